//! Domain primitives shared by every photo-api crate.
//!
//! Nothing in here performs I/O. Job identifiers, the retry policy
//! descriptor handed to the workflow engine, upload key naming, API key
//! digests and the domain error type live here so the storage, engine,
//! ledger and HTTP crates agree on them.

pub mod api_key;
pub mod error;
pub mod job;
pub mod retry;
pub mod types;
pub mod upload;
