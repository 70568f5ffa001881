//! Photo job gateway server library.
//!
//! Exposes config, state, error handling, router and routes so the binary
//! entrypoint and the integration tests build the same application.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
