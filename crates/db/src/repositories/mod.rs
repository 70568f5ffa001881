//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod job_log_repo;

pub use job_log_repo::JobLogRepo;
