//! Domain model structs and DTOs.
//!
//! - [`job_log::JobLog`] -- a `FromRow` row of the `job_logs` table
//! - [`job_log::NewJobLog`] -- insert DTO
//! - [`job_log::JobLogUpdate`] -- partial status update
//! - [`status::JobStatus`] -- lookup-table backed status enum

pub mod job_log;
pub mod status;
