//! Job submission and status reconciliation.
//!
//! Composes the object existence check, the best-effort job ledger and the
//! workflow dispatcher into [`submission::JobService`], and issues presigned
//! upload forms through [`uploads::UploadService`].

pub mod admission;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod reconciler;
pub mod submission;
pub mod uploads;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{JobError, UploadError};
