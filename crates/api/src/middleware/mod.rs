//! Request extractors and layers shared across routes.
//!
//! - [`auth::ApiKeyAuth`] -- requires the static bearer API key.
//! - [`security_headers`] -- response hardening headers.

pub mod auth;
pub mod security_headers;
