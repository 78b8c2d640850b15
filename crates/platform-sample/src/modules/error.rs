//! Error types for the platform's business modules.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The session token is unknown or was revoked.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
