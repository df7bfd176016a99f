//! Error types for trek-core

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;

/// Result type alias using trek-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in trek-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Credential/session error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
