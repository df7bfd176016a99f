use std::io;

use thiserror::Error;
use trek_core::api::ApiError;
use trek_core::auth::AuthError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] trek_core::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Trip ID cannot be empty")]
    EmptyTripId,
    #[error("No trip given. Pass --trip <ID> or run `trek config use-trip <ID>`")]
    NoTripSelected,
    #[error("Invalid item address '{0}'. Use CATEGORY:INDEX, e.g. clothing:0")]
    InvalidItemAddress(String),
    #[error("No item at {category}:{index}")]
    ItemNotFound { category: String, index: usize },
    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("You do not have permission to {0}")]
    Forbidden(String),
    #[error("{0} packing update(s) failed and were reverted")]
    PackingUpdateFailed(usize),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "API is not configured. Run `trek config init --api-base-url <URL>` or set TREK_API_URL."
    )]
    ApiNotConfigured,
}

impl From<AuthError> for CliError {
    fn from(error: AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
