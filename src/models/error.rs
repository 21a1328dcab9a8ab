use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Errors surfaced to a connected client over the live connection.
#[derive(Debug)]
pub enum RelayError {
    /// Bad or expired credential token; the connection is refused.
    Unauthenticated(String),
    /// Malformed submission (empty comment, bad payload); the message is dropped.
    InvalidInput(String),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Unauthenticated(reason) => write!(f, "Unauthenticated: {}", reason),
            RelayError::InvalidInput(reason) => write!(f, "Invalid input: {}", reason),
        }
    }
}

impl std::error::Error for RelayError {}
