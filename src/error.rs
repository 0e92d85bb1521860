//! Error types for the Verkeerscentrum client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The login was refused, or the site answered without the logged-in marker.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, ApiError::InvalidCredentials)
    }
}
