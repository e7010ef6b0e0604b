/*!
 * Error types for the bimtrans application.
 *
 * This module contains custom error types for the different boundaries of
 * the pipeline, using the thiserror crate for ergonomic error definitions.
 * Provider errors never cross the dispatcher boundary: the client turns them
 * into soft failures or a cancellation. Write-back errors only ever roll back
 * their own transaction.
 */

use thiserror::Error;

/// Errors that can occur when talking to the translation API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be completed (timeout, body read failure, ...)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The endpoint could not be reached at all
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The account's character quota is used up
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    /// Build the typed error matching an HTTP status returned by the API
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            456 => Self::QuotaExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors raised by the host document while writing back
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The sub-document is not part of the model
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The element id does not exist in the sub-document
    #[error("Element {0} not found")]
    ElementNotFound(String),

    /// The owner has no such parameter
    #[error("Parameter '{parameter}' not found on element {element}")]
    ParameterNotFound { element: String, parameter: String },

    /// The host refuses to modify the target
    #[error("Target is read-only: {0}")]
    ReadOnly(String),

    /// A grid coordinate lies outside the schedule body
    #[error("Cell ({row}, {column}) is outside schedule {schedule}")]
    CellOutOfRange { schedule: String, row: usize, column: usize },

    /// A transaction call arrived in the wrong state
    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// Errors that abort the write-back of one translation group
#[derive(Error, Debug)]
pub enum WriteBackError {
    /// Error from the host document
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// The owner/kind pair has no write-back strategy
    #[error("No write-back strategy for {kind} on {owner}")]
    UnsupportedTarget { kind: String, owner: String },

    /// A grid unit arrived without coordinates
    #[error("Missing cell coordinates for {0}")]
    MissingCoordinates(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from writing back into the model
    #[error("Write-back error: {0}")]
    WriteBack(#[from] WriteBackError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<HostError> for AppError {
    fn from(error: HostError) -> Self {
        Self::WriteBack(WriteBackError::Host(error))
    }
}
