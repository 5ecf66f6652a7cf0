/*!
 * Error types for the sqlshift application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the external SQL services
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Error when sending a request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a service response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the service itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Diagnostic message from the service
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service did not answer within the configured bound
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The service answered, but the answer breaks the contract
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Diagnostic text provided by the service, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ApiError { message, .. } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether the failure happened before the service produced any answer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Guard violations and selection errors raised by the session state machine.
///
/// The display text of each variant is the warning shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please provide SQL statements to convert")]
    EmptyInput,

    #[error("Please select a source and a target dialect")]
    NoDialectSelected,

    #[error("Source and target dialects must be different")]
    IdenticalDialects,

    #[error("A conversion is already in progress")]
    ConversionInProgress,

    #[error("No results to export")]
    NothingToExport,

    #[error("Unsupported dialect: {0}")]
    UnknownDialect(String),

    #[error("Supported dialects are not loaded, restart the session")]
    CatalogNotLoaded,
}

/// Errors that can occur while converting a statement set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A guard rejected the request before anything was sent
    #[error("Conversion rejected: {0}")]
    Rejected(#[from] SessionError),

    /// The conversion service failed as a whole
    #[error("Conversion failed: {0}")]
    Service(#[from] ServiceError),

    /// The service returned a result sequence of the wrong length
    #[error("Conversion returned {actual} result(s) for {expected} statement(s)")]
    CountMismatch {
        /// Number of submitted statements
        expected: usize,
        /// Number of results received
        actual: usize,
    },
}

/// Errors that can occur while exporting one format
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// A guard rejected the request before anything was sent
    #[error("Export rejected: {0}")]
    Rejected(#[from] SessionError),

    /// The rendering service failed
    #[error("Export failed: {0}")]
    Service(#[from] ServiceError),

    /// The document was rendered but could not be saved
    #[error("Failed to save export: {0}")]
    Save(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from an external service
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Error from a session guard
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Error from conversion
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from export
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

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
