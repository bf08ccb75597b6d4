/*!
 * Error types for the synsync application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Coarse classification of a failure, as seen by the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing credentials
    Auth,
    /// The translation quota for the billing period is used up
    QuotaExceeded,
    /// Transport failures, rate limiting and unexpected API responses
    Network,
    /// Data that must not be written
    Validation,
    /// Misuse of the engine or a crashed run
    Internal,
}

/// Errors that can occur when working with the remote APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
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

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Character quota of the translation account is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationError(_) => ErrorKind::Auth,
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ApiError { .. }
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_) => ErrorKind::Network,
        }
    }

    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by the synchronization engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required credential is not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The remote service rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A merge produced data that must not be written
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Error from a collaborator
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The session id was never issued by this engine
    #[error("Unknown session: {0}")]
    SessionNotFound(u64),

    /// The task driving a run ended without producing a report
    #[error("Run aborted: {0}")]
    Aborted(String),
}

impl SyncError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials(_) | Self::Authentication(_) => ErrorKind::Auth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::SessionNotFound(_) | Self::Aborted(_) => ErrorKind::Internal,
            Self::Provider(e) => e.kind(),
        }
    }

    /// Whether this error aborts a whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the sync engine
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

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
