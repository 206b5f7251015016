//! Error types for the portal workflow
//!
//! This module defines the domain errors used by the navigator and parser,
//! including the transient/non-transient split that drives retry decisions.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Rate limit response from the portal (429)
    #[error("Rate limited by server")]
    RateLimited,

    /// Server-side error with status code (5xx)
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Client-side error with status code (4xx): the request itself is
    /// malformed or rejected; retrying cannot help
    #[error("Client error: {0}")]
    ClientError(u16),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, 5xx and 429 are transient; 4xx and
    /// malformed URLs are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited | Self::ServerError(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::ClientError(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Errors that can occur while interpreting portal responses
#[derive(Error, Debug)]
pub enum ParseError {
    /// No form found where the workflow expects one
    #[error("No form found on page")]
    FormNotFound,

    /// The province dropdown does not offer the configured province
    #[error("Province not offered by the portal: {0}")]
    ProvinceNotOffered(String),

    /// A required form field is missing from the page
    #[error("Required form field missing: {0}")]
    MissingField(String),

    /// The page matches none of the recognized layouts
    #[error("Unrecognized page layout")]
    UnrecognizedLayout,
}
