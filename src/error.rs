//! Error types and result handling for reelquotes operations.
//!
//! Internal fallible code returns a [`Result<T>`], which is a type alias for
//! `std::result::Result<T, Error>`. These errors almost never reach a caller of
//! the pipelines. Provider failures are collapsed to "zero results" by the
//! [`Fetcher`](crate::net::Fetcher), and anything that escapes a pipeline is
//! converted into an error field on the
//! [`ResponseEnvelope`](crate::types::ResponseEnvelope).
//!
//! # Error Categories
//!
//! - **Network Errors**: Connection issues and transport failures
//! - **HTTP Errors**: Non-success status from a provider
//! - **Timeouts**: A provider call exceeded its deadline
//! - **Parse Errors**: Payloads that do not match the expected schema
//! - **Config Errors**: Invalid filter patterns or settings
//! - **Missing Input**: Neither a search term nor an identifier was supplied
//!
//! # Examples
//!
//! ```rust
//! use reelquotes::error::{Error, Result};
//!
//! fn check(term: &str) -> Result<()> {
//!     if term.trim().is_empty() {
//!         return Err(Error::missing_input("a search term or identifier is required"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(check(" "), Err(Error::MissingInput(_))));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Type alias for Results with reelquotes errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all reelquotes operations.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Http`](Error::Http) - Non-success HTTP status from a provider
/// * [`Timeout`](Error::Timeout) - Provider call cancelled by its deadline
/// * [`Parse`](Error::Parse) - Data parsing and format errors
/// * [`Json`](Error::Json) - JSON deserialization errors
/// * [`Config`](Error::Config) - Invalid configuration
/// * [`MissingInput`](Error::MissingInput) - Nothing to search for
/// * [`Other`](Error::Other) - Generic error messages
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest), such as DNS
    /// resolution failures, TLS errors and dropped connections.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A provider answered with a non-success status code.
    #[error("Provider [{provider}] answered HTTP {status}")]
    Http { provider: String, status: u16 },

    /// A provider call exceeded its deadline and was cancelled.
    #[error("Provider [{provider}] timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    /// Payload parsing and data format errors.
    ///
    /// ```rust
    /// use reelquotes::Error;
    ///
    /// let error = Error::parse("thread payload is not a two element array");
    /// assert!(error.to_string().contains("two element"));
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration, such as a denylist pattern that does not compile.
    #[error("Config error: {0}")]
    Config(String),

    /// The caller supplied neither a search term nor an identifier.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates an HTTP status error for a provider.
    ///
    /// ```rust
    /// use reelquotes::Error;
    ///
    /// let error = Error::http("reddit", 429);
    /// assert_eq!(error.to_string(), "Provider [reddit] answered HTTP 429");
    /// ```
    pub fn http(provider: impl Into<String>, status: u16) -> Self {
        Error::Http {
            provider: provider.into(),
            status,
        }
    }

    /// Creates a timeout error for a provider.
    pub fn timeout(provider: impl Into<String>, after: Duration) -> Self {
        Error::Timeout {
            provider: provider.into(),
            after,
        }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a missing-input error.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Error::MissingInput(msg.into())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Config(format!("invalid pattern: {}", e))
    }
}
