//! Error types for the reconciliation core
//!
//! Model, mapping and selection code never fails; everything that talks to a
//! provider or validates configuration reports through [`Error`].

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider type name
        provider: String,
        /// Error message
        message: String,
    },

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors reported by a provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A change request that can never be expressed for the provider.
    ///
    /// Reported through `DoneHandler::set_invalid` and never retried.
    #[error("{0}")]
    InvalidRequest(String),

    /// Unsupported or malformed routing policy
    #[error("{0}")]
    RoutingPolicy(String),

    /// Aggregate failure of a change batch
    #[error("{0} changes failed")]
    ChangesFailed(usize),

    /// Zone is not hosted by the provider
    #[error("DNSZone {0} not hosted")]
    ZoneNotHosted(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Several provider calls of one request failed
    #[error("{}", join_messages(.0))]
    Multiple(Vec<Error>),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a routing policy error
    pub fn routing_policy(msg: impl Into<String>) -> Self {
        Self::RoutingPolicy(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error marks a request as permanently unprocessable
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::RoutingPolicy(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
