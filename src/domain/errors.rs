//! Error types for the cache, the route limiter and the remote API.

use std::time::Duration;

use thiserror::Error;

/// Whole seconds a caller must wait, rounded up so a sleep of that length
/// always lands past the window boundary.
fn ceil_secs(wait: &Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Errors raised by the entity cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The category was never registered with the coordinator.
    #[error("Unknown cache category: {0}")]
    UnknownCategory(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Pre-flight denial raised by the route registry before a request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// The route used up its allowance for the current window.
    #[error("limit reached for route {url}, retry after {} seconds", ceil_secs(.retry_after))]
    RouteLimitExceeded {
        /// Route (request path) that was denied
        url: String,
        /// Time until the route's window closes
        retry_after: Duration,
    },
}

impl LimitError {
    /// Wait before retrying, rounded up to whole seconds.
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::RouteLimitExceeded { retry_after, .. } => ceil_secs(retry_after),
        }
    }

    /// Exact wait before retrying.
    pub const fn retry_after(&self) -> Duration {
        match self {
            Self::RouteLimitExceeded { retry_after, .. } => *retry_after,
        }
    }

    /// Route denials are always retryable once the wait has elapsed.
    pub const fn is_transient(&self) -> bool {
        true
    }
}

/// Errors produced by the transport layer when talking to the remote API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The API token was rejected (HTTP 401)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The requested resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API answered with an error payload
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Message extracted from the error payload
        message: String,
    },

    /// Network error occurred during the request
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not valid JSON
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    /// Map a non-success HTTP status and its body to an error variant.
    ///
    /// - 401: invalid token
    /// - 404: not found
    /// - anything else: generic API error carrying the body
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::InvalidToken(body),
            404 => Self::NotFound(body),
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }

    /// Returns true for server-side (5xx) failures, throttling (429) and network errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Network(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

/// Errors surfaced by [`ApiClient`](crate::services::ApiClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Programming error against the cache
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Request denied before it was sent
    #[error(transparent)]
    Limit(#[from] LimitError),

    /// Error from the remote API, passed through unmodified
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A payload could not be turned into a typed record
    #[error("Failed to hydrate record: {0}")]
    Hydration(#[source] serde_json::Error),
}

impl ClientError {
    /// Returns true if the caller may retry the same operation later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Limit(err) => err.is_transient(),
            Self::Remote(err) => err.is_transient(),
            Self::Cache(_) | Self::Hydration(_) => false,
        }
    }

    /// Wait reported by a route denial, if this is one.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Limit(err) => Some(err.retry_after()),
            _ => None,
        }
    }
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
