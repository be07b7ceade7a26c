use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::domain::errors::RemoteError;

/// HTTP verbs the API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read
    Get,
    /// Create / action
    Post,
    /// Partial update
    Patch,
    /// Delete
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// Request function the coordination layer sits in front of.
///
/// Implementations perform exactly one network call per invocation and
/// return the parsed payload (`Value::Null` for empty bodies) or a
/// [`RemoteError`]. They never retry and never consult the cache.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request against an API path (e.g. `/api/v0/user/alice/consoles/`)
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RemoteError>;
}
