use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Method, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::domain::errors::RemoteError;
use crate::domain::models::ClientConfig;
use crate::domain::ports::{HttpMethod, Transport};

/// Payload keys the API uses to report an error, checked in this order.
const ERROR_KEYS: [&str; 4] = ["detail", "error", "error_message", "non_field_errors"];

/// reqwest-backed [`Transport`] talking to the regional API host.
///
/// - Connection pooling and reuse (via `reqwest::Client`)
/// - `Authorization: Token <token>` on every request
/// - Bounded number of requests in flight
/// - Error payloads mapped to [`RemoteError`]
pub struct HttpTransport {
    http_client: ReqwestClient,
    base_url: String,
    permits: Arc<Semaphore>,
}

impl HttpTransport {
    /// Build a transport from a client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|_| RemoteError::InvalidToken("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_concurrent_requests)
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()?;

        debug!(
            base_url = config.base_url(),
            timeout_secs = config.timeout_secs,
            max_concurrent_requests = config.max_concurrent_requests,
            "http transport initialized"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        })
    }

    /// Host paths are appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a response into a payload or an error
    async fn handle_response(response: Response) -> Result<Value, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if body.trim().is_empty() {
            if status.is_success() {
                return Ok(Value::Null);
            }
            let reason = status.canonical_reason().unwrap_or("empty response");
            return Err(RemoteError::from_status(status.as_u16(), reason.to_string()));
        }

        let payload: Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(RemoteError::from_status(status.as_u16(), body));
            }
            Err(err) => return Err(RemoteError::Decode(err)),
        };

        if let Some(message) = error_message(&payload) {
            warn!(status = status.as_u16(), %message, "API reported an error");
            return Err(RemoteError::from_status(status.as_u16(), message));
        }

        if !status.is_success() {
            return Err(RemoteError::from_status(status.as_u16(), body));
        }

        Ok(payload)
    }
}

/// Message carried by the first error key present in an object payload
fn error_message(payload: &Value) -> Option<String> {
    let object = payload.as_object()?;
    ERROR_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .map(|value| match value {
            Value::String(message) => message.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        })
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(method = %verb))]
    async fn request(
        &self,
        verb: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RemoteError> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.http_client.request(method(verb), &url);
        if let Some(ref body) = body {
            request = request.json(body);
        }

        // A closed semaphore only happens on drop; send unthrottled in that case.
        let _permit = self.permits.acquire().await.ok();
        let response = request.send().await?;

        Self::handle_response(response).await
    }
}
