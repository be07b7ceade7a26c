//! Common test utilities for integration tests
//!
//! Provides a scripted in-memory transport, API payload builders and
//! session constructors shared across the integration test files.

#![allow(dead_code)]

use anywhere_client::{
    ApiClient, ClientConfig, Entity, HttpMethod, RemoteError, Transport,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "alice";

/// One request as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(u16, String),
}

/// Transport answering from a table of `(method, path)` replies.
///
/// Unregistered routes answer 404. Every call is recorded, so tests can
/// assert how many requests actually reached the network.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn key(method: HttpMethod, path: &str) -> String {
    format!("{method} {path}")
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `method path` with a JSON payload
    pub fn reply(&self, method: HttpMethod, path: &str, payload: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(key(method, path), Reply::Json(payload));
    }

    /// Answer `method path` with an error status
    pub fn fail(&self, method: HttpMethod, path: &str, status: u16, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(key(method, path), Reply::Status(status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls made to one `method path`
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RemoteError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });

        let reply = self.replies.lock().unwrap().get(&key(method, path)).cloned();
        match reply {
            Some(Reply::Json(payload)) => Ok(payload),
            Some(Reply::Status(status, message)) => Err(RemoteError::from_status(status, message)),
            None => Err(RemoteError::NotFound("Not found.".to_string())),
        }
    }
}

/// Valid configuration for the test account
pub fn test_config() -> ClientConfig {
    ClientConfig::new(USERNAME, "0123456789abcdef0123456789abcdef01234567")
}

/// Session over a fresh mock transport
pub fn mock_client() -> (ApiClient<MockTransport>, Arc<MockTransport>) {
    mock_client_with(&test_config())
}

pub fn mock_client_with(config: &ClientConfig) -> (ApiClient<MockTransport>, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let client = ApiClient::with_transport(config, Arc::clone(&transport));
    (client, transport)
}

/// API path under the test account
pub fn user_path(rest: &str) -> String {
    format!("/api/v0/user/{USERNAME}/{rest}")
}

pub fn console_payload(id: u64) -> Value {
    json!({
        "id": id,
        "user": USERNAME,
        "executable": "python3.10",
        "arguments": "",
        "working_directory": null,
        "name": "Python 3.10 console",
        "console_url": format!("/user/{USERNAME}/consoles/{id}/"),
        "console_frame_url": format!("/user/{USERNAME}/consoles/{id}/frame/")
    })
}

pub fn scheduled_task_payload(id: u64) -> Value {
    json!({
        "id": id,
        "url": format!("/api/v0/user/{USERNAME}/schedule/{id}/"),
        "user": USERNAME,
        "command": "python3 /home/alice/backup.py",
        "expiry": "2026-12-01",
        "enabled": true,
        "logfile": format!("/user/{USERNAME}/files/var/log/tasklog-{id}.log"),
        "extend_url": format!("/user/{USERNAME}/schedule/task/{id}/extend"),
        "interval": "daily",
        "hour": 4,
        "minute": 30,
        "printable_time": "04:30",
        "can_enable": true,
        "description": ""
    })
}

pub fn always_on_payload(id: u64) -> Value {
    json!({
        "id": id,
        "url": format!("/api/v0/user/{USERNAME}/always_on/{id}/"),
        "user": USERNAME,
        "command": "python3 /home/alice/bot.py",
        "description": "chat bot",
        "enabled": true,
        "state": "running"
    })
}

pub fn webapp_payload(id: u64, domain_name: &str) -> Value {
    json!({
        "id": id,
        "user": USERNAME,
        "domain_name": domain_name,
        "python_version": "3.10",
        "source_directory": format!("/home/{USERNAME}/mysite"),
        "working_directory": format!("/home/{USERNAME}/"),
        "virtualenv_path": null,
        "expiry": null,
        "force_https": false
    })
}

/// Console entity ready to put into a coordinator
pub fn console_entity(id: u64) -> Entity {
    Entity::Console(serde_json::from_value(console_payload(id)).unwrap())
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
