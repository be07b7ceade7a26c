//! anywhere-client - async PythonAnywhere API client
//!
//! A client session that sits between callers and the remote API and keeps
//! them inside the API's per-route call limits, while serving repeat reads
//! from a short-lived entity cache.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): typed records, configuration, errors and port traits
//! - **Infrastructure Layer** (`infrastructure`): cache, route limiter, HTTP transport, config, logging
//! - **Service Layer** (`services`): the [`ApiClient`] session
//!
//! # Example
//!
//! ```no_run
//! use anywhere_client::{ApiClient, ConfigLoader, LoggerImpl};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let _logger = LoggerImpl::init(&config.logging)?;
//!
//!     let client = ApiClient::new(&config)?;
//!     for console in client.consoles().await? {
//!         println!("{} {}", console.id, console.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{
    CacheError, CacheResult, ClientError, ClientResult, LimitError, RemoteError,
};
pub use domain::models::{
    AlwaysOnTask, Cacheable, Category, ClientConfig, Console, Entity, EntityId, NewScheduledTask,
    Record, Region, ScheduledTask, ScheduledTaskUpdate, TaskInterval, WebApp, WebAppUpdate,
};
pub use domain::ports::{HttpMethod, Transport, TtlStore};
pub use infrastructure::cache::CacheCoordinator;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::http::HttpTransport;
pub use infrastructure::limiter::RouteRegistry;
pub use infrastructure::logging::LoggerImpl;
pub use services::ApiClient;
