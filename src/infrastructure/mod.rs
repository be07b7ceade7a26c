//! Infrastructure layer module
//!
//! - Entity cache with lazy TTL expiration
//! - Per-route admission limiter
//! - HTTP transport (reqwest)
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod cache;
pub mod config;
pub mod http;
pub mod limiter;
pub mod logging;
