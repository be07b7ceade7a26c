//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty stdout formatting
//! - JSON file output with rotation and retention

pub mod logger;

pub use logger::{parse_log_level, LoggerImpl};
