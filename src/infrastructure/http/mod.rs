//! HTTP adapter for the [`Transport`](crate::domain::ports::Transport) port.

pub mod transport;

pub use transport::HttpTransport;
