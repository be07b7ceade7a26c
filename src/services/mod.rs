//! Service layer: the client session that ties the cache, the route
//! limiter and the transport together.

pub mod client;

pub use client::ApiClient;
