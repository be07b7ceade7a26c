//! Port trait definitions (Hexagonal Architecture)
//!
//! - Transport: the request function the coordination layer guards
//! - TtlStore: the interface cache consumers code against
pub mod transport;
pub mod ttl_store;

pub use transport::{HttpMethod, Transport};
pub use ttl_store::TtlStore;
