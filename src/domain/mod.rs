//! Domain layer: typed records, configuration, errors and port traits.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    CacheError, CacheResult, ClientError, ClientResult, LimitError, RemoteError,
};
