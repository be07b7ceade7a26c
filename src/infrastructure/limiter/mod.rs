//! Per-route admission control.
//!
//! Each request path gets a [`Route`] with a 60 second window and a limit
//! chosen from its URL shape: 120 calls for console input, 40 otherwise.

pub mod registry;
pub mod route;

pub use registry::RouteRegistry;
pub use route::{Admission, Route, RouteClass, CONSOLE_INPUT_LIMIT, ORDINARY_LIMIT, WINDOW};
