//! Mock-serving HTTP surface.
//!
//! Real clients point at this listener. Whatever the path, the request is
//! handed to the resolution engine and answered from the endpoint's active
//! preset; nothing here mutates state.

mod handler;
mod server;

pub use server::MockServer;
