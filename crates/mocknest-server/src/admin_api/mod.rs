//! Admin REST API for managing mock endpoints and presets.
//!
//! This module provides the operator-facing surface:
//! - Creating, updating, and deleting endpoints (with preset batch edits)
//! - Managing presets and toggling which one is active
//! - The catalogue of currently-servable routes
//! - Health and Prometheus metrics endpoints
//!
//! The API listens on its own port (default: 4545), separate from the
//! mock-serving listener.

mod handlers;
mod router;
mod server;
pub(crate) mod types;

pub use server::{AdminApiServer, AdminState};
