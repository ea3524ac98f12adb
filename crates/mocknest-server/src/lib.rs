//! Mocknest: a preset-driven mock HTTP server.
//!
//! Operators register endpoints (method + path), attach named presets
//! (status code + JSON payload + filter keys), and flip which preset is
//! active. Real clients hit the mock listener and receive the active
//! preset's payload, optionally narrowed by their query parameters.

// ===== Resolution core =====
pub mod engine;
pub mod model;
pub mod store;

// ===== HTTP surfaces =====
pub mod admin_api;
pub mod mock_api;

// ===== Ambient =====
pub mod config;
pub mod metrics;
