//! Request handlers for the Admin API, grouped by resource.

pub mod endpoints;
pub mod presets;
pub mod system;
