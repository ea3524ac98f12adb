//! Persistence boundary for endpoints and presets.
//!
//! The resolution engine and admin API depend on these traits only, never on
//! a concrete backend. The traits are intentionally synchronous: reads are
//! lock-guarded lookups, and every write that changes which preset is enabled
//! happens inside a single store call so callers get atomicity for free.

pub mod memory;

pub use memory::InMemoryStore;

use crate::model::{
    Endpoint, EndpointPatch, HttpMethod, NewEndpoint, NewPreset, Preset, PresetPatch, PresetUpsert,
};
use anyhow::Result as AnyResult;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Endpoint {0} not found")]
    EndpointNotFound(Uuid),
    #[error("Preset {0} not found")]
    PresetNotFound(Uuid),
    #[error("An endpoint for {method} {path} already exists")]
    DuplicateRoute { method: HttpMethod, path: String },
}

/// Filters for listing endpoints.
#[derive(Debug, Default, Clone)]
pub struct EndpointQuery {
    /// Case-insensitive substring match against the endpoint path.
    pub search: Option<String>,
    /// Restrict to these methods; empty means all.
    pub methods: Vec<HttpMethod>,
}

/// Read/write access to endpoint definitions.
pub trait EndpointStore: Send + Sync {
    /// Create an endpoint, optionally with inline presets, as one atomic
    /// write. Fails with `DuplicateRoute` if (method, path) is taken.
    fn create_endpoint(&self, new: NewEndpoint) -> Result<(Endpoint, Vec<Preset>), StoreError>;

    /// Apply an endpoint patch. Fails with `DuplicateRoute` if the patch
    /// moves the endpoint onto another endpoint's (method, path).
    fn update_endpoint(&self, id: Uuid, patch: EndpointPatch) -> Result<Endpoint, StoreError>;

    /// Delete an endpoint and, by cascade, all of its presets.
    fn delete_endpoint(&self, id: Uuid) -> Result<Endpoint, StoreError>;

    fn get_endpoint(&self, id: Uuid) -> Result<Option<Endpoint>, StoreError>;

    /// Exact-match lookup by (method, path). A miss is a normal outcome.
    fn find_route(&self, method: HttpMethod, path: &str) -> Result<Option<Endpoint>, StoreError>;

    /// List endpoints newest-first, subject to the query filters.
    fn list_endpoints(&self, query: &EndpointQuery) -> Result<Vec<Endpoint>, StoreError>;

    /// Endpoints that currently have an enabled preset, ordered by path.
    fn active_routes(&self) -> Result<Vec<Endpoint>, StoreError>;
}

/// Read/write access to presets.
///
/// Every method that can change which preset is enabled (insert of an
/// enabled preset, enabling update, `set_active`, batch edits) clears the
/// endpoint's other presets within the same atomic unit of work.
pub trait PresetStore: Send + Sync {
    /// Add a preset to an endpoint. An `enabled: true` payload deactivates
    /// all sibling presets in the same write.
    fn insert_preset(&self, endpoint_id: Uuid, new: NewPreset) -> Result<Preset, StoreError>;

    /// Apply a preset patch. Enabling deactivates all siblings in the same
    /// write; disabling touches only this preset.
    fn update_preset(&self, id: Uuid, patch: PresetPatch) -> Result<Preset, StoreError>;

    fn delete_preset(&self, id: Uuid) -> Result<Preset, StoreError>;

    fn get_preset(&self, id: Uuid) -> Result<Option<Preset>, StoreError>;

    /// All presets of an endpoint, newest-first. Fails with
    /// `EndpointNotFound` when the endpoint does not exist.
    fn presets_for_endpoint(&self, endpoint_id: Uuid) -> Result<Vec<Preset>, StoreError>;

    /// The enabled presets of an endpoint in stable order (oldest first,
    /// then by id). Correct stores return zero or one element.
    fn enabled_presets(&self, endpoint_id: Uuid) -> Result<Vec<Preset>, StoreError>;

    /// Atomically disable every preset of `endpoint_id`, then enable
    /// `preset_id`. Fails with `PresetNotFound` when the preset does not
    /// exist or belongs to a different endpoint.
    fn set_active(&self, endpoint_id: Uuid, preset_id: Uuid) -> Result<Preset, StoreError>;

    /// Disable every preset of the endpoint.
    fn deactivate_all(&self, endpoint_id: Uuid) -> Result<(), StoreError>;

    /// Apply a batch edit in one atomic write: entries with ids update,
    /// entries without ids create, stored presets absent from the batch are
    /// deleted. Returns the endpoint's presets afterwards, newest-first.
    fn apply_preset_batch(
        &self,
        endpoint_id: Uuid,
        batch: Vec<PresetUpsert>,
    ) -> Result<Vec<Preset>, StoreError>;
}

/// Create a store from the configured backend name.
///
/// Only the in-memory backend exists today; the name is matched anyway so a
/// persistent backend can slot in without touching call sites.
pub fn create_store(backend: &str) -> AnyResult<Arc<InMemoryStore>> {
    match backend {
        "memory" => {
            tracing::info!("Using in-memory endpoint/preset store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        other => anyhow::bail!("Unknown store backend: {other}"),
    }
}
