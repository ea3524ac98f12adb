//! Active-preset reads and toggles.
//!
//! The selector is the only reader of the enabled flag on the serving path
//! and the component that decides what happens when the store breaks the
//! single-active invariant: log it, count it, and keep answering with the
//! first preset in stable order.

use crate::metrics;
use crate::model::Preset;
use crate::store::{PresetStore, StoreError};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub struct PresetSelector {
    store: Arc<dyn PresetStore>,
}

impl PresetSelector {
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self { store }
    }

    /// The single enabled preset of an endpoint, or `None` when zero are
    /// enabled.
    ///
    /// A store yielding more than one enabled preset has broken its
    /// invariant. Resolution still answers: the first preset in the store's
    /// stable order (oldest, then smallest id) is served and the anomaly is
    /// logged and counted.
    pub fn active_preset(&self, endpoint_id: Uuid) -> Result<Option<Preset>, StoreError> {
        let mut enabled = self.store.enabled_presets(endpoint_id)?;
        if enabled.len() > 1 {
            warn!(
                %endpoint_id,
                enabled = enabled.len(),
                "More than one enabled preset for endpoint, serving the first in stable order"
            );
            metrics::record_invariant_violation();
        }
        if enabled.is_empty() {
            Ok(None)
        } else {
            Ok(Some(enabled.remove(0)))
        }
    }

    /// Atomically make `preset_id` the endpoint's only enabled preset.
    pub fn set_active(&self, endpoint_id: Uuid, preset_id: Uuid) -> Result<Preset, StoreError> {
        let result = self.store.set_active(endpoint_id, preset_id);
        metrics::record_preset_activation(result.is_ok());
        result
    }

    /// Disable every preset of the endpoint.
    pub fn deactivate_all(&self, endpoint_id: Uuid) -> Result<(), StoreError> {
        self.store.deactivate_all(endpoint_id)
    }
}
