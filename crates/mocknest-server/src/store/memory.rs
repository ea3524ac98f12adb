//! In-memory store backend.
//!
//! All state lives behind one `RwLock`, so resolution reads run in parallel
//! while every write, including the disable-all-then-enable-one swap, is a
//! single critical section. No reader can observe an endpoint with zero or
//! two enabled presets mid-toggle.

use super::{EndpointQuery, EndpointStore, PresetStore, StoreError};
use crate::model::{
    Endpoint, EndpointPatch, HttpMethod, NewEndpoint, NewPreset, Preset, PresetPatch, PresetUpsert,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    endpoints: HashMap<Uuid, Endpoint>,
    presets: HashMap<Uuid, Preset>,
    /// Uniqueness index over (method, path).
    routes: HashMap<(HttpMethod, String), Uuid>,
}

impl StoreState {
    fn deactivate_siblings(&mut self, endpoint_id: Uuid, except: Option<Uuid>, now: DateTime<Utc>) {
        for preset in self.presets.values_mut() {
            if preset.endpoint_id == endpoint_id && Some(preset.id) != except && preset.enabled {
                preset.enabled = false;
                preset.updated_at = now;
            }
        }
    }

    fn endpoint_presets(&self, endpoint_id: Uuid) -> Vec<Preset> {
        self.presets
            .values()
            .filter(|p| p.endpoint_id == endpoint_id)
            .cloned()
            .collect()
    }
}

/// Thread-safe in-memory implementation of both store traits.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(presets: &mut [Preset]) {
    presets.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl EndpointStore for InMemoryStore {
    fn create_endpoint(&self, new: NewEndpoint) -> Result<(Endpoint, Vec<Preset>), StoreError> {
        let NewEndpoint {
            method,
            path,
            description,
            presets,
        } = new;

        let mut state = self.state.write();
        if state.routes.contains_key(&(method, path.clone())) {
            return Err(StoreError::DuplicateRoute { method, path });
        }

        let now = Utc::now();
        let endpoint = Endpoint {
            id: Uuid::new_v4(),
            method,
            path: path.clone(),
            description,
            created_at: now,
            updated_at: now,
        };
        state.routes.insert((method, path), endpoint.id);
        state.endpoints.insert(endpoint.id, endpoint.clone());

        // The boundary rejects payloads with more than one enabled preset;
        // if one slips through anyway, only the first stays enabled.
        let mut created = Vec::with_capacity(presets.len());
        let mut seen_enabled = false;
        for new_preset in presets {
            let enabled = new_preset.enabled && !seen_enabled;
            seen_enabled |= enabled;
            let preset = Preset {
                id: Uuid::new_v4(),
                endpoint_id: endpoint.id,
                name: new_preset.name,
                enabled,
                status_code: new_preset.status_code,
                response_data: new_preset.response_data,
                filter_keys: new_preset.filter_keys,
                created_at: now,
                updated_at: now,
            };
            state.presets.insert(preset.id, preset.clone());
            created.push(preset);
        }

        Ok((endpoint, created))
    }

    fn update_endpoint(&self, id: Uuid, patch: EndpointPatch) -> Result<Endpoint, StoreError> {
        let mut state = self.state.write();
        let current = state
            .endpoints
            .get(&id)
            .cloned()
            .ok_or(StoreError::EndpointNotFound(id))?;

        let method = patch.method.unwrap_or(current.method);
        let path = patch.path.unwrap_or_else(|| current.path.clone());

        if let Some(&holder) = state.routes.get(&(method, path.clone())) {
            if holder != id {
                return Err(StoreError::DuplicateRoute { method, path });
            }
        }

        state.routes.remove(&(current.method, current.path));
        state.routes.insert((method, path.clone()), id);

        let endpoint = state
            .endpoints
            .get_mut(&id)
            .ok_or(StoreError::EndpointNotFound(id))?;
        endpoint.method = method;
        endpoint.path = path;
        if let Some(description) = patch.description {
            endpoint.description = Some(description);
        }
        endpoint.updated_at = Utc::now();
        Ok(endpoint.clone())
    }

    fn delete_endpoint(&self, id: Uuid) -> Result<Endpoint, StoreError> {
        let mut state = self.state.write();
        let endpoint = state
            .endpoints
            .remove(&id)
            .ok_or(StoreError::EndpointNotFound(id))?;
        state.routes.remove(&(endpoint.method, endpoint.path.clone()));
        state.presets.retain(|_, p| p.endpoint_id != id);
        Ok(endpoint)
    }

    fn get_endpoint(&self, id: Uuid) -> Result<Option<Endpoint>, StoreError> {
        Ok(self.state.read().endpoints.get(&id).cloned())
    }

    fn find_route(&self, method: HttpMethod, path: &str) -> Result<Option<Endpoint>, StoreError> {
        let state = self.state.read();
        let endpoint = state
            .routes
            .get(&(method, path.to_string()))
            .and_then(|id| state.endpoints.get(id))
            .cloned();
        Ok(endpoint)
    }

    fn list_endpoints(&self, query: &EndpointQuery) -> Result<Vec<Endpoint>, StoreError> {
        let state = self.state.read();
        let needle = query.search.as_ref().map(|s| s.to_lowercase());
        let mut endpoints: Vec<Endpoint> = state
            .endpoints
            .values()
            .filter(|e| {
                needle
                    .as_ref()
                    .map(|n| e.path.to_lowercase().contains(n))
                    .unwrap_or(true)
            })
            .filter(|e| query.methods.is_empty() || query.methods.contains(&e.method))
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(endpoints)
    }

    fn active_routes(&self) -> Result<Vec<Endpoint>, StoreError> {
        let state = self.state.read();
        let active: HashSet<Uuid> = state
            .presets
            .values()
            .filter(|p| p.enabled)
            .map(|p| p.endpoint_id)
            .collect();
        let mut endpoints: Vec<Endpoint> = state
            .endpoints
            .values()
            .filter(|e| active.contains(&e.id))
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        Ok(endpoints)
    }
}

impl PresetStore for InMemoryStore {
    fn insert_preset(&self, endpoint_id: Uuid, new: NewPreset) -> Result<Preset, StoreError> {
        let mut state = self.state.write();
        if !state.endpoints.contains_key(&endpoint_id) {
            return Err(StoreError::EndpointNotFound(endpoint_id));
        }

        let now = Utc::now();
        if new.enabled {
            state.deactivate_siblings(endpoint_id, None, now);
        }
        let preset = Preset {
            id: Uuid::new_v4(),
            endpoint_id,
            name: new.name,
            enabled: new.enabled,
            status_code: new.status_code,
            response_data: new.response_data,
            filter_keys: new.filter_keys,
            created_at: now,
            updated_at: now,
        };
        state.presets.insert(preset.id, preset.clone());
        Ok(preset)
    }

    fn update_preset(&self, id: Uuid, patch: PresetPatch) -> Result<Preset, StoreError> {
        let mut state = self.state.write();
        let endpoint_id = state
            .presets
            .get(&id)
            .map(|p| p.endpoint_id)
            .ok_or(StoreError::PresetNotFound(id))?;

        let now = Utc::now();
        if patch.enabled == Some(true) {
            state.deactivate_siblings(endpoint_id, Some(id), now);
        }

        let preset = state
            .presets
            .get_mut(&id)
            .ok_or(StoreError::PresetNotFound(id))?;
        if let Some(name) = patch.name {
            preset.name = name;
        }
        if let Some(enabled) = patch.enabled {
            preset.enabled = enabled;
        }
        if let Some(status_code) = patch.status_code {
            preset.status_code = status_code;
        }
        if let Some(response_data) = patch.response_data {
            preset.response_data = response_data;
        }
        if let Some(filter_keys) = patch.filter_keys {
            preset.filter_keys = filter_keys;
        }
        preset.updated_at = now;
        Ok(preset.clone())
    }

    fn delete_preset(&self, id: Uuid) -> Result<Preset, StoreError> {
        let mut state = self.state.write();
        state
            .presets
            .remove(&id)
            .ok_or(StoreError::PresetNotFound(id))
    }

    fn get_preset(&self, id: Uuid) -> Result<Option<Preset>, StoreError> {
        Ok(self.state.read().presets.get(&id).cloned())
    }

    fn presets_for_endpoint(&self, endpoint_id: Uuid) -> Result<Vec<Preset>, StoreError> {
        let state = self.state.read();
        if !state.endpoints.contains_key(&endpoint_id) {
            return Err(StoreError::EndpointNotFound(endpoint_id));
        }
        let mut presets = state.endpoint_presets(endpoint_id);
        newest_first(&mut presets);
        Ok(presets)
    }

    fn enabled_presets(&self, endpoint_id: Uuid) -> Result<Vec<Preset>, StoreError> {
        let state = self.state.read();
        let mut presets: Vec<Preset> = state
            .presets
            .values()
            .filter(|p| p.endpoint_id == endpoint_id && p.enabled)
            .cloned()
            .collect();
        // Stable order: oldest first, then by id.
        presets.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(presets)
    }

    fn set_active(&self, endpoint_id: Uuid, preset_id: Uuid) -> Result<Preset, StoreError> {
        let mut state = self.state.write();
        let owned = state
            .presets
            .get(&preset_id)
            .map(|p| p.endpoint_id == endpoint_id)
            .unwrap_or(false);
        if !owned {
            return Err(StoreError::PresetNotFound(preset_id));
        }

        // One pass under the write lock: disable every sibling, enable the
        // target. Readers block until the swap is complete.
        let now = Utc::now();
        for preset in state.presets.values_mut() {
            if preset.endpoint_id != endpoint_id {
                continue;
            }
            let target = preset.id == preset_id;
            if preset.enabled != target {
                preset.enabled = target;
                preset.updated_at = now;
            }
        }

        state
            .presets
            .get(&preset_id)
            .cloned()
            .ok_or(StoreError::PresetNotFound(preset_id))
    }

    fn deactivate_all(&self, endpoint_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.endpoints.contains_key(&endpoint_id) {
            return Err(StoreError::EndpointNotFound(endpoint_id));
        }
        state.deactivate_siblings(endpoint_id, None, Utc::now());
        Ok(())
    }

    fn apply_preset_batch(
        &self,
        endpoint_id: Uuid,
        batch: Vec<PresetUpsert>,
    ) -> Result<Vec<Preset>, StoreError> {
        let mut state = self.state.write();
        if !state.endpoints.contains_key(&endpoint_id) {
            return Err(StoreError::EndpointNotFound(endpoint_id));
        }
        for item in &batch {
            if let Some(id) = item.id {
                match state.presets.get(&id) {
                    Some(p) if p.endpoint_id == endpoint_id => {}
                    _ => return Err(StoreError::PresetNotFound(id)),
                }
            }
        }

        let now = Utc::now();

        // Stored presets missing from the batch are deleted.
        let keep: HashSet<Uuid> = batch.iter().filter_map(|i| i.id).collect();
        state
            .presets
            .retain(|id, p| p.endpoint_id != endpoint_id || keep.contains(id));

        let mut seen_enabled = false;
        for item in batch {
            let enabled = item.enabled && !seen_enabled;
            seen_enabled |= enabled;
            match item.id {
                // Ids were checked above, before the deletes.
                Some(id) => {
                    let preset = state
                        .presets
                        .get_mut(&id)
                        .ok_or(StoreError::PresetNotFound(id))?;
                    preset.name = item.name;
                    preset.enabled = enabled;
                    preset.status_code = item.status_code;
                    preset.response_data = item.response_data;
                    preset.filter_keys = item.filter_keys;
                    preset.updated_at = now;
                }
                None => {
                    let preset = Preset {
                        id: Uuid::new_v4(),
                        endpoint_id,
                        name: item.name,
                        enabled,
                        status_code: item.status_code,
                        response_data: item.response_data,
                        filter_keys: item.filter_keys,
                        created_at: now,
                        updated_at: now,
                    };
                    state.presets.insert(preset.id, preset);
                }
            }
        }

        if let Some(endpoint) = state.endpoints.get_mut(&endpoint_id) {
            endpoint.updated_at = now;
        }

        let mut presets = state.endpoint_presets(endpoint_id);
        newest_first(&mut presets);
        Ok(presets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(method: HttpMethod, path: &str) -> NewEndpoint {
        NewEndpoint {
            method,
            path: path.to_string(),
            description: None,
            presets: Vec::new(),
        }
    }

    fn preset(name: &str, enabled: bool) -> NewPreset {
        NewPreset {
            name: name.to_string(),
            enabled,
            status_code: 200,
            response_data: json!({"preset": name}),
            filter_keys: Vec::new(),
        }
    }

    #[test]
    fn test_create_and_find_route() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();

        let found = store.find_route(HttpMethod::GET, "/api/users").unwrap();
        assert_eq!(found.map(|e| e.id), Some(created.id));

        // Exact matching only: different method, trailing slash, case.
        assert!(store
            .find_route(HttpMethod::POST, "/api/users")
            .unwrap()
            .is_none());
        assert!(store
            .find_route(HttpMethod::GET, "/api/users/")
            .unwrap()
            .is_none());
        assert!(store
            .find_route(HttpMethod::GET, "/API/users")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_create_rejects_duplicate_route() {
        let store = InMemoryStore::new();
        store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();

        let err = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRoute { .. }));

        // Same path under another method is a different route.
        assert!(store
            .create_endpoint(endpoint(HttpMethod::POST, "/api/users"))
            .is_ok());
    }

    #[test]
    fn test_create_with_inline_presets() {
        let store = InMemoryStore::new();
        let new = NewEndpoint {
            presets: vec![preset("success", true), preset("error", false)],
            ..endpoint(HttpMethod::GET, "/api/items")
        };
        let (created, presets) = store.create_endpoint(new).unwrap();
        assert_eq!(presets.len(), 2);
        assert!(presets.iter().all(|p| p.endpoint_id == created.id));
        assert_eq!(presets.iter().filter(|p| p.enabled).count(), 1);
    }

    #[test]
    fn test_update_endpoint_moves_route() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/old"))
            .unwrap();

        let updated = store
            .update_endpoint(
                created.id,
                EndpointPatch {
                    path: Some("/api/new".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.path, "/api/new");

        assert!(store
            .find_route(HttpMethod::GET, "/api/old")
            .unwrap()
            .is_none());
        assert!(store
            .find_route(HttpMethod::GET, "/api/new")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_update_endpoint_rejects_route_collision() {
        let store = InMemoryStore::new();
        store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/a"))
            .unwrap();
        let (second, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/b"))
            .unwrap();

        let err = store
            .update_endpoint(
                second.id,
                EndpointPatch {
                    path: Some("/api/a".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRoute { .. }));

        // A no-op update onto its own route is allowed.
        assert!(store
            .update_endpoint(
                second.id,
                EndpointPatch {
                    path: Some("/api/b".to_string()),
                    ..Default::default()
                },
            )
            .is_ok());
    }

    #[test]
    fn test_delete_endpoint_cascades() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let kept = store
            .insert_preset(created.id, preset("success", true))
            .unwrap();

        store.delete_endpoint(created.id).unwrap();
        assert!(store.get_endpoint(created.id).unwrap().is_none());
        assert!(store.get_preset(kept.id).unwrap().is_none());
        assert!(store
            .find_route(HttpMethod::GET, "/api/users")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_insert_enabled_preset_clears_siblings() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let first = store
            .insert_preset(created.id, preset("first", true))
            .unwrap();
        let second = store
            .insert_preset(created.id, preset("second", true))
            .unwrap();

        assert!(!store.get_preset(first.id).unwrap().unwrap().enabled);
        assert!(store.get_preset(second.id).unwrap().unwrap().enabled);
        assert_eq!(store.enabled_presets(created.id).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_disabled_preset_keeps_active() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let active = store
            .insert_preset(created.id, preset("active", true))
            .unwrap();
        store
            .insert_preset(created.id, preset("draft", false))
            .unwrap();

        let enabled = store.enabled_presets(created.id).unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, active.id);
    }

    #[test]
    fn test_update_preset_enable_swaps_active() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let first = store
            .insert_preset(created.id, preset("first", true))
            .unwrap();
        let second = store
            .insert_preset(created.id, preset("second", false))
            .unwrap();

        store
            .update_preset(
                second.id,
                PresetPatch {
                    enabled: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!store.get_preset(first.id).unwrap().unwrap().enabled);
        assert!(store.get_preset(second.id).unwrap().unwrap().enabled);
    }

    #[test]
    fn test_update_preset_fields() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let stored = store
            .insert_preset(created.id, preset("success", false))
            .unwrap();

        let updated = store
            .update_preset(
                stored.id,
                PresetPatch {
                    name: Some("renamed".to_string()),
                    status_code: Some(418),
                    response_data: Some(json!({"tea": true})),
                    filter_keys: Some(vec!["kind".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status_code, 418);
        assert_eq!(updated.response_data, json!({"tea": true}));
        assert_eq!(updated.filter_keys, vec!["kind".to_string()]);
        assert!(!updated.enabled);
    }

    #[test]
    fn test_set_active_swaps_atomically() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let first = store
            .insert_preset(created.id, preset("first", true))
            .unwrap();
        let second = store
            .insert_preset(created.id, preset("second", false))
            .unwrap();

        let activated = store.set_active(created.id, second.id).unwrap();
        assert!(activated.enabled);
        assert!(!store.get_preset(first.id).unwrap().unwrap().enabled);

        let enabled = store.enabled_presets(created.id).unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, second.id);
    }

    #[test]
    fn test_set_active_rejects_foreign_preset() {
        let store = InMemoryStore::new();
        let (a, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/a"))
            .unwrap();
        let (b, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/b"))
            .unwrap();
        let foreign = store.insert_preset(b.id, preset("other", false)).unwrap();

        let err = store.set_active(a.id, foreign.id).unwrap_err();
        assert!(matches!(err, StoreError::PresetNotFound(id) if id == foreign.id));
        // Nothing on endpoint b was touched.
        assert!(!store.get_preset(foreign.id).unwrap().unwrap().enabled);
    }

    #[test]
    fn test_set_active_unknown_preset() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let missing = Uuid::new_v4();
        let err = store.set_active(created.id, missing).unwrap_err();
        assert!(matches!(err, StoreError::PresetNotFound(id) if id == missing));
    }

    #[test]
    fn test_deactivate_all() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        store
            .insert_preset(created.id, preset("active", true))
            .unwrap();

        store.deactivate_all(created.id).unwrap();
        assert!(store.enabled_presets(created.id).unwrap().is_empty());

        let err = store.deactivate_all(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::EndpointNotFound(_)));
    }

    #[test]
    fn test_presets_for_endpoint_newest_first() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        store.insert_preset(created.id, preset("old", false)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.insert_preset(created.id, preset("new", false)).unwrap();

        let presets = store.presets_for_endpoint(created.id).unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name, "new");
        assert_eq!(presets[1].name, "old");

        let err = store.presets_for_endpoint(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::EndpointNotFound(_)));
    }

    #[test]
    fn test_apply_preset_batch_create_update_delete() {
        let store = InMemoryStore::new();
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let kept = store.insert_preset(created.id, preset("kept", true)).unwrap();
        let dropped = store
            .insert_preset(created.id, preset("dropped", false))
            .unwrap();

        let batch = vec![
            PresetUpsert {
                id: Some(kept.id),
                name: "kept-renamed".to_string(),
                enabled: false,
                status_code: 204,
                response_data: json!(null),
                filter_keys: Vec::new(),
            },
            PresetUpsert {
                id: None,
                name: "fresh".to_string(),
                enabled: true,
                status_code: 200,
                response_data: json!([1, 2]),
                filter_keys: vec!["id".to_string()],
            },
        ];
        let presets = store.apply_preset_batch(created.id, batch).unwrap();

        assert_eq!(presets.len(), 2);
        assert!(store.get_preset(dropped.id).unwrap().is_none());
        let renamed = store.get_preset(kept.id).unwrap().unwrap();
        assert_eq!(renamed.name, "kept-renamed");
        assert_eq!(renamed.status_code, 204);
        assert!(!renamed.enabled);

        let enabled = store.enabled_presets(created.id).unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "fresh");
    }

    #[test]
    fn test_apply_preset_batch_rejects_foreign_id() {
        let store = InMemoryStore::new();
        let (a, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/a"))
            .unwrap();
        let (b, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/b"))
            .unwrap();
        let survivor = store.insert_preset(a.id, preset("mine", true)).unwrap();
        let foreign = store.insert_preset(b.id, preset("other", false)).unwrap();

        let batch = vec![PresetUpsert {
            id: Some(foreign.id),
            name: "hijack".to_string(),
            enabled: true,
            status_code: 200,
            response_data: json!(null),
            filter_keys: Vec::new(),
        }];
        let err = store.apply_preset_batch(a.id, batch).unwrap_err();
        assert!(matches!(err, StoreError::PresetNotFound(_)));

        // The failed batch must not have deleted anything.
        assert!(store.get_preset(survivor.id).unwrap().is_some());
    }

    #[test]
    fn test_list_endpoints_search_and_methods() {
        let store = InMemoryStore::new();
        store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        store
            .create_endpoint(endpoint(HttpMethod::POST, "/api/users"))
            .unwrap();
        store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/orders"))
            .unwrap();

        let all = store.list_endpoints(&EndpointQuery::default()).unwrap();
        assert_eq!(all.len(), 3);

        let users = store
            .list_endpoints(&EndpointQuery {
                search: Some("USERS".to_string()),
                methods: Vec::new(),
            })
            .unwrap();
        assert_eq!(users.len(), 2);

        let get_only = store
            .list_endpoints(&EndpointQuery {
                search: None,
                methods: vec![HttpMethod::GET],
            })
            .unwrap();
        assert_eq!(get_only.len(), 2);

        let get_users = store
            .list_endpoints(&EndpointQuery {
                search: Some("users".to_string()),
                methods: vec![HttpMethod::GET],
            })
            .unwrap();
        assert_eq!(get_users.len(), 1);
    }

    #[test]
    fn test_active_routes_lists_only_enabled() {
        let store = InMemoryStore::new();
        let (served, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        store.insert_preset(served.id, preset("on", true)).unwrap();

        let (idle, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/orders"))
            .unwrap();
        store.insert_preset(idle.id, preset("off", false)).unwrap();

        let routes = store.active_routes().unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/api/users");
    }

    #[test]
    fn test_concurrent_set_active_converges() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let first = store
            .insert_preset(created.id, preset("first", true))
            .unwrap();
        let second = store
            .insert_preset(created.id, preset("second", false))
            .unwrap();

        let num_threads = 10;
        let flips_per_thread = 100;
        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let store_clone = Arc::clone(&store);
                let endpoint_id = created.id;
                let target = if thread_id % 2 == 0 { first.id } else { second.id };
                thread::spawn(move || {
                    for _ in 0..flips_per_thread {
                        store_clone.set_active(endpoint_id, target).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Whatever interleaving happened, exactly one preset is enabled.
        let enabled = store.enabled_presets(created.id).unwrap();
        assert_eq!(enabled.len(), 1);
        assert!(enabled[0].id == first.id || enabled[0].id == second.id);
    }

    #[test]
    fn test_readers_never_observe_two_enabled() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        let (created, _) = store
            .create_endpoint(endpoint(HttpMethod::GET, "/api/users"))
            .unwrap();
        let first = store
            .insert_preset(created.id, preset("first", true))
            .unwrap();
        let second = store
            .insert_preset(created.id, preset("second", false))
            .unwrap();

        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store_clone = Arc::clone(&store);
            let done = Arc::clone(&done);
            let endpoint_id = created.id;
            thread::spawn(move || {
                for i in 0..500 {
                    let target = if i % 2 == 0 { second.id } else { first.id };
                    store_clone.set_active(endpoint_id, target).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store_clone = Arc::clone(&store);
                let done = Arc::clone(&done);
                let endpoint_id = created.id;
                thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        let enabled = store_clone.enabled_presets(endpoint_id).unwrap();
                        assert!(
                            enabled.len() <= 1,
                            "observed {} enabled presets mid-toggle",
                            enabled.len()
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(store.enabled_presets(created.id).unwrap().len(), 1);
    }
}
