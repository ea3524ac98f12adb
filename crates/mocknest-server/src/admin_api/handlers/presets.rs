//! Preset CRUD and activation handlers.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::model::{NewPreset, PresetPatch};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// GET /endpoints/:id/presets - List an endpoint's presets newest-first
pub async fn handle_list_for_endpoint(
    endpoint_id: Uuid,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    match state.presets.presets_for_endpoint(endpoint_id) {
        Ok(presets) => json_response(StatusCode::OK, &ListPresetsResponse { presets }),
        Err(e) => store_error_response(&e),
    }
}

/// GET /presets?endpointId=:id - Query-parameter form of the preset listing
pub async fn handle_list_by_query(
    query: Option<&str>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    match parse_endpoint_id_param(query) {
        Ok(endpoint_id) => handle_list_for_endpoint(endpoint_id, state).await,
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
    }
}

/// POST /endpoints/:id/presets - Add a preset to an endpoint
pub async fn handle_create(
    endpoint_id: Uuid,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let new: NewPreset = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid preset JSON: {e}"))
        }
    };

    if let Err(e) = new.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    match state.presets.insert_preset(endpoint_id, new) {
        Ok(preset) => {
            info!(
                "Created preset '{}' for endpoint {} (enabled: {})",
                preset.name, endpoint_id, preset.enabled
            );
            json_response(StatusCode::CREATED, &preset)
        }
        Err(e) => store_error_response(&e),
    }
}

/// PUT /presets/:id - Patch a preset
pub async fn handle_update(
    preset_id: Uuid,
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let patch: PresetPatch = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid preset JSON: {e}"))
        }
    };

    if let Err(e) = patch.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    match state.presets.update_preset(preset_id, patch) {
        Ok(preset) => json_response(StatusCode::OK, &preset),
        Err(e) => store_error_response(&e),
    }
}

/// DELETE /presets/:id - Remove a preset
pub async fn handle_delete(preset_id: Uuid, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.presets.delete_preset(preset_id) {
        Ok(preset) => {
            info!("Deleted preset '{}' ({})", preset.name, preset.id);
            json_response(StatusCode::OK, &preset)
        }
        Err(e) => store_error_response(&e),
    }
}

/// POST /endpoints/:id/presets/:presetId/activate - Make one preset the
/// active responder, deactivating its siblings in the same write
pub async fn handle_activate(
    endpoint_id: Uuid,
    preset_id: Uuid,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    match state.selector.set_active(endpoint_id, preset_id) {
        Ok(preset) => {
            info!(
                "Activated preset '{}' for endpoint {}",
                preset.name, endpoint_id
            );
            json_response(StatusCode::OK, &preset)
        }
        Err(e) => store_error_response(&e),
    }
}

/// POST /endpoints/:id/presets/deactivate - Disable every preset of the
/// endpoint
pub async fn handle_deactivate_all(
    endpoint_id: Uuid,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    if let Err(e) = state.selector.deactivate_all(endpoint_id) {
        return store_error_response(&e);
    }
    info!("Deactivated all presets for endpoint {}", endpoint_id);
    match state.presets.presets_for_endpoint(endpoint_id) {
        Ok(presets) => json_response(StatusCode::OK, &ListPresetsResponse { presets }),
        Err(e) => store_error_response(&e),
    }
}
