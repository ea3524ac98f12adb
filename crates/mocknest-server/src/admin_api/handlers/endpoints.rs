//! Endpoint CRUD handlers.

use crate::admin_api::server::AdminState;
use crate::admin_api::types::*;
use crate::model::{validate_preset_batch, Endpoint, NewEndpoint, Preset};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn endpoint_detail(endpoint: Endpoint, presets: Vec<Preset>, base_url: &str) -> EndpointDetail {
    let links = make_endpoint_links(base_url, endpoint.id);
    EndpointDetail {
        endpoint,
        presets,
        links,
    }
}

/// GET /endpoints - List endpoints with presets embedded
pub async fn handle_list(
    state: Arc<AdminState>,
    query: Option<&str>,
    base_url: &str,
) -> Response<Full<Bytes>> {
    let params = match parse_list_query(query) {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let endpoints = match state.endpoints.list_endpoints(&params) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };

    let details: Vec<EndpointDetail> = endpoints
        .into_iter()
        .map(|endpoint| {
            // An endpoint deleted between the list and this read serializes
            // with an empty preset list.
            let presets = state
                .presets
                .presets_for_endpoint(endpoint.id)
                .unwrap_or_default();
            endpoint_detail(endpoint, presets, base_url)
        })
        .collect();

    json_response(StatusCode::OK, &ListEndpointsResponse { endpoints: details })
}

/// POST /endpoints - Create an endpoint, optionally with inline presets
pub async fn handle_create(
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let new: NewEndpoint = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid endpoint JSON: {e}"),
            )
        }
    };

    if let Err(e) = new.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    match state.endpoints.create_endpoint(new) {
        Ok((endpoint, presets)) => {
            info!("Created endpoint {} {}", endpoint.method, endpoint.path);
            json_response(
                StatusCode::CREATED,
                &endpoint_detail(endpoint, presets, base_url),
            )
        }
        Err(e) => store_error_response(&e),
    }
}

/// GET /endpoints/:id - Fetch one endpoint with presets
pub async fn handle_get(
    id: Uuid,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let endpoint = match state.endpoints.get_endpoint(id) {
        Ok(Some(e)) => e,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, &format!("Endpoint {id} not found"))
        }
        Err(e) => return store_error_response(&e),
    };

    let presets = state.presets.presets_for_endpoint(id).unwrap_or_default();
    json_response(StatusCode::OK, &endpoint_detail(endpoint, presets, base_url))
}

/// PUT /endpoints/:id - Patch endpoint fields and optionally apply a preset
/// batch edit
pub async fn handle_update(
    id: Uuid,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let payload: UpdateEndpointRequest = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid endpoint JSON: {e}"),
            )
        }
    };

    if let Err(e) = payload.endpoint.validate() {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }
    if let Some(batch) = &payload.presets {
        if let Err(e) = validate_preset_batch(batch) {
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    }

    let mut endpoint = match state.endpoints.update_endpoint(id, payload.endpoint) {
        Ok(e) => e,
        Err(e) => return store_error_response(&e),
    };

    let presets = match payload.presets {
        Some(batch) => match state.presets.apply_preset_batch(id, batch) {
            Ok(presets) => {
                // The batch touches the endpoint's updatedAt, re-read it so
                // the response reflects the final state.
                if let Ok(Some(refreshed)) = state.endpoints.get_endpoint(id) {
                    endpoint = refreshed;
                }
                presets
            }
            Err(e) => return store_error_response(&e),
        },
        None => state.presets.presets_for_endpoint(id).unwrap_or_default(),
    };

    info!("Updated endpoint {} {}", endpoint.method, endpoint.path);
    json_response(StatusCode::OK, &endpoint_detail(endpoint, presets, base_url))
}

/// DELETE /endpoints/:id - Delete an endpoint and cascade to its presets
pub async fn handle_delete(id: Uuid, state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.endpoints.delete_endpoint(id) {
        Ok(endpoint) => {
            info!("Deleted endpoint {} {}", endpoint.method, endpoint.path);
            json_response(StatusCode::OK, &endpoint)
        }
        Err(e) => store_error_response(&e),
    }
}

/// GET /routes - Catalogue of routes that currently serve a preset
pub async fn handle_routes(state: Arc<AdminState>) -> Response<Full<Bytes>> {
    match state.endpoints.active_routes() {
        Ok(endpoints) => {
            let routes: Vec<RouteInfo> = endpoints
                .into_iter()
                .map(|e| RouteInfo {
                    method: e.method,
                    path: e.path,
                    endpoint_id: e.id,
                })
                .collect();
            json_response(StatusCode::OK, &ListRoutesResponse { routes })
        }
        Err(e) => store_error_response(&e),
    }
}
