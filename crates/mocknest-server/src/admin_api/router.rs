//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{endpoints, presets, system};
use crate::admin_api::server::AdminState;
use crate::admin_api::types::{error_response, get_base_url, not_found};
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Parsed route for endpoint-specific paths
enum EndpointRoute {
    /// GET/PUT/DELETE /endpoints/:id
    Root,
    /// GET/POST /endpoints/:id/presets
    Presets,
    /// POST /endpoints/:id/presets/deactivate
    DeactivateAll,
    /// POST /endpoints/:id/presets/:presetId/activate
    Activate(Uuid),
}

impl EndpointRoute {
    /// Parse route from path segments after `/endpoints/:id`
    fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            [] => Some(EndpointRoute::Root),
            ["presets"] => Some(EndpointRoute::Presets),
            ["presets", "deactivate"] => Some(EndpointRoute::DeactivateAll),
            ["presets", preset_id, "activate"] => {
                preset_id.parse().ok().map(EndpointRoute::Activate)
            }
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: Arc<AdminState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());
    let base_url = get_base_url(&req);

    debug!("Admin API: {} {}", method, path);

    let response = route_by_path(&method, &path, query.as_deref(), req, &base_url, state).await;
    metrics::record_admin_request(method.as_str(), response.status().as_u16());
    Ok(response)
}

/// Route based on path
async fn route_by_path(
    method: &Method,
    path: &str,
    query: Option<&str>,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    // Fast path for common routes
    match (method, path) {
        (&Method::GET, "/") => return system::handle_root(base_url),
        (&Method::GET, "/health") => return system::handle_health(),
        (&Method::GET, "/metrics") => return system::handle_metrics(),
        (&Method::GET, "/routes") => return endpoints::handle_routes(state).await,
        _ => {}
    }

    // Endpoint collection routes
    if path == "/endpoints" {
        return match *method {
            Method::GET => endpoints::handle_list(state, query, base_url).await,
            Method::POST => endpoints::handle_create(req, base_url, state).await,
            _ => not_found(),
        };
    }

    // Individual endpoint routes
    if let Some(rest) = path.strip_prefix("/endpoints/") {
        return route_endpoint(method, rest, req, base_url, state).await;
    }

    // Preset collection route (query-parameter form)
    if path == "/presets" {
        return match *method {
            Method::GET => presets::handle_list_by_query(query, state).await,
            _ => not_found(),
        };
    }

    // Individual preset routes
    if let Some(rest) = path.strip_prefix("/presets/") {
        let segments: Vec<&str> = rest.split('/').collect();
        return match segments.as_slice() {
            [id_str] => {
                let preset_id: Uuid = match id_str.parse() {
                    Ok(id) => id,
                    Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid preset id"),
                };
                match *method {
                    Method::PUT => presets::handle_update(preset_id, req, state).await,
                    Method::DELETE => presets::handle_delete(preset_id, state).await,
                    _ => not_found(),
                }
            }
            _ => not_found(),
        };
    }

    not_found()
}

/// Route endpoint-specific requests
async fn route_endpoint(
    method: &Method,
    path: &str,
    req: Request<Incoming>,
    base_url: &str,
    state: Arc<AdminState>,
) -> Response<Full<Bytes>> {
    let segments: Vec<&str> = path.split('/').collect();

    if segments.is_empty() {
        return not_found();
    }

    let endpoint_id: Uuid = match segments[0].parse() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid endpoint id"),
    };

    let route = match EndpointRoute::parse(&segments[1..]) {
        Some(r) => r,
        None => return not_found(),
    };

    match (method, route) {
        // /endpoints/:id
        (&Method::GET, EndpointRoute::Root) => {
            endpoints::handle_get(endpoint_id, base_url, state).await
        }
        (&Method::PUT, EndpointRoute::Root) => {
            endpoints::handle_update(endpoint_id, req, base_url, state).await
        }
        (&Method::DELETE, EndpointRoute::Root) => {
            endpoints::handle_delete(endpoint_id, state).await
        }

        // /endpoints/:id/presets
        (&Method::GET, EndpointRoute::Presets) => {
            presets::handle_list_for_endpoint(endpoint_id, state).await
        }
        (&Method::POST, EndpointRoute::Presets) => {
            presets::handle_create(endpoint_id, req, state).await
        }

        // /endpoints/:id/presets/deactivate
        (&Method::POST, EndpointRoute::DeactivateAll) => {
            presets::handle_deactivate_all(endpoint_id, state).await
        }

        // /endpoints/:id/presets/:presetId/activate
        (&Method::POST, EndpointRoute::Activate(preset_id)) => {
            presets::handle_activate(endpoint_id, preset_id, state).await
        }

        _ => not_found(),
    }
}
