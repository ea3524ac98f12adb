//! Response types and helpers for the Admin API.

use crate::model::{Endpoint, EndpointPatch, HttpMethod, Preset, PresetUpsert};
use crate::store::{EndpointQuery, StoreError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HATEOAS link structure
#[derive(Debug, Serialize, Clone)]
pub struct Link {
    pub href: String,
}

/// HATEOAS links for endpoint resources
#[derive(Debug, Serialize, Clone)]
pub struct EndpointLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub presets: Link,
}

/// An endpoint with its presets embedded, as returned by every endpoint
/// read/write route.
#[derive(Debug, Serialize)]
pub struct EndpointDetail {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    pub presets: Vec<Preset>,
    #[serde(rename = "_links")]
    pub links: EndpointLinks,
}

/// Response for listing endpoints
#[derive(Debug, Serialize)]
pub struct ListEndpointsResponse {
    pub endpoints: Vec<EndpointDetail>,
}

/// Response for listing an endpoint's presets
#[derive(Debug, Serialize)]
pub struct ListPresetsResponse {
    pub presets: Vec<Preset>,
}

/// One servable route: an endpoint that currently has an enabled preset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub method: HttpMethod,
    pub path: String,
    pub endpoint_id: Uuid,
}

/// Response for the servable-route catalogue
#[derive(Debug, Serialize)]
pub struct ListRoutesResponse {
    pub routes: Vec<RouteInfo>,
}

/// Request body for `PUT /endpoints/{id}`.
///
/// Endpoint fields are patched in place. When `presets` is present it is a
/// full batch edit: entries with ids update, entries without ids create, and
/// stored presets missing from the batch are deleted. An absent `presets`
/// key leaves the presets untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateEndpointRequest {
    #[serde(flatten)]
    pub endpoint: EndpointPatch,
    #[serde(default)]
    pub presets: Option<Vec<PresetUpsert>>,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// =============================================================================
// Query parameter parsing
// =============================================================================

/// Parse the `search` and `methods` filters of `GET /endpoints`.
pub fn parse_list_query(query: Option<&str>) -> Result<EndpointQuery, String> {
    let mut params = EndpointQuery::default();
    let q = match query {
        Some(q) => q,
        None => return Ok(params),
    };
    for pair in q.split('&').filter(|s| !s.is_empty()) {
        if let Some((key, value)) = pair.split_once('=') {
            match key {
                "search" => {
                    let decoded = urlencoding::decode(value).unwrap_or_default().into_owned();
                    if !decoded.is_empty() {
                        params.search = Some(decoded);
                    }
                }
                "methods" => {
                    for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                        match HttpMethod::parse(token) {
                            Some(method) => params.methods.push(method),
                            None => {
                                return Err(format!("Unknown method in methods filter: {token}"))
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(params)
}

/// Extract the mandatory `endpointId` parameter of `GET /presets`.
pub fn parse_endpoint_id_param(query: Option<&str>) -> Result<Uuid, String> {
    if let Some(q) = query {
        for pair in q.split('&').filter(|s| !s.is_empty()) {
            if let Some((key, value)) = pair.split_once('=') {
                if key == "endpointId" {
                    return Uuid::parse_str(value)
                        .map_err(|_| format!("Invalid endpointId: {value}"));
                }
            }
        }
    }
    Err("Missing required query parameter: endpointId".to_string())
}

// =============================================================================
// Helper functions for generating HATEOAS links
// =============================================================================

/// Extract base URL from request headers for HATEOAS links
pub fn get_base_url(req: &Request<Incoming>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:4545".to_string()
}

/// Generate HATEOAS links for an endpoint
pub fn make_endpoint_links(base_url: &str, id: Uuid) -> EndpointLinks {
    EndpointLinks {
        self_link: Link {
            href: format!("{}/endpoints/{}", base_url, id),
        },
        presets: Link {
            href: format!("{}/endpoints/{}/presets", base_url, id),
        },
    }
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
///
/// This function handles the unlikely case where Response::builder() fails
/// by returning a minimal 500 error response.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Map a store error onto the admin status space: missing resources are 404,
/// route collisions are 409.
pub fn store_error_response(err: &StoreError) -> Response<Full<Bytes>> {
    let status = match err {
        StoreError::EndpointNotFound(_) | StoreError::PresetNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::DuplicateRoute { .. } => StatusCode::CONFLICT,
    };
    error_response(status, &err.to_string())
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    use http_body_util::BodyExt;
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}
