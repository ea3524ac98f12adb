//! Request handling for the mock-serving listener.
//!
//! Every request, whatever its path, flows through the resolution engine.
//! This module only translates between HTTP and the engine's types: it never
//! decides which preset answers or how payloads are filtered.

use crate::admin_api::types::build_response_with_headers;
use crate::engine::{Resolved, ResolutionEngine, ResolutionError};
use crate::metrics;
use crate::model::HttpMethod;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Handle a request to the mock listener
pub async fn handle_mock_request(
    req: Request<Incoming>,
    engine: Arc<ResolutionEngine>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method_token = req.method().as_str().to_string();
    let uri = req.uri().clone();
    let path = uri.path().to_string();
    let query = parse_query_string(uri.query().unwrap_or(""));
    // HEAD answers with status and headers only; the body is dropped at this
    // boundary, never inside the engine.
    let suppress_body = req.method() == hyper::Method::HEAD;

    let method = match HttpMethod::parse(&method_token) {
        Some(m) => m,
        None => {
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            metrics::record_mock_request(&method_token, "method_not_allowed", duration_ms);
            debug!("Mock request with unsupported method {}", method_token);
            return Ok(method_not_allowed_response(&method_token));
        }
    };

    let response = match engine.resolve(method, &path, &query) {
        Ok(resolved) => {
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            metrics::record_mock_request(method.as_str(), "served", duration_ms);
            debug!(
                "Mock hit: {} {} -> preset '{}' ({})",
                method, path, resolved.preset_name, resolved.status
            );
            resolved_response(&resolved, suppress_body)
        }
        Err(err) => {
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            metrics::record_mock_request(method.as_str(), err.outcome(), duration_ms);
            debug!("Mock miss: {} {} -> {}", method, path, err);
            error_mock_response(&err, suppress_body)
        }
    };

    Ok(response)
}

/// Parse a raw query string into a flat map. Repeated keys keep the last
/// value; pairs without '=' are dropped.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            // URL-decode both key and value to handle encoded characters like %2C -> ,
            let decoded_key = urlencoding::decode(key).unwrap_or_default().into_owned();
            let decoded_value = urlencoding::decode(value).unwrap_or_default().into_owned();
            Some((decoded_key, decoded_value))
        })
        .collect()
}

fn resolved_response(resolved: &Resolved, suppress_body: bool) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(resolved.status).unwrap_or(StatusCode::OK);
    let preset_header = resolved.preset_id.to_string();
    let body = if suppress_body {
        Bytes::new()
    } else {
        Bytes::from(serde_json::to_string(&resolved.body).unwrap_or_else(|_| "null".to_string()))
    };
    build_response_with_headers(
        status,
        [
            ("Content-Type", "application/json"),
            ("x-mocknest-mock", "true"),
            ("x-mocknest-preset", preset_header.as_str()),
        ],
        body,
    )
}

fn error_mock_response(err: &ResolutionError, suppress_body: bool) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if suppress_body {
        Bytes::new()
    } else {
        Bytes::from(serde_json::to_string(&err.body()).unwrap_or_else(|_| "{}".to_string()))
    };
    build_response_with_headers(
        status,
        [
            ("Content-Type", "application/json"),
            ("x-mocknest-mock", "true"),
        ],
        body,
    )
}

fn method_not_allowed_response(method_token: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Method not allowed",
        "message": format!("{method_token} is not a mockable method"),
    });
    build_response_with_headers(
        StatusCode::METHOD_NOT_ALLOWED,
        [
            ("Content-Type", "application/json"),
            ("x-mocknest-mock", "true"),
        ],
        serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string()),
    )
}
