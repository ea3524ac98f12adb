//! System handlers: service info, health, metrics.

use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET / - Service info with navigation links
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "name": "mocknest",
        "version": env!("CARGO_PKG_VERSION"),
        "_links": {
            "endpoints": {"href": format!("{}/endpoints", base_url)},
            "routes": {"href": format!("{}/routes", base_url)},
            "health": {"href": format!("{}/health", base_url)},
            "metrics": {"href": format!("{}/metrics", base_url)}
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}
