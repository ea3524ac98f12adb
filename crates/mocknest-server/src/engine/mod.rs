//! The mock response resolution engine.
//!
//! One entry point, [`ResolutionEngine::resolve`]: find the endpoint for
//! (method, path), pick its single active preset, narrow the preset payload
//! by the request query, and hand back a status/body pair. The engine only
//! reads; every write goes through the admin API and the store.

pub mod filter;
mod resolver;
mod selector;

pub use resolver::EndpointResolver;
pub use selector::PresetSelector;

use crate::model::{HttpMethod, Preset};
use crate::store::{EndpointStore, PresetStore, StoreError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Why a request could not be served with preset data.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("No mock endpoint is registered for {method} {path}")]
    EndpointNotFound { method: HttpMethod, path: String },
    #[error("No preset is enabled for {method} {path}")]
    NoActivePreset { method: HttpMethod, path: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolutionError {
    /// The HTTP status this outcome maps to.
    pub fn status(&self) -> u16 {
        match self {
            ResolutionError::EndpointNotFound { .. } => 404,
            ResolutionError::NoActivePreset { .. } => 500,
            ResolutionError::Store(_) => 500,
        }
    }

    /// The `{error, message}` body served for this outcome.
    pub fn body(&self) -> serde_json::Value {
        let error = match self {
            ResolutionError::EndpointNotFound { .. } => "Endpoint not found",
            ResolutionError::NoActivePreset { .. } => "No active preset",
            ResolutionError::Store(_) => "Internal error",
        };
        json!({ "error": error, "message": self.to_string() })
    }

    /// Label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            ResolutionError::EndpointNotFound { .. } => "endpoint_not_found",
            ResolutionError::NoActivePreset { .. } => "no_active_preset",
            ResolutionError::Store(_) => "store_error",
        }
    }
}

/// A successfully resolved mock response.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub status: u16,
    pub body: serde_json::Value,
    /// Which preset answered, for response headers and logging.
    pub preset_id: Uuid,
    pub preset_name: String,
}

/// Orchestrates resolver, selector, and filter into one read-only pipeline.
pub struct ResolutionEngine {
    resolver: EndpointResolver,
    selector: PresetSelector,
}

impl ResolutionEngine {
    pub fn new(endpoints: Arc<dyn EndpointStore>, presets: Arc<dyn PresetStore>) -> Self {
        Self {
            resolver: EndpointResolver::new(endpoints),
            selector: PresetSelector::new(presets),
        }
    }

    /// Resolve one incoming request into a status/body pair.
    ///
    /// The filter runs only when the active preset declares filter keys AND
    /// the request carries at least one query parameter; otherwise the
    /// stored payload is served verbatim.
    pub fn resolve(
        &self,
        method: HttpMethod,
        path: &str,
        query: &HashMap<String, String>,
    ) -> Result<Resolved, ResolutionError> {
        let endpoint = self.resolver.find_endpoint(method, path)?.ok_or_else(|| {
            ResolutionError::EndpointNotFound {
                method,
                path: path.to_string(),
            }
        })?;

        let preset = self.selector.active_preset(endpoint.id)?.ok_or_else(|| {
            ResolutionError::NoActivePreset {
                method,
                path: path.to_string(),
            }
        })?;

        let Preset {
            id: preset_id,
            name: preset_name,
            status_code,
            response_data,
            filter_keys,
            ..
        } = preset;

        let body = if !filter_keys.is_empty() && !query.is_empty() {
            filter::filter_response_data(response_data, &filter_keys, query)
        } else {
            response_data
        };

        debug!(
            %method,
            path,
            preset = %preset_name,
            status = status_code,
            "Resolved mock response"
        );

        Ok(Resolved {
            status: status_code,
            body,
            preset_id,
            preset_name,
        })
    }
}
