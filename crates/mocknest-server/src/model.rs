//! Domain types shared by the store, the resolution engine, and both HTTP
//! surfaces: endpoints, presets, and the payloads that create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// HTTP methods a mock endpoint can be registered under.
///
/// Matching is case-sensitive: `get /x` does not resolve an endpoint
/// registered as `GET /x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    /// Parse an exact method token. No case-folding.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered (method, path) pair the mock server answers for.
///
/// The pair is unique across the store. Endpoints are created and edited by
/// the admin API; the resolution engine only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: Uuid,
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named canned response belonging to one endpoint.
///
/// At most one preset per endpoint has `enabled = true` at any observable
/// instant; the store's write path upholds this, never a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub status_code: u16,
    pub response_data: serde_json::Value,
    pub filter_keys: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Input payloads (admin API requests and seed files)
// ============================================================================

pub(crate) fn default_status_code() -> u16 {
    200
}

/// Deserialize a status code from a number or a numeric string, rejecting
/// anything outside the 100-599 range up front.
pub(crate) fn deserialize_status_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    let code = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| D::Error::custom("invalid status code number"))?,
        serde_json::Value::String(s) => s
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}")))?,
        _ => return Err(D::Error::custom("statusCode must be a number or string")),
    };
    if !(100..=599).contains(&code) {
        return Err(D::Error::custom(format!(
            "statusCode {code} is outside the 100-599 range"
        )));
    }
    Ok(code)
}

fn deserialize_opt_status_code<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_status_code(deserializer).map(Some)
}

/// Payload that creates a preset, either inline with an endpoint or via
/// `POST /endpoints/{id}/presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPreset {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(
        default = "default_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status_code: u16,
    #[serde(default)]
    pub response_data: serde_json::Value,
    #[serde(default)]
    pub filter_keys: Vec<String>,
}

/// Payload that creates an endpoint, optionally with inline presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEndpoint {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub presets: Vec<NewPreset>,
}

/// Endpoint fields an update may change. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPatch {
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Preset fields an update may change. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_opt_status_code")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_data: Option<serde_json::Value>,
    #[serde(default)]
    pub filter_keys: Option<Vec<String>>,
}

/// One entry of a batch preset edit (`PUT /endpoints/{id}` with `presets`).
///
/// An entry with an id updates that stored preset; one without an id creates
/// a new preset. Stored presets absent from the batch are deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetUpsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(
        default = "default_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status_code: u16,
    #[serde(default)]
    pub response_data: serde_json::Value,
    #[serde(default)]
    pub filter_keys: Vec<String>,
}

// ============================================================================
// Input validation
// ============================================================================

/// Rejections raised before anything touches the store.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Endpoint path must start with '/'")]
    PathMissingSlash,
    #[error("Preset name must not be empty")]
    EmptyPresetName,
    #[error("At most one preset may be enabled per endpoint, payload enables {0}")]
    MultipleEnabled(usize),
}

pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') {
        return Err(ValidationError::PathMissingSlash);
    }
    Ok(())
}

pub fn validate_preset_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyPresetName);
    }
    Ok(())
}

impl NewPreset {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_preset_name(&self.name)
    }
}

impl NewEndpoint {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_path(&self.path)?;
        for preset in &self.presets {
            preset.validate()?;
        }
        let enabled = self.presets.iter().filter(|p| p.enabled).count();
        if enabled > 1 {
            return Err(ValidationError::MultipleEnabled(enabled));
        }
        Ok(())
    }
}

impl EndpointPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.path {
            validate_path(path)?;
        }
        Ok(())
    }
}

impl PresetPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_preset_name(name)?;
        }
        Ok(())
    }
}

/// Validate a whole batch edit: every entry well-formed, at most one enabled.
pub fn validate_preset_batch(items: &[PresetUpsert]) -> Result<(), ValidationError> {
    for item in items {
        validate_preset_name(&item.name)?;
    }
    let enabled = items.iter().filter(|p| p.enabled).count();
    if enabled > 1 {
        return Err(ValidationError::MultipleEnabled(enabled));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parse_is_case_sensitive() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::parse("get"), None);
        assert_eq!(HttpMethod::parse("FETCH"), None);
        assert_eq!(HttpMethod::parse(""), None);
    }

    #[test]
    fn test_method_roundtrips_through_serde() {
        for method in HttpMethod::ALL {
            let encoded = serde_json::to_string(&method).unwrap();
            assert_eq!(encoded, format!("\"{}\"", method.as_str()));
            let decoded: HttpMethod = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, method);
        }
    }

    #[test]
    fn test_new_preset_defaults() {
        let preset: NewPreset = serde_json::from_value(json!({"name": "empty"})).unwrap();
        assert!(!preset.enabled);
        assert_eq!(preset.status_code, 200);
        assert_eq!(preset.response_data, serde_json::Value::Null);
        assert!(preset.filter_keys.is_empty());
    }

    #[test]
    fn test_status_code_accepts_number_or_string() {
        let preset: NewPreset =
            serde_json::from_value(json!({"name": "a", "statusCode": 404})).unwrap();
        assert_eq!(preset.status_code, 404);

        let preset: NewPreset =
            serde_json::from_value(json!({"name": "a", "statusCode": "503"})).unwrap();
        assert_eq!(preset.status_code, 503);
    }

    #[test]
    fn test_status_code_range_is_enforced() {
        for bad in [0, 99, 600, 1000] {
            let result: Result<NewPreset, _> =
                serde_json::from_value(json!({"name": "a", "statusCode": bad}));
            assert!(result.is_err(), "statusCode {bad} should be rejected");
        }
        let result: Result<NewPreset, _> =
            serde_json::from_value(json!({"name": "a", "statusCode": true}));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_status_code_validated_when_present() {
        let patch: PresetPatch = serde_json::from_value(json!({"statusCode": 201})).unwrap();
        assert_eq!(patch.status_code, Some(201));

        let result: Result<PresetPatch, _> = serde_json::from_value(json!({"statusCode": 42}));
        assert!(result.is_err());

        let patch: PresetPatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(patch.status_code, None);
    }

    #[test]
    fn test_new_endpoint_rejects_bad_path() {
        let endpoint: NewEndpoint =
            serde_json::from_value(json!({"method": "GET", "path": "api/users"})).unwrap();
        assert!(matches!(
            endpoint.validate(),
            Err(ValidationError::PathMissingSlash)
        ));
    }

    #[test]
    fn test_new_endpoint_rejects_two_enabled_presets() {
        let endpoint: NewEndpoint = serde_json::from_value(json!({
            "method": "GET",
            "path": "/api/users",
            "presets": [
                {"name": "a", "enabled": true},
                {"name": "b", "enabled": true},
            ]
        }))
        .unwrap();
        assert!(matches!(
            endpoint.validate(),
            Err(ValidationError::MultipleEnabled(2))
        ));
    }

    #[test]
    fn test_new_endpoint_accepts_one_enabled_preset() {
        let endpoint: NewEndpoint = serde_json::from_value(json!({
            "method": "POST",
            "path": "/api/orders",
            "description": "order intake",
            "presets": [
                {"name": "created", "enabled": true, "statusCode": 201},
                {"name": "rejected", "statusCode": 422},
            ]
        }))
        .unwrap();
        assert!(endpoint.validate().is_ok());
    }

    #[test]
    fn test_blank_preset_name_is_rejected() {
        let preset: NewPreset = serde_json::from_value(json!({"name": "   "})).unwrap();
        assert!(matches!(
            preset.validate(),
            Err(ValidationError::EmptyPresetName)
        ));
    }

    #[test]
    fn test_preset_serializes_camel_case() {
        let preset = Preset {
            id: Uuid::nil(),
            endpoint_id: Uuid::nil(),
            name: "success".to_string(),
            enabled: true,
            status_code: 200,
            response_data: json!([1, 2, 3]),
            filter_keys: vec!["category".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&preset).unwrap();
        assert!(value.get("endpointId").is_some());
        assert!(value.get("statusCode").is_some());
        assert!(value.get("filterKeys").is_some());
        assert!(value.get("endpoint_id").is_none());
    }

    #[test]
    fn test_preset_batch_validation() {
        let items: Vec<PresetUpsert> = serde_json::from_value(json!([
            {"name": "a", "enabled": true},
            {"name": "b"},
        ]))
        .unwrap();
        assert!(validate_preset_batch(&items).is_ok());

        let items: Vec<PresetUpsert> = serde_json::from_value(json!([
            {"name": "a", "enabled": true},
            {"name": "b", "enabled": true},
        ]))
        .unwrap();
        assert!(matches!(
            validate_preset_batch(&items),
            Err(ValidationError::MultipleEnabled(2))
        ));
    }
}
