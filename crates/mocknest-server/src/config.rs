//! Configuration and seed-file types for mocknest-server.

use crate::model::NewEndpoint;
use crate::store::EndpointStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_admin_port() -> u16 {
    4545
}

fn default_mock_port() -> u16 {
    4546
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend name. Only "memory" today.
    pub backend: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Address both listeners bind on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of the admin API listener.
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// Port of the mock-serving listener.
    #[serde(default = "default_mock_port")]
    pub mock_port: u16,

    #[serde(default)]
    pub store: StoreConfig,

    /// Optional seed file loaded into the store at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,

    /// Optional tracing filter, e.g. "info" or "mocknest_server=debug".
    /// RUST_LOG takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            admin_port: default_admin_port(),
            mock_port: default_mock_port(),
            store: StoreConfig::default(),
            seed: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin_port == 0 || self.mock_port == 0 {
            anyhow::bail!("Listener ports must be non-zero");
        }
        if self.admin_port == self.mock_port {
            anyhow::bail!(
                "Admin and mock listeners must use different ports, both are {}",
                self.admin_port
            );
        }
        Ok(())
    }
}

/// A seed document: endpoints with inline presets, loaded at startup so a
/// fully canned server can run from a single file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeedFile {
    #[serde(default)]
    pub endpoints: Vec<NewEndpoint>,
}

impl SeedFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(&path)?;
        let seed: SeedFile = serde_yaml::from_str(&contents)?;
        Ok(seed)
    }

    /// Push every seeded endpoint through the same validation and store path
    /// the admin API uses. Returns the number of endpoints created.
    pub fn apply(&self, store: &dyn EndpointStore) -> Result<usize, anyhow::Error> {
        use anyhow::Context;

        for endpoint in &self.endpoints {
            endpoint.validate().with_context(|| {
                format!(
                    "Invalid seed endpoint {} {}",
                    endpoint.method, endpoint.path
                )
            })?;
        }
        for endpoint in &self.endpoints {
            store.create_endpoint(endpoint.clone()).with_context(|| {
                format!(
                    "Could not seed endpoint {} {}",
                    endpoint.method, endpoint.path
                )
            })?;
        }
        Ok(self.endpoints.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use crate::store::InMemoryStore;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.admin_port, 4545);
        assert_eq!(config.mock_port, 4546);
        assert_eq!(config.store.backend, "memory");
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_parses() {
        let yaml = r#"
host: 0.0.0.0
admin_port: 9100
mock_port: 9101
store:
  backend: memory
seed: ./seed.yaml
log_filter: "mocknest_server=debug"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.admin_port, 9100);
        assert_eq!(config.mock_port, 9101);
        assert_eq!(config.seed, Some(PathBuf::from("./seed.yaml")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_equal_ports_rejected() {
        let yaml = "admin_port: 7000\nmock_port: 7000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("different ports"));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin_port: 8100\nmock_port: 8101").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.admin_port, 8100);
        assert_eq!(config.mock_port, 8101);
    }

    #[test]
    fn test_seed_file_parses_and_applies() {
        let yaml = r#"
endpoints:
  - method: GET
    path: /api/users
    description: user listing
    presets:
      - name: success
        enabled: true
        statusCode: 200
        responseData:
          - id: 1
            name: alice
        filterKeys: [name]
      - name: empty
        statusCode: 200
        responseData: []
  - method: POST
    path: /api/users
    presets:
      - name: created
        enabled: true
        statusCode: 201
        responseData:
          ok: true
"#;
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.endpoints.len(), 2);
        assert_eq!(seed.endpoints[0].presets.len(), 2);
        assert_eq!(seed.endpoints[0].presets[0].status_code, 200);

        let store = InMemoryStore::new();
        let created = seed.apply(&store).unwrap();
        assert_eq!(created, 2);
        assert!(store
            .find_route(HttpMethod::GET, "/api/users")
            .unwrap()
            .is_some());
        assert!(store
            .find_route(HttpMethod::POST, "/api/users")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_seed_rejects_invalid_endpoint() {
        let yaml = r#"
endpoints:
  - method: GET
    path: no-slash
"#;
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        let store = InMemoryStore::new();
        let err = seed.apply(&store).unwrap_err();
        assert!(err.to_string().contains("Invalid seed endpoint"));
    }

    #[test]
    fn test_seed_rejects_duplicate_route() {
        let yaml = r#"
endpoints:
  - method: GET
    path: /api/users
  - method: GET
    path: /api/users
"#;
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        let store = InMemoryStore::new();
        let err = seed.apply(&store).unwrap_err();
        assert!(err.to_string().contains("Could not seed"));
    }

    #[test]
    fn test_seed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoints:\n  - method: GET\n    path: /api/ping\n    presets:\n      - name: pong\n        enabled: true\n        responseData:\n          pong: true"
        )
        .unwrap();

        let seed = SeedFile::from_file(file.path()).unwrap();
        assert_eq!(seed.endpoints.len(), 1);
        assert_eq!(seed.endpoints[0].path, "/api/ping");
    }
}
