//! Configuration system for evaldash.
//!
//! Uses `figment` for layered configuration: defaults -> user file -> workspace
//! file -> explicit file -> environment -> explicit overrides. The workspace
//! file lives at `.evaldash/config.toml`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for a dashboard session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Where the remote catalog lives and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL that relative endpoint paths are appended to.
    pub base_url: String,
    /// Transport timeout per request, in seconds.
    pub timeout_secs: u64,
    pub endpoints: EndpointConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            endpoints: EndpointConfig::default(),
        }
    }
}

/// Paths of the remote catalog endpoints. A value that already starts with
/// `http://` or `https://` is used as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub dataset: String,
    pub metrics: String,
    pub versions: String,
    pub corpora: String,
    pub topics: String,
    pub query_groups: String,
    pub filter: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            dataset: "/evaluation".to_string(),
            metrics: "/metrics".to_string(),
            versions: "/versions".to_string(),
            corpora: "/corpora".to_string(),
            topics: "/topics".to_string(),
            query_groups: "/queryGroups".to_string(),
            filter: "/filter".to_string(),
        }
    }
}

impl EndpointConfig {
    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("dataset", self.dataset.as_str()),
            ("metrics", self.metrics.as_str()),
            ("versions", self.versions.as_str()),
            ("corpora", self.corpora.as_str()),
            ("topics", self.topics.as_str()),
            ("query_groups", self.query_groups.as_str()),
            ("filter", self.filter.as_str()),
        ]
    }
}

/// Periodic re-issue of the active filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    /// Period between refreshes, in milliseconds.
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 60_000,
        }
    }
}

impl DashboardConfig {
    /// Validate the configuration, returning a list of problems.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let base = self.gateway.base_url.trim();
        if base.is_empty() {
            errors.push("gateway.base_url must not be empty".to_string());
        } else if !(base.starts_with("http://") || base.starts_with("https://")) {
            errors.push(format!(
                "gateway.base_url must start with http:// or https:// (got '{base}')"
            ));
        }
        if self.gateway.timeout_secs == 0 {
            errors.push("gateway.timeout_secs must be greater than zero".to_string());
        }
        for (name, path) in self.gateway.endpoints.entries() {
            if path.trim().is_empty() {
                errors.push(format!("gateway.endpoints.{name} must not be empty"));
            }
        }
        if self.refresh.interval_ms == 0 {
            errors.push("refresh.interval_ms must be greater than zero".to_string());
        }

        errors
    }

    /// Like [`validate`](Self::validate), folded into one error.
    pub fn check(&self) -> Result<(), ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid {
                message: problems.join("; "),
            })
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `EVALDASH_`)
/// 3. An explicit config file (e.g. `--config`)
/// 4. Workspace-local config (`.evaldash/config.toml`)
/// 5. User config (`~/.config/evaldash/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&DashboardConfig>,
) -> Result<DashboardConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DashboardConfig::default()));

    // User-level config
    if let Some(dirs) = directories::ProjectDirs::from("dev", "evaldash", "evaldash") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".evaldash").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(file) = config_file {
        figment = figment.merge(Toml::file(file));
    }

    // Environment variables (EVALDASH_GATEWAY__BASE_URL, EVALDASH_REFRESH__INTERVAL_MS, ...)
    figment = figment.merge(Env::prefixed("EVALDASH_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.gateway.base_url, "http://localhost:8080");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.gateway.endpoints.dataset, "/evaluation");
        assert_eq!(config.gateway.endpoints.query_groups, "/queryGroups");
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.interval_ms, 60_000);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = DashboardConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: DashboardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.gateway.base_url, config.gateway.base_url);
        assert_eq!(deserialized.gateway.endpoints, config.gateway.endpoints);
        assert_eq!(deserialized.refresh.interval_ms, config.refresh.interval_ms);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
[refresh]
interval_ms = 5000
"#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_ms, 5000);
        assert!(config.refresh.enabled);
        assert_eq!(config.gateway.endpoints.filter, "/filter");
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = DashboardConfig::default();
        config.gateway.base_url = "localhost:8080".into();
        config.gateway.timeout_secs = 0;
        config.gateway.endpoints.topics = " ".into();
        config.refresh.interval_ms = 0;

        let errors = config.validate();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("base_url")));
        assert!(errors.iter().any(|e| e.contains("endpoints.topics")));
        assert!(errors.iter().any(|e| e.contains("interval_ms")));
    }

    #[test]
    fn test_check_folds_problems() {
        assert!(DashboardConfig::default().check().is_ok());

        let mut config = DashboardConfig::default();
        config.gateway.timeout_secs = 0;
        config.refresh.interval_ms = 0;
        match config.check() {
            Err(ConfigError::Invalid { message }) => {
                assert!(message.contains("timeout_secs"));
                assert!(message.contains("; refresh.interval_ms"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.toml");
        std::fs::write(&file, "[refresh]\ninterval_ms = \"soon\"\n").unwrap();

        let err = load_config(None, Some(&file), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().starts_with("Configuration parse error:"));
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = DashboardConfig::default();
        overrides.gateway.base_url = "http://rre.internal:9000".into();
        overrides.refresh.interval_ms = 1_000;

        let config = load_config(None, None, Some(&overrides)).unwrap();
        assert_eq!(config.gateway.base_url, "http://rre.internal:9000");
        assert_eq!(config.refresh.interval_ms, 1_000);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let ws_dir = dir.path().join(".evaldash");
        std::fs::create_dir_all(&ws_dir).unwrap();
        std::fs::write(
            ws_dir.join("config.toml"),
            r#"
[gateway]
base_url = "http://dashboard.test"

[gateway.endpoints]
filter = "/api/filter"

[refresh]
enabled = false
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None, None).unwrap();
        assert_eq!(config.gateway.base_url, "http://dashboard.test");
        assert_eq!(config.gateway.endpoints.filter, "/api/filter");
        assert_eq!(config.gateway.endpoints.corpora, "/corpora");
        assert!(!config.refresh.enabled);
    }

    #[test]
    fn test_explicit_file_beats_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let ws_dir = dir.path().join(".evaldash");
        std::fs::create_dir_all(&ws_dir).unwrap();
        std::fs::write(
            ws_dir.join("config.toml"),
            "[refresh]\ninterval_ms = 2000\n",
        )
        .unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "[refresh]\ninterval_ms = 3000\n").unwrap();

        let config = load_config(Some(dir.path()), Some(&explicit), None).unwrap();
        assert_eq!(config.refresh.interval_ms, 3000);
    }
}
