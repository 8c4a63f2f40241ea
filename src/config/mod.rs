//! Configuration module for Verdant
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`VERDANT_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use verdant::config::VerdantConfig;
//!
//! // Load defaults
//! let config = VerdantConfig::default();
//! assert_eq!(config.server.port, 8000);
//!
//! // Parse from TOML
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: VerdantConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```

pub mod carbon;
pub mod classifier;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod logging;
pub mod server;

pub use carbon::{CarbonConfig, RegionConfig};
pub use classifier::ClassifierConfig;
pub use dispatch::DispatchConfig;
pub use endpoint::EndpointConfig;
pub use error::ConfigError;
pub use health::HealthConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Verdant router.
///
/// Aggregates all sections: server, carbon signal, classifier, dispatch,
/// health, logging, and the static endpoint roster.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerdantConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Carbon signal cache and feed configuration
    pub carbon: CarbonConfig,
    /// Task classifier configuration
    pub classifier: ClassifierConfig,
    /// Dispatcher configuration
    pub dispatch: DispatchConfig,
    /// Health state and recovery prober configuration
    pub health: HealthConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Static expert endpoint definitions
    pub endpoints: Vec<EndpointConfig>,
}

impl VerdantConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports VERDANT_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("VERDANT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("VERDANT_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("VERDANT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("VERDANT_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(feed_url) = std::env::var("VERDANT_CARBON_FEED_URL") {
            self.carbon.feed_url = feed_url;
        }
        if let Ok(probes) = std::env::var("VERDANT_HEALTH_PROBES") {
            self.health.enabled = probes.to_lowercase() == "true";
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.dispatch.max_attempts == 0 {
            return Err(ConfigError::Validation {
                field: "dispatch.max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.classifier.min_confidence) {
            return Err(ConfigError::Validation {
                field: "classifier.min_confidence".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }

        let mut seen_ids = std::collections::HashSet::new();
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.id.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("endpoints[{}].id", i),
                    message: "id cannot be empty".to_string(),
                });
            }
            if endpoint.url.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("endpoints[{}].url", i),
                    message: "URL cannot be empty".to_string(),
                });
            }
            if endpoint.region.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("endpoints[{}].region", i),
                    message: "region cannot be empty".to_string(),
                });
            }
            if !seen_ids.insert(endpoint.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("endpoints[{}].id", i),
                    message: format!("duplicate endpoint id: {}", endpoint.id),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelClass;
    use std::path::Path;

    #[test]
    fn test_verdant_config_defaults() {
        let config = VerdantConfig::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.health.enabled);
        assert!(config.endpoints.is_empty());
        assert_eq!(config.carbon.staleness_seconds, 900);
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [server]
        port = 9000
        "#;

        let config: VerdantConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0"); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../verdant.example.toml");
        let config: VerdantConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        assert!(!config.endpoints.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_parse_endpoints_array() {
        let toml = r#"
        [[endpoints]]
        id = "grammar-us-west1"
        class = "grammar-100m"
        region = "us-west1"
        url = "http://10.0.0.1:9001"

        [[endpoints]]
        id = "email-us-east1"
        class = "email-7b"
        region = "us-east1"
        url = "http://10.0.0.2:9001"
        max_concurrency = 8
        "#;

        let config: VerdantConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].model_class, ModelClass::Email7b);
        assert_eq!(config.endpoints[1].max_concurrency, 8);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = VerdantConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = VerdantConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = VerdantConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_env_override_port() {
        std::env::set_var("VERDANT_PORT", "9999");
        let config = VerdantConfig::default().with_env_overrides();
        std::env::remove_var("VERDANT_PORT");

        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("VERDANT_PORT", "not-a-number");
        let config = VerdantConfig::default().with_env_overrides();
        std::env::remove_var("VERDANT_PORT");

        // Should keep default, not crash
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_env_override_health_probes() {
        std::env::set_var("VERDANT_HEALTH_PROBES", "false");
        let config = VerdantConfig::default().with_env_overrides();
        std::env::remove_var("VERDANT_HEALTH_PROBES");

        assert!(!config.health.enabled);
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = VerdantConfig::default();
        config.server.port = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_config_validation_zero_attempts() {
        let mut config = VerdantConfig::default();
        config.dispatch.max_attempts = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_duplicate_endpoint_id() {
        let mut config = VerdantConfig::default();
        for _ in 0..2 {
            config.endpoints.push(EndpointConfig {
                id: "grammar-us-west1".to_string(),
                model_class: ModelClass::Grammar100m,
                region: "us-west1".to_string(),
                url: "http://10.0.0.1:9001".to_string(),
                max_concurrency: 4,
            });
        }

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field.contains("id")
        ));
    }

    #[test]
    fn test_config_validation_empty_endpoint_url() {
        let mut config = VerdantConfig::default();
        config.endpoints.push(EndpointConfig {
            id: "grammar-us-west1".to_string(),
            model_class: ModelClass::Grammar100m,
            region: "us-west1".to_string(),
            url: String::new(),
            max_concurrency: 4,
        });

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field.contains("url")
        ));
    }
}
