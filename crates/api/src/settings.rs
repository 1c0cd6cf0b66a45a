//! Service configuration
//!
//! Read from an optional TOML file, then overridden by `ESTIMATOR_*`
//! environment variables (nested keys joined with `__`, e.g.
//! `ESTIMATOR_SERVER__BIND_ADDR`).

use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use inference_engine::ModelCard;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::rate_limit::RateLimitConfig;

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "price-estimator.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub validation: ValidationConfig,
    pub model_card: ModelCard,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Paths of the offline-trained artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// `.onnx` or `.json` regression model
    pub model_path: String,
    /// JSON scaler parameters
    pub scaler_path: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_path: "artifacts/model.json".to_string(),
            scaler_path: "artifacts/scaler.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Parsed `level`; unknown names are a configuration error
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        self.level.parse::<Level>().map_err(|_| {
            ConfigError::Message(format!(
                "invalid logging.level {:?}: expected trace, debug, info, warn or error",
                self.level
            ))
        })
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("ESTIMATOR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.logging.max_level()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.artifacts.model_path, "artifacts/model.json");
        assert_eq!(config.validation.discrepancy_range, (-8, 8));
        assert_eq!(config.model_card.model, "XGBoost Regressor");
        assert!(!config.rate_limit.enabled);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/price-estimator.toml")).is_err());
    }

    #[test]
    fn test_logging_level_names() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.max_level().unwrap(), Level::INFO);

        logging.level = "WARN".to_string();
        assert_eq!(logging.max_level().unwrap(), Level::WARN);

        logging.level = "verbose".to_string();
        let err = logging.max_level().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_load_rejects_misspelled_level() {
        let path = std::env::temp_dir().join(format!(
            "price-estimator-level-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[logging]\nlevel = \"inf\"\n").unwrap();

        let result = AppConfig::load(path.to_str());
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let path = std::env::temp_dir().join(format!(
            "price-estimator-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:9000"

[artifacts]
model_path = "models/best_model.onnx"

[validation]
discrepancy_range = [-4, 4]

[model_card]
mae = 150000.0
"#,
        )
        .unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.artifacts.model_path, "models/best_model.onnx");
        assert_eq!(config.artifacts.scaler_path, "artifacts/scaler.json");
        assert_eq!(config.validation.discrepancy_range, (-4, 4));
        assert_eq!(config.validation.rooms_range, (1.0, 8.0));
        assert_eq!(config.model_card.mae, 150000.0);
        assert_eq!(config.model_card.r_squared, 0.5726);
    }
}
