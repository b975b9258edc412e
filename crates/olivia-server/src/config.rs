//! Service configuration
//!
//! Layers, lowest precedence first: built-in defaults, the YAML file,
//! `OLIVIA__`-prefixed environment variables (`__` separates nesting, e.g.
//! `OLIVIA__SOURCES__JUDILIBRE__API_KEY`), then command-line overrides.

use config::{Config, Environment, File, FileFormat};
use olivia_aggregator::AggregationConfig;
use olivia_classifiers::AnalysisConfig;
use olivia_core::{Error, Result};
use olivia_sources::SourcesSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,

    pub analysis: AnalysisConfig,

    pub aggregation: AggregationConfig,

    pub sources: SourcesSettings,

    /// YAML lexicon replacing the built-in one
    pub lexicon_path: Option<PathBuf>,

    /// Serve every enabled source from offline fixtures; no credentials needed
    pub demo_mode: bool,

    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,

    pub port: u16,

    /// Largest accepted request body
    pub body_limit_bytes: usize,

    /// Allowed browser origins, in addition to localhost
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub lexicon_path: Option<PathBuf>,
    pub demo_mode: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            analysis: AnalysisConfig::default(),
            aggregation: AggregationConfig::default(),
            sources: SourcesSettings::default(),
            lexicon_path: None,
            demo_mode: true,
            log_format: LogFormat::Text,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".to_string(),
            port: 8000,
            body_limit_bytes: 64 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, environment and CLI overrides.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(path: impl AsRef<Path>, overrides: &Overrides) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("OLIVIA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::config(format!("failed to load {}: {}", path.display(), e)))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(listen) = &overrides.listen {
            self.server.listen = listen.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = &overrides.lexicon_path {
            self.lexicon_path = Some(path.clone());
        }
        if let Some(demo_mode) = overrides.demo_mode {
            self.demo_mode = demo_mode;
        }
    }

    /// Everything that must hold before serving; failures are fatal
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.aggregation.validate()?;
        self.sources.validate(self.demo_mode)?;
        if self.server.body_limit_bytes == 0 {
            return Err(Error::config("server.body_limit_bytes must be positive"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.listen, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate_in_demo_mode() {
        let config = AppConfig::default();
        assert!(config.demo_mode);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let config = AppConfig {
            demo_mode: false,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_yaml_file_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
analysis:
  detection_threshold: 30
aggregation:
  max_concurrency: 2
sources:
  justice_back:
    enabled: false
log_format: json
"#
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(9100),
            ..Overrides::default()
        };
        let config = AppConfig::load(file.path(), &overrides).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.analysis.detection_threshold, 30.0);
        assert_eq!(config.analysis.score_saturation, 4.0);
        assert_eq!(config.aggregation.max_concurrency, 2);
        assert!(!config.sources.justice_back.enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml"), &Overrides::default()).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = AppConfig::default();
        config.analysis.detection_threshold = 150.0;
        assert!(config.validate().is_err());
    }
}
