//! Analyzer configuration and credentials.
//!
//! Settings come from an optional TOML file; every field has a default so an
//! empty file (or no file) is valid. Credentials are read from the
//! environment once, by the binary, and handed to the collaborators that
//! need them. Pipeline stages never see either.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tickerlab_core::data::{polygon, CsvSource, FetchPacer, PolygonSource, PriceDataSource};
use tickerlab_core::insight::{
    huggingface, HuggingFaceGenerator, InsightOptions, SharedGenerator,
};
use tracing::{info, warn};

pub const POLYGON_KEY_VAR: &str = "POLYGON_API_KEY";
pub const HF_TOKEN_VAR: &str = "HF_API_TOKEN";

/// Upper bound on `data.lookback_days` (about ten years).
pub const MAX_LOOKBACK_DAYS: u32 = 3_650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("missing credential {0} (set it in the environment or .env)")]
    MissingCredential(&'static str),

    #[error("failed to set up {component}: {reason}")]
    Setup {
        component: &'static str,
        reason: String,
    },
}

/// Which price source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Polygon,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: SourceKind,
    /// Calendar days to request. 60 normally yields 30+ trading days.
    pub lookback_days: u32,
    /// Minimum spacing between provider requests.
    pub min_fetch_interval_secs: u64,
    pub base_url: String,
    pub csv_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Polygon,
            lookback_days: 60,
            min_fetch_interval_secs: polygon::DEFAULT_MIN_INTERVAL.as_secs(),
            base_url: polygon::DEFAULT_BASE_URL.to_string(),
            csv_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_chars: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: huggingface::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
            max_chars: huggingface::DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("storage"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub data: DataConfig,
    pub insight: InsightConfig,
    pub output: OutputConfig,
}

impl AnalyzerConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.data.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "data.lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.data.lookback_days
            )));
        }
        if self.insight.timeout_secs == 0 {
            return Err(ConfigError::Invalid("insight.timeout_secs must be >= 1".into()));
        }
        if self.insight.max_chars == 0 {
            return Err(ConfigError::Invalid("insight.max_chars must be >= 1".into()));
        }
        Ok(())
    }

    pub fn insight_options(&self) -> InsightOptions {
        InsightOptions {
            timeout: Duration::from_secs(self.insight.timeout_secs),
        }
    }

    /// Build the configured price source.
    pub fn price_source(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn PriceDataSource>, ConfigError> {
        match self.data.source {
            SourceKind::Polygon => {
                let key = credentials.require_polygon()?;
                let pacer =
                    FetchPacer::new(Duration::from_secs(self.data.min_fetch_interval_secs));
                let source = PolygonSource::new(key, pacer)
                    .map_err(|e| ConfigError::Setup {
                        component: "polygon source",
                        reason: e.to_string(),
                    })?
                    .with_base_url(&self.data.base_url);
                info!(
                    min_interval_secs = self.data.min_fetch_interval_secs,
                    "using Polygon.io price source"
                );
                Ok(Box::new(source))
            }
            SourceKind::Csv => {
                info!(dir = %self.data.csv_dir.display(), "using CSV price source");
                Ok(Box::new(CsvSource::new(&self.data.csv_dir)))
            }
        }
    }

    /// Build the text generator, or `None` when insights should come from
    /// the rule-based template only.
    pub fn text_generator(&self, credentials: &Credentials) -> Option<SharedGenerator> {
        if !self.insight.enabled {
            info!("text generation disabled; using rule-based insights");
            return None;
        }
        let Some(token) = credentials.hf_api_token.as_deref() else {
            info!("{HF_TOKEN_VAR} not set; using rule-based insights");
            return None;
        };
        match HuggingFaceGenerator::new(&self.insight.endpoint, token, self.insight.max_chars) {
            Ok(generator) => Some(Arc::new(generator)),
            Err(e) => {
                warn!(error = %e, "text generator unavailable; using rule-based insights");
                None
            }
        }
    }
}

/// API credentials. Placeholder values such as `your_hf_api_token_here`
/// count as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub polygon_api_key: Option<String>,
    pub hf_api_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("polygon_api_key", &mask(&self.polygon_api_key))
            .field("hf_api_token", &mask(&self.hf_api_token))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty() && !is_placeholder(v))
        };
        Self {
            polygon_api_key: read(POLYGON_KEY_VAR),
            hf_api_token: read(HF_TOKEN_VAR),
        }
    }

    pub fn require_polygon(&self) -> Result<&str, ConfigError> {
        self.polygon_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential(POLYGON_KEY_VAR))
    }
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with("your_") && value.ends_with("_here")
}
