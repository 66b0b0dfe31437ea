//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AttractorError, Result};
use crate::view::model::{DatasetType, MetricType, PlotType, RegressionType};

/// Full dashboard configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub datasets: DatasetsConfig,
    pub static_data: StaticDataConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
    /// Where this config was loaded from (not serialized from file contents).
    #[serde(skip)]
    pub config_file: PathBuf,
}

/// Metric server endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

/// Available dataset types and the one shown first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetsConfig {
    pub default_type: String,
    /// Type key → display label.
    pub types: BTreeMap<String, String>,
}

/// Pre-injected data for offline rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StaticDataConfig {
    /// Pages are pre-rendered per type; type switches navigate instead.
    pub serve_static: bool,
    /// JSON array of metric records used instead of the values request.
    pub values_file: Option<PathBuf>,
    /// Prefix used instead of the file-prefix request.
    pub file_prefix: Option<String>,
}

/// Initial display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ViewConfig {
    pub metric_type: MetricType,
    pub regression_type: RegressionType,
    pub display_regression: bool,
    pub display_filenames: bool,
    pub plot_type: PlotType,
}

/// Session log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSONL lifecycle log; `None` disables it.
    pub jsonl_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7890".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert("js".to_string(), "JavaScript".to_string());
        types.insert("rb".to_string(), "Ruby".to_string());
        Self {
            default_type: "rb".to_string(),
            types,
        }
    }
}

impl DatasetsConfig {
    #[must_use]
    pub fn default_dataset(&self) -> DatasetType {
        DatasetType::new(self.default_type.clone())
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            metric_type: MetricType::default(),
            regression_type: RegressionType::default(),
            display_regression: false,
            display_filenames: false,
            plot_type: PlotType::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_path: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Config {
    /// Default configuration path: `$XDG_CONFIG_HOME/attractor/view.toml`,
    /// falling back to `~/.config`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("attractor").join("view.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| AttractorError::io(&path_buf, source))?;
            Self::from_toml_str(&raw)?
        } else if is_explicit_path {
            return Err(AttractorError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.config_file = path_buf;
        cfg.apply_env_overrides_from(|name| env::var(name).ok())?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without env overrides or validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic hash of the effective config for the session log.
    ///
    /// FNV-1a over canonical JSON, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut var = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = var("ATTRACTOR_SERVER_BASE_URL") {
            self.server.base_url = raw;
        }
        if let Some(raw) = var("ATTRACTOR_SERVER_TIMEOUT_MS") {
            self.server.timeout_ms = parse_env_u64("ATTRACTOR_SERVER_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = var("ATTRACTOR_DEFAULT_TYPE") {
            self.datasets.default_type = raw;
        }
        if let Some(raw) = var("ATTRACTOR_SERVE_STATIC") {
            self.static_data.serve_static = parse_env_bool("ATTRACTOR_SERVE_STATIC", &raw)?;
        }
        if let Some(raw) = var("ATTRACTOR_VALUES_FILE") {
            self.static_data.values_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = var("ATTRACTOR_FILE_PREFIX") {
            self.static_data.file_prefix = Some(raw);
        }
        if let Some(raw) = var("ATTRACTOR_LOG_JSONL") {
            self.logging.jsonl_path = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.server.base_url.trim().trim_end_matches('/');
        self.server.base_url = trimmed.to_string();
        self.datasets.default_type = self.datasets.default_type.trim().to_string();
        if self.static_data.file_prefix.as_deref() == Some("") {
            self.static_data.file_prefix = None;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.base_url.is_empty() {
            return Err(AttractorError::InvalidConfig {
                details: "server.base_url must not be empty".to_string(),
            });
        }
        if self.server.timeout_ms == 0 {
            return Err(AttractorError::InvalidConfig {
                details: "server.timeout_ms must be > 0".to_string(),
            });
        }
        if self.datasets.types.is_empty() {
            return Err(AttractorError::InvalidConfig {
                details: "datasets.types must list at least one dataset type".to_string(),
            });
        }
        if !self.datasets.types.contains_key(&self.datasets.default_type) {
            return Err(AttractorError::InvalidConfig {
                details: format!(
                    "datasets.default_type {:?} is not one of {:?}",
                    self.datasets.default_type,
                    self.datasets.types.keys().collect::<Vec<_>>()
                ),
            });
        }
        if self.static_data.serve_static && self.static_data.values_file.is_none() {
            return Err(AttractorError::InvalidConfig {
                details: "static_data.serve_static requires static_data.values_file".to_string(),
            });
        }
        if self.logging.max_size_bytes == 0 {
            return Err(AttractorError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| AttractorError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| AttractorError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
