//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SuiteError};

/// Full suite configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
    pub paths: PathsConfig,
}

/// Terminal presentation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
    /// Print "Plate 3 of 15" style progress lines during multi-trial tests.
    pub show_progress: bool,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub activity_log: PathBuf,
    pub fallback_log: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Classification service boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of the image classification service.
    pub service_url: String,
}

/// Filesystem paths used by eyesuite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            activity_log: data_dir().join("activity.jsonl"),
            fallback_log: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5005".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir()
                .join(".config")
                .join("eyesuite")
                .join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[EVS-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("eyesuite")
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SuiteError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SuiteError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(|name| env::var(name).ok())?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON so the digest is stable across processes.
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
        let mut get = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = get("EYESUITE_DISPLAY_COLOR") {
            self.display.color = parse_env_bool("EYESUITE_DISPLAY_COLOR", &raw)?;
        }
        if let Some(raw) = get("EYESUITE_DISPLAY_SHOW_PROGRESS") {
            self.display.show_progress = parse_env_bool("EYESUITE_DISPLAY_SHOW_PROGRESS", &raw)?;
        }
        if let Some(raw) = get("EYESUITE_LOGGING_ENABLED") {
            self.logging.enabled = parse_env_bool("EYESUITE_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = get("EYESUITE_LOGGING_ACTIVITY_LOG") {
            self.logging.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = get("EYESUITE_LOGGING_FALLBACK_LOG") {
            self.logging.fallback_log = Some(PathBuf::from(raw));
        }
        if let Some(raw) = get("EYESUITE_LOGGING_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env_u64("EYESUITE_LOGGING_MAX_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = get("EYESUITE_LOGGING_MAX_ROTATED_FILES") {
            let value = parse_env_u64("EYESUITE_LOGGING_MAX_ROTATED_FILES", &raw)?;
            self.logging.max_rotated_files =
                u32::try_from(value).map_err(|error| SuiteError::ConfigParse {
                    context: "env",
                    details: format!("EYESUITE_LOGGING_MAX_ROTATED_FILES={raw:?}: {error}"),
                })?;
        }
        if let Some(raw) = get("EYESUITE_ANALYSIS_SERVICE_URL") {
            self.analysis.service_url = raw;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.analysis.service_url.trim().trim_end_matches('/');
        self.analysis.service_url = trimmed.to_string();
    }

    fn validate(&self) -> Result<()> {
        if self.logging.max_size_bytes == 0 {
            return Err(SuiteError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }
        if self.logging.max_rotated_files == 0 {
            return Err(SuiteError::InvalidConfig {
                details: "logging.max_rotated_files must be >= 1".to_string(),
            });
        }
        if self.logging.enabled && self.logging.activity_log.as_os_str().is_empty() {
            return Err(SuiteError::InvalidConfig {
                details: "logging.activity_log must be set when logging is enabled".to_string(),
            });
        }

        let url = &self.analysis.service_url;
        if url.is_empty() {
            return Err(SuiteError::InvalidConfig {
                details: "analysis.service_url must not be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SuiteError::InvalidConfig {
                details: format!("analysis.service_url must be an http(s) URL, got {url:?}"),
            });
        }

        Ok(())
    }
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| SuiteError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| SuiteError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
