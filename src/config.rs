//! Engine configuration
//!
//! Loaded from `<config dir>/tera-settings-sync/config.json`. A missing or
//! broken file falls back to defaults; the engine must come up regardless.
//! `SETTINGS_SYNC_MODE` and `SETTINGS_SYNC_DATA_DIR` override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::{self, paths, timing};

/// How the engine reacts to live settings that drift from the charfile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Tell the user; never touch the client
    #[default]
    Report,
    /// Push the charfile back over divergent server loads
    Correct,
}

impl FromStr for ReconcileMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "correct" => Ok(Self::Correct),
            other => anyhow::bail!("unknown reconcile mode '{other}' (expected 'report' or 'correct')"),
        }
    }
}

impl fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report => f.write_str("report"),
            Self::Correct => f.write_str("correct"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: ReconcileMode,

    /// Root for the `characters/` and `profiles/` directories
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_correction_delay_ms")]
    pub correction_delay_ms: u64,

    /// Spacing between account and user reapplication
    #[serde(default = "default_reapply_gap_ms")]
    pub reapply_gap_ms: u64,
}

fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(paths::APP_DIR);
    path
}

fn default_correction_delay_ms() -> u64 {
    timing::DEFAULT_CORRECTION_DELAY_MS
}

fn default_reapply_gap_ms() -> u64 {
    timing::DEFAULT_REAPPLY_GAP_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ReconcileMode::default(),
            data_dir: default_data_dir(),
            correction_delay_ms: default_correction_delay_ms(),
            reapply_gap_ms: default_reapply_gap_ms(),
        }
    }
}

impl EngineConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path.push(paths::CONFIG_FILENAME);
        path
    }

    /// Load from the default location, then apply env overrides
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::path());
        config.apply_env_overrides();
        config.validate_and_clamp();
        config
    }

    /// Defaults when the file is missing or unparseable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No engine config file found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(mut config) => {
                info!(path = %path.display(), mode = %config.mode, "Loaded engine config");
                config.validate_and_clamp();
                config
            }
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "Failed to load engine config, using defaults");
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            env::var(constants::env::MODE).ok().as_deref(),
            env::var(constants::env::DATA_DIR).ok().as_deref(),
        );
    }

    fn apply_overrides(&mut self, mode: Option<&str>, data_dir: Option<&str>) {
        if let Some(mode) = mode {
            match mode.parse() {
                Ok(mode) => {
                    info!(mode = %mode, "Reconcile mode overridden from environment");
                    self.mode = mode;
                }
                Err(e) => warn!(error = %e, "Ignoring invalid reconcile mode override"),
            }
        }
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            info!(data_dir = %dir, "Data directory overridden from environment");
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// Keep both delays non-zero and bounded
    pub fn validate_and_clamp(&mut self) {
        for (name, value) in [
            ("correction_delay_ms", &mut self.correction_delay_ms),
            ("reapply_gap_ms", &mut self.reapply_gap_ms),
        ] {
            if *value < timing::MIN_DELAY_MS {
                warn!(field = name, value = *value, min = timing::MIN_DELAY_MS, "Delay below minimum, clamping");
                *value = timing::MIN_DELAY_MS;
            } else if *value > timing::MAX_DELAY_MS {
                warn!(field = name, value = *value, max = timing::MAX_DELAY_MS, "Delay exceeds maximum, clamping");
                *value = timing::MAX_DELAY_MS;
            }
        }
    }

    pub fn correction_delay(&self) -> Duration {
        Duration::from_millis(self.correction_delay_ms)
    }

    pub fn reapply_gap(&self) -> Duration {
        Duration::from_millis(self.reapply_gap_ms)
    }
}
