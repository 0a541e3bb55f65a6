//! Persisted settings documents
//!
//! One JSON document per character and per named profile. Reads never fail:
//! anything missing, empty or unparseable comes back as the default document.
//! Writes report success as a boolean and log the reason on failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::codec::PacketRecord;
use crate::constants::{naming, paths};
use crate::error::SyncError;
use crate::types::{sanitize_name, SettingKind};

/// Lock flag plus the last known account and user settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    pub lock: bool,
    pub account_settings: Option<PacketRecord>,
    pub user_settings: Option<PacketRecord>,
}

impl SettingsDocument {
    pub fn new(account_settings: Option<PacketRecord>, user_settings: Option<PacketRecord>) -> Self {
        Self {
            lock: false,
            account_settings,
            user_settings,
        }
    }

    pub fn get(&self, kind: SettingKind) -> Option<&PacketRecord> {
        match kind {
            SettingKind::Account => self.account_settings.as_ref(),
            SettingKind::User => self.user_settings.as_ref(),
        }
    }

    pub fn set(&mut self, kind: SettingKind, record: Option<PacketRecord>) {
        match kind {
            SettingKind::Account => self.account_settings = record,
            SettingKind::User => self.user_settings = record,
        }
    }

    /// Neither kind carries data
    pub fn is_empty(&self) -> bool {
        self.account_settings.is_none() && self.user_settings.is_none()
    }

    /// Coerce an arbitrary JSON value into a document
    /// Non-boolean `lock` reads as false, non-object settings read as null
    fn from_value(value: &Value) -> Self {
        let lock = value.get("lock").and_then(Value::as_bool).unwrap_or(false);
        let record = |kind: SettingKind| -> Option<PacketRecord> {
            match value.get(kind.key()) {
                Some(field @ Value::Object(_)) => serde_json::from_value(field.clone())
                    .inspect_err(|e| warn!(field = kind.key(), error = %e, "Settings record has unexpected member types, treating as absent"))
                    .ok(),
                _ => None,
            }
        };

        Self {
            lock,
            account_settings: record(SettingKind::Account),
            user_settings: record(SettingKind::User),
        }
    }
}

/// Load a document, substituting the default for any read or parse problem
pub fn load_document(path: &Path) -> SettingsDocument {
    match try_load_document(path) {
        Ok(Some(document)) => document,
        Ok(None) => SettingsDocument::default(),
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "Failed to read settings document, using defaults");
            SettingsDocument::default()
        }
    }
}

/// `Ok(None)` when the file is missing or blank
fn try_load_document(path: &Path) -> Result<Option<SettingsDocument>> {
    if !path.exists() {
        info!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        info!(path = %path.display(), "Settings file is empty, using defaults");
        return Ok(None);
    }

    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(Some(SettingsDocument::from_value(&value)))
}

/// Write a document as pretty-printed JSON; false on any failure
pub fn save_document(path: &Path, document: &SettingsDocument) -> bool {
    match try_save_document(path, document) {
        Ok(()) => {
            info!(path = %path.display(), lock = document.lock, "Settings saved");
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to save settings");
            false
        }
    }
}

fn try_save_document(path: &Path, document: &SettingsDocument) -> Result<(), SyncError> {
    let io_err = |source| SyncError::FileIo { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(document)
        .context("Failed to serialize settings document")?;
    fs::write(path, json).map_err(io_err)
}

/// Does the file exist with non-blank contents
pub fn has_contents(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|contents| !contents.trim().is_empty())
        .unwrap_or(false)
}

/// Locates character and profile documents below a data directory
///
/// Characters and profiles live in separate subdirectories, so a profile
/// named like a character key can never shadow that character's file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    data_dir: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn characters_dir(&self) -> PathBuf {
        self.data_dir.join(paths::CHARACTERS_DIR)
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join(paths::PROFILES_DIR)
    }

    /// Create both namespaces
    pub fn ensure_dirs(&self) -> Result<(), SyncError> {
        for dir in [self.characters_dir(), self.profiles_dir()] {
            fs::create_dir_all(&dir).map_err(|source| SyncError::FileIo { path: dir.clone(), source })?;
        }
        Ok(())
    }

    /// Path for an already computed character key
    pub fn character_path(&self, character_key: &str) -> PathBuf {
        self.characters_dir()
            .join(format!("{character_key}.{}", naming::DOCUMENT_EXTENSION))
    }

    pub fn profile_path(&self, profile_name: &str) -> PathBuf {
        self.profiles_dir()
            .join(format!("{}.{}", sanitize_name(profile_name), naming::DOCUMENT_EXTENSION))
    }

    pub fn profile_exists(&self, profile_name: &str) -> bool {
        self.profile_path(profile_name).is_file()
    }

    /// Names of all stored profiles, sorted
    pub fn list_profiles(&self) -> Result<Vec<String>> {
        let dir = self.profiles_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(naming::DOCUMENT_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
