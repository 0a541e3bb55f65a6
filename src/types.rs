use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{messages, naming};

/// One of the two independent settings channels the client keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Account,
    User,
}

impl SettingKind {
    pub const ALL: [SettingKind; 2] = [SettingKind::Account, SettingKind::User];

    /// Key used in the persisted JSON document and in user notices
    pub fn key(self) -> &'static str {
        match self {
            SettingKind::Account => "accountSettings",
            SettingKind::User => "userSettings",
        }
    }

    /// Short label for status lines
    pub fn label(self) -> &'static str {
        match self {
            SettingKind::Account => "Account",
            SettingKind::User => "User",
        }
    }

    pub fn server_message(self) -> &'static str {
        match self {
            SettingKind::Account => messages::S_LOAD_CLIENT_ACCOUNT_SETTING,
            SettingKind::User => messages::S_LOAD_CLIENT_USER_SETTING,
        }
    }

    pub fn client_save_message(self) -> &'static str {
        match self {
            SettingKind::Account => messages::C_SAVE_CLIENT_ACCOUNT_SETTING,
            SettingKind::User => messages::C_SAVE_CLIENT_USER_SETTING,
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What the game client object model tells us about the logged-in character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server_id: Option<u32>,
}

impl CharacterInfo {
    pub fn new(name: impl Into<String>, server_id: Option<u32>) -> Self {
        Self {
            name: Some(name.into()),
            server_id,
        }
    }

    /// `<sanitized name>-<server id>`, the character document key
    pub fn character_key(&self) -> String {
        let server = self
            .server_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| naming::DEFAULT_SERVER_ID.to_string());
        format!("{}-{}", sanitize_name(self.name.as_deref().unwrap_or_default()), server)
    }
}

/// Keep only `[A-Za-z0-9_-]`; an empty result becomes a fixed placeholder
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        naming::UNKNOWN_CHARACTER.to_string()
    } else {
        cleaned
    }
}
