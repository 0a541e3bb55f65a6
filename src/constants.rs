//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Character and profile file naming
pub mod naming {
    /// Server id used when the game client does not report one
    pub const DEFAULT_SERVER_ID: &str = "0000";

    /// Replacement for a character or profile name that sanitizes to nothing
    pub const UNKNOWN_CHARACTER: &str = "unknown-character";

    /// Extension for every persisted document
    pub const DOCUMENT_EXTENSION: &str = "json";
}

/// On-disk layout below the data directory
pub mod paths {
    /// Application directory name under the platform config/data dirs
    pub const APP_DIR: &str = "tera-settings-sync";

    /// Engine configuration filename
    pub const CONFIG_FILENAME: &str = "config.json";

    /// Subdirectory holding per-character documents
    pub const CHARACTERS_DIR: &str = "characters";

    /// Subdirectory holding named profiles
    pub const PROFILES_DIR: &str = "profiles";
}

/// Hooked message names as the host reports them
pub mod messages {
    pub const S_LOAD_CLIENT_ACCOUNT_SETTING: &str = "S_LOAD_CLIENT_ACCOUNT_SETTING";
    pub const S_LOAD_CLIENT_USER_SETTING: &str = "S_LOAD_CLIENT_USER_SETTING";
    pub const C_SAVE_CLIENT_ACCOUNT_SETTING: &str = "C_SAVE_CLIENT_ACCOUNT_SETTING";
    pub const C_SAVE_CLIENT_USER_SETTING: &str = "C_SAVE_CLIENT_USER_SETTING";

    /// Client finished loading the zone topology (fully in game)
    pub const C_LOAD_TOPO_FIN: &str = "C_LOAD_TOPO_FIN";

    pub const C_RETURN_TO_LOBBY: &str = "C_RETURN_TO_LOBBY";
    pub const S_RETURN_TO_LOBBY: &str = "S_RETURN_TO_LOBBY";
}

/// Packet header layout, in hex characters
pub mod packet {
    /// Width of the 2-byte length field
    pub const LENGTH_HEX_WIDTH: usize = 4;

    /// Width of the 2-byte opcode field
    pub const OPCODE_HEX_WIDTH: usize = 4;

    /// Smallest buffer that carries a full header
    pub const MIN_PACKET_BYTES: usize = (LENGTH_HEX_WIDTH + OPCODE_HEX_WIDTH) / 2;
}

/// Deferred task timing (milliseconds)
pub mod timing {
    /// Gap between account and user reapplication
    pub const DEFAULT_REAPPLY_GAP_MS: u64 = 150;

    /// Delay before a correction is re-injected
    pub const DEFAULT_CORRECTION_DELAY_MS: u64 = 100;

    /// The client drops back-to-back settings loads, so zero is never allowed
    pub const MIN_DELAY_MS: u64 = 50;

    pub const MAX_DELAY_MS: u64 = 1000;
}

/// Environment variable names
pub mod env {
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const MODE: &str = "SETTINGS_SYNC_MODE";
    pub const DATA_DIR: &str = "SETTINGS_SYNC_DATA_DIR";
}
