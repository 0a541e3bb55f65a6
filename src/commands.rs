//! `settings` chat command
//!
//! The host's command parser hands us the raw argument list; everything the
//! user sees comes back through [`Host::message`].

use tracing::{error, info};

use crate::persistence::{load_document, save_document, SettingsDocument};
use crate::engine::ReconciliationEngine;
use crate::host::Host;
use crate::types::{sanitize_name, SettingKind};

/// Name the command is registered under
pub const COMMAND_NAME: &str = "settings";

const NOT_READY: &str = "Mod not fully initialized or not in game. Please try again shortly.";

const USAGE: [&str; 8] = [
    "--- TeraSettingsSaver ---",
    " settings save - Save live game settings to this character's file.",
    " settings load <profile> - Load <profile>.json to charfile & apply to live game.",
    " settings saveas <profile> - Save live game settings as <profile>.json.",
    " settings reload - Apply charfile settings to live game.",
    " settings lock - Toggle lock on charfile.",
    " settings status - Show current status and settings comparisons.",
    " settings profiles - List saved profiles.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    Save,
    Load(Option<String>),
    SaveAs(Option<String>),
    Reload,
    Lock,
    Status,
    Profiles,
    Usage,
}

impl SettingsCommand {
    /// Subcommand is case-insensitive; profile names are taken verbatim
    pub fn parse(args: &[&str]) -> Self {
        let profile = args.get(1).map(|s| s.to_string()).filter(|s| !s.is_empty());
        match args.first().map(|s| s.to_lowercase()).as_deref() {
            Some("save") => Self::Save,
            Some("load") => Self::Load(profile),
            Some("saveas") => Self::SaveAs(profile),
            Some("reload") => Self::Reload,
            Some("lock") => Self::Lock,
            Some("status") => Self::Status,
            Some("profiles") => Self::Profiles,
            _ => Self::Usage,
        }
    }
}

impl<H: Host> ReconciliationEngine<H> {
    pub fn run_command(&mut self, args: &[&str]) {
        let command = SettingsCommand::parse(args);
        info!(command = ?command, "Settings command");
        self.execute(command);
    }

    pub fn execute(&mut self, command: SettingsCommand) {
        if !self.session.is_in_game() || self.character_path().is_none() {
            self.host.message(NOT_READY);
            return;
        }

        match command {
            SettingsCommand::Save => self.save_live_to_charfile(),
            SettingsCommand::Load(Some(profile)) => self.load_profile(&profile),
            SettingsCommand::Load(None) => self.host.message("Usage: settings load <profilename>"),
            SettingsCommand::SaveAs(Some(profile)) => self.save_live_as_profile(&profile),
            SettingsCommand::SaveAs(None) => self.host.message("Usage: settings saveas <profilename>"),
            SettingsCommand::Reload => {
                self.host.message("Reloading settings from charfile to live game...");
                self.reload_all();
            }
            SettingsCommand::Lock => self.toggle_lock(),
            SettingsCommand::Status => self.report_status(),
            SettingsCommand::Profiles => self.list_profiles(),
            SettingsCommand::Usage => {
                for line in USAGE {
                    self.host.message(line);
                }
            }
        }
    }

    fn live_snapshot(&self, lock: bool) -> SettingsDocument {
        let live = &self.session.context().live;
        SettingsDocument {
            lock,
            account_settings: live.get(SettingKind::Account).cloned(),
            user_settings: live.get(SettingKind::User).cloned(),
        }
    }

    fn save_live_to_charfile(&mut self) {
        if self.persisted.lock {
            self.host.message("Charfile is locked. Cannot save. Unlock with 'settings lock'.");
            return;
        }
        if !self.session.context().initial_sync_complete {
            self.host.message("Live client settings not fully captured yet. Please wait.");
            return;
        }

        let snapshot = self.live_snapshot(self.persisted.lock);
        if self.persist_character(snapshot) {
            self.host.message("Live game settings saved to charfile.");
        } else {
            self.host.message("Error saving settings to charfile.");
        }
    }

    fn load_profile(&mut self, profile: &str) {
        if self.persisted.lock {
            self.host.message("Charfile is locked. Cannot load profile. Unlock with 'settings lock'.");
            return;
        }
        if !self.store.profile_exists(profile) {
            self.host.message(&format!("Profile \"{profile}\" not found."));
            return;
        }

        // A profile may carry only one of the two kinds
        let loaded = load_document(&self.store.profile_path(profile));
        if loaded.is_empty() {
            self.host.message(&format!(
                "Profile \"{profile}\" is effectively empty (missing both account & user settings data)."
            ));
            return;
        }

        let document = SettingsDocument::new(loaded.account_settings, loaded.user_settings);
        if self.persist_character(document) {
            info!(profile = %profile, "Profile applied to charfile");
            self.host.message(&format!("Profile \"{profile}\" applied to charfile."));
            self.reload_all();
        } else {
            self.host.message(&format!("Error applying profile \"{profile}\" to charfile."));
        }
    }

    /// Profiles ignore the charfile lock and are always written unlocked
    fn save_live_as_profile(&mut self, profile: &str) {
        if !self.session.context().initial_sync_complete {
            self.host.message("Live client settings not fully captured yet. Cannot save profile.");
            return;
        }

        let name = sanitize_name(profile);
        let path = self.store.profile_path(profile);
        if save_document(&path, &self.live_snapshot(false)) {
            self.host.message(&format!("Live game settings saved as new profile: {name}.json"));
        } else {
            self.host.message(&format!("Error saving profile {name}.json"));
        }
    }

    fn toggle_lock(&mut self) {
        let mut document = self.persisted.clone();
        document.lock = !document.lock;
        if self.persist_character(document) {
            let state = if self.persisted.lock { "ON" } else { "OFF" };
            self.host.message(&format!("Charfile lock: {state}."));
        } else {
            self.host.message("Error updating charfile lock status.");
        }
    }

    fn report_status(&mut self) {
        let path = self
            .character_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "N/A (not in game)".to_string());
        let ctx = self.session.context();

        let mut lines = vec![
            "--- Settings Saver Status ---".to_string(),
            format!("Charfile: {path}"),
            format!(" Charfile Lock: {}", self.persisted.lock),
        ];
        for kind in SettingKind::ALL {
            lines.push(format!(" Charfile {} Populated: {}", kind.label(), self.persisted.get(kind).is_some()));
        }
        for kind in SettingKind::ALL {
            lines.push(format!("Live {} Populated: {}", kind.label(), ctx.live.is_populated(kind)));
        }
        if ctx.initial_sync_complete && self.session.is_in_game() {
            for kind in SettingKind::ALL {
                let label = kind.label();
                lines.push(format!(" Live {label} == Charfile {label}: {}", self.live_matches(kind)));
            }
        } else {
            lines.push(" Comparison pending full client settings load.".to_string());
        }

        for line in &lines {
            self.host.message(line);
        }
    }

    fn list_profiles(&mut self) {
        match self.store.list_profiles() {
            Ok(names) if names.is_empty() => self.host.message("No profiles saved."),
            Ok(names) => self.host.message(&format!("Profiles: {}", names.join(", "))),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to list profiles");
                self.host.message("Error listing profiles.");
            }
        }
    }
}
