//! Reconciliation between live client settings and the charfile
//!
//! One engine per connection. It observes settings packets in both
//! directions, keeps the live cache, compares it with the persisted document
//! and, depending on [`ReconcileMode`], reports drift or corrects it by
//! re-injecting the persisted packet.
//!
//! Every public handler is a boundary: errors are logged and the handler
//! degrades to pass-through. Nothing here may destabilize the host.

use std::path::PathBuf;
use tracing::{debug, error, info, trace, warn};

use crate::codec::{settings_equal, PacketRecord};
use crate::config::{EngineConfig, ReconcileMode};
use crate::error::{SyncError, SyncResult};
use crate::host::{DeferredAction, DeferredTask, Host, HookedMessage};
use crate::persistence::{has_contents, load_document, save_document, SettingsDocument, SettingsStore};
use crate::session::SessionLifecycleTracker;
use crate::types::{CharacterInfo, SettingKind};

/// Document used while no character is bound; locked so nothing writes it
fn inert_document() -> SettingsDocument {
    SettingsDocument {
        lock: true,
        ..SettingsDocument::default()
    }
}

pub struct ReconciliationEngine<H: Host> {
    pub(crate) config: EngineConfig,
    pub(crate) store: SettingsStore,
    pub(crate) host: H,
    pub(crate) session: SessionLifecycleTracker,
    /// Last known contents of the bound character's file
    pub(crate) persisted: SettingsDocument,
}

impl<H: Host> ReconciliationEngine<H> {
    pub fn new(config: EngineConfig, host: H) -> Self {
        let store = SettingsStore::new(&config.data_dir);
        info!(data_dir = %store.data_dir().display(), mode = %config.mode, "Settings sync engine created");
        Self {
            config,
            store,
            host,
            session: SessionLifecycleTracker::new(),
            persisted: inert_document(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self) -> &SessionLifecycleTracker {
        &self.session
    }

    pub fn persisted(&self) -> &SettingsDocument {
        &self.persisted
    }

    /// Path of the bound character's document
    pub fn character_path(&self) -> Option<PathBuf> {
        self.session
            .context()
            .character_key
            .as_deref()
            .map(|key| self.store.character_path(key))
    }

    /// Live value equals the persisted one for `kind`
    pub fn live_matches(&self, kind: SettingKind) -> bool {
        settings_equal(self.session.context().live.get(kind), self.persisted.get(kind))
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    pub fn on_enter_game(&mut self, character: &CharacterInfo) {
        if let Err(e) = self.try_enter_game(character) {
            error!(error = %e, character = ?character.name, "Failed to bind character, settings sync inactive for this session");
            self.session.disconnect();
            self.persisted = inert_document();
        }
    }

    fn try_enter_game(&mut self, character: &CharacterInfo) -> SyncResult<()> {
        let key = character.character_key();
        self.store.ensure_dirs()?;

        let path = self.store.character_path(&key);
        let document = load_document(&path);
        if !has_contents(&path) && save_document(&path, &document) {
            info!(path = %path.display(), "Initialized new settings file");
        }

        self.session.enter_game(key.clone());
        info!(character = %key, path = %path.display(), lock = document.lock, "Entered game");
        self.persisted = document;
        Ok(())
    }

    pub fn on_topology_ready(&mut self) {
        self.session.topology_ready();
    }

    /// Lobby return and disconnect both tear the session down
    pub fn on_return_to_lobby(&mut self) {
        self.session.disconnect();
        self.persisted = inert_document();
    }

    // ==========================================================================
    // Packet hooks
    // ==========================================================================

    /// Route a raw hook by message name. Returns whether the packet passes through.
    pub fn on_packet(&mut self, name: &str, buffer: &[u8], synthetic: bool) -> bool {
        match HookedMessage::from_name(name) {
            Some(HookedMessage::ServerSettings(kind)) => self.on_server_settings(kind, buffer, synthetic),
            Some(HookedMessage::ClientSave(kind)) => self.on_client_save(kind, buffer, synthetic),
            Some(HookedMessage::TopologyReady) => {
                self.on_topology_ready();
                true
            }
            Some(HookedMessage::ReturnToLobby) => {
                self.on_return_to_lobby();
                true
            }
            None => {
                trace!(message = name, "Unhooked message");
                true
            }
        }
    }

    /// Packets are only observed in game with a bound character
    fn observing(&self) -> bool {
        self.session.is_in_game() && self.session.context().character_key.is_some()
    }

    /// Server loading settings into the client
    pub fn on_server_settings(&mut self, kind: SettingKind, buffer: &[u8], synthetic: bool) -> bool {
        // Our own corrections come back flagged synthetic
        if synthetic || !self.observing() {
            return true;
        }
        match self.observe_server_settings(kind, buffer) {
            Ok(pass_through) => pass_through,
            Err(e) => {
                error!(kind = %kind, error = %e, "Error handling server settings packet");
                true
            }
        }
    }

    fn observe_server_settings(&mut self, kind: SettingKind, buffer: &[u8]) -> SyncResult<bool> {
        let record = PacketRecord::decode(buffer)?;
        debug!(kind = %kind, bytes = buffer.len(), "Live settings updated from server packet");
        self.session.context_mut().live.set(kind, record.clone());
        let first_sync = self.mark_initial_sync();

        match self.config.mode {
            ReconcileMode::Report => {
                self.report_server_update(kind, first_sync);
                Ok(true)
            }
            ReconcileMode::Correct => Ok(self.correct_server_update(kind, record, buffer)),
        }
    }

    /// Returns true exactly once per session, when both kinds are first known
    fn mark_initial_sync(&mut self) -> bool {
        let ctx = self.session.context_mut();
        if ctx.initial_sync_complete || !ctx.live.is_complete() {
            return false;
        }
        ctx.initial_sync_complete = true;
        info!("Initial live client settings (account & user) received");
        true
    }

    fn report_server_update(&mut self, kind: SettingKind, first_sync: bool) {
        if first_sync {
            for kind in SettingKind::ALL {
                let notice = if self.live_matches(kind) {
                    format!("Live {kind} match charfile.")
                } else {
                    format!("Live {kind} differ from charfile.")
                };
                self.host.message(&notice);
            }
        } else if self.session.context().initial_sync_complete && !self.live_matches(kind) {
            self.host.message(&format!(
                "Live {kind} now differ from charfile. Consider 'settings save' or 'settings reload'."
            ));
        }
    }

    /// Compares bytes, not hex text: a record differing only in hex case is not drift
    fn correct_server_update(&mut self, kind: SettingKind, observed: PacketRecord, buffer: &[u8]) -> bool {
        let Some(expected) = self.persisted.get(kind).cloned() else {
            if self.persisted.lock {
                debug!(kind = %kind, "Charfile locked, not adopting live settings");
                return true;
            }
            let mut document = self.persisted.clone();
            document.set(kind, Some(observed));
            if self.persist_character(document) {
                info!(kind = %kind, "Adopted live settings into empty charfile slot");
            }
            return true;
        };

        match expected.encode() {
            Ok(expected) if expected == buffer => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(kind = %kind, error = %e, "Charfile record is corrupt, letting live settings through");
                return true;
            }
        }

        let task = DeferredTask {
            generation: self.session.generation(),
            action: DeferredAction::Correct(kind),
        };
        info!(kind = %kind, delay_ms = self.config.correction_delay_ms, "Live settings drifted, scheduling correction");
        self.host.schedule(self.config.correction_delay(), task);
        false
    }

    /// Client asking the server to store its settings
    pub fn on_client_save(&mut self, kind: SettingKind, buffer: &[u8], synthetic: bool) -> bool {
        if synthetic || !self.observing() {
            return true;
        }
        if let Err(e) = self.observe_client_save(kind, buffer) {
            error!(kind = %kind, error = %e, "Error handling client save packet");
        }
        true
    }

    fn observe_client_save(&mut self, kind: SettingKind, buffer: &[u8]) -> SyncResult<()> {
        let record = PacketRecord::decode(buffer)?;
        debug!(kind = %kind, "Client trying to save settings, live cache updated");
        self.session.context_mut().live.set(kind, record.clone());

        if self.persisted.lock {
            return Ok(());
        }
        match self.config.mode {
            ReconcileMode::Report => {
                if !self.live_matches(kind) {
                    self.host.message(&format!(
                        "Live {kind} changed by game. Use 'settings save' to persist to charfile."
                    ));
                }
            }
            ReconcileMode::Correct => {
                let mut document = self.persisted.clone();
                document.set(kind, Some(record));
                if self.persist_character(document) {
                    info!(kind = %kind, "Merged client save into charfile");
                }
            }
        }
        Ok(())
    }

    /// Write `document` to the bound charfile; it becomes the persisted state
    /// only if the write succeeded
    pub(crate) fn persist_character(&mut self, document: SettingsDocument) -> bool {
        let Some(path) = self.character_path() else {
            warn!("No character bound, refusing to write charfile");
            return false;
        };
        if save_document(&path, &document) {
            self.persisted = document;
            true
        } else {
            false
        }
    }

    // ==========================================================================
    // Deferred tasks
    // ==========================================================================

    /// Entry point for tasks handed to [`Host::schedule`]
    pub fn run_deferred(&mut self, task: DeferredTask) {
        if task.generation != self.session.generation() {
            debug!(task = ?task.action, scheduled = task.generation, current = self.session.generation(), "Dropping stale deferred task");
            return;
        }
        if !self.session.is_in_game() {
            debug!(task = ?task.action, "Dropping deferred task outside of game");
            return;
        }

        match task.action {
            DeferredAction::Reapply(kind) => {
                self.apply_to_client(kind);
            }
            DeferredAction::Correct(kind) => self.correct_client(kind),
        }
    }

    /// Re-read the charfile record at fire time; it may have changed since scheduling
    fn correct_client(&mut self, kind: SettingKind) {
        let Some(record) = self.persisted.get(kind).cloned() else {
            debug!(kind = %kind, "Charfile slot emptied before correction, nothing to do");
            return;
        };
        match self.inject_record(kind, &record) {
            Ok(()) => {
                info!(kind = %kind, "Corrected live settings from charfile");
                self.host.message(&format!("Live {kind} differed from charfile; charfile settings re-applied."));
            }
            Err(e) => error!(kind = %kind, error = %e, "Failed to correct live settings"),
        }
    }

    // ==========================================================================
    // Reapplication
    // ==========================================================================

    /// Push the persisted record for `kind` into the client
    pub fn apply_to_client(&mut self, kind: SettingKind) -> bool {
        let Some(record) = self.persisted.get(kind).cloned() else {
            debug!(kind = %kind, "No persisted data to apply");
            self.host.message(&format!("No {kind} found in character file to apply."));
            return false;
        };

        match self.inject_record(kind, &record) {
            Ok(()) => {
                self.host.message(&format!("{kind} from character file applied to game."));
                true
            }
            Err(SyncError::Codec(e)) if e.is_corrupt() => {
                error!(kind = %kind, error = %e, "Charfile data incomplete or corrupt");
                self.host.message(&format!("Data for {kind} in character file appears corrupt."));
                false
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Error applying settings to client");
                self.host.message(&format!("Error applying {kind} to client."));
                false
            }
        }
    }

    /// Encode, inject, and record what the client now holds
    fn inject_record(&mut self, kind: SettingKind, record: &PacketRecord) -> SyncResult<()> {
        let buffer = record.encode()?;
        self.host
            .inject_to_client(&buffer)
            .map_err(|e| SyncError::Injection(format!("{e:#}")))?;
        self.session.context_mut().live.set(kind, record.clone());
        Ok(())
    }

    /// Account now, user after the reapply gap. The client cannot absorb two
    /// settings loads back to back.
    pub fn reload_all(&mut self) {
        info!("Reloading all settings from charfile to client");
        self.apply_to_client(SettingKind::Account);

        let task = DeferredTask {
            generation: self.session.generation(),
            action: DeferredAction::Reapply(SettingKind::User),
        };
        self.host.schedule(self.config.reapply_gap(), task);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::testing::RecordingHost;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    pub const ACCOUNT_A: &[u8] = &[0x08, 0x00, 0x9c, 0x4e, 0xaa, 0xbb, 0xcc, 0xdd];
    pub const ACCOUNT_B: &[u8] = &[0x08, 0x00, 0x9c, 0x4e, 0x11, 0x22, 0x33, 0x44];
    pub const USER_A: &[u8] = &[0x07, 0x00, 0x3b, 0xe1, 0x01, 0x02, 0x03];
    pub const USER_B: &[u8] = &[0x07, 0x00, 0x3b, 0xe1, 0x09, 0x08, 0x07];

    pub fn engine(mode: ReconcileMode) -> (TempDir, ReconciliationEngine<RecordingHost>) {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            mode,
            data_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        (dir, ReconciliationEngine::new(config, RecordingHost::default()))
    }

    pub fn enter(engine: &mut ReconciliationEngine<RecordingHost>) {
        engine.on_enter_game(&CharacterInfo::new("Tester", Some(27)));
        engine.on_topology_ready();
    }

    fn rec(buffer: &[u8]) -> PacketRecord {
        PacketRecord::decode(buffer).unwrap()
    }

    fn write_charfile(engine: &ReconciliationEngine<RecordingHost>, doc: &SettingsDocument) {
        let path = engine.store().character_path("Tester-27");
        assert!(save_document(&path, doc));
    }

    #[test]
    fn test_enter_game_creates_default_file() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        enter(&mut engine);

        let path = engine.character_path().unwrap();
        assert!(path.ends_with("characters/Tester-27.json"));
        assert!(path.exists());
        assert_eq!(load_document(&path), SettingsDocument::default());
        assert_eq!(engine.persisted(), &SettingsDocument::default());
    }

    #[test]
    fn test_enter_game_failure_is_inert() {
        let dir = TempDir::new().unwrap();
        // Data dir is a file: directories cannot be created below it
        let blocker = dir.path().join("data");
        fs::write(&blocker, "x").unwrap();
        let config = EngineConfig {
            data_dir: blocker,
            ..EngineConfig::default()
        };
        let mut engine = ReconciliationEngine::new(config, RecordingHost::default());

        engine.on_enter_game(&CharacterInfo::new("Tester", Some(27)));
        engine.on_topology_ready();

        assert_eq!(engine.character_path(), None);
        assert!(engine.persisted().lock);
        assert!(!engine.session().is_in_game());
        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(!engine.session().context().live.is_populated(SettingKind::Account));
    }

    #[test]
    fn test_packets_ignored_before_topology() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        engine.on_enter_game(&CharacterInfo::new("Tester", Some(27)));

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(!engine.session().context().live.is_populated(SettingKind::Account));
    }

    #[test]
    fn test_report_initial_sync_both_differ() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(engine.host().messages.is_empty());
        assert!(engine.on_server_settings(SettingKind::User, USER_A, false));

        let ctx = engine.session().context();
        assert!(ctx.initial_sync_complete);
        assert!(ctx.live.is_complete());
        assert_eq!(
            engine.host().messages,
            vec![
                "Live accountSettings differ from charfile.".to_string(),
                "Live userSettings differ from charfile.".to_string(),
            ]
        );
    }

    #[test]
    fn test_report_initial_sync_match_then_drift() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), Some(rec(USER_A))));
        enter(&mut engine);

        engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false);
        engine.on_server_settings(SettingKind::User, USER_A, false);
        assert_eq!(
            engine.host_mut().take_messages(),
            vec!["Live accountSettings match charfile.", "Live userSettings match charfile."]
        );

        engine.on_server_settings(SettingKind::User, USER_B, false);
        assert_eq!(
            engine.host_mut().take_messages(),
            vec!["Live userSettings now differ from charfile. Consider 'settings save' or 'settings reload'."]
        );
    }

    #[test]
    fn test_synthetic_deliveries_ignored() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, true));
        assert!(engine.on_client_save(SettingKind::User, USER_A, true));
        assert_eq!(engine.session().context().live.get(SettingKind::Account), None);
        assert_eq!(engine.persisted(), &SettingsDocument::default());
    }

    #[test]
    fn test_short_packet_passes_through() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        enter(&mut engine);
        assert!(engine.on_server_settings(SettingKind::Account, &[0x01], false));
        assert!(!engine.session().context().live.is_populated(SettingKind::Account));
    }

    #[test]
    fn test_report_client_save_notifies_when_unlocked() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        enter(&mut engine);

        assert!(engine.on_client_save(SettingKind::Account, ACCOUNT_B, false));
        assert!(engine.host().said("Live accountSettings changed by game."));
        assert_eq!(engine.session().context().live.get(SettingKind::Account), Some(&rec(ACCOUNT_B)));
        // Report mode never writes
        assert_eq!(engine.persisted(), &SettingsDocument::default());
    }

    #[test]
    fn test_report_client_save_silent_when_locked() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        write_charfile(&engine, &SettingsDocument { lock: true, ..SettingsDocument::default() });
        enter(&mut engine);

        engine.on_client_save(SettingKind::Account, ACCOUNT_B, false);
        assert!(engine.host().messages.is_empty());
    }

    #[test]
    fn test_correct_adopts_into_empty_slot() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        let path = engine.character_path().unwrap();
        assert_eq!(load_document(&path).account_settings, Some(rec(ACCOUNT_A)));
        assert!(engine.host().scheduled.is_empty());
    }

    #[test]
    fn test_correct_locked_does_not_adopt() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        let locked = SettingsDocument { lock: true, ..SettingsDocument::default() };
        write_charfile(&engine, &locked);
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert_eq!(load_document(&engine.character_path().unwrap()), locked);
    }

    #[test]
    fn test_correct_consumes_and_reinjects_drift() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), None));
        enter(&mut engine);

        assert!(!engine.on_server_settings(SettingKind::Account, ACCOUNT_B, false));
        let scheduled = engine.host_mut().take_scheduled();
        assert_eq!(scheduled.len(), 1);
        let (delay, task) = scheduled[0].clone();
        assert_eq!(delay, Duration::from_millis(100));
        assert_eq!(task.action, DeferredAction::Correct(SettingKind::Account));

        engine.run_deferred(task);
        assert_eq!(engine.host().injected, vec![ACCOUNT_A.to_vec()]);
        assert!(engine.live_matches(SettingKind::Account));

        // The loopback echo of our own injection must not trigger another round
        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, true));
        assert!(engine.host().scheduled.is_empty());
    }

    #[test]
    fn test_correct_equal_passes_through() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), None));
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(engine.host().scheduled.is_empty());
    }

    #[test]
    fn test_correct_uppercase_charfile_is_not_drift() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        let upper = PacketRecord::new("0800", "9C4E", "AABBCCDD");
        write_charfile(&engine, &SettingsDocument::new(Some(upper), None));
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(engine.host().scheduled.is_empty());
    }

    #[test]
    fn test_correct_corrupt_charfile_passes_through() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        let corrupt = PacketRecord::new("0800", "9c4e", "");
        write_charfile(&engine, &SettingsDocument::new(Some(corrupt), None));
        enter(&mut engine);

        assert!(engine.on_server_settings(SettingKind::Account, ACCOUNT_A, false));
        assert!(engine.host().scheduled.is_empty());
    }

    #[test]
    fn test_correct_client_save_locked_does_not_write() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        let locked = SettingsDocument {
            lock: true,
            ..SettingsDocument::new(Some(rec(ACCOUNT_A)), None)
        };
        write_charfile(&engine, &locked);
        enter(&mut engine);

        assert!(engine.on_client_save(SettingKind::Account, ACCOUNT_B, false));
        assert_eq!(load_document(&engine.character_path().unwrap()), locked);
        assert_eq!(engine.persisted(), &locked);
    }

    #[test]
    fn test_correct_client_save_merges() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), Some(rec(USER_A))));
        enter(&mut engine);

        assert!(engine.on_client_save(SettingKind::User, USER_B, false));
        let on_disk = load_document(&engine.character_path().unwrap());
        assert_eq!(on_disk.user_settings, Some(rec(USER_B)));
        assert_eq!(on_disk.account_settings, Some(rec(ACCOUNT_A)));
        assert_eq!(engine.persisted(), &on_disk);
    }

    #[test]
    fn test_stale_task_after_disconnect_is_noop() {
        let (_dir, mut engine) = engine(ReconcileMode::Correct);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), None));
        enter(&mut engine);
        engine.on_server_settings(SettingKind::Account, ACCOUNT_B, false);
        let (_, task) = engine.host_mut().take_scheduled().remove(0);

        engine.on_return_to_lobby();
        engine.run_deferred(task.clone());
        assert!(engine.host().injected.is_empty());

        // Even after re-entering the same character the old generation stays dead
        enter(&mut engine);
        engine.run_deferred(task);
        assert!(engine.host().injected.is_empty());
    }

    #[test]
    fn test_reload_all_orders_account_then_user() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), Some(rec(USER_A))));
        enter(&mut engine);

        engine.reload_all();
        assert_eq!(engine.host().injected, vec![ACCOUNT_A.to_vec()]);

        let scheduled = engine.host_mut().take_scheduled();
        assert_eq!(scheduled.len(), 1);
        let (gap, task) = scheduled[0].clone();
        assert!(gap > Duration::ZERO);
        assert_eq!(task.action, DeferredAction::Reapply(SettingKind::User));

        engine.run_deferred(task);
        assert_eq!(engine.host().injected, vec![ACCOUNT_A.to_vec(), USER_A.to_vec()]);
        assert!(engine.host().said("userSettings from character file applied to game."));
    }

    #[test]
    fn test_apply_corrupt_record() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        write_charfile(&engine, &SettingsDocument::new(Some(PacketRecord::new("0800", "", "aa")), None));
        enter(&mut engine);

        assert!(!engine.apply_to_client(SettingKind::Account));
        assert!(engine.host().said("Data for accountSettings in character file appears corrupt."));
        assert!(engine.host().injected.is_empty());
    }

    #[test]
    fn test_apply_injection_failure() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        write_charfile(&engine, &SettingsDocument::new(Some(rec(ACCOUNT_A)), None));
        enter(&mut engine);
        engine.host_mut().fail_injection = true;

        assert!(!engine.apply_to_client(SettingKind::Account));
        assert!(engine.host().said("Error applying accountSettings to client."));
        assert!(!engine.session().context().live.is_populated(SettingKind::Account));
    }

    #[test]
    fn test_on_packet_routes_by_name() {
        let (_dir, mut engine) = engine(ReconcileMode::Report);
        engine.on_enter_game(&CharacterInfo::new("Tester", Some(27)));
        assert!(engine.on_packet("C_LOAD_TOPO_FIN", &[], false));
        assert!(engine.session().is_in_game());

        assert!(engine.on_packet("S_LOAD_CLIENT_USER_SETTING", USER_A, false));
        assert!(engine.session().context().live.is_populated(SettingKind::User));
        assert!(engine.on_packet("S_SOMETHING_ELSE", &[1, 2, 3, 4], false));

        assert!(engine.on_packet("S_RETURN_TO_LOBBY", &[], false));
        assert!(!engine.session().is_in_game());
        assert_eq!(engine.character_path(), None);
    }
}
