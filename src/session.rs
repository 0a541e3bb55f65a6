//! Session lifecycle tracking
//!
//! All per-connection state lives in one [`SessionContext`] that is replaced
//! as a unit on every lifecycle transition. Each replacement advances the
//! generation, which is how deferred tasks scheduled for an older session
//! recognise themselves as stale.

use tracing::{debug, info};

use crate::codec::PacketRecord;
use crate::types::SettingKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Disconnected,
    /// Character selected, world not loaded yet
    CharacterBound,
    /// Topology loaded; packets may be observed
    InGame,
}

/// Most recently observed live settings, one slot per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStateCache {
    account: Option<PacketRecord>,
    user: Option<PacketRecord>,
}

impl LiveStateCache {
    pub fn get(&self, kind: SettingKind) -> Option<&PacketRecord> {
        match kind {
            SettingKind::Account => self.account.as_ref(),
            SettingKind::User => self.user.as_ref(),
        }
    }

    pub fn set(&mut self, kind: SettingKind, record: PacketRecord) {
        match kind {
            SettingKind::Account => self.account = Some(record),
            SettingKind::User => self.user = Some(record),
        }
    }

    pub fn is_populated(&self, kind: SettingKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.account.is_some() && self.user.is_some()
    }
}

/// Ephemeral state for one connection
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// `None` until enter_game succeeds
    pub character_key: Option<String>,
    pub state: LifecycleState,
    pub live: LiveStateCache,
    pub initial_sync_complete: bool,
    generation: u64,
}

impl SessionContext {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Drives [`SessionContext`] through `Disconnected → CharacterBound → InGame`
#[derive(Debug, Default)]
pub struct SessionLifecycleTracker {
    context: SessionContext,
}

impl SessionLifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn state(&self) -> LifecycleState {
        self.context.state
    }

    pub fn generation(&self) -> u64 {
        self.context.generation
    }

    pub fn is_in_game(&self) -> bool {
        self.context.state == LifecycleState::InGame
    }

    /// Fresh context bound to `character_key`; valid from any state
    pub fn enter_game(&mut self, character_key: String) {
        self.reset();
        info!(character = %character_key, generation = self.context.generation, "Character bound to session");
        self.context.character_key = Some(character_key);
        self.context.state = LifecycleState::CharacterBound;
    }

    /// Topology finished loading. Returns true when this moved the session in game
    pub fn topology_ready(&mut self) -> bool {
        match self.context.state {
            LifecycleState::CharacterBound => {
                self.context.state = LifecycleState::InGame;
                info!("Topology loaded. Client fully in-game.");
                true
            }
            LifecycleState::InGame => {
                debug!("Topology reloaded while in game");
                false
            }
            LifecycleState::Disconnected => {
                debug!("Topology signal without a bound character, ignoring");
                false
            }
        }
    }

    /// Lobby return or disconnect from any state
    pub fn disconnect(&mut self) {
        self.reset();
        info!(generation = self.context.generation, "Returned to lobby or disconnected");
    }

    /// Drop everything and invalidate deferred tasks of the old session
    fn reset(&mut self) {
        let generation = self.context.generation.wrapping_add(1);
        self.context = SessionContext {
            generation,
            ..SessionContext::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: &str) -> PacketRecord {
        PacketRecord::new("0800", "0101", payload)
    }

    #[test]
    fn test_full_lifecycle() {
        let mut tracker = SessionLifecycleTracker::new();
        assert_eq!(tracker.state(), LifecycleState::Disconnected);

        tracker.enter_game("Mage-27".to_string());
        assert_eq!(tracker.state(), LifecycleState::CharacterBound);
        assert_eq!(tracker.context().character_key.as_deref(), Some("Mage-27"));
        assert!(!tracker.is_in_game());

        assert!(tracker.topology_ready());
        assert!(tracker.is_in_game());

        tracker.disconnect();
        assert_eq!(tracker.state(), LifecycleState::Disconnected);
        assert_eq!(tracker.context().character_key, None);
    }

    #[test]
    fn test_topology_without_character_ignored() {
        let mut tracker = SessionLifecycleTracker::new();
        assert!(!tracker.topology_ready());
        assert_eq!(tracker.state(), LifecycleState::Disconnected);
    }

    #[test]
    fn test_repeated_topology_stays_in_game() {
        let mut tracker = SessionLifecycleTracker::new();
        tracker.enter_game("Mage-27".to_string());
        tracker.topology_ready();
        tracker.context_mut().live.set(SettingKind::Account, record("aa"));

        assert!(!tracker.topology_ready());
        assert!(tracker.is_in_game());
        assert!(tracker.context().live.is_populated(SettingKind::Account));
    }

    #[test]
    fn test_reentry_resets_context() {
        let mut tracker = SessionLifecycleTracker::new();
        tracker.enter_game("Mage-27".to_string());
        tracker.topology_ready();
        tracker.context_mut().live.set(SettingKind::Account, record("aa"));
        tracker.context_mut().live.set(SettingKind::User, record("bb"));
        tracker.context_mut().initial_sync_complete = true;
        let before = tracker.generation();

        tracker.enter_game("Warrior-27".to_string());
        let ctx = tracker.context();
        assert_eq!(ctx.character_key.as_deref(), Some("Warrior-27"));
        assert_eq!(ctx.live, LiveStateCache::default());
        assert!(!ctx.initial_sync_complete);
        assert_eq!(ctx.state, LifecycleState::CharacterBound);
        assert!(tracker.generation() > before);
    }

    #[test]
    fn test_disconnect_advances_generation() {
        let mut tracker = SessionLifecycleTracker::new();
        tracker.enter_game("Mage-27".to_string());
        let bound = tracker.generation();
        tracker.disconnect();
        assert_ne!(tracker.generation(), bound);
    }

    #[test]
    fn test_live_cache_completeness() {
        let mut cache = LiveStateCache::default();
        assert!(!cache.is_complete());
        cache.set(SettingKind::User, record("01"));
        assert!(!cache.is_complete());
        cache.set(SettingKind::Account, record("02"));
        assert!(cache.is_complete());
        assert_eq!(cache.get(SettingKind::User), Some(&record("01")));
    }
}
