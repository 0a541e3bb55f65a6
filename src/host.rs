//! Seam between the engine and the add-on host
//!
//! The host owns packet hooks, lifecycle dispatch, the outbound injection
//! primitive, timers and the chat window. The engine only sees this trait.

use std::time::Duration;

use crate::constants::messages;
use crate::types::SettingKind;

/// Work the engine wants done later, tagged with the session generation
/// that scheduled it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredTask {
    pub generation: u64,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Second half of a reload: push the persisted record for this kind
    Reapply(SettingKind),
    /// Override a divergent live value with the persisted one
    Correct(SettingKind),
}

/// Services the engine needs from the host environment
pub trait Host {
    /// Show a line in the user's chat window
    fn message(&mut self, text: &str);

    /// Deliver a raw buffer to the client as if the server sent it.
    /// The host must flag the resulting loopback delivery as synthetic.
    fn inject_to_client(&mut self, buffer: &[u8]) -> anyhow::Result<()>;

    /// Hand `task` back through `ReconciliationEngine::run_deferred` after `delay`.
    /// There is no cancellation; stale tasks are filtered when they run.
    fn schedule(&mut self, delay: Duration, task: DeferredTask);
}

/// Messages the engine registers raw hooks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookedMessage {
    ServerSettings(SettingKind),
    ClientSave(SettingKind),
    TopologyReady,
    ReturnToLobby,
}

impl HookedMessage {
    pub fn from_name(name: &str) -> Option<Self> {
        for kind in SettingKind::ALL {
            if name == kind.server_message() {
                return Some(Self::ServerSettings(kind));
            }
            if name == kind.client_save_message() {
                return Some(Self::ClientSave(kind));
            }
        }
        match name {
            messages::C_LOAD_TOPO_FIN => Some(Self::TopologyReady),
            messages::C_RETURN_TO_LOBBY | messages::S_RETURN_TO_LOBBY => Some(Self::ReturnToLobby),
            _ => None,
        }
    }

    /// Whether a host has to hook `name`
    pub fn is_hooked(name: &str) -> bool {
        Self::hook_names().contains(&name)
    }

    /// Every message name a host has to hook
    pub fn hook_names() -> [&'static str; 7] {
        [
            messages::S_LOAD_CLIENT_ACCOUNT_SETTING,
            messages::S_LOAD_CLIENT_USER_SETTING,
            messages::C_SAVE_CLIENT_ACCOUNT_SETTING,
            messages::C_SAVE_CLIENT_USER_SETTING,
            messages::C_LOAD_TOPO_FIN,
            messages::C_RETURN_TO_LOBBY,
            messages::S_RETURN_TO_LOBBY,
        ]
    }
}
