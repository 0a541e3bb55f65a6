//! Keeps a per-character settings file in sync with a live game client
//!
//! The host feeds lifecycle events and raw settings packets into a
//! [`ReconciliationEngine`]; the engine tracks the live values, compares them
//! with the persisted document and reports or corrects drift. The `settings`
//! chat command saves, loads and reapplies documents and profiles.

#![forbid(unsafe_code)]

pub mod codec;
pub mod commands;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod host;
pub mod persistence;
pub mod replay;
pub mod session;
pub mod types;

pub use codec::PacketRecord;
pub use commands::SettingsCommand;
pub use config::{EngineConfig, ReconcileMode};
pub use engine::ReconciliationEngine;
pub use error::{CodecError, SyncError};
pub use host::{DeferredAction, DeferredTask, Host, HookedMessage};
pub use persistence::{SettingsDocument, SettingsStore};
pub use session::{LifecycleState, SessionContext};
pub use types::{CharacterInfo, SettingKind};
