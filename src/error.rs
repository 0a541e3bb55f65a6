//! Error taxonomy for the sync engine
//!
//! Nothing here is ever allowed to reach the host: handlers convert these
//! into log lines and user notices at their boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Failures converting between raw packets and [`crate::codec::PacketRecord`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Buffer cannot hold the 2-byte length and 2-byte opcode header
    #[error("packet too short: {actual} bytes (need at least {required})")]
    TooShort { actual: usize, required: usize },

    /// A record field is empty or missing
    #[error("corrupt record: {field} field is empty")]
    CorruptRecord { field: &'static str },

    /// Record fields do not concatenate to valid hex
    #[error("corrupt record: invalid hex ({0})")]
    InvalidHex(#[from] hex::FromHexError),
}

impl CodecError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. } | Self::InvalidHex(_))
    }
}

/// Engine-level failures
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("file I/O failed for {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("client injection failed: {0}")]
    Injection(String),

    #[error("unexpected failure: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
