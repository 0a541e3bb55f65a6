//! Raw settings packet capture and reconstruction
//!
//! Packets are never interpreted: the hex encoding of the buffer is sliced
//! into a 2-byte length, a 2-byte opcode and whatever follows. The length is
//! not checked against the payload.

use serde::{Deserialize, Serialize};

use crate::constants::packet::{LENGTH_HEX_WIDTH, MIN_PACKET_BYTES, OPCODE_HEX_WIDTH};
use crate::error::CodecError;

/// Hex-triple form of one raw settings packet, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Missing members deserialize as empty so a damaged record stays
    /// visible and is rejected at apply time instead of silently dropped
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub opcode: String,
    #[serde(default)]
    pub payload: String,
}

impl PacketRecord {
    pub fn new(length: impl Into<String>, opcode: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            length: length.into(),
            opcode: opcode.into(),
            payload: payload.into(),
        }
    }

    /// Slice a raw packet into its record form
    pub fn decode(buffer: &[u8]) -> Result<Self, CodecError> {
        if buffer.len() < MIN_PACKET_BYTES {
            return Err(CodecError::TooShort {
                actual: buffer.len(),
                required: MIN_PACKET_BYTES,
            });
        }

        let hex = hex::encode(buffer);
        let (length, rest) = hex.split_at(LENGTH_HEX_WIDTH);
        let (opcode, payload) = rest.split_at(OPCODE_HEX_WIDTH);

        Ok(Self::new(length, opcode, payload))
    }

    /// Rebuild the raw packet
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.validate()?;
        let joined = format!("{}{}{}", self.length, self.opcode, self.payload);
        Ok(hex::decode(joined)?)
    }

    /// All three fields must be non-empty before a record may be applied
    pub fn validate(&self) -> Result<(), CodecError> {
        for (field, value) in [
            ("length", &self.length),
            ("opcode", &self.opcode),
            ("payload", &self.payload),
        ] {
            if value.is_empty() {
                return Err(CodecError::CorruptRecord { field });
            }
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Settings equality: both absent is equal, one absent is not, otherwise
/// every field must match
pub fn settings_equal(a: Option<&PacketRecord>, b: Option<&PacketRecord>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
