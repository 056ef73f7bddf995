//! Record identifiers shared by every catalog collection.
//!
//! Identifiers are twelve opaque bytes. Their public form is a 24-character
//! hex string; anything that does not match `^[a-fA-F0-9]{24}$` is rejected
//! before it reaches a repository.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier `{input}`: expected 24 hex characters")]
pub struct RecordIdError {
    pub input: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; ID_BYTES]);

impl RecordId {
    /// Generate a fresh identifier: big-endian unix seconds followed by
    /// eight random bytes, so ids sort roughly by creation time.
    pub fn generate() -> Self {
        let seconds = OffsetDateTime::now_utc().unix_timestamp().max(0) as u32;
        let random = Uuid::new_v4();

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);
        Self(bytes)
    }

    pub fn parse(input: &str) -> Result<Self, RecordIdError> {
        if input.len() != ID_HEX_LEN || !input.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RecordIdError {
                input: input.to_string(),
            });
        }

        let mut bytes = [0u8; ID_BYTES];
        hex::decode_to_slice(input, &mut bytes).map_err(|_| RecordIdError {
            input: input.to_string(),
        })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RecordId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
