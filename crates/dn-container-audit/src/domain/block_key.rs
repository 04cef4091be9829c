//! # Composite Block Keys
//!
//! A block is identified by `(containerID, localID)`. Depending on the store's
//! scan output the pair arrives in one of three shapes:
//!
//! | Source | Shape |
//! |--------|-------|
//! | record value | `{"blockID": {"containerBlockID": {"containerID": 7, "localID": 42}}}` |
//! | raw key | `{"containerID": 7, "localID": 42}` (JSON object) |
//! | raw key | `7\|42` (delimited) |
//!
//! All of them normalize to the same `BlockKey`. The embedded record value
//! takes precedence over the raw key.

use crate::domain::entities::{ContainerId, LocalId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Separator of the delimited key encoding.
pub const KEY_DELIMITER: char = '|';

/// Normalized composite block key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub container_id: ContainerId,
    pub local_id: LocalId,
}

/// Why a scanned entry's key could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    #[error("no embedded blockID and key `{0}` is not `containerID|localID`")]
    Unrecognized(String),

    #[error("`{0}` is missing or not an integer or string")]
    InvalidField(&'static str),
}

impl BlockKey {
    pub fn new(container_id: impl Into<ContainerId>, local_id: impl Into<LocalId>) -> Self {
        Self {
            container_id: container_id.into(),
            local_id: local_id.into(),
        }
    }

    /// Resolve the key of one scanned entry.
    pub fn decode(raw_key: &str, record: &Value) -> Result<Self, KeyDecodeError> {
        if let Some(embedded) = record.pointer("/blockID/containerBlockID") {
            return Self::from_structured(embedded);
        }

        let trimmed = raw_key.trim();
        if trimmed.starts_with('{') {
            if let Ok(structured) = serde_json::from_str::<Value>(trimmed) {
                let inner = structured
                    .pointer("/containerBlockID")
                    .unwrap_or(&structured);
                return Self::from_structured(inner);
            }
        }

        Self::from_delimited(trimmed)
    }

    /// `{"containerID": .., "localID": ..}`
    pub fn from_structured(value: &Value) -> Result<Self, KeyDecodeError> {
        let container_id = value
            .get("containerID")
            .and_then(opaque_id)
            .ok_or(KeyDecodeError::InvalidField("containerID"))?;
        let local_id = value
            .get("localID")
            .and_then(opaque_id)
            .ok_or(KeyDecodeError::InvalidField("localID"))?;
        Ok(Self::new(container_id, local_id))
    }

    /// `containerID|localID`
    pub fn from_delimited(raw: &str) -> Result<Self, KeyDecodeError> {
        let unrecognized = || KeyDecodeError::Unrecognized(raw.to_string());
        let (container_id, local_id) = raw.split_once(KEY_DELIMITER).ok_or_else(unrecognized)?;
        let (container_id, local_id) = (container_id.trim(), local_id.trim());
        if container_id.is_empty() || local_id.is_empty() || local_id.contains(KEY_DELIMITER) {
            return Err(unrecognized());
        }
        Ok(Self::new(container_id, local_id))
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.container_id, KEY_DELIMITER, self.local_id)
    }
}

/// Identifier as an opaque string: integers and non-empty strings only.
pub fn opaque_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Serde helper for identifier fields that may be integers or strings.
pub fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    opaque_id(&value).ok_or_else(|| D::Error::custom("identifier must be an integer or a string"))
}
