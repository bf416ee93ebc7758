//! # Snapshot Format
//!
//! Binary serialization for attribute trees.
//!
//! Format: Header (5 bytes) + postcard-serialized tree.
//! - 4 bytes: Magic ("IDEA")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_SNAPSHOT_SIZE};
use crate::{BridgeError, Idea};

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header preceding every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Check magic bytes and version.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if &self.magic != MAGIC_BYTES {
            return Err(BridgeError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(BridgeError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [a, b, c, d] = self.magic;
        [a, b, c, d, self.version]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BridgeError> {
        match bytes {
            [a, b, c, d, version, ..] => Ok(Self {
                magic: [*a, *b, *c, *d],
                version: *version,
            }),
            _ => Err(BridgeError::DeserializationError(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode a tree as header + payload.
pub fn idea_to_bytes(idea: &Idea) -> Result<Vec<u8>, BridgeError> {
    let payload =
        postcard::to_stdvec(idea).map_err(|e| BridgeError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN.saturating_add(payload.len()));
    bytes.extend_from_slice(&SnapshotHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a snapshot produced by [`idea_to_bytes`].
pub fn idea_from_bytes(bytes: &[u8]) -> Result<Idea, BridgeError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(BridgeError::DeserializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    let idea: Idea = postcard::from_bytes(payload).map_err(|e| {
        BridgeError::DeserializationError(format!("Failed to decode snapshot payload: {e}"))
    })?;
    idea.validate()
        .map_err(|e| BridgeError::DeserializationError(format!("Invalid snapshot tree: {e}")))?;
    Ok(idea)
}

/// True when `bytes` start with the snapshot magic.
#[must_use]
pub fn is_snapshot(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC_BYTES)
}

// =============================================================================
// TESTS
// =============================================================================
