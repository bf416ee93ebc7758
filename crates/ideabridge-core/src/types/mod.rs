//! # Core Type Definitions
//!
//! This module contains the value types shared by every codec:
//! - Scalar leaf values (`Scalar`)
//! - Working-memory handles and triples (`Identifier`, `Wme`, `WmeValue`)
//! - Error types (`BridgeError`)
//!
//! The attribute tree itself lives in [`crate::idea`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SCALAR
// =============================================================================

/// A leaf value carried by an [`Idea`](crate::Idea) or a working-memory edge.
///
/// JSON numbers always widen to `Double`; the kernel has no narrower numeric
/// representation at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Free text (JSON string, kernel symbolic constant).
    Text(String),
    /// A double precision number.
    Double(f64),
    /// A boolean flag.
    Boolean(bool),
}

impl Scalar {
    /// Get the text content if this is a `Text` scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number if this is a `Double` scalar.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the flag if this is a `Boolean` scalar.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to a JSON scalar. Non-finite doubles become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Renders the way the kernel prints constants: `RED`, `4.0`, `true`.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Double(d) => write!(f, "{d:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Scalar {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Double(f64::from(i))
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Double(i as f64)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

// =============================================================================
// WORKING MEMORY IDENTIFIERS
// =============================================================================

/// Opaque handle to a vertex of the kernel's working memory.
///
/// The handle carries the kernel's display symbol (`I3`, `W1`) together with
/// the arena slot and the generation it was issued in. A handle from an older
/// generation is stale and every operation on it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    letter: char,
    number: u64,
    slot: u32,
    generation: u32,
}

impl Identifier {
    /// Create an identifier handle.
    #[must_use]
    pub const fn new(letter: char, number: u64, slot: u32, generation: u32) -> Self {
        Self {
            letter,
            number,
            slot,
            generation,
        }
    }

    /// The symbol letter (`I` in `I3`).
    #[must_use]
    pub const fn letter(&self) -> char {
        self.letter
    }

    /// The symbol number (`3` in `I3`).
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// The arena slot backing this identifier.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// The generation this identifier was issued in.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.number)
    }
}

// =============================================================================
// WORKING MEMORY ELEMENTS
// =============================================================================

/// The target of a working-memory edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WmeValue {
    /// The edge points at another identifier (shared vertex).
    Identifier(Identifier),
    /// The edge terminates in a constant.
    Scalar(Scalar),
}

impl WmeValue {
    /// Get the target identifier, if any.
    #[must_use]
    pub fn as_identifier(&self) -> Option<Identifier> {
        match self {
            Self::Identifier(id) => Some(*id),
            Self::Scalar(_) => None,
        }
    }
}

impl fmt::Display for WmeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(id) => write!(f, "{id}"),
            Self::Scalar(s) => write!(f, "{s}"),
        }
    }
}

/// A working-memory element: `(from ^attribute value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wme {
    /// The source identifier.
    pub from: Identifier,
    /// The attribute label.
    pub attribute: String,
    /// The target.
    pub value: WmeValue,
}

impl Wme {
    /// Create a new working-memory element.
    #[must_use]
    pub fn new(from: Identifier, attribute: impl Into<String>, value: WmeValue) -> Self {
        Self {
            from,
            attribute: attribute.into(),
            value,
        }
    }
}

/// Kernel print format: `(I3,SoarCommandChange,C1)`.
impl fmt::Display for Wme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.from, self.attribute, self.value)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the conversion engine.
///
/// Coercion failures, unknown record types and ambiguous path segments are
/// recovered where they happen (as `None`) and never reach this type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Unparsable JSON, an empty dotted path or segment, an unknown numeric
    /// kind, or an invalid attribute name.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The identifier was issued before the last kernel reset, or its vertex
    /// no longer exists.
    #[error("Stale identifier: {0}")]
    StaleIdentifier(Identifier),

    /// The operation would break the leaf/internal node invariant.
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
