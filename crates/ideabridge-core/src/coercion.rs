//! # Type Coercion
//!
//! Best-effort numeric parsing shared by the JSON codec and the record
//! materializer.
//!
//! Coercion never fails loudly: a value that cannot be represented in the
//! requested width yields `None`, and callers leave the target unset.

use crate::{BridgeError, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// NUMERIC KINDS
// =============================================================================

/// The numeric widths a value can be coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Double,
    Float,
    Int,
    Short,
    Long,
}

impl NumericKind {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl FromStr for NumericKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "double" => Ok(Self::Double),
            "float" => Ok(Self::Float),
            "int" | "integer" => Ok(Self::Int),
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            other => Err(BridgeError::MalformedInput(format!(
                "unknown numeric kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// NUMBERS
// =============================================================================

/// A number tagged with the width it was coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Double(f64),
    Float(f32),
    Int(i32),
    Short(i16),
    Long(i64),
}

impl Number {
    /// The width of this number.
    #[must_use]
    pub const fn kind(self) -> NumericKind {
        match self {
            Self::Double(_) => NumericKind::Double,
            Self::Float(_) => NumericKind::Float,
            Self::Int(_) => NumericKind::Int,
            Self::Short(_) => NumericKind::Short,
            Self::Long(_) => NumericKind::Long,
        }
    }

    /// Widen to `f64`.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Double(d) => d,
            Self::Float(f) => f64::from(f),
            Self::Int(i) => f64::from(i),
            Self::Short(s) => f64::from(s),
            Self::Long(l) => l as f64,
        }
    }

    /// Convert to a JSON number (non-finite values become `null`).
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Self::Int(i) => serde_json::Value::from(i),
            Self::Short(s) => serde_json::Value::from(s),
            Self::Long(l) => serde_json::Value::from(l),
            Self::Double(_) | Self::Float(_) => Scalar::Double(self.as_f64()).to_json(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double(d) => write!(f, "{d:?}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Short(s) => write!(f, "{s}"),
            Self::Long(l) => write!(f, "{l}"),
        }
    }
}

// =============================================================================
// COERCION
// =============================================================================

/// Coerce a scalar to the requested numeric width.
///
/// Accepts numbers and numeric text. Integer widths reject fractional and
/// out-of-range values. Booleans never coerce.
#[must_use]
pub fn coerce(value: &Scalar, kind: NumericKind) -> Option<Number> {
    match value {
        Scalar::Double(d) => from_f64(*d, kind),
        Scalar::Text(text) => from_text(text.trim(), kind),
        Scalar::Boolean(_) => None,
    }
}

/// True when the value is a number or numeric text.
#[must_use]
pub fn is_number(value: &Scalar) -> bool {
    match value {
        Scalar::Double(_) => true,
        Scalar::Text(text) => parse_finite(text.trim()).is_some(),
        Scalar::Boolean(_) => false,
    }
}

/// Parse leaf text numeric-first, falling back to the raw string.
#[must_use]
pub fn parse_scalar(text: &str) -> Scalar {
    match parse_finite(text.trim()) {
        Some(d) => Scalar::Double(d),
        None => Scalar::Text(text.to_string()),
    }
}

/// Finite decimal parse. `NaN` and `inf` spellings are treated as text.
fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|d| d.is_finite())
}

fn from_f64(d: f64, kind: NumericKind) -> Option<Number> {
    match kind {
        NumericKind::Double => Some(Number::Double(d)),
        NumericKind::Float => {
            let narrowed = d as f32;
            (narrowed.is_finite() || !d.is_finite()).then_some(Number::Float(narrowed))
        }
        NumericKind::Int => whole(d)
            .and_then(|w| i32::try_from(w).ok())
            .map(Number::Int),
        NumericKind::Short => whole(d)
            .and_then(|w| i16::try_from(w).ok())
            .map(Number::Short),
        NumericKind::Long => whole(d).map(Number::Long),
    }
}

fn from_text(text: &str, kind: NumericKind) -> Option<Number> {
    match kind {
        NumericKind::Double | NumericKind::Float => {
            parse_finite(text).and_then(|d| from_f64(d, kind))
        }
        NumericKind::Int => text
            .parse::<i32>()
            .ok()
            .map(Number::Int)
            .or_else(|| parse_finite(text).and_then(|d| from_f64(d, kind))),
        NumericKind::Short => text
            .parse::<i16>()
            .ok()
            .map(Number::Short)
            .or_else(|| parse_finite(text).and_then(|d| from_f64(d, kind))),
        NumericKind::Long => text
            .parse::<i64>()
            .ok()
            .map(Number::Long)
            .or_else(|| parse_finite(text).and_then(|d| from_f64(d, kind))),
    }
}

/// Integral value of `d`, if it has no fractional part and fits an `i64`.
fn whole(d: f64) -> Option<i64> {
    let in_range = d >= i64::MIN as f64 && d < i64::MAX as f64;
    (d.is_finite() && d.fract() == 0.0 && in_range).then_some(d as i64)
}

// =============================================================================
// TESTS
// =============================================================================
