//! # Typed Records
//!
//! Output-link commands are turned into typed records by name. Types are
//! reached through an explicit [`RecordRegistry`]: hand-written Rust types
//! implement [`Record`], and descriptor-driven types are served by
//! [`DynamicRecord`].
//!
//! Field values are coerced to the declared field kind. A value that does not
//! fit leaves the field unset.

mod dynamic;
mod materializer;
mod registry;

pub use dynamic::DynamicRecord;
pub use materializer::{Materializer, materialize, record_to_json};
pub use registry::RecordRegistry;

use crate::coercion::{self, Number, NumericKind};
use crate::primitives::PATH_SEPARATOR;
use crate::Scalar;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// The declared kind of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Double,
    Float,
    Int,
    Short,
    Long,
    Boolean,
    Text,
    /// A nested record of the named (qualified) type.
    Record(String),
}

impl FieldKind {
    /// The numeric width, for numeric kinds.
    #[must_use]
    pub fn numeric(&self) -> Option<NumericKind> {
        match self {
            Self::Double => Some(NumericKind::Double),
            Self::Float => Some(NumericKind::Float),
            Self::Int => Some(NumericKind::Int),
            Self::Short => Some(NumericKind::Short),
            Self::Long => Some(NumericKind::Long),
            Self::Boolean | Self::Text | Self::Record(_) => None,
        }
    }

    /// True when `value` is assignable to a field of this kind. Nested records
    /// must be of exactly the declared type.
    #[must_use]
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Boolean, FieldValue::Boolean(_))
            | (Self::Text, FieldValue::Text(_)) => true,
            (Self::Record(declared), FieldValue::Record(record)) => record.type_name() == declared,
            (kind, FieldValue::Number(n)) => kind.numeric() == Some(n.kind()),
            _ => false,
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A record type: qualified name plus ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl RecordDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The part of a qualified type name after the last separator.
#[must_use]
pub fn simple_name(type_name: &str) -> &str {
    type_name
        .rsplit_once(PATH_SEPARATOR)
        .map_or(type_name, |(_, simple)| simple)
}

/// The namespace of a qualified type name (empty when unqualified).
#[must_use]
pub fn namespace_of(type_name: &str) -> &str {
    type_name
        .rsplit_once(PATH_SEPARATOR)
        .map_or("", |(namespace, _)| namespace)
}

/// Join a namespace and a simple name.
#[must_use]
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}{PATH_SEPARATOR}{name}")
    }
}

// =============================================================================
// FIELD VALUES
// =============================================================================

/// An owned value assigned to a record field.
#[derive(Debug)]
pub enum FieldValue {
    Number(Number),
    Boolean(bool),
    Text(String),
    Record(Box<dyn Record>),
}

impl FieldValue {
    /// Convert a leaf value to the declared field kind.
    ///
    /// Text fields keep the value as printed. Numeric fields go through
    /// [`coercion::coerce`]. Boolean fields accept booleans and the strings
    /// `true`/`false`. Record fields never accept a scalar.
    #[must_use]
    pub fn from_scalar(value: &Scalar, kind: &FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Text => Some(Self::Text(value.to_string())),
            FieldKind::Boolean => match value {
                Scalar::Boolean(b) => Some(Self::Boolean(*b)),
                Scalar::Text(t) => t.trim().parse::<bool>().ok().map(Self::Boolean),
                Scalar::Double(_) => None,
            },
            FieldKind::Record(_) => None,
            numeric => numeric
                .numeric()
                .and_then(|width| coercion::coerce(value, width))
                .map(Self::Number),
        }
    }

    /// Borrow as a [`FieldRef`].
    #[must_use]
    pub fn as_field_ref(&self) -> FieldRef<'_> {
        match self {
            Self::Number(n) => FieldRef::Number(*n),
            Self::Boolean(b) => FieldRef::Boolean(*b),
            Self::Text(t) => FieldRef::Text(t),
            Self::Record(r) => FieldRef::Record(&**r),
        }
    }
}

/// A borrowed view of a record field.
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Number(Number),
    Boolean(bool),
    Text(&'a str),
    Record(&'a (dyn Record + 'static)),
}

impl fmt::Display for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(t) => f.write_str(t),
            Self::Record(r) => f.write_str(r.type_name()),
        }
    }
}

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A record type that can be materialized from an attribute tree.
///
/// Implementations start zero-valued (`Default`) and accept field values by
/// name.
pub trait Record: Any + fmt::Debug + Send + Sync {
    /// Qualified type name, as registered.
    fn type_name(&self) -> &str;

    /// Declared fields, in order.
    fn fields(&self) -> Vec<FieldSpec>;

    /// Assign a field. Returns `false` when the field does not exist or the
    /// value has the wrong kind.
    fn set_field(&mut self, name: &str, value: FieldValue) -> bool;

    /// Read a field. `None` when unknown or unset.
    fn get_field(&self, name: &str) -> Option<FieldRef<'_>>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Record {
    /// Downcast to a concrete record type.
    #[must_use]
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

// =============================================================================
// TESTS
// =============================================================================
