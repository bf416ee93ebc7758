//! # ideabridge-core
//!
//! The symbolic state conversion engine for ideabridge.
//!
//! Moves data between four representations:
//! - JSON documents (`json`)
//! - the attribute tree, `Idea` (`idea`)
//! - a kernel's identifier/attribute/value working memory (`memory`, `codec`)
//! - typed records materialized by name (`record`)
//!
//! ## Architectural Constraints
//!
//! - Synchronous: every conversion completes within the call
//! - No async, no network dependencies
//! - The kernel is reached only through the `WorkingMemory` trait
//! - Record types are resolved through an explicit registry

// =============================================================================
// MODULES
// =============================================================================

pub mod codec;
pub mod coercion;
pub mod formats;
pub mod idea;
pub mod json;
pub mod memory;
pub mod primitives;
pub mod record;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{BridgeError, Identifier, Scalar, Wme, WmeValue};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use coercion::{Number, NumericKind, coerce, is_number, parse_scalar};
pub use idea::Idea;
pub use memory::{WorkingMemory, WorkingMemoryArena};
pub use record::{
    DynamicRecord, FieldKind, FieldRef, FieldSpec, FieldValue, Materializer, Record,
    RecordDescriptor, RecordRegistry, materialize, record_to_json,
};
pub use session::{Session, SessionStatus};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, idea_from_bytes, idea_to_bytes, is_snapshot};
