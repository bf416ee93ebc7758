//! # Engine Primitives
//!
//! Hardcoded constants shared by the codecs and the working memory arena.
//!
//! These are compiled into the binary and are immutable at runtime.

// =============================================================================
// TREE & JSON
// =============================================================================

/// Name of the synthetic node that holds the members of a JSON document
/// which does not reduce to a single named node.
pub const ROOT_NAME: &str = "root";

/// Separator between segments of a dotted path (`InputLink.CURRENT_PHASE`).
pub const PATH_SEPARATOR: char = '.';

// =============================================================================
// WORKING MEMORY
// =============================================================================

/// Attribute linking the top state to the io structure.
pub const IO_ATTRIBUTE: &str = "io";

/// Attribute linking the io structure to the input link.
pub const INPUT_LINK_ATTRIBUTE: &str = "input-link";

/// Attribute linking the io structure to the output link.
pub const OUTPUT_LINK_ATTRIBUTE: &str = "output-link";

/// Node name given to a tree extracted from the input link.
pub const INPUT_LINK_NAME: &str = "InputLink";

/// Node name given to a tree extracted from the output link.
pub const OUTPUT_LINK_NAME: &str = "OutputLink";

/// Symbol letter used when an attribute starts with no ASCII letter.
pub const DEFAULT_IDENTIFIER_LETTER: char = 'W';

/// Maximum length for attribute names written to working memory.
pub const MAX_ATTRIBUTE_LENGTH: usize = 256;

/// Maximum recursion depth when reading trees back out of working memory.
///
/// The kernel never produces cycles in practice, but shared vertices are
/// legal, so extraction and search are bounded regardless.
pub const MAX_EXTRACT_DEPTH: usize = 100;

/// Maximum number of nodes one extraction (or lines one dump) may produce.
/// Chains of shared vertices multiply the paths below them.
pub const MAX_EXTRACT_NODES: usize = 100_000;

/// Indentation per nesting level in the kernel-style WME dump.
pub const RENDER_INDENT: &str = "   ";

// =============================================================================
// RECORDS
// =============================================================================

/// Type names containing this marker (case-insensitive) are array commands,
/// which are not materialized.
pub const ARRAY_MARKER: &str = "ARRAY";

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the tree snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"IDEA";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum snapshot size accepted by the decoder (64 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024 * 1024;
