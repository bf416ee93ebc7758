//! # Session Module
//!
//! A `Session` pairs one working memory with the record registry used to read
//! its output link.
//!
//! The input link is replaced wholesale on every write: previous content is
//! cleared before the new tree is injected. A tree with an invalid attribute
//! name is rejected before anything is cleared. Reads build fresh trees named
//! `InputLink` / `OutputLink`.

use crate::codec;
use crate::json;
use crate::memory::{WorkingMemory, WorkingMemoryArena};
use crate::primitives::{INPUT_LINK_NAME, OUTPUT_LINK_NAME, ROOT_NAME};
use crate::record::{Materializer, Record, RecordRegistry};
use crate::{BridgeError, Idea, Identifier};
use serde::Serialize;
use tracing::debug;

/// Edge counts and generation of a session's working memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub generation: u32,
    pub input_link_edges: usize,
    pub output_link_edges: usize,
    pub total_edges: usize,
    pub record_types: usize,
}

/// Working memory plus the registry used to materialize its commands.
#[derive(Debug)]
pub struct Session<W: WorkingMemory = WorkingMemoryArena> {
    memory: W,
    registry: RecordRegistry,
    namespace: String,
}

impl Default for Session<WorkingMemoryArena> {
    fn default() -> Self {
        Self::with_memory(WorkingMemoryArena::new())
    }
}

impl Session<WorkingMemoryArena> {
    /// Create a session over a fresh in-process arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<W: WorkingMemory> Session<W> {
    /// Create a session over an existing working memory.
    #[must_use]
    pub fn with_memory(memory: W) -> Self {
        Self {
            memory,
            registry: RecordRegistry::new(),
            namespace: String::new(),
        }
    }

    /// Attach a record registry. Command names under the output link are
    /// qualified with `namespace`.
    #[must_use]
    pub fn with_registry(mut self, registry: RecordRegistry, namespace: impl Into<String>) -> Self {
        self.registry = registry;
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn memory(&self) -> &W {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut W {
        &mut self.memory
    }

    #[must_use]
    pub fn registry(&self) -> &RecordRegistry {
        &self.registry
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // =========================================================================
    // INPUT / OUTPUT LINKS
    // =========================================================================

    /// Replace the input link content with the children of `idea`.
    pub fn set_input_link_idea(&mut self, idea: &Idea) -> Result<usize, BridgeError> {
        let link = self.memory.input_link();
        Self::replace(&mut self.memory, link, idea)
    }

    /// Replace the input link content with a JSON document.
    ///
    /// `{"InputLink": {..}}` and multi-member documents contribute their
    /// children; any other single-member document becomes one child.
    pub fn set_input_link_json(&mut self, doc: &serde_json::Value) -> Result<usize, BridgeError> {
        self.set_input_link_idea(&link_tree(doc, INPUT_LINK_NAME))
    }

    /// Replace the output link content (the kernel side of a cycle).
    pub fn set_output_link_idea(&mut self, idea: &Idea) -> Result<usize, BridgeError> {
        let link = self.memory.output_link();
        Self::replace(&mut self.memory, link, idea)
    }

    /// Replace the output link content with a JSON document, as delivered by
    /// a kernel at the end of a cycle.
    pub fn set_output_link_json(&mut self, doc: &serde_json::Value) -> Result<usize, BridgeError> {
        self.set_output_link_idea(&link_tree(doc, OUTPUT_LINK_NAME))
    }

    /// Rejected trees leave the link untouched.
    fn replace(memory: &mut W, link: Identifier, idea: &Idea) -> Result<usize, BridgeError> {
        codec::validate_names(idea)?;
        let removed = codec::clear(memory, link)?;
        let written = codec::inject(memory, link, idea)?;
        debug!(identifier = %link, removed, written, "link content replaced");
        Ok(written)
    }

    /// The input link as a tree named `InputLink`.
    pub fn input_link_idea(&self) -> Result<Idea, BridgeError> {
        codec::extract(&self.memory, self.memory.input_link(), INPUT_LINK_NAME)
    }

    /// The output link as a tree named `OutputLink`.
    pub fn output_link_idea(&self) -> Result<Idea, BridgeError> {
        codec::extract(&self.memory, self.memory.output_link(), OUTPUT_LINK_NAME)
    }

    /// Kernel-style dump of the input link.
    pub fn input_link_as_string(&self) -> Result<String, BridgeError> {
        codec::render(&self.memory, self.memory.input_link())
    }

    /// Kernel-style dump of the output link.
    pub fn output_link_as_string(&self) -> Result<String, BridgeError> {
        codec::render(&self.memory, self.memory.output_link())
    }

    // =========================================================================
    // RECORDS
    // =========================================================================

    /// Materialize every command under the output link.
    pub fn output_in_records(&self) -> Result<Vec<Box<dyn Record>>, BridgeError> {
        let output = self.output_link_idea()?;
        Ok(Materializer::new(&self.registry, &self.namespace).materialize_children(&output))
    }

    /// Materialize the command reached by a dotted path under the output link.
    ///
    /// The last path segment names the record type.
    pub fn record_at(&self, dotted_path: &str) -> Result<Option<Box<dyn Record>>, BridgeError> {
        let output = self.memory.output_link();
        let Some(id) = codec::locate(&self.memory, output, dotted_path)? else {
            return Ok(None);
        };
        let name = json::split_path(dotted_path)?
            .last()
            .copied()
            .unwrap_or(dotted_path);
        let tree = codec::extract(&self.memory, id, name)?;
        Ok(Materializer::new(&self.registry, &self.namespace).materialize(&tree))
    }

    /// First identifier reached through `attribute`, searching the input link
    /// then the output link.
    pub fn search(&self, attribute: &str) -> Result<Option<Identifier>, BridgeError> {
        if let Some(found) = codec::search(&self.memory, self.memory.input_link(), attribute)? {
            return Ok(Some(found));
        }
        codec::search(&self.memory, self.memory.output_link(), attribute)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Reset the working memory. Every identifier handed out so far is stale.
    pub fn reset(&mut self) {
        self.memory.reset();
        debug!(generation = self.memory.generation(), "working memory reset");
    }

    /// Current edge counts and generation.
    pub fn status(&self) -> Result<SessionStatus, BridgeError> {
        Ok(SessionStatus {
            generation: self.memory.generation(),
            input_link_edges: self.memory.edges_from(self.memory.input_link())?.len(),
            output_link_edges: self.memory.edges_from(self.memory.output_link())?.len(),
            total_edges: self.memory.edge_count(),
            record_types: self.registry.len(),
        })
    }
}

fn link_tree(doc: &serde_json::Value, link_name: &str) -> Idea {
    let tree = json::from_json(doc);
    if tree.name() == link_name || tree.name() == ROOT_NAME {
        tree
    } else {
        Idea::new(link_name).with_child(tree)
    }
}

// =============================================================================
// TESTS
// =============================================================================
