//! # Working Memory
//!
//! The kernel boundary. A production-rule kernel exposes its state as a graph
//! of identifier/attribute/value triples; everything in this crate reaches
//! that graph through the `WorkingMemory` trait.
//!
//! `WorkingMemoryArena` is the in-process implementation. Vertices live in an
//! arena addressed by slot index, and every handle carries the generation it
//! was issued in. A reset bumps the generation, so a handle that survives a
//! reset fails with `StaleIdentifier` instead of aliasing a new vertex.

use crate::primitives::{
    DEFAULT_IDENTIFIER_LETTER, INPUT_LINK_ATTRIBUTE, IO_ATTRIBUTE, MAX_ATTRIBUTE_LENGTH,
    OUTPUT_LINK_ATTRIBUTE,
};
use crate::{BridgeError, Identifier, Scalar, Wme, WmeValue};
use std::collections::BTreeMap;

// =============================================================================
// WORKINGMEMORY TRAIT
// =============================================================================

/// Read/write access to a kernel's symbolic working memory.
///
/// Every operation taking an identifier returns `BridgeError::StaleIdentifier`
/// when that identifier predates the last reset or names a removed vertex.
pub trait WorkingMemory {
    /// The identifier the kernel reads its input from.
    fn input_link(&self) -> Identifier;

    /// The identifier the kernel publishes its commands under.
    fn output_link(&self) -> Identifier;

    /// Create a fresh identifier and the edge `(parent, attribute, id)`.
    fn add_identifier(
        &mut self,
        parent: Identifier,
        attribute: &str,
    ) -> Result<Identifier, BridgeError>;

    /// Create the edge `(parent, attribute, value)`.
    fn add_value(
        &mut self,
        parent: Identifier,
        attribute: &str,
        value: Scalar,
    ) -> Result<(), BridgeError>;

    /// All edges whose source is `id`.
    ///
    /// Edge order is not part of the contract.
    fn edges_from(&self, id: Identifier) -> Result<Vec<Wme>, BridgeError>;

    /// Remove every edge whose source is `id`. Returns the number removed.
    fn remove_edges_from(&mut self, id: Identifier) -> Result<usize, BridgeError>;

    /// Discard all content and invalidate every identifier issued so far.
    fn reset(&mut self);

    /// The current generation (bumped on every reset).
    fn generation(&self) -> u32;

    /// Total number of live edges.
    fn edge_count(&self) -> usize;
}

// =============================================================================
// ARENA IMPLEMENTATION
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Slot {
    /// `None` marks a free slot.
    symbol: Option<Identifier>,
    edges: Vec<(String, WmeValue)>,
    /// Incoming identifier edges.
    refs: usize,
}

/// In-process working memory with generation-checked identifiers.
///
/// Bootstraps the kernel's io structure: `S1 ^io I1`, `I1 ^input-link I2`,
/// `I1 ^output-link I3`. Vertices that lose their last incoming edge are
/// reclaimed; their slots are reused under new symbols.
#[derive(Debug, Clone)]
pub struct WorkingMemoryArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Next symbol number per letter.
    counters: BTreeMap<char, u64>,
    generation: u32,
    top_state: Identifier,
    io: Identifier,
    input_link: Identifier,
    output_link: Identifier,
}

impl Default for WorkingMemoryArena {
    fn default() -> Self {
        Self::bootstrap(0)
    }
}

impl WorkingMemoryArena {
    /// Create an arena holding only the io structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bootstrap(generation: u32) -> Self {
        let top_state = Identifier::new('S', 1, 0, generation);
        let io = Identifier::new('I', 1, 1, generation);
        let input_link = Identifier::new('I', 2, 2, generation);
        let output_link = Identifier::new('I', 3, 3, generation);

        let slots = vec![
            Slot {
                symbol: Some(top_state),
                edges: vec![(IO_ATTRIBUTE.to_string(), WmeValue::Identifier(io))],
                refs: 0,
            },
            Slot {
                symbol: Some(io),
                edges: vec![
                    (
                        INPUT_LINK_ATTRIBUTE.to_string(),
                        WmeValue::Identifier(input_link),
                    ),
                    (
                        OUTPUT_LINK_ATTRIBUTE.to_string(),
                        WmeValue::Identifier(output_link),
                    ),
                ],
                refs: 1,
            },
            Slot {
                symbol: Some(input_link),
                edges: Vec::new(),
                refs: 1,
            },
            Slot {
                symbol: Some(output_link),
                edges: Vec::new(),
                refs: 1,
            },
        ];

        Self {
            slots,
            free: Vec::new(),
            counters: BTreeMap::from([('S', 1), ('I', 3)]),
            generation,
            top_state,
            io,
            input_link,
            output_link,
        }
    }

    /// The top state (`S1`).
    #[must_use]
    pub fn top_state(&self) -> Identifier {
        self.top_state
    }

    /// Number of live identifiers, including the io structure.
    #[must_use]
    pub fn identifier_count(&self) -> usize {
        self.slots.iter().filter(|s| s.symbol.is_some()).count()
    }

    /// Add an edge to an existing identifier, sharing the target vertex.
    ///
    /// The kernel can produce shared and cyclic structure this way; the codecs
    /// must tolerate it.
    pub fn link(
        &mut self,
        parent: Identifier,
        attribute: &str,
        target: Identifier,
    ) -> Result<(), BridgeError> {
        validate_attribute(attribute)?;
        self.check(target)?;
        self.slot_mut(parent)?
            .edges
            .push((attribute.to_string(), WmeValue::Identifier(target)));
        let target_slot = self.slot_mut(target)?;
        target_slot.refs = target_slot.refs.saturating_add(1);
        Ok(())
    }

    fn check(&self, id: Identifier) -> Result<&Slot, BridgeError> {
        if id.generation() != self.generation {
            return Err(BridgeError::StaleIdentifier(id));
        }
        self.slots
            .get(id.slot() as usize)
            .filter(|slot| slot.symbol == Some(id))
            .ok_or(BridgeError::StaleIdentifier(id))
    }

    fn slot_mut(&mut self, id: Identifier) -> Result<&mut Slot, BridgeError> {
        if id.generation() != self.generation {
            return Err(BridgeError::StaleIdentifier(id));
        }
        self.slots
            .get_mut(id.slot() as usize)
            .filter(|slot| slot.symbol == Some(id))
            .ok_or(BridgeError::StaleIdentifier(id))
    }

    fn allocate(&mut self, letter: char) -> Result<Identifier, BridgeError> {
        let counter = self.counters.entry(letter).or_insert(0);
        *counter = counter.saturating_add(1);
        let number = *counter;

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(self.slots.len()).map_err(|_| {
                    BridgeError::InvalidTree("working memory slot limit reached".to_string())
                })?;
                self.slots.push(Slot::default());
                slot
            }
        };

        let id = Identifier::new(letter, number, slot, self.generation);
        if let Some(entry) = self.slots.get_mut(slot as usize) {
            *entry = Slot {
                symbol: Some(id),
                edges: Vec::new(),
                refs: 0,
            };
        }
        Ok(id)
    }

    fn is_root(&self, id: Identifier) -> bool {
        id == self.top_state || id == self.io || id == self.input_link || id == self.output_link
    }

    /// Drop one incoming reference from each target, reclaiming orphans.
    fn release(&mut self, targets: Vec<Identifier>) {
        let mut pending = targets;
        while let Some(target) = pending.pop() {
            let root = self.is_root(target);
            let Ok(slot) = self.slot_mut(target) else {
                continue;
            };
            slot.refs = slot.refs.saturating_sub(1);
            if slot.refs > 0 || root {
                continue;
            }
            slot.symbol = None;
            let edges = std::mem::take(&mut slot.edges);
            pending.extend(edges.iter().filter_map(|(_, v)| v.as_identifier()));
            self.free.push(target.slot());
        }
    }
}

impl WorkingMemory for WorkingMemoryArena {
    fn input_link(&self) -> Identifier {
        self.input_link
    }

    fn output_link(&self) -> Identifier {
        self.output_link
    }

    fn add_identifier(
        &mut self,
        parent: Identifier,
        attribute: &str,
    ) -> Result<Identifier, BridgeError> {
        validate_attribute(attribute)?;
        self.check(parent)?;
        let id = self.allocate(identifier_letter(attribute))?;
        self.slot_mut(parent)?
            .edges
            .push((attribute.to_string(), WmeValue::Identifier(id)));
        let slot = self.slot_mut(id)?;
        slot.refs = 1;
        Ok(id)
    }

    fn add_value(
        &mut self,
        parent: Identifier,
        attribute: &str,
        value: Scalar,
    ) -> Result<(), BridgeError> {
        validate_attribute(attribute)?;
        self.slot_mut(parent)?
            .edges
            .push((attribute.to_string(), WmeValue::Scalar(value)));
        Ok(())
    }

    fn edges_from(&self, id: Identifier) -> Result<Vec<Wme>, BridgeError> {
        let slot = self.check(id)?;
        Ok(slot
            .edges
            .iter()
            .map(|(attribute, value)| Wme::new(id, attribute.clone(), value.clone()))
            .collect())
    }

    fn remove_edges_from(&mut self, id: Identifier) -> Result<usize, BridgeError> {
        let edges = std::mem::take(&mut self.slot_mut(id)?.edges);
        let removed = edges.len();
        self.release(edges.iter().filter_map(|(_, v)| v.as_identifier()).collect());
        Ok(removed)
    }

    fn reset(&mut self) {
        *self = Self::bootstrap(self.generation.wrapping_add(1));
    }

    fn generation(&self) -> u32 {
        self.generation
    }

    fn edge_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.symbol.is_some())
            .map(|s| s.edges.len())
            .sum()
    }
}

/// Symbol letter for a fresh identifier: the upper-cased first letter of its
/// attribute.
fn identifier_letter(attribute: &str) -> char {
    attribute
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or(DEFAULT_IDENTIFIER_LETTER)
}

pub(crate) fn validate_attribute(attribute: &str) -> Result<(), BridgeError> {
    if attribute.is_empty() {
        return Err(BridgeError::MalformedInput("empty attribute name".to_string()));
    }
    if attribute.len() > MAX_ATTRIBUTE_LENGTH {
        return Err(BridgeError::MalformedInput(format!(
            "attribute name exceeds {MAX_ATTRIBUTE_LENGTH} bytes"
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
