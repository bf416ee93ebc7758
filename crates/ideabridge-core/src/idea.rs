//! # Attribute Tree
//!
//! The `Idea` is the canonical in-memory form every codec converts to and
//! from: a named node carrying either a scalar value (leaf) or an ordered
//! list of children (internal node).
//!
//! Repeated child names are the only representation of arrays. No index is
//! stored; trees read back from working memory have unspecified sibling
//! order, so order-independent comparison is available through
//! [`Idea::matches_unordered`].

use crate::{BridgeError, Scalar};
use crate::primitives::RENDER_INDENT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, optionally valued node of the attribute tree.
///
/// Invariant: a node with children carries no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    name: String,
    value: Option<Scalar>,
    children: Vec<Idea>,
}

impl Idea {
    /// Create an empty node (no value, no children).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf carrying a value.
    #[must_use]
    pub fn leaf(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Idea::add`].
    #[must_use]
    pub fn with_child(mut self, child: Idea) -> Self {
        self.add(child);
        self
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The leaf value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    /// The ordered children.
    #[must_use]
    pub fn children(&self) -> &[Idea] {
        &self.children
    }

    /// Consume the node, returning its children.
    #[must_use]
    pub fn into_children(self) -> Vec<Idea> {
        self.children
    }

    /// Append a child. A valued node becomes internal and drops its value.
    pub fn add(&mut self, child: Idea) -> &mut Self {
        self.value = None;
        self.children.push(child);
        self
    }

    /// Set the leaf value.
    ///
    /// Returns `BridgeError::InvalidTree` if the node already has children.
    pub fn set_value(&mut self, value: impl Into<Scalar>) -> Result<(), BridgeError> {
        if !self.children.is_empty() {
            return Err(BridgeError::InvalidTree(format!(
                "node '{}' has children and cannot carry a value",
                self.name
            )));
        }
        self.value = Some(value.into());
        Ok(())
    }

    /// First child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Idea> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name (fan-out siblings).
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Idea> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// A node without children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when the node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Check the leaf/internal invariant over the whole tree. Deserialized
    /// trees do not pass through the constructors.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.value.is_some() && !self.children.is_empty() {
            return Err(BridgeError::InvalidTree(format!(
                "node '{}' carries both a value and children",
                self.name
            )));
        }
        self.children.iter().try_for_each(Idea::validate)
    }

    /// Structural equality with sibling order treated as a multiset.
    #[must_use]
    pub fn matches_unordered(&self, other: &Idea) -> bool {
        if self.name != other.name
            || self.value != other.value
            || self.children.len() != other.children.len()
        {
            return false;
        }

        // Equivalence relation, so greedy pairing is exact.
        let mut used = vec![false; other.children.len()];
        self.children.iter().all(|mine| {
            let found = other
                .children
                .iter()
                .enumerate()
                .find(|(i, theirs)| !used[*i] && mine.matches_unordered(theirs))
                .map(|(i, _)| i);
            match found {
                Some(i) => {
                    used[i] = true;
                    true
                }
                None => false,
            }
        })
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = RENDER_INDENT.repeat(depth);
        match &self.value {
            Some(value) => writeln!(f, "{indent}{}: {value}", self.name)?,
            None => writeln!(f, "{indent}{}", self.name)?,
        }
        for child in &self.children {
            child.write_outline(f, depth.saturating_add(1))?;
        }
        Ok(())
    }
}

/// Indented outline, one node per line.
impl fmt::Display for Idea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
