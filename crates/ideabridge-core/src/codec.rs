//! # Symbolic Graph Codec
//!
//! Moves attribute trees in and out of working memory.
//!
//! Every traversal here tolerates shared vertices and cycles. Extraction and
//! rendering track the identifiers on the current path, stop at
//! `MAX_EXTRACT_DEPTH` and produce at most `MAX_EXTRACT_NODES` nodes.
//! Searches keep a visited set.

use crate::json::split_path;
use crate::memory::{WorkingMemory, validate_attribute};
use crate::primitives::{MAX_EXTRACT_DEPTH, MAX_EXTRACT_NODES, RENDER_INDENT};
use crate::{BridgeError, Idea, Identifier, Wme, WmeValue};
use std::collections::BTreeSet;
use tracing::{debug, warn};

// =============================================================================
// INJECT
// =============================================================================

/// Write the children of `tree` under `root`.
///
/// A leaf child becomes a value edge; any other child gets a fresh identifier
/// and is written recursively. Same-named children each get their own edge.
/// Names are checked with [`validate_names`] before anything is written.
/// Returns the number of edges written.
pub fn inject<W: WorkingMemory + ?Sized>(
    wm: &mut W,
    root: Identifier,
    tree: &Idea,
) -> Result<usize, BridgeError> {
    validate_names(tree)?;
    inject_children(wm, root, tree)
}

fn inject_children<W: WorkingMemory + ?Sized>(
    wm: &mut W,
    root: Identifier,
    tree: &Idea,
) -> Result<usize, BridgeError> {
    let mut written = 0usize;
    for child in tree.children() {
        match child.value() {
            Some(value) => wm.add_value(root, child.name(), value.clone())?,
            None => {
                let id = wm.add_identifier(root, child.name())?;
                written = written.saturating_add(inject_children(wm, id, child)?);
            }
        }
        written = written.saturating_add(1);
    }
    Ok(written)
}

/// Check every name below `tree` (not its own) as an attribute name.
pub fn validate_names(tree: &Idea) -> Result<(), BridgeError> {
    for child in tree.children() {
        validate_attribute(child.name())?;
        validate_names(child)?;
    }
    Ok(())
}

/// Remove every edge under `root`. Returns the number removed.
pub fn clear<W: WorkingMemory + ?Sized>(wm: &mut W, root: Identifier) -> Result<usize, BridgeError> {
    wm.remove_edges_from(root)
}

// =============================================================================
// EXTRACT
// =============================================================================

/// Read the graph below `root` into a tree named `name`.
///
/// One child per edge, so repeated attributes fan out into siblings. An
/// identifier already on the current path, or beyond the depth limit, is
/// emitted as an empty node. Edges past the node budget are dropped.
pub fn extract<W: WorkingMemory + ?Sized>(
    wm: &W,
    root: Identifier,
    name: &str,
) -> Result<Idea, BridgeError> {
    let mut node = Idea::new(name);
    let mut path = BTreeSet::from([root]);
    let mut budget = MAX_EXTRACT_NODES;
    extract_children(wm, root, &mut node, &mut path, 0, &mut budget)?;
    if budget == 0 {
        warn!(identifier = %root, limit = MAX_EXTRACT_NODES, "extraction truncated");
    }
    Ok(node)
}

fn extract_children<W: WorkingMemory + ?Sized>(
    wm: &W,
    id: Identifier,
    node: &mut Idea,
    path: &mut BTreeSet<Identifier>,
    depth: usize,
    budget: &mut usize,
) -> Result<(), BridgeError> {
    for wme in wm.edges_from(id)? {
        if *budget == 0 {
            return Ok(());
        }
        *budget = budget.saturating_sub(1);
        match wme.value {
            WmeValue::Scalar(value) => {
                node.add(Idea::leaf(wme.attribute, value));
            }
            WmeValue::Identifier(child) => {
                let mut sub = Idea::new(wme.attribute);
                if path.contains(&child) || depth >= MAX_EXTRACT_DEPTH {
                    debug!(identifier = %child, depth, "not descending into identifier");
                } else {
                    path.insert(child);
                    extract_children(wm, child, &mut sub, path, depth.saturating_add(1), budget)?;
                    path.remove(&child);
                }
                node.add(sub);
            }
        }
    }
    Ok(())
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Follow a dotted path of identifier-valued edges from `root`.
///
/// Each segment must match exactly one identifier-valued edge; a missing or
/// ambiguous segment yields `None`.
pub fn locate<W: WorkingMemory + ?Sized>(
    wm: &W,
    root: Identifier,
    dotted_path: &str,
) -> Result<Option<Identifier>, BridgeError> {
    let mut current = root;
    for segment in split_path(dotted_path)? {
        let matches: Vec<Identifier> = wm
            .edges_from(current)?
            .into_iter()
            .filter(|wme| wme.attribute == segment)
            .filter_map(|wme| wme.value.as_identifier())
            .collect();
        match matches.as_slice() {
            [only] => current = *only,
            [] => {
                debug!(segment, path = dotted_path, "path segment not found");
                return Ok(None);
            }
            _ => {
                warn!(
                    segment,
                    path = dotted_path,
                    candidates = matches.len(),
                    "ambiguous path segment"
                );
                return Ok(None);
            }
        }
    }
    Ok(Some(current))
}

/// First identifier reached through an edge labelled `attribute` anywhere
/// below `root`.
pub fn search<W: WorkingMemory + ?Sized>(
    wm: &W,
    root: Identifier,
    attribute: &str,
) -> Result<Option<Identifier>, BridgeError> {
    let mut visited = BTreeSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for wme in wm.edges_from(current)? {
            let Some(target) = wme.value.as_identifier() else {
                continue;
            };
            if wme.attribute == attribute {
                return Ok(Some(target));
            }
            if visited.insert(target) {
                stack.push(target);
            }
        }
    }
    Ok(None)
}

/// Every edge labelled `attribute` anywhere below `root`.
pub fn search_wmes<W: WorkingMemory + ?Sized>(
    wm: &W,
    root: Identifier,
    attribute: &str,
) -> Result<Vec<Wme>, BridgeError> {
    let mut found = Vec::new();
    let mut visited = BTreeSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for wme in wm.edges_from(current)? {
            if let Some(target) = wme.value.as_identifier() {
                if visited.insert(target) {
                    stack.push(target);
                }
            }
            if wme.attribute == attribute {
                found.push(wme);
            }
        }
    }
    Ok(found)
}

/// True when any edge in `edges` carries the attribute `name`.
#[must_use]
pub fn contains_attribute(edges: &[Wme], name: &str) -> bool {
    edges.iter().any(|wme| wme.attribute == name)
}

// =============================================================================
// RENDER
// =============================================================================

/// Kernel-style dump of the graph below `root`: one `(I3,attr,value)` line
/// per edge, nested edges indented one level.
pub fn render<W: WorkingMemory + ?Sized>(wm: &W, root: Identifier) -> Result<String, BridgeError> {
    let mut out = String::new();
    let mut path = BTreeSet::from([root]);
    let mut budget = MAX_EXTRACT_NODES;
    render_edges(wm, root, &mut out, &mut path, 0, &mut budget)?;
    if budget == 0 {
        warn!(identifier = %root, limit = MAX_EXTRACT_NODES, "dump truncated");
    }
    Ok(out)
}

fn render_edges<W: WorkingMemory + ?Sized>(
    wm: &W,
    id: Identifier,
    out: &mut String,
    path: &mut BTreeSet<Identifier>,
    depth: usize,
    budget: &mut usize,
) -> Result<(), BridgeError> {
    for wme in wm.edges_from(id)? {
        if *budget == 0 {
            return Ok(());
        }
        *budget = budget.saturating_sub(1);
        out.push_str(&RENDER_INDENT.repeat(depth));
        out.push_str(&wme.to_string());
        out.push('\n');

        if let Some(child) = wme.value.as_identifier() {
            if depth < MAX_EXTRACT_DEPTH && path.insert(child) {
                render_edges(wm, child, out, path, depth.saturating_add(1), budget)?;
                path.remove(&child);
            }
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
