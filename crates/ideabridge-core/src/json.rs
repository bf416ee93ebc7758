//! # JSON Codec
//!
//! Converts JSON documents to attribute trees and back, and builds or patches
//! documents along dotted paths.
//!
//! ## Fan-out
//!
//! A JSON array under key `k` becomes one sibling node named `k` per element.
//! Going back, siblings sharing a name are grouped into one array member. The
//! inversion is not lossless: a one-element array reads back as a plain
//! member, nested arrays flatten, and `null` members vanish.

use crate::primitives::{PATH_SEPARATOR, ROOT_NAME};
use crate::{BridgeError, Idea, Scalar};
use serde_json::{Map, Value};
use tracing::debug;

// =============================================================================
// JSON -> IDEA
// =============================================================================

/// Convert a JSON document to an attribute tree.
///
/// An object with a single non-array member reduces to that member's node
/// (`{"InputLink": {..}}` yields `InputLink`). Anything else hangs under a
/// synthetic node named `root`, including a lone object member named `root`.
#[must_use]
pub fn from_json(doc: &Value) -> Idea {
    match doc {
        Value::Object(members) => {
            if let Some((key, value)) = single_member(members) {
                if let Some(node) = nodes_for(key, value).pop() {
                    return node;
                }
            }
            let mut root = Idea::new(ROOT_NAME);
            for (key, value) in members {
                for node in nodes_for(key, value) {
                    root.add(node);
                }
            }
            root
        }
        Value::Array(elements) => {
            let mut root = Idea::new(ROOT_NAME);
            for element in elements {
                for node in nodes_for(ROOT_NAME, element) {
                    root.add(node);
                }
            }
            root
        }
        Value::Null => Idea::new(ROOT_NAME),
        scalar => nodes_for(ROOT_NAME, scalar)
            .pop()
            .unwrap_or_else(|| Idea::new(ROOT_NAME)),
    }
}

/// Parse JSON text and convert it.
pub fn from_json_str(text: &str) -> Result<Idea, BridgeError> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| BridgeError::MalformedInput(format!("invalid JSON: {e}")))?;
    Ok(from_json(&doc))
}

/// The lone member of a one-member object, unless it would not survive the
/// trip back: arrays, nulls, and an object under `root` that `to_json` would
/// unwrap as synthetic.
fn single_member(members: &Map<String, Value>) -> Option<(&String, &Value)> {
    if members.len() != 1 {
        return None;
    }
    members.iter().next().filter(|(k, v)| {
        !v.is_array() && !v.is_null() && !(k.as_str() == ROOT_NAME && v.is_object())
    })
}

/// Nodes produced by one `key: value` member. Arrays fan out.
fn nodes_for(key: &str, value: &Value) -> Vec<Idea> {
    match value {
        Value::Null => Vec::new(),
        Value::Bool(b) => vec![Idea::leaf(key, *b)],
        Value::Number(n) => n
            .as_f64()
            .map(|d| Idea::leaf(key, Scalar::Double(d)))
            .into_iter()
            .collect(),
        Value::String(s) => vec![Idea::leaf(key, s.as_str())],
        Value::Object(members) => {
            let mut node = Idea::new(key);
            for (child_key, child_value) in members {
                for child in nodes_for(child_key, child_value) {
                    node.add(child);
                }
            }
            vec![node]
        }
        Value::Array(elements) => elements
            .iter()
            .flat_map(|element| nodes_for(key, element))
            .collect(),
    }
}

// =============================================================================
// IDEA -> JSON
// =============================================================================

/// Convert a tree to `{name: body}`. A valueless synthetic `root` is unwrapped
/// to its body.
#[must_use]
pub fn to_json(node: &Idea) -> Value {
    if node.name() == ROOT_NAME && node.value().is_none() {
        return to_json_body(node);
    }
    let mut doc = Map::new();
    doc.insert(node.name().to_string(), to_json_body(node));
    Value::Object(doc)
}

/// The JSON body of a node: its scalar, or an object of its children.
#[must_use]
pub fn to_json_body(node: &Idea) -> Value {
    if let Some(value) = node.value() {
        return value.to_json();
    }

    let mut members = Map::new();
    for child in node.children() {
        let body = to_json_body(child);
        match members.get_mut(child.name()) {
            // Bodies are never arrays, so an array here is a fan-out group.
            Some(Value::Array(group)) => group.push(body),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, body]);
            }
            None => {
                members.insert(child.name().to_string(), body);
            }
        }
    }
    Value::Object(members)
}

/// Two-space indented rendering.
pub fn to_pretty(doc: &Value) -> Result<String, BridgeError> {
    serde_json::to_string_pretty(doc).map_err(|e| BridgeError::SerializationError(e.to_string()))
}

// =============================================================================
// DOTTED PATHS
// =============================================================================

/// Split a dotted path into its segments.
///
/// Returns `MalformedInput` for an empty path or an empty segment (`A..B`).
pub fn split_path(path: &str) -> Result<Vec<&str>, BridgeError> {
    if path.is_empty() {
        return Err(BridgeError::MalformedInput("empty path".to_string()));
    }
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(BridgeError::MalformedInput(format!(
            "empty segment in path '{path}'"
        )));
    }
    Ok(segments)
}

/// Build a fresh single-branch document along `path` ending in `leaf`.
pub fn build_path(path: &str, leaf: Value) -> Result<Value, BridgeError> {
    let segments = split_path(path)?;
    Ok(segments.iter().rev().fold(leaf, |inner, segment| {
        let mut level = Map::new();
        level.insert((*segment).to_string(), inner);
        Value::Object(level)
    }))
}

/// Set `path` to `value` inside `existing`, creating missing intermediate
/// objects and replacing non-object intermediates. Siblings are untouched.
///
/// A `null` document is treated as empty; any other non-object document is
/// `MalformedInput`.
pub fn graft_path(path: &str, existing: &mut Value, value: Value) -> Result<(), BridgeError> {
    let segments = split_path(path)?;
    if existing.is_null() {
        *existing = Value::Object(Map::new());
    }
    match existing {
        Value::Object(members) => {
            graft_segments(members, &segments, value);
            Ok(())
        }
        _ => Err(BridgeError::MalformedInput(
            "graft target is not a JSON object".to_string(),
        )),
    }
}

fn graft_segments(members: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        members.insert((*first).to_string(), value);
        return;
    }

    let slot = members
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        debug!(segment = *first, "replacing non-object intermediate");
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(next) = slot {
        graft_segments(next, rest, value);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_member_object_reduces_to_node() {
        let doc = json!({"InputLink": {"CURRENT_PHASE": {"PHASE": "RED", "NUMBER": 4}}});
        let tree = from_json(&doc);

        assert_eq!(tree.name(), "InputLink");
        let phase = tree.child("CURRENT_PHASE").expect("phase node");
        assert_eq!(phase.child("PHASE").and_then(|c| c.value()), Some(&Scalar::from("RED")));
        assert_eq!(phase.child("NUMBER").and_then(|c| c.value()), Some(&Scalar::Double(4.0)));
    }

    #[test]
    fn array_fans_out_into_siblings() {
        let doc = json!({"light": [
            {"color": "red", "number": 4},
            {"color": "green", "number": 1}
        ]});
        let tree = from_json(&doc);

        assert_eq!(tree.name(), ROOT_NAME);
        let lights: Vec<&Idea> = tree.children_named("light").collect();
        assert_eq!(lights.len(), 2);
        assert!(lights.iter().any(|l| {
            l.child("color").and_then(|c| c.value()) == Some(&Scalar::from("red"))
                && l.child("number").and_then(|c| c.value()) == Some(&Scalar::Double(4.0))
        }));
        assert!(lights.iter().any(|l| {
            l.child("color").and_then(|c| c.value()) == Some(&Scalar::from("green"))
                && l.child("number").and_then(|c| c.value()) == Some(&Scalar::Double(1.0))
        }));
    }

    #[test]
    fn nulls_are_dropped() {
        let tree = from_json(&json!({"A": {"B": null, "C": true}}));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.child("C").and_then(|c| c.value()), Some(&Scalar::Boolean(true)));
    }

    #[test]
    fn multi_member_object_uses_root() {
        let tree = from_json(&json!({"A": 1, "B": "x"}));
        assert_eq!(tree.name(), ROOT_NAME);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn scalar_document_is_root_leaf() {
        let tree = from_json(&json!(3));
        assert_eq!(tree.name(), ROOT_NAME);
        assert_eq!(tree.value(), Some(&Scalar::Double(3.0)));
    }

    #[test]
    fn malformed_text_rejected() {
        assert!(matches!(
            from_json_str("{\"unterminated\": "),
            Err(BridgeError::MalformedInput(_))
        ));
    }

    #[test]
    fn to_json_wraps_named_node() {
        let tree = Idea::new("CURRENT_PHASE")
            .with_child(Idea::leaf("PHASE", "RED"))
            .with_child(Idea::leaf("NUMBER", 4));
        assert_eq!(
            to_json(&tree),
            json!({"CURRENT_PHASE": {"PHASE": "RED", "NUMBER": 4.0}})
        );
    }

    #[test]
    fn to_json_groups_repeated_names() {
        let doc = json!({"light": [{"color": "red"}, {"color": "green"}], "mode": "auto"});
        assert_eq!(to_json(&from_json(&doc)), doc);
    }

    #[test]
    fn root_key_survives_round_trip() {
        let doc = json!({"root": {"x": 1.0}});
        let tree = from_json(&doc);
        assert_eq!(tree.name(), ROOT_NAME);
        assert_eq!(tree.child(ROOT_NAME).map(Idea::len), Some(1));
        assert_eq!(to_json(&tree), doc);

        for doc in [json!({"root": {}}), json!({"root": "x"}), json!({"root": {"root": {"y": true}}})] {
            assert_eq!(to_json(&from_json(&doc)), doc);
        }
    }

    #[test]
    fn empty_node_renders_as_object() {
        assert_eq!(to_json(&Idea::new("EMPTY")), json!({"EMPTY": {}}));
    }

    #[test]
    fn build_path_creates_branch() {
        let doc = build_path("InputLink.CURRENT_PHASE.PHASE", json!("RED")).expect("valid path");
        assert_eq!(doc, json!({"InputLink": {"CURRENT_PHASE": {"PHASE": "RED"}}}));
    }

    #[test]
    fn graft_preserves_siblings() {
        let mut doc = json!({"A": {"D": "keep"}});
        graft_path("A.B.C", &mut doc, json!(4)).expect("graft succeeds");
        assert_eq!(doc, json!({"A": {"D": "keep", "B": {"C": 4}}}));

        // Idempotent on the branch.
        graft_path("A.B.C", &mut doc, json!(5)).expect("graft succeeds");
        assert_eq!(doc, json!({"A": {"D": "keep", "B": {"C": 5}}}));
    }

    #[test]
    fn graft_replaces_scalar_intermediate() {
        let mut doc = json!({"A": 1});
        graft_path("A.B", &mut doc, json!("x")).expect("graft succeeds");
        assert_eq!(doc, json!({"A": {"B": "x"}}));
    }

    #[test]
    fn graft_rejects_non_object_document() {
        let mut doc = json!([1, 2]);
        assert!(matches!(
            graft_path("A", &mut doc, json!(1)),
            Err(BridgeError::MalformedInput(_))
        ));
    }

    #[test]
    fn empty_paths_rejected() {
        assert!(matches!(build_path("", json!(1)), Err(BridgeError::MalformedInput(_))));
        assert!(matches!(build_path("A..B", json!(1)), Err(BridgeError::MalformedInput(_))));
        let mut doc = json!({});
        assert!(matches!(
            graft_path("A.", &mut doc, json!(1)),
            Err(BridgeError::MalformedInput(_))
        ));
    }

    #[test]
    fn pretty_print_indents() {
        let text = to_pretty(&json!({"A": {"B": 1}})).expect("serializes");
        assert_eq!(text, "{\n  \"A\": {\n    \"B\": 1\n  }\n}");
    }
}
