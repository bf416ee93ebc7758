//! Tree -> record materialization and record -> JSON rendering.

use super::{
    FieldKind, FieldRef, FieldSpec, FieldValue, Record, RecordRegistry, namespace_of, qualify,
    simple_name,
};
use crate::Idea;
use crate::primitives::ARRAY_MARKER;
use serde_json::{Map, Value};
use tracing::debug;

// =============================================================================
// MATERIALIZE
// =============================================================================

/// Build a record of `type_name` from the children of `tree`.
///
/// Returns `None` for unknown types, for simple names containing `ARRAY`, and
/// when no child names a declared field. Leaf children are coerced to the
/// field kind; a value that does not fit leaves the field unset.
///
/// An internal child is resolved as a nested record: first by its own name
/// as a type in the same namespace, then by each grandchild's name (the last
/// success wins), then by the field's declared record type.
pub fn materialize(
    tree: &Idea,
    type_name: &str,
    registry: &RecordRegistry,
) -> Option<Box<dyn Record>> {
    if simple_name(type_name).to_uppercase().contains(ARRAY_MARKER) {
        debug!(type_name, "array commands are not materialized");
        return None;
    }
    let Some(mut record) = registry.instantiate(type_name) else {
        debug!(type_name, "unknown record type");
        return None;
    };

    let namespace = namespace_of(type_name);
    let fields = record.fields();
    let mut matched = false;

    for child in tree.children() {
        let Some(spec) = find_field(&fields, child) else {
            continue;
        };
        matched = true;

        let value = match child.value() {
            Some(scalar) => {
                let value = FieldValue::from_scalar(scalar, &spec.kind);
                if value.is_none() {
                    debug!(
                        field = %spec.name,
                        value = %scalar,
                        kind = ?spec.kind,
                        "value does not fit field; left unset"
                    );
                }
                value
            }
            None if child.is_empty() => None,
            None => materialize_nested(child, spec, namespace, registry).map(FieldValue::Record),
        };

        if let Some(value) = value {
            if !record.set_field(&spec.name, value) {
                debug!(field = %spec.name, type_name, "field rejected value");
            }
        }
    }

    matched.then_some(record)
}

fn find_field<'a>(fields: &'a [FieldSpec], child: &Idea) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == child.name()).or_else(|| {
        if child.is_leaf() {
            return None;
        }
        fields.iter().find(|f| {
            matches!(&f.kind, FieldKind::Record(declared) if simple_name(declared) == child.name())
        })
    })
}

fn materialize_nested(
    child: &Idea,
    spec: &FieldSpec,
    namespace: &str,
    registry: &RecordRegistry,
) -> Option<Box<dyn Record>> {
    let own = qualify(namespace, child.name());
    if registry.contains(&own) {
        return materialize(child, &own, registry);
    }

    let mut nested = None;
    for grandchild in child.children() {
        let name = qualify(namespace, grandchild.name());
        if let Some(record) = materialize(grandchild, &name, registry) {
            nested = Some(record);
        }
    }

    match (&nested, &spec.kind) {
        (None, FieldKind::Record(declared)) => materialize(child, declared, registry),
        _ => nested,
    }
}

// =============================================================================
// MATERIALIZER
// =============================================================================

/// Materializes trees whose names are unqualified type names within one
/// namespace.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    registry: &'a RecordRegistry,
    namespace: &'a str,
}

impl<'a> Materializer<'a> {
    #[must_use]
    pub fn new(registry: &'a RecordRegistry, namespace: &'a str) -> Self {
        Self {
            registry,
            namespace,
        }
    }

    /// Qualify a simple type name with this namespace.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        qualify(self.namespace, name)
    }

    /// Materialize `tree` as the type named by `tree.name()`.
    #[must_use]
    pub fn materialize(&self, tree: &Idea) -> Option<Box<dyn Record>> {
        materialize(tree, &self.qualify(tree.name()), self.registry)
    }

    /// Materialize every command under an output-link tree. Commands that do
    /// not materialize are skipped.
    #[must_use]
    pub fn materialize_children(&self, link: &Idea) -> Vec<Box<dyn Record>> {
        link.children()
            .iter()
            .filter_map(|command| self.materialize(command))
            .collect()
    }
}

// =============================================================================
// RECORD -> JSON
// =============================================================================

/// Render a record as `{"qualified.Type": {field: "text", ..}}`.
///
/// Scalar fields are stringified; nested records render as nested bodies.
/// Unset fields are omitted.
#[must_use]
pub fn record_to_json(record: &dyn Record) -> Value {
    let mut doc = Map::new();
    doc.insert(record.type_name().to_string(), record_body(record));
    Value::Object(doc)
}

fn record_body(record: &dyn Record) -> Value {
    let mut body = Map::new();
    for spec in record.fields() {
        let Some(field) = record.get_field(&spec.name) else {
            continue;
        };
        let value = match field {
            FieldRef::Record(nested) => record_body(nested),
            other => Value::String(other.to_string()),
        };
        body.insert(spec.name, value);
    }
    Value::Object(body)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::coercion::Number;
    use crate::record::{DynamicRecord, RecordDescriptor};
    use serde_json::json;

    fn registry() -> RecordRegistry {
        let mut registry = RecordRegistry::new();
        registry
            .register_descriptor(RecordDescriptor::new(
                "ns.Move",
                vec![
                    FieldSpec::new("speed", FieldKind::Int),
                    FieldSpec::new("target", FieldKind::Text),
                ],
            ))
            .register_descriptor(RecordDescriptor::new(
                "ns.Plan",
                vec![
                    FieldSpec::new("step", FieldKind::Record("ns.Move".to_string())),
                    FieldSpec::new("priority", FieldKind::Double),
                ],
            ));
        registry
    }

    #[test]
    fn leaves_coerce_to_declared_kind() {
        let registry = registry();
        let tree = Idea::new("Move")
            .with_child(Idea::leaf("speed", 3))
            .with_child(Idea::leaf("target", "door"));

        let record = Materializer::new(&registry, "ns").materialize(&tree).expect("known");
        assert_eq!(record.type_name(), "ns.Move");
        assert!(matches!(
            record.get_field("speed"),
            Some(FieldRef::Number(Number::Int(3)))
        ));
        assert_eq!(
            record.get_field("target").map(|f| f.to_string()),
            Some("door".to_string())
        );
    }

    #[test]
    fn unfit_values_leave_field_unset() {
        let registry = registry();
        let tree = Idea::new("Move")
            .with_child(Idea::leaf("speed", "fast"))
            .with_child(Idea::leaf("target", "door"));

        let record = materialize(&tree, "ns.Move", &registry).expect("matched");
        assert!(record.get_field("speed").is_none());
        assert!(record.get_field("target").is_some());
    }

    #[test]
    fn unknown_array_and_unmatched_are_none() {
        let registry = registry();
        let tree = Idea::new("Move").with_child(Idea::leaf("speed", 1));

        assert!(materialize(&tree, "ns.Missing", &registry).is_none());
        assert!(materialize(&tree, "ns.MoveArray", &registry).is_none());

        let unrelated = Idea::new("Move").with_child(Idea::leaf("colour", "red"));
        assert!(materialize(&unrelated, "ns.Move", &registry).is_none());
    }

    #[test]
    fn array_marker_applies_to_simple_name_only() {
        let mut registry = RecordRegistry::new();
        let speed = || vec![FieldSpec::new("speed", FieldKind::Double)];
        registry
            .register_descriptor(RecordDescriptor::new("robot.arrays.Move", speed()))
            .register_descriptor(RecordDescriptor::new("com.disarray.Move", speed()))
            .register_descriptor(RecordDescriptor::new("robot.arrays.MoveArray", speed()));
        let tree = Idea::new("Move").with_child(Idea::leaf("speed", 3));

        assert!(materialize(&tree, "robot.arrays.Move", &registry).is_some());
        assert!(materialize(&tree, "com.disarray.Move", &registry).is_some());
        assert!(materialize(&tree, "robot.arrays.MoveArray", &registry).is_none());
    }

    #[test]
    fn nested_by_grandchild_name() {
        let registry = registry();
        let tree = Idea::new("Plan")
            .with_child(Idea::leaf("priority", 2))
            .with_child(
                Idea::new("step").with_child(
                    Idea::new("Move")
                        .with_child(Idea::leaf("speed", 5))
                        .with_child(Idea::leaf("target", "exit")),
                ),
            );

        let record = materialize(&tree, "ns.Plan", &registry).expect("matched");
        let Some(FieldRef::Record(step)) = record.get_field("step") else {
            panic!("nested record missing");
        };
        assert_eq!(step.type_name(), "ns.Move");
        assert!(step.downcast_ref::<DynamicRecord>().is_some());
        assert!(matches!(
            step.get_field("speed"),
            Some(FieldRef::Number(Number::Int(5)))
        ));
    }

    #[test]
    fn nested_by_own_type_name() {
        let registry = registry();
        let tree = Idea::new("Plan").with_child(
            Idea::new("Move").with_child(Idea::leaf("speed", 1)),
        );

        let record = materialize(&tree, "ns.Plan", &registry).expect("matched");
        assert!(matches!(record.get_field("step"), Some(FieldRef::Record(_))));
    }

    #[test]
    fn nested_by_declared_type() {
        let registry = registry();
        let tree = Idea::new("Plan").with_child(
            Idea::new("step")
                .with_child(Idea::leaf("speed", 9))
                .with_child(Idea::leaf("target", "roof")),
        );

        let record = materialize(&tree, "ns.Plan", &registry).expect("matched");
        let json = record_to_json(&*record);
        assert_eq!(
            json,
            json!({"ns.Plan": {"step": {"speed": "9", "target": "roof"}}})
        );
    }

    #[test]
    fn nested_record_of_other_type_left_unset() {
        let mut registry = registry();
        registry.register_descriptor(RecordDescriptor::new(
            "ns.Wait",
            vec![FieldSpec::new("seconds", FieldKind::Int)],
        ));
        let tree = Idea::new("Plan")
            .with_child(Idea::leaf("priority", 1))
            .with_child(
                Idea::new("step").with_child(Idea::new("Wait").with_child(Idea::leaf("seconds", 3))),
            );

        let record = materialize(&tree, "ns.Plan", &registry).expect("matched");
        assert!(record.get_field("step").is_none());
        assert!(record.get_field("priority").is_some());
    }

    #[test]
    fn materialize_children_skips_failures() {
        let registry = registry();
        let link = Idea::new("OutputLink")
            .with_child(Idea::new("Move").with_child(Idea::leaf("speed", 1)))
            .with_child(Idea::new("Unknown").with_child(Idea::leaf("x", 1)))
            .with_child(Idea::new("Move").with_child(Idea::leaf("target", "a")));

        let records = Materializer::new(&registry, "ns").materialize_children(&link);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn record_json_stringifies_scalars() {
        let registry = registry();
        let tree = Idea::new("Plan").with_child(Idea::leaf("priority", 2));
        let record = materialize(&tree, "ns.Plan", &registry).expect("matched");
        assert_eq!(
            record_to_json(&*record),
            json!({"ns.Plan": {"priority": "2.0"}})
        );
    }
}
