//! # Materialization Tests
//!
//! Hand-written record types driven through the registry, the session and
//! the JSON renderer.

#![allow(clippy::unwrap_used, clippy::panic)]

use ideabridge_core::{
    FieldKind, FieldRef, FieldSpec, FieldValue, Idea, Number, Record, RecordRegistry, Session,
    materialize, record_to_json,
};
use serde_json::json;
use std::any::Any;

const NAMESPACE: &str = "bindings.soar";

// =============================================================================
// RECORD TYPES
// =============================================================================

#[derive(Debug, Default)]
struct SoarCommandChange {
    production_name: String,
    quantity: f64,
    apply: String,
}

impl Record for SoarCommandChange {
    fn type_name(&self) -> &str {
        "bindings.soar.SoarCommandChange"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("productionName", FieldKind::Text),
            FieldSpec::new("quantity", FieldKind::Double),
            FieldSpec::new("apply", FieldKind::Text),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("productionName", FieldValue::Text(t)) => self.production_name = t,
            ("quantity", FieldValue::Number(n)) => self.quantity = n.as_f64(),
            ("apply", FieldValue::Text(t)) => self.apply = t,
            _ => return false,
        }
        true
    }

    fn get_field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "productionName" => Some(FieldRef::Text(&self.production_name)),
            "quantity" => Some(FieldRef::Number(Number::Double(self.quantity))),
            "apply" => Some(FieldRef::Text(&self.apply)),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
struct SoarCommandNested {
    nested_class: Option<Box<dyn Record>>,
    quantity: f64,
}

impl Record for SoarCommandNested {
    fn type_name(&self) -> &str {
        "bindings.soar.SoarCommandNested"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(
                "nestedClass",
                FieldKind::Record("bindings.soar.SoarCommandChange".to_string()),
            ),
            FieldSpec::new("quantity", FieldKind::Double),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("nestedClass", FieldValue::Record(r)) => self.nested_class = Some(r),
            ("quantity", FieldValue::Number(n)) => self.quantity = n.as_f64(),
            _ => return false,
        }
        true
    }

    fn get_field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "nestedClass" => self.nested_class.as_deref().map(FieldRef::Record),
            "quantity" => Some(FieldRef::Number(Number::Double(self.quantity))),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn registry() -> RecordRegistry {
    let mut registry = RecordRegistry::new();
    registry
        .register::<SoarCommandChange>("bindings.soar.SoarCommandChange")
        .register::<SoarCommandNested>("bindings.soar.SoarCommandNested");
    registry
}

fn change_command(quantity: i32) -> Idea {
    Idea::new("SoarCommandChange")
        .with_child(Idea::leaf("productionName", "change"))
        .with_child(Idea::leaf("quantity", quantity))
        .with_child(Idea::leaf("apply", "true"))
}

// =============================================================================
// TESTS
// =============================================================================

#[test]
fn change_command_materializes() {
    let registry = registry();
    let record = materialize(
        &change_command(2),
        "bindings.soar.SoarCommandChange",
        &registry,
    )
    .expect("known type");

    let change = record
        .downcast_ref::<SoarCommandChange>()
        .expect("concrete type");
    assert_eq!(change.production_name, "change");
    assert_eq!(change.quantity, 2.0);
    assert_eq!(change.apply, "true");
}

#[test]
fn nested_command_directly_under_parent() {
    let registry = registry();
    let tree = Idea::new("SoarCommandNested")
        .with_child(change_command(5))
        .with_child(Idea::leaf("quantity", 2));

    let record = materialize(&tree, "bindings.soar.SoarCommandNested", &registry)
        .expect("known type");
    let nested = record
        .downcast_ref::<SoarCommandNested>()
        .expect("concrete type");
    assert_eq!(nested.quantity, 2.0);

    let inner = nested
        .nested_class
        .as_deref()
        .and_then(|r| r.downcast_ref::<SoarCommandChange>())
        .expect("nested change");
    assert_eq!(inner.quantity, 5.0);
    assert_eq!(inner.production_name, "change");
    assert_eq!(inner.apply, "true");
}

#[test]
fn nested_command_through_field_vertex() {
    let registry = registry();
    let tree = Idea::new("SoarCommandNested")
        .with_child(Idea::new("nestedClass").with_child(change_command(5)))
        .with_child(Idea::leaf("quantity", 2));

    let record = materialize(&tree, "bindings.soar.SoarCommandNested", &registry)
        .expect("known type");
    let nested = record
        .downcast_ref::<SoarCommandNested>()
        .expect("concrete type");
    let inner = nested
        .nested_class
        .as_deref()
        .and_then(|r| r.downcast_ref::<SoarCommandChange>())
        .expect("nested change");
    assert_eq!(inner.quantity, 5.0);
}

#[test]
fn session_reads_commands_from_output_link() {
    let mut session = Session::new().with_registry(registry(), NAMESPACE);
    let output = Idea::new("OutputLink")
        .with_child(change_command(2))
        .with_child(Idea::new("SoarCommandARRAY").with_child(Idea::leaf("quantity", 1)));
    session.set_output_link_idea(&output).expect("inject");

    let records = session.output_in_records().expect("read output");
    assert_eq!(records.len(), 1);
    let change = records[0]
        .downcast_ref::<SoarCommandChange>()
        .expect("concrete type");
    assert_eq!(change.quantity, 2.0);

    let dump = session.output_link_as_string().expect("render");
    assert!(dump.contains("(I3,SoarCommandChange,"));
    assert!(dump.contains(",productionName,change)\n"));
}

#[test]
fn record_json_matches_bean_rendering() {
    let registry = registry();
    let record = materialize(
        &change_command(2),
        "bindings.soar.SoarCommandChange",
        &registry,
    )
    .expect("known type");

    assert_eq!(
        record_to_json(&*record),
        json!({"bindings.soar.SoarCommandChange": {
            "productionName": "change",
            "quantity": "2.0",
            "apply": "true"
        }})
    );
}

#[test]
fn nested_record_json() {
    let registry = registry();
    let tree = Idea::new("SoarCommandNested")
        .with_child(change_command(5))
        .with_child(Idea::leaf("quantity", 2));
    let record = materialize(&tree, "bindings.soar.SoarCommandNested", &registry)
        .expect("known type");

    assert_eq!(
        record_to_json(&*record),
        json!({"bindings.soar.SoarCommandNested": {
            "nestedClass": {"productionName": "change", "quantity": "5.0", "apply": "true"},
            "quantity": "2.0"
        }})
    );
}
