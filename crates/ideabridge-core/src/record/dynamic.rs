//! Descriptor-driven records.

use super::{FieldRef, FieldSpec, FieldValue, Record, RecordDescriptor};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A record whose shape comes from a [`RecordDescriptor`] loaded at runtime.
#[derive(Debug)]
pub struct DynamicRecord {
    descriptor: Arc<RecordDescriptor>,
    values: BTreeMap<String, FieldValue>,
}

impl DynamicRecord {
    /// A zero-valued record: every field unset.
    #[must_use]
    pub fn new(descriptor: Arc<RecordDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    /// Number of fields currently set.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.values.len()
    }
}

impl Record for DynamicRecord {
    fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.descriptor.fields.clone()
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match self.descriptor.field(name) {
            Some(spec) if spec.kind.accepts(&value) => {
                self.values.insert(name.to_string(), value);
                true
            }
            _ => false,
        }
    }

    fn get_field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.values.get(name).map(FieldValue::as_field_ref)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
