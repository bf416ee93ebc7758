//! Name -> constructor registry for record types.

use super::{DynamicRecord, Record, RecordDescriptor};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type Constructor = Box<dyn Fn() -> Box<dyn Record> + Send + Sync>;

/// Maps qualified type names to zero-valued constructors.
#[derive(Default)]
pub struct RecordRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl RecordRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Rust type under `name`. Replaces any previous entry.
    pub fn register<T: Record + Default>(&mut self, name: impl Into<String>) -> &mut Self {
        self.constructors
            .insert(name.into(), Box::new(|| Box::new(T::default())));
        self
    }

    /// Register a descriptor-driven type under its own name.
    pub fn register_descriptor(&mut self, descriptor: RecordDescriptor) -> &mut Self {
        let name = descriptor.name.clone();
        let descriptor = Arc::new(descriptor);
        self.constructors.insert(
            name,
            Box::new(move || Box::new(DynamicRecord::new(Arc::clone(&descriptor)))),
        );
        self
    }

    /// A zero-valued instance of `name`, or `None` when unknown.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Record>> {
        self.constructors.get(name).map(|construct| construct())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for RecordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}
