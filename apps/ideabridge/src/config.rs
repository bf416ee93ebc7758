//! # Record Descriptor Configuration
//!
//! Loads record types for the output-link materializer from a TOML file:
//!
//! ```toml
//! namespace = "bindings.soar"
//!
//! [[records]]
//! name = "SoarCommandChange"
//! fields = [
//!   { name = "productionName", kind = "text" },
//!   { name = "quantity", kind = "double" },
//! ]
//! ```
//!
//! Simple record names (and simple names inside `record` field kinds) are
//! qualified with the file's namespace.

use ideabridge_core::record::qualify;
use ideabridge_core::{BridgeError, FieldKind, RecordDescriptor, RecordRegistry};
use serde::Deserialize;
use std::path::Path;

/// Maximum size of a records file (1 MB).
const MAX_RECORDS_FILE_SIZE: u64 = 1024 * 1024;

/// The parsed contents of a records file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsFile {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub records: Vec<RecordDescriptor>,
}

impl RecordsFile {
    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        toml::from_str(text)
            .map_err(|e| BridgeError::MalformedInput(format!("invalid records file: {e}")))
    }

    /// Read and parse a records file.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            BridgeError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_RECORDS_FILE_SIZE {
            return Err(BridgeError::MalformedInput(format!(
                "Records file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_RECORDS_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Build a registry of dynamic records, returning it with the namespace.
    pub fn into_registry(mut self) -> (RecordRegistry, String) {
        let mut registry = RecordRegistry::new();
        for descriptor in std::mem::take(&mut self.records) {
            registry.register_descriptor(self.qualified(descriptor));
        }
        tracing::debug!(
            namespace = %self.namespace,
            types = registry.len(),
            "record registry loaded"
        );
        (registry, self.namespace)
    }

    fn qualified(&self, mut descriptor: RecordDescriptor) -> RecordDescriptor {
        descriptor.name = self.qualify_name(&descriptor.name);
        for field in &mut descriptor.fields {
            if let FieldKind::Record(declared) = &field.kind {
                field.kind = FieldKind::Record(self.qualify_name(declared));
            }
        }
        descriptor
    }

    fn qualify_name(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            qualify(&self.namespace, name)
        }
    }
}

/// Load a registry from an optional records file. Without a file the
/// registry is empty and `namespace` is used as given.
pub fn load_registry(
    path: Option<&Path>,
    namespace: Option<&str>,
) -> Result<(RecordRegistry, String), BridgeError> {
    let file = match path {
        Some(path) => RecordsFile::load(path)?,
        None => RecordsFile::default(),
    };
    let (registry, file_namespace) = file.into_registry();
    let namespace = namespace.map_or(file_namespace, str::to_string);
    Ok((registry, namespace))
}

// =============================================================================
// TESTS
// =============================================================================
