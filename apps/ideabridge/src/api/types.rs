//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use ideabridge_core::{BridgeError, NumericKind, Scalar, SessionStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Working memory status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub generation: u32,
    pub input_link_edges: usize,
    pub output_link_edges: usize,
    pub total_edges: usize,
    pub record_types: usize,
    pub namespace: String,
}

impl StatusResponse {
    pub fn new(status: SessionStatus, namespace: &str) -> Self {
        Self {
            generation: status.generation,
            input_link_edges: status.input_link_edges,
            output_link_edges: status.output_link_edges,
            total_edges: status.total_edges,
            record_types: status.record_types,
            namespace: namespace.to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// LINK WRITE / RESET
// =============================================================================

/// Result of replacing a link's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkWriteResponse {
    pub success: bool,
    /// Edges written under the link.
    pub written: usize,
}

/// Result of a working memory reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub generation: u32,
}

// =============================================================================
// MATERIALIZE RESPONSE
// =============================================================================

/// Records materialized from the output link, each as `{"type": {..}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeResponse {
    pub count: usize,
    pub records: Vec<Value>,
}

// =============================================================================
// PATH REQUESTS
// =============================================================================

/// Build `{"A": {"B": value}}` from `A.B`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathBuildRequest {
    pub path: String,
    pub value: Value,
}

/// Set `path` inside `document`, keeping unrelated members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathGraftRequest {
    #[serde(default)]
    pub document: Value,
    pub path: String,
    pub value: Value,
}

/// The built or grafted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub document: Value,
}

// =============================================================================
// COERCE REQUEST/RESPONSE
// =============================================================================

/// Coerce a JSON scalar to a numeric kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoerceRequest {
    pub value: Value,
    pub kind: String,
}

impl CoerceRequest {
    /// Validate the request and split it into a scalar and a kind.
    ///
    /// Numbers travel as their JSON text so integer literals beyond the
    /// exact range of a double keep every digit.
    pub fn to_parts(&self) -> Result<(Scalar, NumericKind), BridgeError> {
        let kind: NumericKind = self.kind.parse()?;
        let scalar = match &self.value {
            Value::String(s) => Scalar::Text(s.clone()),
            Value::Number(n) => Scalar::Text(n.to_string()),
            Value::Bool(b) => Scalar::Boolean(*b),
            other => {
                return Err(BridgeError::MalformedInput(format!(
                    "expected a scalar, got {other}"
                )));
            }
        };
        Ok((scalar, kind))
    }
}

/// Coercion result. `value` is `null` when the input does not fit the kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoerceResponse {
    pub kind: NumericKind,
    pub value: Option<Value>,
}
