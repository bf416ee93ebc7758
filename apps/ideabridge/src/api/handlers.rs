//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CoerceRequest, CoerceResponse, ErrorResponse, HealthResponse, LinkWriteResponse,
        MaterializeResponse, PathBuildRequest, PathGraftRequest, PathResponse, ResetResponse,
        StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use ideabridge_core::{BridgeError, WorkingMemory, coerce, json, record_to_json};
use serde_json::Value;

/// Error half of every fallible handler.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a core error to its HTTP status.
pub fn api_error(error: BridgeError) -> ApiError {
    let status = match &error {
        BridgeError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        BridgeError::StaleIdentifier(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(%error, "request failed");
    }
    (status, Json(ErrorResponse::new(error.to_string())))
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Edge counts for both links and the arena generation.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.session.read().await;
    let status = session.status().map_err(api_error)?;
    Ok(Json(StatusResponse::new(status, session.namespace())))
}

// =============================================================================
// LINK HANDLERS
// =============================================================================

/// Replace the input link with a JSON document.
pub async fn set_input_link_handler(
    State(state): State<AppState>,
    Json(doc): Json<Value>,
) -> Result<Json<LinkWriteResponse>, ApiError> {
    let mut session = state.session.write().await;
    let written = session.set_input_link_json(&doc).map_err(api_error)?;
    Ok(Json(LinkWriteResponse {
        success: true,
        written,
    }))
}

/// Replace the output link with a kernel's JSON document.
pub async fn set_output_link_handler(
    State(state): State<AppState>,
    Json(doc): Json<Value>,
) -> Result<Json<LinkWriteResponse>, ApiError> {
    let mut session = state.session.write().await;
    let written = session.set_output_link_json(&doc).map_err(api_error)?;
    Ok(Json(LinkWriteResponse {
        success: true,
        written,
    }))
}

/// The input link as `{"InputLink": {..}}`.
pub async fn input_link_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let session = state.session.read().await;
    let tree = session.input_link_idea().map_err(api_error)?;
    Ok(Json(json::to_json(&tree)))
}

/// The output link as `{"OutputLink": {..}}`.
pub async fn output_link_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let session = state.session.read().await;
    let tree = session.output_link_idea().map_err(api_error)?;
    Ok(Json(json::to_json(&tree)))
}

/// Kernel-style text dump of `input` or `output`.
pub async fn wmes_handler(
    State(state): State<AppState>,
    Path(link): Path<String>,
) -> Result<String, ApiError> {
    let session = state.session.read().await;
    let dump = match link.as_str() {
        "input" => session.input_link_as_string(),
        "output" => session.output_link_as_string(),
        other => Err(BridgeError::MalformedInput(format!(
            "unknown link '{other}', expected 'input' or 'output'"
        ))),
    };
    dump.map_err(api_error)
}

// =============================================================================
// MATERIALIZE / RESET
// =============================================================================

/// Materialize every output-link command with the session's registry.
pub async fn materialize_handler(
    State(state): State<AppState>,
) -> Result<Json<MaterializeResponse>, ApiError> {
    let session = state.session.read().await;
    let records: Vec<Value> = session
        .output_in_records()
        .map_err(api_error)?
        .iter()
        .map(|record| record_to_json(&**record))
        .collect();
    Ok(Json(MaterializeResponse {
        count: records.len(),
        records,
    }))
}

/// Reset the working memory. Every earlier identifier becomes stale.
pub async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.write().await;
    session.reset();
    let generation = session.memory().generation();
    tracing::info!(generation, "working memory reset");
    Json(ResetResponse {
        success: true,
        generation,
    })
}

// =============================================================================
// PATH / COERCE
// =============================================================================

/// Build a nested document from a dotted path.
pub async fn path_build_handler(
    Json(request): Json<PathBuildRequest>,
) -> Result<Json<PathResponse>, ApiError> {
    let document = json::build_path(&request.path, request.value).map_err(api_error)?;
    Ok(Json(PathResponse { document }))
}

/// Graft a value into an existing document.
pub async fn path_graft_handler(
    Json(request): Json<PathGraftRequest>,
) -> Result<Json<PathResponse>, ApiError> {
    let PathGraftRequest {
        mut document,
        path,
        value,
    } = request;
    json::graft_path(&path, &mut document, value).map_err(api_error)?;
    Ok(Json(PathResponse { document }))
}

/// Coerce a scalar to a numeric kind.
pub async fn coerce_handler(
    Json(request): Json<CoerceRequest>,
) -> Result<Json<CoerceResponse>, ApiError> {
    let (scalar, kind) = request.to_parts().map_err(api_error)?;
    let value = coerce(&scalar, kind).map(|n| n.to_json());
    Ok(Json(CoerceResponse { kind, value }))
}
