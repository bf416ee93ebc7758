//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config;
use crate::kernel::{KernelClient, KernelError};
use ideabridge_core::json::{build_path, from_json, graft_path, to_json, to_pretty};
use ideabridge_core::{
    BridgeError, Idea, NumericKind, Scalar, Session, WorkingMemory, coerce, idea_from_bytes,
    idea_to_bytes, is_snapshot, record_to_json,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a JSON document read from disk (16 MB).
const MAX_DOCUMENT_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum size of a snapshot read from disk (64 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = ideabridge_core::primitives::MAX_SNAPSHOT_SIZE as u64;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BridgeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BridgeError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BridgeError::MalformedInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, BridgeError> {
    let canonical = path.canonicalize().map_err(|e| {
        BridgeError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(BridgeError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, BridgeError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        BridgeError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(BridgeError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| BridgeError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Read a file after path and size validation.
fn read_file(path: &Path, max_size: u64) -> Result<Vec<u8>, BridgeError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated)
        .map_err(|e| BridgeError::IoError(format!("Read file '{}': {}", path.display(), e)))
}

/// Read and parse a JSON document.
pub fn read_document(path: &Path) -> Result<Value, BridgeError> {
    let bytes = read_file(path, MAX_DOCUMENT_SIZE)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        BridgeError::MalformedInput(format!("'{}' is not valid JSON: {}", path.display(), e))
    })
}

/// Read a file as a tree: binary snapshots by header, anything else as JSON.
pub fn read_tree(path: &Path) -> Result<Idea, BridgeError> {
    let bytes = read_file(path, MAX_SNAPSHOT_FILE_SIZE)?;
    if is_snapshot(&bytes) {
        return idea_from_bytes(&bytes);
    }
    let doc: Value = serde_json::from_slice(&bytes).map_err(|e| {
        BridgeError::MalformedInput(format!(
            "'{}' is neither a snapshot nor valid JSON: {}",
            path.display(),
            e
        ))
    })?;
    Ok(from_json(&doc))
}

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value_arg(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Build a session whose registry comes from the records file.
pub fn load_session(records: Option<&Path>, namespace: Option<&str>) -> Result<Session, BridgeError> {
    let (registry, namespace) = config::load_registry(records, namespace)?;
    Ok(Session::new().with_registry(registry, namespace))
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(session: Session, host: &str, port: u16) -> Result<(), BridgeError> {
    println!("ideabridge Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:         {}", host);
    println!("  Port:         {}", port);
    println!("  Namespace:    {}", session.namespace());
    println!("  Record types: {}", session.registry().len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health            - Health check");
    println!("  GET  /status            - Working memory status");
    println!("  POST /input-link        - Replace the input link");
    println!("  GET  /input-link        - Read the input link");
    println!("  POST /output-link       - Deliver a kernel output tree");
    println!("  GET  /output-link       - Read the output link");
    println!("  GET  /wmes/{{link}}       - Kernel-style dump (input|output)");
    println!("  POST /materialize       - Materialize output commands");
    println!("  POST /reset             - Reset working memory");
    println!("  POST /path/build        - Dotted path to document");
    println!("  POST /path/graft        - Set a dotted path in a document");
    println!("  POST /coerce            - Numeric coercion");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// CONVERT / INSPECT COMMANDS
// =============================================================================

/// Convert a JSON document to a tree, optionally writing a snapshot.
pub fn cmd_convert(json_mode: bool, file: &Path, snapshot: Option<&Path>) -> Result<(), BridgeError> {
    let doc = read_document(file)?;
    let tree = from_json(&doc);
    tracing::debug!(root = %tree.name(), children = tree.len(), "document converted");

    if let Some(out) = snapshot {
        let validated = validate_output_path(out)?;
        let bytes = idea_to_bytes(&tree)?;
        std::fs::write(&validated, &bytes)
            .map_err(|e| BridgeError::IoError(format!("Write file: {}", e)))?;
        if !json_mode {
            println!("Wrote {} bytes to {:?}", bytes.len(), validated);
        }
    }

    if json_mode {
        print_json(&to_json(&tree));
    } else {
        print!("{}", tree);
    }
    Ok(())
}

/// Print a JSON document or snapshot as a tree.
pub fn cmd_inspect(json_mode: bool, file: &Path) -> Result<(), BridgeError> {
    let tree = read_tree(file)?;
    if json_mode {
        println!("{}", to_pretty(&to_json(&tree))?);
    } else {
        print!("{}", tree);
    }
    Ok(())
}

// =============================================================================
// INJECT COMMAND
// =============================================================================

/// Inject a document into a fresh input link and print the kernel-style dump.
pub fn cmd_inject(json_mode: bool, verbose: bool, file: &Path) -> Result<(), BridgeError> {
    let doc = read_document(file)?;
    let mut session = Session::new();
    let written = session.set_input_link_json(&doc)?;
    let dump = session.input_link_as_string()?;

    if json_mode {
        print_json(&serde_json::json!({
            "written": written,
            "wmes": dump.lines().map(str::trim).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    print!("{}", dump);
    if verbose {
        println!();
        println!("Edges written: {}", written);
        println!("Total edges:   {}", session.memory().edge_count());
    }
    Ok(())
}

// =============================================================================
// PATH COMMANDS
// =============================================================================

/// Print `{"A": {"B": value}}` for `A.B value`.
pub fn cmd_path_build(path: &str, value: &str) -> Result<(), BridgeError> {
    let doc = build_path(path, parse_value_arg(value))?;
    println!("{}", to_pretty(&doc)?);
    Ok(())
}

/// Print the document in `file` with `path` set to `value`.
pub fn cmd_path_graft(file: &Path, path: &str, value: &str) -> Result<(), BridgeError> {
    let mut doc = read_document(file)?;
    graft_path(path, &mut doc, parse_value_arg(value))?;
    println!("{}", to_pretty(&doc)?);
    Ok(())
}

// =============================================================================
// COERCE COMMAND
// =============================================================================

/// Coerce a value to a numeric kind.
pub fn cmd_coerce(json_mode: bool, value: &str, kind: &str) -> Result<(), BridgeError> {
    let kind: NumericKind = kind.parse()?;
    let number = coerce(&Scalar::from(value), kind);

    if json_mode {
        print_json(&serde_json::json!({
            "kind": kind.name(),
            "value": number.map(|n| n.to_json()),
        }));
        return Ok(());
    }

    match number {
        Some(n) => println!("{}: {}", kind, n),
        None => println!("'{}' does not fit {}", value, kind),
    }
    Ok(())
}

// =============================================================================
// MATERIALIZE / CYCLE COMMANDS
// =============================================================================

/// Materialize every command of an output-link document.
pub fn cmd_materialize(json_mode: bool, mut session: Session, file: &Path) -> Result<(), BridgeError> {
    let doc = read_document(file)?;
    session.set_output_link_json(&doc)?;
    print_records(json_mode, &session)
}

/// Run one cycle against a remote kernel and materialize its reply.
pub async fn cmd_cycle(
    json_mode: bool,
    mut session: Session,
    file: &Path,
    kernel_url: Option<&str>,
    timeout: Option<u64>,
) -> Result<(), BridgeError> {
    let client = KernelClient::from_env(kernel_url, timeout.map(Duration::from_secs))
        .ok_or_else(|| {
            BridgeError::MalformedInput(
                "no kernel URL: pass --kernel-url or set IDEABRIDGE_KERNEL_URL".to_string(),
            )
        })?;

    let doc = read_document(file)?;
    session.set_input_link_json(&doc)?;
    let input = to_json(&session.input_link_idea()?);

    tracing::info!(
        kernel = %client.base_url(),
        timeout = ?client.timeout(),
        "running kernel cycle"
    );
    let reply = client.cycle(&input).await.map_err(kernel_error)?;
    let written = session.set_output_link_json(&reply)?;
    tracing::debug!(written, "kernel output delivered");

    print_records(json_mode, &session)
}

fn kernel_error(error: KernelError) -> BridgeError {
    match error {
        KernelError::ParseError(msg) => BridgeError::DeserializationError(msg),
        other => BridgeError::IoError(other.to_string()),
    }
}

fn print_records(json_mode: bool, session: &Session) -> Result<(), BridgeError> {
    let records: Vec<Value> = session
        .output_in_records()?
        .iter()
        .map(|record| record_to_json(&**record))
        .collect();

    if json_mode {
        print_json(&Value::Array(records));
        return Ok(());
    }

    println!("Materialized {} command(s)", records.len());
    for record in &records {
        println!("  {}", record);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
