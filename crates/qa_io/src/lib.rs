//! crates/qa_io/src/lib.rs
//! I/O for the assignment engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - `loader`: items / roster / config / manifest JSON → raw `qa_core` records.
//! - `canonical_json`: sorted-key compact JSON and atomic file writes.
//! - `hasher`: SHA-256 over raw or canonical bytes.
//! - `sink`: an `AssignmentSink` that writes `assignments.json`.
//!
//! Strictly offline: any path carrying a URL scheme is rejected.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for qa_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors with a location hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Run manifest shape or policy violations.
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("hash error: {0}")]
    Hash(String),

    /// Generic validation / invariants (e.g. configuration domains).
    #[error("invalid: {0}")]
    Invalid(String),
}

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; report the position instead.
        IoError::Json {
            pointer: format!("line {} column {}", e.line(), e.column()),
            msg: e.to_string(),
        }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

impl From<manifest::ManifestError> for IoError {
    fn from(e: manifest::ManifestError) -> Self {
        IoError::Manifest(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod manifest;
pub mod loader;
pub mod sink;

/// Returns true if `s` looks like a URL (any `<scheme>://`, plus bare `http:` / `https:`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let t = s.trim();
    t.contains("://") || t.starts_with("http:") || t.starts_with("https:")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError};

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_all_from_manifest, load_config, load_items, load_roster, LoadedInputs};
    pub use crate::sink::JsonAssignmentSink;
}
