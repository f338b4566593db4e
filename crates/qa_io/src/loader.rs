//! Loader: read local JSON inputs (items, roster, optional config), either
//! directly or through a run manifest. Returns raw `qa_core` records; the
//! pipeline normalizes them. No network I/O.

#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use qa_core::sources::{RawItem, RawRoster};
use qa_core::variables::{validate_domains, EngineConfig};

use crate::{looks_like_url_strict, manifest, IoError};

/// Everything a run reads from disk.
#[derive(Debug, Clone, Default)]
pub struct LoadedInputs {
    pub items: Vec<RawItem>,
    pub roster: RawRoster,
    /// `None` when no config file was named.
    pub config: Option<EngineConfig>,
}

/// Items file: a bare array, or an object with an `items` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsFile {
    Bare(Vec<RawItem>),
    Wrapped { items: Vec<RawItem> },
}

fn read_json<T: DeserializeOwned>(label: &str, path: &Path) -> Result<T, IoError> {
    if looks_like_url_strict(&path.to_string_lossy()) {
        return Err(IoError::Invalid(format!("{label} path must be local: {}", path.display())));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{label}: {} ({e})", path.display())))?;
    serde_json::from_slice(&bytes).map_err(|e| IoError::Json {
        pointer: format!("{}:{}:{}", path.display(), e.line(), e.column()),
        msg: e.to_string(),
    })
}

pub fn load_items(path: &Path) -> Result<Vec<RawItem>, IoError> {
    Ok(match read_json::<ItemsFile>("items", path)? {
        ItemsFile::Bare(v) => v,
        ItemsFile::Wrapped { items } => items,
    })
}

pub fn load_roster(path: &Path) -> Result<RawRoster, IoError> {
    read_json("roster", path)
}

/// Parse and domain-check a configuration file.
pub fn load_config(path: &Path) -> Result<EngineConfig, IoError> {
    let cfg: EngineConfig = read_json("config", path)?;
    validate_domains(&cfg).map_err(|e| IoError::Invalid(format!("config {}: {e}", path.display())))?;
    Ok(cfg)
}

/// Load items + roster (+ config) from explicit paths.
pub fn load_all(items: &Path, roster: &Path, config: Option<&Path>) -> Result<LoadedInputs, IoError> {
    Ok(LoadedInputs {
        items: load_items(items)?,
        roster: load_roster(roster)?,
        config: config.map(load_config).transpose()?,
    })
}

/// Manifest → resolved paths → inputs.
pub fn load_all_from_manifest(path: &Path) -> Result<LoadedInputs, IoError> {
    let resolved = manifest::load_manifest(path)?;
    load_all(&resolved.items_path, &resolved.roster_path, resolved.config_path.as_deref())
}
