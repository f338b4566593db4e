// crates/qa_io/src/manifest.rs
//
// Run manifest: one JSON file naming the inputs of a run.
//
// • Required: items_path, roster_path. Optional: config_path.
// • Paths are relative to the manifest's directory (absolute paths pass through).
// • Offline-only: any path with a scheme ("://", "http:", "https:") is rejected.
// • Optional raw-file sha256 digests; when present they must be 64 lowercase hex
//   and are verified after resolution.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hasher::sha256_file;
use crate::looks_like_url_strict;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Optional user label; not used by any artifact.
    #[serde(default)]
    pub id: Option<String>,
    pub items_path: String,
    pub roster_path: String,
    #[serde(default)]
    pub config_path: Option<String>,
    #[serde(default)]
    pub inputs_sha256: Option<InputDigests>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDigests {
    #[serde(default)]
    pub items_path: Option<String>,
    #[serde(default)]
    pub roster_path: Option<String>,
    #[serde(default)]
    pub config_path: Option<String>,
}

/// Paths resolved against the manifest's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub items_path: PathBuf,
    pub roster_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub digests: Option<InputDigests>,
}

#[derive(Debug)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    Io(&'static str, String),
    NotAFile(&'static str, String),
    Parse(String),
    DigestShape(&'static str, String),
    DigestMismatch(&'static str, String),
    DigestForMissing(&'static str),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {}", k),
            UrlPath(k, v) => write!(f, "path must be local (no scheme) for {}: {}", k, v),
            Io(k, v) => write!(f, "cannot access {}: {}", k, v),
            NotAFile(k, v) => write!(f, "path is not a file for {}: {}", k, v),
            Parse(v) => write!(f, "cannot parse manifest: {}", v),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {}: {}", k, v),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {}: {}", k, v),
            DigestForMissing(k) => write!(f, "digest supplied for missing input: {}", k),
        }
    }
}
impl std::error::Error for ManifestError {}

// ---------- helpers (pure) ----------

#[inline]
fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn path_field(label: &'static str, s: &str) -> Result<(), ManifestError> {
    if s.trim().is_empty() {
        return Err(ManifestError::Empty(label));
    }
    if looks_like_url_strict(s) {
        return Err(ManifestError::UrlPath(label, s.to_string()));
    }
    Ok(())
}

fn digest_field(label: &'static str, digest: Option<&String>, present: bool) -> Result<(), ManifestError> {
    let Some(h) = digest else { return Ok(()) };
    if !present {
        return Err(ManifestError::DigestForMissing(label));
    }
    if !is_lower_hex_64(h) {
        return Err(ManifestError::DigestShape(label, h.clone()));
    }
    Ok(())
}

// ---------- validation / resolution ----------

/// Shape and offline policy. No I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    path_field("items_path", &man.items_path)?;
    path_field("roster_path", &man.roster_path)?;
    if let Some(c) = &man.config_path {
        path_field("config_path", c)?;
    }
    if let Some(d) = &man.inputs_sha256 {
        digest_field("items_path", d.items_path.as_ref(), true)?;
        digest_field("roster_path", d.roster_path.as_ref(), true)?;
        digest_field("config_path", d.config_path.as_ref(), man.config_path.is_some())?;
    }
    Ok(())
}

/// Join paths under `base_dir` and check that every named input is a file.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let items = join_under(base_dir, &man.items_path);
    let roster = join_under(base_dir, &man.roster_path);
    let config = man.config_path.as_ref().map(|s| join_under(base_dir, s));

    must_exist_file("items_path", &items)?;
    must_exist_file("roster_path", &roster)?;
    if let Some(p) = &config {
        must_exist_file("config_path", p)?;
    }

    Ok(ResolvedManifest {
        items_path: items,
        roster_path: roster,
        config_path: config,
        digests: man.inputs_sha256.clone(),
    })
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

/// Compare provided digests with the raw bytes of the resolved files.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    let Some(d) = &resolved.digests else { return Ok(()) };

    fn check_one(label: &'static str, path: &Path, expect: &str) -> Result<(), ManifestError> {
        let got = sha256_file(path).map_err(|e| ManifestError::Io(label, e.to_string()))?;
        if got != expect {
            return Err(ManifestError::DigestMismatch(label, format!("expected={expect} got={got}")));
        }
        Ok(())
    }

    if let Some(h) = &d.items_path {
        check_one("items_path", &resolved.items_path, h)?;
    }
    if let Some(h) = &d.roster_path {
        check_one("roster_path", &resolved.roster_path, h)?;
    }
    if let (Some(h), Some(p)) = (&d.config_path, &resolved.config_path) {
        check_one("config_path", p, h)?;
    }
    Ok(())
}

/// Read → validate → resolve (relative to the manifest's directory) → verify digests.
pub fn load_manifest(path: &Path) -> Result<ResolvedManifest, ManifestError> {
    if looks_like_url_strict(&path.to_string_lossy()) {
        return Err(ManifestError::UrlPath("manifest", path.display().to_string()));
    }
    let bytes = fs::read(path).map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", path.display())))?;
    let man: Manifest = serde_json::from_slice(&bytes).map_err(|e| ManifestError::Parse(e.to_string()))?;
    validate_manifest(&man)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resolved = resolve_paths(base, &man)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}
