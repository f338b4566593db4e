// crates/qa_cli/src/args.rs
//
// Offline CLI argument surface (types, validation, normalization).
//
// - No networked paths (reject any scheme:// like http/https/file)
// - Exactly one of: --manifest  XOR  (--items + --roster)
// - Optional: --config (explicit mode only; a manifest names its own config)
// - Overrides: --backlog-mode, --absent, --limit (repeatable), --default-capacity
// - Output: --out dir, --render [text|json]*
// - --validate-only loads and normalizes inputs without running the engine

use std::{
    env, fs,
    io::Read,
    path::{Path, PathBuf},
};

use clap::Parser;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "qa-assign",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic assignment of QA work items to a team"
)]
pub struct Args {
    // --- Mode selection ---
    /// Run manifest JSON naming the inputs (mutually exclusive with --items/--roster/--config).
    #[arg(long, conflicts_with_all = ["items", "roster", "config"])]
    pub manifest: Option<PathBuf>,

    /// Items JSON (array, or object with an `items` array).
    #[arg(long)]
    pub items: Option<PathBuf>,
    /// Roster JSON (members, absent, capacity_overrides, pre_assignments).
    #[arg(long)]
    pub roster: Option<PathBuf>,
    /// Engine configuration JSON.
    #[arg(long)]
    pub config: Option<PathBuf>,

    // --- Overrides ---
    /// Order items by sequence key and fill the earliest first.
    #[arg(long)]
    pub backlog_mode: bool,
    /// Comma-separated absentees; replaces the roster's list ("none" clears it).
    #[arg(long)]
    pub absent: Option<String>,
    /// Capacity overrides "Name:Limit, Name:Limit"; repeatable, appended after the roster's.
    #[arg(long)]
    pub limit: Vec<String>,
    /// Capacity for workers without an override.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub default_capacity: Option<u32>,

    // --- Output & rendering ---
    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Extra report file(s) to write into --out (report.txt, report.json).
    #[arg(long, value_parser = ["text", "json"])]
    pub render: Vec<String>,

    /// Load and normalize inputs only; do not allocate or write artifacts.
    #[arg(long)]
    pub validate_only: bool,
    /// Do not print the summary to stdout.
    #[arg(long)]
    pub quiet: bool,
    /// Log stage summaries (info) unless QA_LOG says otherwise.
    #[arg(long)]
    pub verbose: bool,
}

/// Errors surfaced by argument parsing/validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
    ManifestQuick(&'static str),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            ManifestQuick(s) => write!(f, "manifest quick-check failed: {s}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Mode checks, existence checks and path normalization on already parsed flags.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    if args.manifest.is_some() {
        validate_manifest_mode(&args)?;
        args.manifest = args.manifest.take().map(|p| normalize_path(&p));
    } else {
        validate_explicit_mode(&args)?;
        args.items = args.items.take().map(|p| normalize_path(&p));
        args.roster = args.roster.take().map(|p| normalize_path(&p));
        args.config = args.config.take().map(|p| normalize_path(&p));
    }

    // Output directory may not exist yet
    args.out = normalize_path(&args.out);
    Ok(args)
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    qa_io::looks_like_url_strict(s) || s.trim().to_ascii_lowercase().starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.manifest.as_deref(),
        args.items.as_deref(),
        args.roster.as_deref(),
        args.config.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

fn validate_manifest_mode(a: &Args) -> Result<(), CliError> {
    let path = a.manifest.as_ref().ok_or(CliError::Missing("--manifest"))?;
    ensure_local_exists(path, "--manifest")?;

    const MAX_BYTES: u64 = 1024 * 1024;
    let mut f = fs::File::open(path).map_err(|_| CliError::NotFound(format!("--manifest {}", path.display())))?;
    let mut buf = Vec::new();
    f.by_ref()
        .take(MAX_BYTES)
        .read_to_end(&mut buf)
        .map_err(|_| CliError::ManifestQuick("unable to read manifest file"))?;
    quick_check_manifest_bytes(&buf)
}

fn validate_explicit_mode(a: &Args) -> Result<(), CliError> {
    let items = a.items.as_ref().ok_or(CliError::Missing("--items (or --manifest)"))?;
    let roster = a.roster.as_ref().ok_or(CliError::Missing("--roster (or --manifest)"))?;
    ensure_local_exists(items, "--items")?;
    ensure_local_exists(roster, "--roster")?;
    if let Some(c) = &a.config {
        ensure_local_exists(c, "--config")?;
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Best-effort absolute path; falls back to CWD-relative when canonicalize fails.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

/// Lightweight manifest quick-check (no JSON parsing):
/// - "items_path" and "roster_path" present
/// - no "http://", "https://" or "file://" anywhere
pub fn quick_check_manifest_bytes(bytes: &[u8]) -> Result<(), CliError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CliError::ManifestQuick("manifest must be UTF-8"))?;
    if !text.contains("\"items_path\"") {
        return Err(CliError::ManifestQuick("missing items_path"));
    }
    if !text.contains("\"roster_path\"") {
        return Err(CliError::ManifestQuick("missing roster_path"));
    }
    if text.contains("http://") || text.contains("https://") || text.contains("file://") {
        return Err(CliError::ManifestQuick("URLs are not allowed (offline only)"));
    }
    Ok(())
}
