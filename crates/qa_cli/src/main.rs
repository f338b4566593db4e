// crates/qa_cli/src/main.rs
//
// Wires up exit codes, typed error mapping, logging, input loading, CLI
// overrides, the validate-only short-circuit and the full run path
// (load → overrides → pipeline → artifacts → optional rendering).

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    pub const VALIDATION: u8 = 2;
    pub const IO: u8 = 4;
    pub const DATA: u8 = 5;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args};

use qa_core::sources::RawCapacityOverride;
use qa_core::variables::validate_domains;
use qa_core::{BlockDecision, Diagnostic, EngineConfig, ItemId, WorkerName};
use qa_io::canonical_json::write_canonical_file;
use qa_io::loader::{self, LoadedInputs};
use qa_io::sink::JsonAssignmentSink;
use qa_pipeline::{AllocationOutcome, PipelineError, RunSummary, Unassignable};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Flags, JSON shape, manifest, configuration domains, roster problems
    Validation(String),
    /// Read/write/path failures
    Io(String),
    /// Item source unusable as a whole
    Data(String),
    /// Report build or output
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Io(m) | MainError::Data(m) | MainError::Render(m) => {
                f.write_str(m)
            }
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("qa-assign: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION);
        }
    };
    init_tracing(args.verbose);

    let result = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    match result {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            eprintln!("qa-assign: error: {e}");
            ExitCode::from(map_error(&e))
        }
    }
}

/// `QA_LOG` wins; otherwise `warn`, or `info` with `--verbose`. Always stderr.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("QA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn map_error(e: &MainError) -> u8 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Io(_) | MainError::Render(_) => IO,
        MainError::Data(_) => DATA,
    }
}

/// Translate qa_io::IoError into MainError buckets.
fn map_qaio_err(e: qa_io::IoError) -> MainError {
    use qa_io::IoError::*;
    match e {
        Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        Manifest(m) => MainError::Validation(format!("manifest: {m}")),
        Invalid(m) => MainError::Validation(m),
        Hash(m) => MainError::Validation(format!("hash: {m}")),
        Path(m) => MainError::Io(format!("path: {m}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Config(m) => MainError::Validation(format!("configuration: {m}")),
        PipelineError::Data(m) => MainError::Data(format!("data: {m}")),
        PipelineError::Io(m) => MainError::Io(format!("io: {m}")),
        PipelineError::Sink(m) => MainError::Io(format!("write-back: {m}")),
    }
}

/// Read inputs and fold the CLI overrides into roster and config.
fn load_inputs(args: &Args) -> Result<(LoadedInputs, EngineConfig), MainError> {
    let mut loaded = match (&args.manifest, &args.items, &args.roster) {
        (Some(m), _, _) => loader::load_all_from_manifest(m),
        (None, Some(items), Some(roster)) => loader::load_all(items, roster, args.config.as_deref()),
        _ => return Err(MainError::Validation("either --manifest or --items and --roster is required".into())),
    }
    .map_err(map_qaio_err)?;

    let mut config = loaded.config.take().unwrap_or_default();
    if args.backlog_mode {
        config.backlog_mode = true;
    }
    if let Some(cap) = args.default_capacity {
        config.default_capacity = cap;
    }
    validate_domains(&config).map_err(|e| MainError::Validation(format!("configuration: {e}")))?;

    if let Some(absent) = &args.absent {
        loaded.roster.absent = absent
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
    }
    for entry in &args.limit {
        let parsed = RawCapacityOverride::parse_list(entry)
            .map_err(|e| MainError::Validation(format!("--limit {entry:?}: {e}")))?;
        loaded.roster.capacity_overrides.extend(parsed);
    }
    debug!(
        items = loaded.items.len(),
        members = loaded.roster.members.len(),
        overrides = loaded.roster.capacity_overrides.len(),
        "inputs loaded"
    );
    Ok((loaded, config))
}

/// Load and normalize (catalog + roster) without allocating or writing anything.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let (loaded, config) = load_inputs(args)?;
    let roster = qa_pipeline::roster::build_roster(loaded.roster, &config).map_err(map_pipeline_err)?;
    let catalog =
        qa_pipeline::catalog::build_catalog(loaded.items, config.backlog_mode).map_err(map_pipeline_err)?;
    if !args.quiet {
        println!(
            "validate-only: inputs OK ({} items, {} unassignable, {} active workers)",
            catalog.len(),
            catalog.unassignable.len(),
            roster.active().len()
        );
    }
    Ok(())
}

/// `summary.json`: everything but the per-item rows (those live in `assignments.json`).
#[derive(Serialize)]
struct SummaryArtifact<'a> {
    input_digest: &'a str,
    config: &'a EngineConfig,
    summary: &'a RunSummary,
    targets: &'a std::collections::BTreeMap<WorkerName, u32>,
    backlog: &'a [ItemId],
    unassignable: &'a [Unassignable],
    decisions: &'a [BlockDecision],
    diagnostics: &'a [Diagnostic],
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let (loaded, config) = load_inputs(args)?;
    let outcome = qa_pipeline::run(loaded.items, loaded.roster, &config).map_err(map_pipeline_err)?;

    write_artifacts(&args.out, &outcome)?;
    let model = qa_report::build_model(&outcome);
    maybe_render_reports(args, &model, &args.out)?;

    if !args.quiet {
        print!("{}", qa_report::render_report_text(&model));
    }
    info!(out = %args.out.display(), "artifacts written");
    Ok(())
}

fn write_artifacts(out_dir: &Path, outcome: &AllocationOutcome) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;

    let mut sink = JsonAssignmentSink::new(out_dir.join("assignments.json"));
    qa_pipeline::write_back(outcome, &mut sink).map_err(map_pipeline_err)?;

    let summary = SummaryArtifact {
        input_digest: &outcome.input_digest,
        config: &outcome.config,
        summary: &outcome.summary,
        targets: &outcome.targets,
        backlog: &outcome.backlog,
        unassignable: &outcome.unassignable,
        decisions: &outcome.decisions,
        diagnostics: &outcome.diagnostics,
    };
    write_canonical_file(&out_dir.join("summary.json"), &summary)
        .map_err(|e| MainError::Io(format!("write summary.json: {e}")))
}

fn maybe_render_reports(args: &Args, model: &qa_report::ReportModel, out_dir: &Path) -> Result<(), MainError> {
    for fmt in &args.render {
        match fmt.as_str() {
            "text" => {
                let path = out_dir.join("report.txt");
                fs::write(&path, qa_report::render_report_text(model))
                    .map_err(|e| MainError::Io(format!("write report.txt: {e}")))?;
            }
            "json" => render_json_report(model, out_dir)?,
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

// Always accept the concrete model type; gate body by feature.
fn render_json_report(model: &qa_report::ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let body = qa_report::render_report_json(model).map_err(|e| MainError::Render(e.to_string()))?;
        fs::write(out_dir.join("report.json"), body).map_err(|e| MainError::Io(format!("write report.json: {e}")))
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}
