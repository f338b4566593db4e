//! qa_pipeline: deterministic pipeline surface
//! (catalog → roster → blocks → targets → allocate → rebalance → summary).
//!
//! Stages are pure over their inputs; all state lives in one `AllocationState`
//! owned by a single `run` call. JSON, hashing and file access are delegated
//! to `qa_io`, the algorithms to `qa_algo`.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use qa_algo::{allocate, compute_targets, rebalance, EngineInput, EngineLimits};
use qa_core::sources::{AssignmentSink, ItemSource, WorkerSource};
use qa_core::variables::validate_domains;
use qa_core::{Assignee, BlockDecision, Brand, CoreError, Diagnostic, EngineConfig, Item, ItemId, Worker, WorkerName};
use qa_io::hasher;
use qa_io::sink::AssignmentRow;

pub mod blocks;
pub mod catalog;
pub mod roster;
pub mod summary;

pub use catalog::{ItemCatalog, Unassignable};
pub use roster::WorkerRoster;
pub use summary::{RunSummary, WorkerSummary};

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    /// Empty roster, malformed capacity, config domain out of range.
    Config(String),
    /// Item source unusable as a whole.
    Data(String),
    Io(String),
    /// Write-back failed.
    Sink(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(m) => write!(f, "configuration error: {m}"),
            PipelineError::Data(m) => write!(f, "data error: {m}"),
            PipelineError::Io(m) => write!(f, "io error: {m}"),
            PipelineError::Sink(m) => write!(f, "write-back error: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<CoreError> for PipelineError {
    fn from(e: CoreError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<qa_io::IoError> for PipelineError {
    fn from(e: qa_io::IoError) -> Self {
        use qa_io::IoError as E;
        match e {
            // Domain failures found while loading a config file are still config errors.
            E::Invalid(m) => PipelineError::Config(m),
            other => PipelineError::Io(other.to_string()),
        }
    }
}

/// Everything a caller needs to render or persist one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    /// One row per assignable item, catalog order.
    pub rows: Vec<AssignmentRow>,
    pub assignments: BTreeMap<ItemId, Assignee>,
    /// Active workers only.
    pub counts: BTreeMap<WorkerName, u32>,
    pub targets: BTreeMap<WorkerName, u32>,
    pub backlog: Vec<ItemId>,
    pub unassignable: Vec<Unassignable>,
    pub summary: RunSummary,
    pub decisions: Vec<BlockDecision>,
    pub diagnostics: Vec<Diagnostic>,
    /// SHA-256 over the canonical normalized inputs and effective config.
    pub input_digest: String,
    pub config: EngineConfig,
}

/// Canonical digest payload; field order is irrelevant (keys are sorted).
#[derive(Serialize)]
struct DigestInputs<'a> {
    items: &'a [Item],
    team: &'a [Worker],
    pre_assignments: &'a BTreeMap<Brand, WorkerName>,
    config: &'a EngineConfig,
}

/// Run every stage over one item source and one worker source.
#[instrument(skip_all, fields(backlog_mode = config.backlog_mode))]
pub fn run<I: ItemSource, W: WorkerSource>(
    items: I,
    workers: W,
    config: &EngineConfig,
) -> Result<AllocationOutcome, PipelineError> {
    validate_domains(config)?;

    let roster = roster::build_roster(workers.into_roster(), config)?;
    let catalog = catalog::build_catalog(items, config.backlog_mode)?;

    let input_digest = hasher::sha256_canonical(&DigestInputs {
        items: &catalog.items,
        team: &roster.team,
        pre_assignments: &roster.pre_assignments,
        config,
    })
    .map_err(|e| PipelineError::Io(e.to_string()))?;

    let active = roster.active();
    let capacities: Vec<u32> = active.iter().map(|w| w.capacity).collect();
    let total = u32::try_from(catalog.len()).map_err(|_| PipelineError::Data("too many items".into()))?;
    let targets = compute_targets(total, &capacities);
    let limits = EngineLimits::for_run(catalog.len(), active.len(), config.guard_factor);

    let state = allocate(EngineInput {
        workers: &active,
        targets: &targets,
        blocks: blocks::build_blocks(&catalog.items, config.backlog_mode),
        pre_assignments: &roster.pre_assignments,
        config,
        limits,
    });
    let state = rebalance(state, config.rebalance, limits.rebalance_moves);

    let summary = summary::summarize(&state, catalog.unassignable.len());
    info!(
        items = catalog.len(),
        workers = active.len(),
        backlog = summary.backlog_count,
        unassignable = summary.unassignable_count,
        spread = summary.spread,
        "allocation finished"
    );

    let mut diagnostics = roster.diagnostics;
    diagnostics.extend(catalog.unassignable.iter().map(|u| Diagnostic::UnassignableItem {
        position: u.position,
        reason: u.reason.clone(),
    }));
    diagnostics.extend(state.diagnostics.iter().cloned());

    let mut rows = Vec::with_capacity(catalog.len());
    for it in &catalog.items {
        let assignee = state
            .assignments
            .get(&it.id)
            .cloned()
            .ok_or_else(|| PipelineError::Data(format!("item {} left unresolved", it.id)))?;
        rows.push(AssignmentRow { item: it.id.clone(), assignee });
    }

    let counts = state.names.iter().cloned().zip(state.loads.iter().copied()).collect();
    let targets = state.names.iter().cloned().zip(state.targets.iter().copied()).collect();

    Ok(AllocationOutcome {
        rows,
        assignments: state.assignments,
        counts,
        targets,
        backlog: state.backlog,
        unassignable: catalog.unassignable,
        summary,
        decisions: state.decisions,
        diagnostics,
        input_digest,
        config: config.clone(),
    })
}

/// Hand the final rows to a sink, one `record` per item in catalog order, then `finish`.
pub fn write_back<S>(outcome: &AllocationOutcome, sink: &mut S) -> Result<(), PipelineError>
where
    S: AssignmentSink,
    S::Error: fmt::Display,
{
    for row in &outcome.rows {
        sink.record(&row.item, &row.assignee)
            .map_err(|e| PipelineError::Sink(e.to_string()))?;
    }
    sink.finish().map_err(|e| PipelineError::Sink(e.to_string()))
}

/// Load a manifest's inputs and run. A config named by the manifest replaces `fallback`.
pub fn run_from_manifest_path<P: AsRef<Path>>(
    path: P,
    fallback: &EngineConfig,
) -> Result<AllocationOutcome, PipelineError> {
    let loaded = qa_io::loader::load_all_from_manifest(path.as_ref())?;
    let config = loaded.config.unwrap_or_else(|| fallback.clone());
    run(loaded.items, loaded.roster, &config)
}
