//! Worker Roster: raw team records → canonical `Worker`s plus the brand
//! pre-assignment map.
//!
//! - Names are title-cased; duplicate members are a configuration error.
//! - Capacity: member value, then `Name:Limit` overrides (later wins), else
//!   the configured default. Malformed values are configuration errors.
//! - Absentees and zero-capacity workers are inactive.
//! - An absentee list whose only entry is "no", "none" or "n" means nobody is absent.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument, warn};

use qa_core::determinism::sort_workers_canonical;
use qa_core::sources::RawRoster;
use qa_core::{Brand, Category, Diagnostic, EngineConfig, Worker, WorkerName};

use crate::PipelineError;

const NOBODY_ABSENT: [&str; 3] = ["no", "none", "n"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerRoster {
    /// Whole team in canonical order, inactive members included.
    pub team: Vec<Worker>,
    /// brand → designated worker (active workers only).
    pub pre_assignments: BTreeMap<Brand, WorkerName>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WorkerRoster {
    /// Active workers, canonical order.
    pub fn active(&self) -> Vec<Worker> {
        self.team.iter().filter(|w| w.active).cloned().collect()
    }
}

/// Names in the absentee list, or none when the list is the "nobody" marker.
fn absentees(raw: &[String]) -> Result<BTreeSet<WorkerName>, PipelineError> {
    let entries: Vec<&str> = raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if let [only] = entries.as_slice() {
        if NOBODY_ABSENT.iter().any(|m| m.eq_ignore_ascii_case(only)) {
            return Ok(BTreeSet::new());
        }
    }
    entries
        .into_iter()
        .map(|s| WorkerName::normalize(s).map_err(PipelineError::from))
        .collect()
}

#[instrument(skip_all, fields(members = raw.members.len()))]
pub fn build_roster(raw: RawRoster, config: &EngineConfig) -> Result<WorkerRoster, PipelineError> {
    if raw.members.is_empty() {
        return Err(PipelineError::Config("worker roster is empty".into()));
    }

    let mut diagnostics = Vec::new();
    let mut team: Vec<Worker> = Vec::with_capacity(raw.members.len());
    for m in &raw.members {
        let name = WorkerName::normalize(&m.name)?;
        if team.iter().any(|w| w.name == name) {
            return Err(PipelineError::Config(format!("duplicate team member: {name}")));
        }
        let capacity = match &m.capacity {
            Some(c) => c.parse(name.as_str())?,
            None => config.default_capacity,
        };
        let mut preferred_categories: Vec<Category> = Vec::new();
        for entry in m.preferences.entries() {
            if let Some(c) = Category::normalize(entry) {
                if !preferred_categories.contains(&c) {
                    preferred_categories.push(c);
                }
            }
        }
        team.push(Worker { name, capacity, preferred_categories, active: true });
    }

    for o in &raw.capacity_overrides {
        let name = WorkerName::normalize(&o.name)?;
        let limit = o.capacity.parse(name.as_str())?;
        match team.iter_mut().find(|w| w.name == name) {
            Some(w) => w.capacity = limit,
            None => {
                warn!(name = %name, "capacity override for a name not on the team; ignored");
                diagnostics.push(Diagnostic::IgnoredCapacityOverride { name: name.as_str().to_owned() });
            }
        }
    }

    let absent = absentees(&raw.absent)?;
    for name in &absent {
        if !team.iter().any(|w| &w.name == name) {
            debug!(name = %name, "absentee not on the team");
        }
    }
    for w in &mut team {
        w.active = w.capacity > 0 && !absent.contains(&w.name);
    }
    if !team.iter().any(|w| w.active) {
        return Err(PipelineError::Config("no active workers (all absent or without capacity)".into()));
    }

    sort_workers_canonical(&mut team, config.tie_order);

    let mut pre_assignments: BTreeMap<Brand, WorkerName> = BTreeMap::new();
    for p in &raw.pre_assignments {
        let brand = Brand::from_raw(Some(p.brand.as_str()));
        let worker = WorkerName::normalize(&p.worker)?;
        if !team.iter().any(|w| w.name == worker && w.active) {
            warn!(brand = %brand, worker = %worker, "pre-assignment to inactive or unknown worker; ignored");
            diagnostics.push(Diagnostic::InactivePreAssignment {
                brand: brand.as_str().to_owned(),
                worker: worker.as_str().to_owned(),
            });
            continue;
        }
        if pre_assignments.contains_key(&brand) {
            warn!(brand = %brand, worker = %worker, "duplicate pre-assignment; first one kept");
            diagnostics.push(Diagnostic::DuplicatePreAssignment {
                brand: brand.as_str().to_owned(),
                worker: worker.as_str().to_owned(),
            });
            continue;
        }
        pre_assignments.insert(brand, worker);
    }

    debug!(
        team = team.len(),
        active = team.iter().filter(|w| w.active).count(),
        pre_assigned = pre_assignments.len(),
        "roster built"
    );
    Ok(WorkerRoster { team, pre_assignments, diagnostics })
}
