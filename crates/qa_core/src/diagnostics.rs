//! Structured run diagnostics and per-block decisions.
//!
//! Warnings are logged where they happen, but the caller also receives them
//! here so a presentation layer can show them without scraping logs.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{Brand, WorkerName};

/// Something the caller should know about; never fatal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An iteration guard fired; `unresolved` items were routed to Backlog
    /// (split) or left where they were (rebalance).
    IterationGuard { stage: String, limit: u64, unresolved: u64 },
    /// Item excluded from allocation (missing or duplicate id).
    UnassignableItem { position: usize, reason: String },
    /// Capacity override for a name that is not on the team.
    IgnoredCapacityOverride { name: String },
    /// Pre-assignment naming a worker who is absent, has no capacity, or is unknown.
    InactivePreAssignment { brand: String, worker: String },
    /// Second pre-assignment for an already bound brand; the first one wins.
    DuplicatePreAssignment { brand: String, worker: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IterationGuard { stage, limit, unresolved } => {
                write!(f, "{stage}: iteration guard hit after {limit} steps ({unresolved} unresolved)")
            }
            Diagnostic::UnassignableItem { position, reason } => {
                write!(f, "record #{position} unassignable: {reason}")
            }
            Diagnostic::IgnoredCapacityOverride { name } => {
                write!(f, "capacity override for {name} ignored (not on the team)")
            }
            Diagnostic::InactivePreAssignment { brand, worker } => {
                write!(f, "pre-assignment {brand} -> {worker} ignored (worker not active)")
            }
            Diagnostic::DuplicatePreAssignment { brand, worker } => {
                write!(f, "duplicate pre-assignment {brand} -> {worker} ignored")
            }
        }
    }
}

/// Where a brand's items ended up once every pass has run.
///
/// `PlacedWhole` means one worker holds every item; anything else that
/// reached at least one worker is `PlacedSplit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BlockState {
    PlacedWhole { worker: WorkerName },
    PlacedSplit { workers: Vec<WorkerName>, backlogged: usize },
    Backlogged,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDecision {
    pub brand: Brand,
    /// Items in the brand, priority and pre-assigned ones included.
    pub size: usize,
    #[serde(flatten)]
    pub state: BlockState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_serialize_with_kind_tag() {
        let d = Diagnostic::IgnoredCapacityOverride { name: "Zed".into() };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["kind"], "ignored_capacity_override");
        assert!(d.to_string().contains("Zed"));
    }

    #[test]
    fn block_decision_flattens_state() {
        let d = BlockDecision {
            brand: Brand::from_raw(Some("Acme")),
            size: 4,
            state: BlockState::Backlogged,
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["state"], "backlogged");
        assert_eq!(v["brand"], "Acme");
    }
}
