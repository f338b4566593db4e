//! qa_report: pure offline report model + renderers (text/JSON).
//!
//! Determinism rules:
//! - No I/O here. Callers hand over an `AllocationOutcome` already in memory.
//! - Percent strings use one-decimal formatting without float arithmetic.
//! - Stable section order and field names.

#![deny(unsafe_code)]

use serde::Serialize;

use qa_pipeline::AllocationOutcome;

#[cfg(feature = "render_json")]
pub mod render_json;
#[cfg(feature = "render_text")]
pub mod render_text;

#[cfg(feature = "render_json")]
pub use render_json::render_report_json;
#[cfg(feature = "render_text")]
pub use render_text::render_report_text;

// ===== Errors =====
#[derive(Debug)]
pub enum ReportError {
    Render(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Render(m) => write!(f, "report rendering failed: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportModel {
    pub header: SectionHeader,
    pub workers: Vec<WorkerLine>,
    pub backlog: SectionBacklog,
    pub balance: SectionBalance,
    pub unassignable: Vec<UnassignableLine>,
    /// Rendered diagnostic messages, outcome order.
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    pub title: String,
    pub total_items: u32,
    pub active_workers: usize,
    /// Short form of the input digest (first 12 hex chars).
    pub input_digest: String,
    pub backlog_mode: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerLine {
    pub name: String,
    pub assigned: u32,
    pub limit: u32,
    pub target: u32,
    /// Signed, e.g. `+2`, `0`, `-1`.
    pub variance: String,
    /// assigned / limit, e.g. `66.7%`.
    pub utilization: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionBacklog {
    pub count: u32,
    /// backlog / total items.
    pub share: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionBalance {
    pub max_assigned: u32,
    pub min_assigned: u32,
    pub spread: u32,
    pub split_blocks: usize,
    pub whole_blocks: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnassignableLine {
    pub position: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Build the presentation model from a finished run.
pub fn build_model(outcome: &AllocationOutcome) -> ReportModel {
    let s = &outcome.summary;
    let workers = s
        .workers
        .iter()
        .map(|w| WorkerLine {
            name: w.name.to_string(),
            assigned: w.assigned,
            limit: w.limit,
            target: w.target,
            variance: signed(w.variance),
            utilization: percent_one_decimal(u64::from(w.assigned), u64::from(w.limit)),
        })
        .collect();

    let (mut whole, mut split) = (0usize, 0usize);
    for d in &outcome.decisions {
        match d.state {
            qa_core::BlockState::PlacedWhole { .. } => whole += 1,
            qa_core::BlockState::PlacedSplit { .. } => split += 1,
            qa_core::BlockState::Backlogged => {}
        }
    }

    ReportModel {
        header: SectionHeader {
            title: "Assignment Summary".into(),
            total_items: s.total_items,
            active_workers: s.workers.len(),
            input_digest: outcome.input_digest.chars().take(12).collect(),
            backlog_mode: outcome.config.backlog_mode,
        },
        workers,
        backlog: SectionBacklog {
            count: s.backlog_count,
            share: percent_one_decimal(u64::from(s.backlog_count), u64::from(s.total_items)),
        },
        balance: SectionBalance {
            max_assigned: s.max_assigned,
            min_assigned: s.min_assigned,
            spread: s.spread,
            split_blocks: split,
            whole_blocks: whole,
        },
        unassignable: outcome
            .unassignable
            .iter()
            .map(|u| UnassignableLine { position: u.position, id: u.id.clone(), reason: u.reason.clone() })
            .collect(),
        notes: outcome.diagnostics.iter().map(ToString::to_string).collect(),
    }
}

/// `num/den` as a percent with one decimal, half-up, integer math only.
/// A zero denominator renders as `0.0%`.
pub fn percent_one_decimal(num: u64, den: u64) -> String {
    if den == 0 {
        return "0.0%".into();
    }
    let tenths = (u128::from(num) * 1000 + u128::from(den) / 2) / u128::from(den);
    format!("{}.{}%", tenths / 10, tenths % 10)
}

fn signed(v: i64) -> String {
    if v > 0 {
        format!("+{v}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::sources::{RawCapacity, RawId, RawItem, RawMember, RawPreferences, RawRoster};
    use qa_core::EngineConfig;

    pub(crate) fn sample_outcome() -> AllocationOutcome {
        let items: Vec<RawItem> = (0..10u64)
            .map(|i| RawItem { id: Some(RawId::Number(i)), brand: Some("Acme".into()), ..RawItem::default() })
            .chain(std::iter::once(RawItem::default()))
            .collect();
        let members = [("ann", 3), ("bob", 3)]
            .iter()
            .map(|&(n, c)| RawMember {
                name: n.into(),
                capacity: Some(RawCapacity::Count(c)),
                preferences: RawPreferences::default(),
            })
            .collect();
        qa_pipeline::run(items, RawRoster { members, ..RawRoster::default() }, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn percent_is_integer_rounded() {
        assert_eq!(percent_one_decimal(2, 3), "66.7%");
        assert_eq!(percent_one_decimal(1, 8), "12.5%");
        assert_eq!(percent_one_decimal(5, 0), "0.0%");
        assert_eq!(percent_one_decimal(3, 3), "100.0%");
    }

    #[test]
    fn model_reflects_outcome() {
        let m = build_model(&sample_outcome());
        assert_eq!(m.header.total_items, 10);
        assert_eq!(m.header.input_digest.len(), 12);
        assert_eq!(m.workers.len(), 2);
        assert_eq!(m.workers[0].name, "Ann");
        assert_eq!(m.workers[0].variance, "0");
        assert_eq!(m.workers[0].utilization, "100.0%");
        assert_eq!(m.backlog.count, 4);
        assert_eq!(m.backlog.share, "40.0%");
        assert_eq!(m.balance.split_blocks, 1);
        assert_eq!(m.unassignable.len(), 1);
        assert_eq!(m.notes.len(), 1);
    }
}
