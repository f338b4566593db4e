//! Run summary: per-worker load against target and limit, plus global spread.

use serde::{Deserialize, Serialize};

use qa_algo::AllocationState;
use qa_core::WorkerName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub name: WorkerName,
    pub assigned: u32,
    pub target: u32,
    pub limit: u32,
    /// assigned − target
    pub variance: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Active workers, canonical order.
    pub workers: Vec<WorkerSummary>,
    pub total_items: u32,
    pub max_assigned: u32,
    pub min_assigned: u32,
    pub spread: u32,
    pub backlog_count: u32,
    pub unassignable_count: u32,
}

pub fn summarize(state: &AllocationState, unassignable: usize) -> RunSummary {
    let workers: Vec<WorkerSummary> = (0..state.worker_count())
        .map(|w| WorkerSummary {
            name: state.names[w].clone(),
            assigned: state.loads[w],
            target: state.targets[w],
            limit: state.capacities[w],
            variance: state.loads[w] as i64 - state.targets[w] as i64,
        })
        .collect();
    let max_assigned = state.loads.iter().copied().max().unwrap_or(0);
    let min_assigned = state.loads.iter().copied().min().unwrap_or(0);
    let backlog_count = state.backlog.len() as u32;
    RunSummary {
        workers,
        total_items: state.loads.iter().sum::<u32>() + backlog_count,
        max_assigned,
        min_assigned,
        spread: max_assigned - min_assigned,
        backlog_count,
        unassignable_count: unassignable as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_algo::{PlacementPlan, Slot};
    use qa_core::{Brand, ItemId, Worker};

    #[test]
    fn reports_variance_and_spread() {
        let ws: Vec<Worker> = ["a", "b"]
            .iter()
            .map(|n| Worker {
                name: WorkerName::normalize(n).unwrap(),
                capacity: 5,
                preferred_categories: vec![],
                active: true,
            })
            .collect();
        let mut st = AllocationState::new(&ws, &[2, 2]);
        let brand = Brand::from_raw(None);
        let mut plan = PlacementPlan::default();
        for i in 0..3u64 {
            plan.push(&ItemId::from(i), &brand, Slot::Worker(0), false);
        }
        plan.push(&ItemId::from(9u64), &brand, Slot::Backlog, false);
        st.commit(plan);

        let s = summarize(&st, 2);
        assert_eq!(s.workers[0].variance, 1);
        assert_eq!(s.workers[1].variance, -2);
        assert_eq!((s.max_assigned, s.min_assigned, s.spread), (3, 0, 3));
        assert_eq!((s.backlog_count, s.unassignable_count, s.total_items), (1, 2, 4));
    }
}
