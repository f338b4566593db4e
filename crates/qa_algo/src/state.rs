//! Allocation state threaded through the engine passes and the rebalancer.
//!
//! Every mutation goes through [`AllocationState::commit`] (or the rebalancer's
//! `relocate`): a pass first builds a [`PlacementPlan`] against simulated loads,
//! then commits it in one step. A rejected plan leaves no trace.

use std::collections::BTreeMap;
use std::vec::Vec;

use qa_core::{Assignee, Block, BlockDecision, BlockState, Brand, Diagnostic, ItemId, Worker, WorkerName};

/// One item sitting on a worker's ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub item: ItemId,
    pub brand: Brand,
    /// Pre-assigned items are never moved by the rebalancer.
    pub pinned: bool,
}

/// Destination of a planned entry: a canonical worker index or Backlog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Worker(usize),
    Backlog,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedEntry {
    pub item: ItemId,
    pub brand: Brand,
    pub slot: Slot,
    pub pinned: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementPlan {
    pub entries: Vec<PlannedEntry>,
}

impl PlacementPlan {
    pub fn push(&mut self, item: &ItemId, brand: &Brand, slot: Slot, pinned: bool) {
        self.entries.push(PlannedEntry { item: item.clone(), brand: brand.clone(), slot, pinned });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct workers receiving items, in first-appearance order.
    pub fn workers(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for e in &self.entries {
            if let Slot::Worker(w) = e.slot {
                if !out.contains(&w) {
                    out.push(w);
                }
            }
        }
        out
    }

    pub fn backlogged(&self) -> usize {
        self.entries.iter().filter(|e| e.slot == Slot::Backlog).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationState {
    /// Active workers, canonical order. All other vectors are index-aligned.
    pub names: Vec<WorkerName>,
    pub capacities: Vec<u32>,
    pub targets: Vec<u32>,
    pub loads: Vec<u32>,
    /// Items per worker in placement order (the rebalancer pops from the end).
    pub ledger: Vec<Vec<Placement>>,
    pub assignments: BTreeMap<ItemId, Assignee>,
    /// Backlogged items in the order they were routed there.
    pub backlog: Vec<ItemId>,
    /// One entry per tracked brand block, derived from `assignments`.
    pub decisions: Vec<BlockDecision>,
    /// Item ids of each tracked block, index-aligned with `decisions`.
    pub block_items: Vec<Vec<ItemId>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AllocationState {
    pub fn new(workers: &[Worker], targets: &[u32]) -> Self {
        debug_assert_eq!(workers.len(), targets.len());
        AllocationState {
            names: workers.iter().map(|w| w.name.clone()).collect(),
            capacities: workers.iter().map(|w| w.capacity).collect(),
            targets: targets.to_vec(),
            loads: vec![0; workers.len()],
            ledger: vec![Vec::new(); workers.len()],
            assignments: BTreeMap::new(),
            backlog: Vec::new(),
            decisions: Vec::new(),
            block_items: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn room(&self, w: usize) -> u32 {
        self.capacities[w].saturating_sub(self.loads[w])
    }

    /// Room left before the worker reaches `min(target, capacity)`.
    #[inline]
    pub fn target_room(&self, w: usize) -> u32 {
        self.targets[w].min(self.capacities[w]).saturating_sub(self.loads[w])
    }

    pub fn index_of(&self, name: &WorkerName) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Apply a plan built against the current loads.
    pub fn commit(&mut self, plan: PlacementPlan) {
        for e in plan.entries {
            debug_assert!(!self.assignments.contains_key(&e.item), "item placed twice");
            match e.slot {
                Slot::Worker(w) => {
                    debug_assert!(self.loads[w] < self.capacities[w], "plan exceeds capacity");
                    self.loads[w] += 1;
                    self.assignments.insert(e.item.clone(), Assignee::Worker(self.names[w].clone()));
                    self.ledger[w].push(Placement { item: e.item, brand: e.brand, pinned: e.pinned });
                }
                Slot::Backlog => {
                    self.assignments.insert(e.item.clone(), Assignee::Backlog);
                    self.backlog.push(e.item);
                }
            }
        }
    }

    /// Move placements from one worker to another (rebalancer only).
    pub fn relocate(&mut self, from: usize, to: usize, moved: Vec<Placement>) {
        for p in moved {
            debug_assert!(self.loads[to] < self.capacities[to]);
            self.loads[from] -= 1;
            self.loads[to] += 1;
            self.assignments.insert(p.item.clone(), Assignee::Worker(self.names[to].clone()));
            self.ledger[to].push(p);
        }
    }

    pub fn note(&mut self, d: Diagnostic) {
        self.diagnostics.push(d);
    }

    /// Register the brand blocks whose terminal state `decisions` reports.
    pub fn track_blocks(&mut self, blocks: &[Block<'_>]) {
        self.block_items = blocks.iter().map(|b| b.items.iter().map(|it| it.id.clone()).collect()).collect();
        self.decisions = blocks
            .iter()
            .map(|b| BlockDecision { brand: b.brand.clone(), size: b.len(), state: BlockState::Backlogged })
            .collect();
        self.refresh_decisions();
    }

    /// Re-derive every tracked block's state from the current assignments.
    ///
    /// Workers are listed in the block's item order. An item that is not
    /// assigned yet counts as backlogged.
    pub fn refresh_decisions(&mut self) {
        for (decision, ids) in self.decisions.iter_mut().zip(&self.block_items) {
            let mut workers: Vec<WorkerName> = Vec::new();
            let mut backlogged = 0usize;
            for id in ids {
                match self.assignments.get(id) {
                    Some(Assignee::Worker(w)) => {
                        if !workers.contains(w) {
                            workers.push(w.clone());
                        }
                    }
                    _ => backlogged += 1,
                }
            }
            decision.state = if workers.is_empty() {
                BlockState::Backlogged
            } else if workers.len() == 1 && backlogged == 0 {
                BlockState::PlacedWhole { worker: workers.swap_remove(0) }
            } else {
                BlockState::PlacedSplit { workers, backlogged }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::Item;

    fn worker(n: &str, cap: u32) -> Worker {
        Worker { name: WorkerName::normalize(n).unwrap(), capacity: cap, preferred_categories: vec![], active: true }
    }

    #[test]
    fn commit_updates_loads_ledger_and_map() {
        let mut st = AllocationState::new(&[worker("a", 2), worker("b", 2)], &[1, 1]);
        let brand = Brand::from_raw(Some("X"));
        let mut plan = PlacementPlan::default();
        plan.push(&ItemId::from(1u64), &brand, Slot::Worker(1), false);
        plan.push(&ItemId::from(2u64), &brand, Slot::Backlog, false);
        assert_eq!(plan.workers(), vec![1]);
        assert_eq!(plan.backlogged(), 1);
        st.commit(plan);

        assert_eq!(st.loads, vec![0, 1]);
        assert_eq!(st.ledger[1].len(), 1);
        assert_eq!(st.backlog, vec![ItemId::from(2u64)]);
        assert!(st.assignments[&ItemId::from(2u64)].is_backlog());
        assert_eq!(st.room(1), 1);
        assert_eq!(st.target_room(1), 0);
    }

    #[test]
    fn relocate_moves_load() {
        let mut st = AllocationState::new(&[worker("a", 2), worker("b", 2)], &[1, 1]);
        let brand = Brand::from_raw(None);
        let mut plan = PlacementPlan::default();
        plan.push(&ItemId::from(1u64), &brand, Slot::Worker(0), false);
        plan.push(&ItemId::from(2u64), &brand, Slot::Worker(0), false);
        st.commit(plan);

        let p = st.ledger[0].pop().unwrap();
        st.relocate(0, 1, vec![p]);
        assert_eq!(st.loads, vec![1, 1]);
        assert_eq!(st.assignments[&ItemId::from(2u64)].to_string(), "B");
    }

    #[test]
    fn decisions_follow_assignments() {
        let mut st = AllocationState::new(&[worker("a", 5), worker("b", 5)], &[2, 2]);
        let brand = Brand::from_raw(Some("X"));
        let xs: Vec<Item> = (1..=3u64)
            .map(|i| Item {
                id: ItemId::from(i),
                brand: brand.clone(),
                category: None,
                priority: false,
                sequence_key: None,
                position: i as usize,
            })
            .collect();
        let block = Block { brand: brand.clone(), items: xs.iter().collect(), origin: 0 };
        st.track_blocks(&[block]);
        assert_eq!(st.decisions[0].state, BlockState::Backlogged);
        assert_eq!(st.decisions[0].size, 3);

        let mut plan = PlacementPlan::default();
        for it in &xs {
            plan.push(&it.id, &brand, Slot::Worker(0), false);
        }
        st.commit(plan);
        st.refresh_decisions();
        assert_eq!(st.decisions[0].state, BlockState::PlacedWhole { worker: st.names[0].clone() });

        let p = st.ledger[0].pop().unwrap();
        st.relocate(0, 1, vec![p]);
        st.refresh_decisions();
        assert_eq!(
            st.decisions[0].state,
            BlockState::PlacedSplit { workers: st.names.clone(), backlogged: 0 }
        );
    }
}
