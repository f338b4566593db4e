//! Post-allocation rebalancing.
//!
//! Contract:
//! - Moves items from the most-over-target worker to the most-under-target
//!   worker until the load gap between them is ≤ 1 or no movable item remains.
//! - Pinned (pre-assigned) items and Backlog are never touched.
//! - `Brand` mode first tries to move a whole brand group when that keeps
//!   both sides on their side of target and strictly lowers max − min;
//!   otherwise it falls back to single-item moves.
//! - Capacity is respected: a receiver is always below its target, hence below capacity.
//! - Bounded by `max_moves`; hitting the bound records a diagnostic.
//! - Block decisions are re-derived after any move.

use std::vec::Vec;

use tracing::{debug, instrument, warn};

use qa_core::variables::RebalanceMode;
use qa_core::{Brand, Diagnostic};

use crate::state::{AllocationState, Placement};

#[instrument(skip_all, fields(mode = ?mode, max_moves = max_moves))]
pub fn rebalance(mut state: AllocationState, mode: RebalanceMode, max_moves: usize) -> AllocationState {
    if mode == RebalanceMode::Off || state.worker_count() < 2 {
        return state;
    }

    let mut exhausted = vec![false; state.worker_count()];
    let mut moves = 0usize;
    loop {
        let (Some(over), Some(under)) = (most_over(&state, &exhausted), most_under(&state)) else {
            break;
        };
        if state.loads[over] <= state.loads[under] + 1 {
            break;
        }
        if moves >= max_moves {
            let unresolved = state.loads[over] - state.targets[over];
            warn!(limit = max_moves, unresolved, "rebalance iteration guard hit");
            state.note(Diagnostic::IterationGuard {
                stage: "rebalance".to_owned(),
                limit: max_moves as u64,
                unresolved: unresolved as u64,
            });
            break;
        }

        if mode == RebalanceMode::Brand {
            if let Some(group) = take_brand_group(&mut state, over, under) {
                debug!(from = %state.names[over], to = %state.names[under], size = group.len(), "moved brand group");
                state.relocate(over, under, group);
                moves += 1;
                continue;
            }
        }

        match pop_movable(&mut state.ledger[over]) {
            Some(p) => {
                debug!(item = %p.item, from = %state.names[over], to = %state.names[under], "moved item");
                state.relocate(over, under, vec![p]);
                moves += 1;
            }
            None => exhausted[over] = true,
        }
    }
    if moves > 0 {
        state.refresh_decisions();
    }
    state
}

/// Largest excess over target; ties by higher load, then canonical index.
fn most_over(state: &AllocationState, exhausted: &[bool]) -> Option<usize> {
    (0..state.worker_count())
        .filter(|&w| !exhausted[w] && state.loads[w] > state.targets[w])
        .min_by(|&a, &b| {
            let ea = state.loads[a] - state.targets[a];
            let eb = state.loads[b] - state.targets[b];
            eb.cmp(&ea)
                .then_with(|| state.loads[b].cmp(&state.loads[a]))
                .then_with(|| a.cmp(&b))
        })
}

/// Largest deficit below target (and below capacity); ties by lower load, then canonical index.
fn most_under(state: &AllocationState) -> Option<usize> {
    (0..state.worker_count())
        .filter(|&w| state.loads[w] < state.targets[w] && state.loads[w] < state.capacities[w])
        .min_by(|&a, &b| {
            let da = state.targets[a] - state.loads[a];
            let db = state.targets[b] - state.loads[b];
            db.cmp(&da)
                .then_with(|| state.loads[a].cmp(&state.loads[b]))
                .then_with(|| a.cmp(&b))
        })
}

/// Most recently placed unpinned item.
fn pop_movable(ledger: &mut Vec<Placement>) -> Option<Placement> {
    let k = ledger.iter().rposition(|p| !p.pinned)?;
    Some(ledger.remove(k))
}

/// Remove and return the largest unpinned brand group on `from` whose move keeps
/// `from` at or above target, `to` at or below target, and lowers max − min.
fn take_brand_group(state: &mut AllocationState, from: usize, to: usize) -> Option<Vec<Placement>> {
    let excess = state.loads[from] - state.targets[from];
    let deficit = state.targets[to] - state.loads[to];
    let limit = excess.min(deficit);
    if limit < 2 {
        // a single item is handled by the plain move
        return None;
    }

    let mut groups: Vec<(Brand, u32)> = Vec::new();
    for p in state.ledger[from].iter().filter(|p| !p.pinned) {
        match groups.iter_mut().find(|(b, _)| *b == p.brand) {
            Some((_, n)) => *n += 1,
            None => groups.push((p.brand.clone(), 1)),
        }
    }

    let spread_now = spread(&state.loads);
    let best = groups
        .into_iter()
        .filter(|&(_, s)| s >= 2 && s <= limit)
        .filter(|(_, s)| {
            let mut after = state.loads.clone();
            after[from] -= s;
            after[to] += s;
            spread(&after) < spread_now
        })
        .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))?;

    let (moved, kept): (Vec<Placement>, Vec<Placement>) = std::mem::take(&mut state.ledger[from])
        .into_iter()
        .partition(|p| !p.pinned && p.brand == best.0);
    state.ledger[from] = kept;
    Some(moved)
}

fn spread(loads: &[u32]) -> u32 {
    let max = loads.iter().copied().max().unwrap_or(0);
    let min = loads.iter().copied().min().unwrap_or(0);
    max - min
}
