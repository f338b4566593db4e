//! Allocation engine: ordered passes over brand blocks.
//!
//! Contract:
//! - Workers are the *active* roster in canonical order; `targets` is index-aligned.
//! - Pass order: priority items → pre-assigned brands → category preferences →
//!   whole-or-split placement. Each pass consumes what it places; the pool
//!   that reaches the next pass only holds unplaced items.
//! - No worker ever exceeds its capacity. Items that cannot be placed go to Backlog.
//! - Every placement is planned against current loads and committed in one step.
//! - `decisions` holds one entry per brand block as it entered the engine,
//!   describing where all of its items ended up across every pass.
//!
//! Determinism:
//! - Worker ties: canonical index ↑. Block ties: origin ↑. No hash maps, no RNG.

use std::collections::BTreeMap;
use std::vec::Vec;

use tracing::{debug, instrument, warn};

use qa_core::determinism::{cmp_sequence, sort_items_by_sequence};
use qa_core::variables::{BlockOrder, PreAssignBound, SplitBasis};
use qa_core::{Block, Brand, Diagnostic, EngineConfig, Item, Worker, WorkerName};

use crate::apportion::largest_remainder_shares;
use crate::balance::{policy_for, BalancePolicy, LoadSnapshot};
use crate::state::{AllocationState, PlacementPlan, Slot};

/// Upper bounds for the two loops that could in principle run long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    /// Max items dealt by a single split.
    pub split_steps: usize,
    /// Max moves made by the rebalancer.
    pub rebalance_moves: usize,
}

impl EngineLimits {
    /// `guard_factor × (items + workers)` for both loops.
    pub fn for_run(items: usize, workers: usize, guard_factor: u32) -> Self {
        let base = items
            .saturating_add(workers)
            .saturating_mul(guard_factor as usize)
            .max(1);
        EngineLimits { split_steps: base, rebalance_moves: base }
    }
}

pub struct EngineInput<'a> {
    pub workers: &'a [Worker],
    pub targets: &'a [u32],
    /// Every assignable item, grouped by brand (priority items included).
    pub blocks: Vec<Block<'a>>,
    pub pre_assignments: &'a BTreeMap<Brand, WorkerName>,
    pub config: &'a EngineConfig,
    pub limits: EngineLimits,
}

#[instrument(skip_all, fields(workers = input.workers.len(), blocks = input.blocks.len()))]
pub fn allocate(input: EngineInput<'_>) -> AllocationState {
    let EngineInput { workers, targets, blocks, pre_assignments, config, limits } = input;
    let mut state = AllocationState::new(workers, targets);
    let order = config.effective_block_order();

    let mut tracked = blocks.clone();
    order_blocks(&mut tracked, order);

    let (priority, mut blocks) = split_priority(blocks, config.backlog_mode);
    place_priority(&mut state, &priority);

    order_blocks(&mut blocks, order);
    let mut pool: Vec<Block<'_>> = blocks
        .into_iter()
        .filter_map(|b| place_pre_assigned(&mut state, b, pre_assignments, config.pre_assign_bound))
        .collect();

    if config.use_preferences {
        pool = pool
            .into_iter()
            .filter_map(|b| place_preferred(&mut state, b, workers))
            .collect();
    }

    // Earlier passes may have shrunk blocks; largest-first must see current sizes.
    order_blocks(&mut pool, order);
    let policy = policy_for(config.balance);
    for block in pool {
        place_block(&mut state, block, policy.as_ref(), config.split_basis, limits.split_steps);
    }

    state.track_blocks(&tracked);
    debug!(
        assigned = state.loads.iter().sum::<u32>(),
        backlog = state.backlog.len(),
        "allocation passes complete"
    );
    state
}

// ----------------------------- Pass 1: priority -----------------------------

/// Pull priority items out of their blocks. Backlog mode orders them by
/// sequence key, otherwise by catalog position.
fn split_priority<'a>(blocks: Vec<Block<'a>>, backlog_mode: bool) -> (Vec<&'a Item>, Vec<Block<'a>>) {
    let mut priority: Vec<&'a Item> = Vec::new();
    let mut rest = Vec::with_capacity(blocks.len());
    for b in blocks {
        let (urgent, normal): (Vec<&'a Item>, Vec<&'a Item>) = b.items.iter().copied().partition(|it| it.priority);
        priority.extend(urgent);
        if !normal.is_empty() {
            rest.push(b.with_items(normal));
        }
    }
    if backlog_mode {
        sort_items_by_sequence(&mut priority);
    } else {
        priority.sort_by_key(|it| it.position);
    }
    (priority, rest)
}

/// Each priority item goes to the least-loaded worker with room; none → Backlog.
fn place_priority(state: &mut AllocationState, items: &[&Item]) {
    for it in items {
        let pick = (0..state.worker_count())
            .filter(|&w| state.room(w) > 0)
            .min_by_key(|&w| (state.loads[w], w));
        let slot = pick.map_or(Slot::Backlog, Slot::Worker);
        let mut plan = PlacementPlan::default();
        plan.push(&it.id, &it.brand, slot, false);
        state.commit(plan);
    }
    if !items.is_empty() {
        debug!(count = items.len(), "priority items placed");
    }
}

// ----------------------------- Block order -----------------------------

pub fn order_blocks(blocks: &mut [Block<'_>], order: BlockOrder) {
    match order {
        BlockOrder::LargestFirst => {
            blocks.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.origin.cmp(&b.origin)))
        }
        BlockOrder::InputOrder => blocks.sort_by_key(|b| b.origin),
        BlockOrder::EarliestSequence => blocks.sort_by(|a, b| {
            cmp_sequence(a.earliest_key(), b.earliest_key()).then_with(|| a.origin.cmp(&b.origin))
        }),
    }
}

// ----------------------------- Pass 2: pre-assignment -----------------------------

/// Place as much of a pre-assigned brand as the bound allows; items placed
/// here are pinned. Returns the overflow, if any.
fn place_pre_assigned<'a>(
    state: &mut AllocationState,
    block: Block<'a>,
    pre: &BTreeMap<Brand, WorkerName>,
    bound: PreAssignBound,
) -> Option<Block<'a>> {
    let Some(w) = pre.get(&block.brand).and_then(|name| state.index_of(name)) else {
        return Some(block);
    };
    let room = match bound {
        PreAssignBound::Capacity => state.room(w),
        PreAssignBound::Target => state.target_room(w),
    };
    let take = (room as usize).min(block.len());

    let mut plan = PlacementPlan::default();
    for it in &block.items[..take] {
        plan.push(&it.id, &it.brand, Slot::Worker(w), true);
    }
    state.commit(plan);
    debug!(brand = %block.brand, worker = %state.names[w], placed = take, overflow = block.len() - take, "pre-assigned brand");

    if take == block.len() {
        None
    } else {
        Some(block.with_items(block.items[take..].to_vec()))
    }
}

// ----------------------------- Pass 3: preferences -----------------------------

/// Route items of each category to workers who prefer it, up to their target.
/// Groups are visited in first-appearance order within the block; leftovers
/// keep their relative order and fall through to the general pass.
fn place_preferred<'a>(state: &mut AllocationState, block: Block<'a>, workers: &[Worker]) -> Option<Block<'a>> {
    let mut taken = vec![false; block.len()];

    let mut categories = Vec::new();
    for it in &block.items {
        if let Some(c) = &it.category {
            if !categories.contains(&c) {
                categories.push(c);
            }
        }
    }

    for cat in categories {
        let fans: Vec<usize> = (0..workers.len()).filter(|&w| workers[w].prefers(cat)).collect();
        if fans.is_empty() {
            continue;
        }
        let members: Vec<usize> = (0..block.len())
            .filter(|&k| block.items[k].category.as_ref() == Some(cat))
            .collect();

        let mut cursor = 0;
        while cursor < members.len() {
            let Some(w) = fans
                .iter()
                .copied()
                .filter(|&w| state.target_room(w) > 0)
                .min_by_key(|&w| (state.loads[w], w))
            else {
                break;
            };
            let take = (state.target_room(w) as usize).min(members.len() - cursor);
            let mut plan = PlacementPlan::default();
            for &k in &members[cursor..cursor + take] {
                let it = block.items[k];
                plan.push(&it.id, &it.brand, Slot::Worker(w), false);
                taken[k] = true;
            }
            state.commit(plan);
            debug!(brand = %block.brand, category = %cat, worker = %state.names[w], placed = take, "preference placement");
            cursor += take;
        }
    }

    let rest: Vec<&'a Item> = block
        .items
        .iter()
        .zip(&taken)
        .filter(|&(_, &t)| !t)
        .map(|(it, _)| *it)
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(block.with_items(rest))
    }
}

// ----------------------------- Pass 4: whole or split -----------------------------

fn place_block(
    state: &mut AllocationState,
    block: Block<'_>,
    policy: &dyn BalancePolicy,
    basis: SplitBasis,
    max_steps: usize,
) {
    let n = block.len();
    if n == 0 {
        return;
    }

    if let Some(c) = whole_candidate(state, n) {
        let mut projected = state.loads.clone();
        projected[c] += n as u32;
        let within_target = projected[c] <= state.targets[c];
        let balanced = within_target || {
            let snapshot = LoadSnapshot { loads: &projected, targets: &state.targets, candidate: c };
            !policy.should_split(&snapshot)
        };
        if balanced {
            let mut plan = PlacementPlan::default();
            for it in &block.items {
                plan.push(&it.id, &it.brand, Slot::Worker(c), false);
            }
            state.commit(plan);
            debug!(brand = %block.brand, worker = %state.names[c], size = n, "placed whole");
            return;
        }
        debug!(brand = %block.brand, candidate = %state.names[c], policy = policy.name(), "whole placement too uneven; splitting");
    }

    let (plan, guard) = split_plan(state, &block, basis, max_steps);
    if let Some(unresolved) = guard {
        warn!(brand = %block.brand, limit = max_steps, unresolved, "split iteration guard hit; routing rest to Backlog");
        state.note(Diagnostic::IterationGuard {
            stage: "split".to_owned(),
            limit: max_steps as u64,
            unresolved: unresolved as u64,
        });
    }

    let workers = plan.workers().len();
    let backlogged = plan.backlogged();
    state.commit(plan);
    debug!(brand = %block.brand, size = n, workers, backlogged, "split placement");
}

/// Worker with room for all `n` items: most room, then lowest load, then canonical index.
fn whole_candidate(state: &AllocationState, n: usize) -> Option<usize> {
    (0..state.worker_count())
        .filter(|&w| state.room(w) as usize >= n)
        .min_by(|&a, &b| {
            state
                .room(b)
                .cmp(&state.room(a))
                .then_with(|| state.loads[a].cmp(&state.loads[b]))
                .then_with(|| a.cmp(&b))
        })
}

/// Quotas in two passes (basis weights, then leftover capacity), dealt
/// round-robin in quota order (quota ↓, canonical ↑). Whatever exceeds total
/// room, or remains when the guard fires, goes to Backlog.
/// Returns the plan and, if the guard fired, the number of items it left unresolved.
fn split_plan(
    state: &AllocationState,
    block: &Block<'_>,
    basis: SplitBasis,
    max_steps: usize,
) -> (PlacementPlan, Option<usize>) {
    let n = state.worker_count();
    let room: Vec<u32> = (0..n).map(|w| state.room(w)).collect();
    let first: Vec<u32> = match basis {
        SplitBasis::TargetGap => (0..n).map(|w| state.target_room(w)).collect(),
        SplitBasis::RemainingCapacity => room.clone(),
    };

    let seats = u32::try_from(block.len()).unwrap_or(u32::MAX);
    let q1 = largest_remainder_shares(seats, &first);
    let used: u32 = q1.iter().sum();
    let spare: Vec<u32> = room.iter().zip(&q1).map(|(r, q)| r - q).collect();
    let q2 = largest_remainder_shares(seats - used, &spare);
    let mut quota: Vec<u32> = q1.iter().zip(&q2).map(|(a, b)| a + b).collect();

    let mut order: Vec<usize> = (0..n).filter(|&w| quota[w] > 0).collect();
    order.sort_by(|&a, &b| quota[b].cmp(&quota[a]).then_with(|| a.cmp(&b)));

    let mut plan = PlacementPlan::default();
    let mut next = 0usize;
    let mut guard_hit = false;
    'deal: loop {
        let mut dealt = false;
        for &w in &order {
            if quota[w] == 0 {
                continue;
            }
            if next == block.len() {
                break 'deal;
            }
            if next >= max_steps {
                guard_hit = true;
                break 'deal;
            }
            let it = block.items[next];
            plan.push(&it.id, &it.brand, Slot::Worker(w), false);
            quota[w] -= 1;
            next += 1;
            dealt = true;
        }
        if !dealt {
            break;
        }
    }

    let unresolved = block.len() - next;
    for it in &block.items[next..] {
        plan.push(&it.id, &it.brand, Slot::Backlog, false);
    }
    (plan, guard_hit.then_some(unresolved))
}
