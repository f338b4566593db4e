//! Determinism utilities: stable ordering for workers, items and sequence keys.
//!
//! This module is **I/O-free**. It provides:
//! - A stable total order for workers (by normalized name)
//! - The canonical worker order used by every tie-break in the engine
//! - Backlog-mode ordering (sequence key ascending, absent keys last)
//!
//! Nothing in the engine iterates a hash map; every "first" or "lowest" choice
//! falls back to the canonical worker index produced here.

use core::cmp::Ordering;

use crate::entities::{Item, Worker};
use crate::ids::{SequenceKey, WorkerName};
use crate::variables::TieOrder;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for WorkerName {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl StableOrd for Worker {
    /// Workers compare by normalized name only.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.name.stable_cmp(&other.name)
    }
}

/* -------------------------------------------------------------------------- */
/*                            Canonical sort helpers                           */
/* -------------------------------------------------------------------------- */

/// Put workers into canonical order **in place**.
///
/// - `Alphabetical`: by normalized name.
/// - `InputOrder`: keep roster order (the slice is left untouched).
pub fn sort_workers_canonical(xs: &mut [Worker], tie: TieOrder) {
    match tie {
        TieOrder::Alphabetical => xs.sort_by(|a, b| a.stable_cmp(b)),
        TieOrder::InputOrder => {}
    }
}

/// Sequence-key comparison with absent keys sorting **last**.
#[inline]
pub fn cmp_sequence(a: Option<&SequenceKey>, b: Option<&SequenceKey>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of item references by sequence key (absent last); ties keep catalog order.
pub fn sort_items_by_sequence(xs: &mut [&Item]) {
    xs.sort_by(|a, b| {
        cmp_sequence(a.sequence_key.as_ref(), b.sequence_key.as_ref())
            .then_with(|| a.position.cmp(&b.position))
    });
}

/* ---------------------------------- Tests --------------------------------- */
