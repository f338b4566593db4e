//! Per-worker target loads under capacity caps.
//!
//! Contract:
//! - Input capacities are index-aligned with the canonical worker order.
//! - Distributable = min(total items, Σ capacities). Targets sum to exactly that.
//! - Iterative capping: spread the remainder evenly over the uncapped pool; any
//!   worker whose share exceeds its capacity is locked at capacity; repeat
//!   until no worker exceeds.
//! - Remainder units go to the first uncapped workers in canonical order.
//!
//! Determinism:
//! - Pure integer arithmetic; ties resolved by canonical index only.

use std::vec::Vec;

use crate::apportion::even_shares;

pub fn compute_targets(total_items: u32, capacities: &[u32]) -> Vec<u32> {
    let n = capacities.len();
    let mut targets = vec![0u32; n];
    if n == 0 {
        return targets;
    }

    let cap_sum: u64 = capacities.iter().map(|&c| c as u64).sum();
    let mut remaining = (total_items as u64).min(cap_sum) as u32;
    let mut locked = vec![false; n];

    // Each round either locks at least one worker or finishes.
    for _round in 0..=n {
        let pool: Vec<usize> = (0..n).filter(|&i| !locked[i]).collect();
        if pool.is_empty() {
            break;
        }
        let shares = even_shares(remaining, pool.len());

        let mut capped_any = false;
        for (k, &i) in pool.iter().enumerate() {
            if shares[k] > capacities[i] {
                locked[i] = true;
                targets[i] = capacities[i];
                remaining -= capacities[i];
                capped_any = true;
            }
        }
        if !capped_any {
            for (k, &i) in pool.iter().enumerate() {
                targets[i] = shares[k];
            }
            break;
        }
    }

    debug_assert_eq!(
        targets.iter().map(|&t| t as u64).sum::<u64>(),
        (total_items as u64).min(cap_sum)
    );
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_with_remainder_to_first() {
        assert_eq!(compute_targets(10, &[100, 100, 100]), vec![4, 3, 3]);
        assert_eq!(compute_targets(8, &[5, 5]), vec![4, 4]);
    }

    #[test]
    fn small_capacity_is_capped_and_excess_redistributed() {
        // even 4/4/4, A capped at 1 → 11 over B,C → 6/5
        assert_eq!(compute_targets(12, &[1, 100, 100]), vec![1, 6, 5]);
        // cascading caps: 1, then 4, rest to C
        assert_eq!(compute_targets(12, &[1, 4, 10]), vec![1, 4, 7]);
    }

    #[test]
    fn total_beyond_capacity_saturates() {
        assert_eq!(compute_targets(10, &[3, 3]), vec![3, 3]);
        assert_eq!(compute_targets(0, &[3, 3]), vec![0, 0]);
        assert!(compute_targets(5, &[]).is_empty());
    }

    #[test]
    fn zero_capacity_worker_gets_zero() {
        assert_eq!(compute_targets(4, &[0, 10]), vec![0, 4]);
    }
}
