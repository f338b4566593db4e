//! Largest Remainder apportionment over integer weights (Hare quota).
//!
//! Contract:
//! - `weights` are given in canonical worker order; the result is index-aligned.
//! - Exact quotas are `seats × w_i / W`; floors are integer division and
//!   remainders are `seats × w_i mod W` (u128 math, no floats).
//! - Leftover seats go by remainder ↓, weight ↓, then canonical index ↑.
//! - `seats` is clamped to `W`, so no share ever exceeds its weight.
//!
//! Determinism:
//! - No RNG; the ranking above is a total order.

use std::vec::Vec;

/// Split `seats` proportionally to `weights`. Sum of the result is `min(seats, Σw)`.
pub fn largest_remainder_shares(seats: u32, weights: &[u32]) -> Vec<u32> {
    let total: u128 = weights.iter().map(|&w| w as u128).sum();
    let mut shares = vec![0u32; weights.len()];
    if seats == 0 || total == 0 {
        return shares;
    }
    let seats = (seats as u128).min(total);

    let mut remainders: Vec<(usize, u128)> = Vec::with_capacity(weights.len());
    let mut sum_floors: u128 = 0;
    for (i, &w) in weights.iter().enumerate() {
        let exact = seats * w as u128;
        let floor = exact / total;
        // floor <= w <= u32::MAX because seats <= total
        shares[i] = floor as u32;
        sum_floors += floor;
        remainders.push((i, exact % total));
    }

    let needed = (seats - sum_floors) as usize;
    if needed == 0 {
        return shares;
    }

    // remainder ↓, weight ↓, canonical ↑
    remainders.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| weights[b.0].cmp(&weights[a.0]))
            .then_with(|| a.0.cmp(&b.0))
    });

    // Every index that still needs a seat has a nonzero remainder, so one pass suffices.
    for &(i, _) in remainders.iter().take(needed) {
        shares[i] += 1;
    }

    debug_assert_eq!(shares.iter().map(|&s| s as u128).sum::<u128>(), seats);
    shares
}

/// `total` spread as evenly as possible over `n` slots; the first `total % n`
/// slots (canonical order) receive the extra unit.
pub fn even_shares(total: u32, n: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    // Equal weights: every remainder ties, so the canonical index decides.
    let n32 = u32::try_from(n).unwrap_or(u32::MAX);
    let base = total / n32;
    let rem = (total % n32) as usize;
    (0..n).map(|i| base + u32::from(i < rem)).collect()
}
