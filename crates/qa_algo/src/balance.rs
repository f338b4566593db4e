//! Balance policies: "would this whole-block placement leave the team too uneven?"
//!
//! The engine asks only when a whole placement would push its candidate over
//! target; placements that stay within target are always accepted.
//! All checks are integer-only (percent ratios).

use std::boxed::Box;

use qa_core::variables::BalanceRule;

/// Loads *after* the proposed placement, index-aligned with the canonical worker order.
#[derive(Clone, Copy, Debug)]
pub struct LoadSnapshot<'a> {
    pub loads: &'a [u32],
    pub targets: &'a [u32],
    pub candidate: usize,
}

pub trait BalancePolicy {
    /// True if the placement should be rejected in favor of a split.
    fn should_split(&self, projected: &LoadSnapshot<'_>) -> bool;
    fn name(&self) -> &'static str;
}

/// highest > ratio_pct/100 × second-highest (or the sole nonzero load on a team of 2+).
#[derive(Clone, Copy, Debug)]
pub struct RatioPolicy {
    pub ratio_pct: u32,
}

/// candidate load > target × (100 + pct)/100.
#[derive(Clone, Copy, Debug)]
pub struct TolerancePolicy {
    pub pct: u32,
}

/// max − min > max_spread.
#[derive(Clone, Copy, Debug)]
pub struct SpreadPolicy {
    pub max_spread: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct NeverSplit;

impl BalancePolicy for RatioPolicy {
    fn should_split(&self, p: &LoadSnapshot<'_>) -> bool {
        if p.loads.len() < 2 {
            return false;
        }
        let (highest, second) = top_two(p.loads);
        if second == 0 {
            return highest > 0;
        }
        (highest as u64) * 100 > (self.ratio_pct as u64) * (second as u64)
    }
    fn name(&self) -> &'static str {
        "ratio"
    }
}

impl BalancePolicy for TolerancePolicy {
    fn should_split(&self, p: &LoadSnapshot<'_>) -> bool {
        let load = p.loads[p.candidate] as u64;
        let target = p.targets[p.candidate] as u64;
        load * 100 > target * (100 + self.pct as u64)
    }
    fn name(&self) -> &'static str {
        "tolerance"
    }
}

impl BalancePolicy for SpreadPolicy {
    fn should_split(&self, p: &LoadSnapshot<'_>) -> bool {
        let max = p.loads.iter().copied().max().unwrap_or(0);
        let min = p.loads.iter().copied().min().unwrap_or(0);
        max - min > self.max_spread
    }
    fn name(&self) -> &'static str {
        "spread"
    }
}

impl BalancePolicy for NeverSplit {
    fn should_split(&self, _: &LoadSnapshot<'_>) -> bool {
        false
    }
    fn name(&self) -> &'static str {
        "off"
    }
}

pub fn policy_for(rule: BalanceRule) -> Box<dyn BalancePolicy> {
    match rule {
        BalanceRule::Ratio { ratio_pct } => Box::new(RatioPolicy { ratio_pct }),
        BalanceRule::Tolerance { pct } => Box::new(TolerancePolicy { pct }),
        BalanceRule::Spread { max_spread } => Box::new(SpreadPolicy { max_spread }),
        BalanceRule::Off => Box::new(NeverSplit),
    }
}

/// Highest and second-highest values (duplicates count twice).
fn top_two(xs: &[u32]) -> (u32, u32) {
    let mut first = 0u32;
    let mut second = 0u32;
    for &x in xs {
        if x > first {
            second = first;
            first = x;
        } else if x > second {
            second = x;
        }
    }
    (first, second)
}
