//! variables.rs: run configuration domains and `EngineConfig` with safe defaults.
//!
//! Every field has a default so an empty JSON object is a valid configuration.
//! `validate_domains` is the single gate for out-of-range values; stages assume
//! a validated config.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Daily capacity used when the roster gives none.
pub const DEFAULT_CAPACITY: u32 = 100;

/// Default imbalance ratio, in percent (1.30 × second-highest load).
pub const DEFAULT_IMBALANCE_RATIO_PCT: u32 = 130;

/// Default multiplier for the split / rebalance iteration guards.
pub const DEFAULT_GUARD_FACTOR: u32 = 4;

// ------------ Macros ------------

/// Define a serde'd enum with explicit wire tokens.
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }
    };
}

// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(
    /// Fixed worker order used for every tie-break.
    TieOrder => {
        Alphabetical = "alphabetical",
        InputOrder   = "input_order"
    }
);

serde_enum!(
    /// Order in which blocks are visited within each engine pass.
    BlockOrder => {
        LargestFirst     = "largest_first",
        InputOrder       = "input_order",
        EarliestSequence = "earliest_sequence"
    }
);

serde_enum!(
    /// Room a pre-assigned worker offers its brand.
    PreAssignBound => {
        Capacity = "capacity",
        Target   = "target"
    }
);

serde_enum!(
    /// Weight used to derive split quotas.
    SplitBasis => {
        TargetGap         = "target_gap",
        RemainingCapacity = "remaining_capacity"
    }
);

serde_enum!(
    /// Post-allocation balancing strategy.
    RebalanceMode => {
        Off   = "off",
        Item  = "item",
        Brand = "brand"
    }
);

impl Default for TieOrder {
    fn default() -> Self { TieOrder::Alphabetical }
}
impl Default for PreAssignBound {
    fn default() -> Self { PreAssignBound::Capacity }
}
impl Default for SplitBasis {
    fn default() -> Self { SplitBasis::TargetGap }
}
impl Default for RebalanceMode {
    fn default() -> Self { RebalanceMode::Item }
}

// ------------ Complex shapes ------------

/// "Is this balanced enough" rule consulted before a whole-block placement
/// that pushes its worker over target. Integer-only parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceRule {
    /// Split when highest load > ratio_pct/100 × second-highest load.
    Ratio { ratio_pct: u32 },
    /// Split when the candidate ends more than pct% above its target.
    Tolerance { pct: u32 },
    /// Split when max load − min load exceeds `max_spread`.
    Spread { max_spread: u32 },
    /// Never split for balance (capacity still forces splits).
    Off,
}

impl Default for BalanceRule {
    fn default() -> Self {
        BalanceRule::Ratio { ratio_pct: DEFAULT_IMBALANCE_RATIO_PCT }
    }
}

// ------------ EngineConfig ------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub default_capacity: u32,
    pub tie_order: TieOrder,
    /// `None` → `earliest_sequence` in backlog mode, `largest_first` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_order: Option<BlockOrder>,
    pub backlog_mode: bool,
    pub pre_assign_bound: PreAssignBound,
    pub split_basis: SplitBasis,
    pub balance: BalanceRule,
    pub use_preferences: bool,
    pub rebalance: RebalanceMode,
    pub guard_factor: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_capacity: DEFAULT_CAPACITY,
            tie_order: TieOrder::default(),
            block_order: None,
            backlog_mode: false,
            pre_assign_bound: PreAssignBound::default(),
            split_basis: SplitBasis::default(),
            balance: BalanceRule::default(),
            use_preferences: true,
            rebalance: RebalanceMode::default(),
            guard_factor: DEFAULT_GUARD_FACTOR,
        }
    }
}

impl EngineConfig {
    /// Block order actually applied for this run.
    pub fn effective_block_order(&self) -> BlockOrder {
        match (self.block_order, self.backlog_mode) {
            (Some(o), _) => o,
            (None, true) => BlockOrder::EarliestSequence,
            (None, false) => BlockOrder::LargestFirst,
        }
    }
}

/// Reject configuration values outside their domains.
pub fn validate_domains(cfg: &EngineConfig) -> Result<(), CoreError> {
    if cfg.default_capacity == 0 {
        return Err(CoreError::DomainOutOfRange("default_capacity must be >= 1"));
    }
    if cfg.guard_factor == 0 {
        return Err(CoreError::DomainOutOfRange("guard_factor must be >= 1"));
    }
    match cfg.balance {
        BalanceRule::Ratio { ratio_pct } if ratio_pct < 100 => {
            Err(CoreError::DomainOutOfRange("balance.ratio_pct must be >= 100"))
        }
        _ => Ok(()),
    }
}
