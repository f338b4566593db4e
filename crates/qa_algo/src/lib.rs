// crates/qa_algo/src/lib.rs
//! qa_algo: allocation algorithms over normalized `qa_core` types.
//!
//! - `targets`: per-worker target loads under capacity caps
//! - `apportion`: largest-remainder integer shares
//! - `balance`: pluggable "too uneven?" policies
//! - `engine`: ordered allocation passes (priority, pre-assignment, preferences, whole/split)
//! - `rebalance`: post-pass leveling that never touches pinned items or Backlog
//!
//! No I/O here. Logging goes through `tracing`; the caller installs a subscriber.
#![forbid(unsafe_code)]

pub mod apportion;
pub mod targets;
pub mod balance;
pub mod state;
pub mod engine;
pub mod rebalance;

pub use apportion::{even_shares, largest_remainder_shares};
pub use balance::{policy_for, BalancePolicy, LoadSnapshot};
pub use engine::{allocate, EngineInput, EngineLimits};
pub use rebalance::rebalance;
pub use state::{AllocationState, Placement, PlacementPlan, Slot};
pub use targets::compute_targets;
