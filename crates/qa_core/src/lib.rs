//! qa_core: Core types, configuration domains, ordering helpers, raw source records.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`qa_io`, `qa_algo`, `qa_pipeline`, `qa_report`, `qa_cli`).
//!
//! - Identifiers: `ItemId`, `WorkerName`, `Brand`, `Category`, `Assignee`
//! - Entities: `Item`, `Worker`, `Block`
//! - Run configuration: `EngineConfig` and its domains (block order, balance rule, …)
//! - Deterministic ordering helpers (worker canonical order)
//! - Raw records and the narrow source/sink traits external collaborators implement

#![forbid(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod entities;
pub mod determinism;
pub mod variables;
pub mod sources;
pub mod diagnostics;

pub use errors::CoreError;
pub use ids::{Assignee, Brand, Category, ItemId, SequenceKey, WorkerName, BACKLOG, NO_BRAND};
pub use entities::{Block, Item, Worker};
pub use variables::EngineConfig;
pub use diagnostics::{BlockDecision, BlockState, Diagnostic};
