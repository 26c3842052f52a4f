//! Memory-dependence prediction and branch-target feed for an out-of-order
//! backend.
//!
//! This module does not implement a full [`crate::core::pipeline::engine::ExecutionEngine`]
//! (issue queue, functional units, register alias table); those remain the
//! in-order backend's domain for now. What lives here is the subsystem that
//! decides, speculatively, whether a load may issue ahead of older stores it
//! has not yet been proven independent of, plus the branch-history inputs
//! ([`AssociativeBtb`], [`Ittage`]) that predictor feeds on:
//!
//! - [`types`] — shared sequence-number, operation, and branch-history types.
//! - [`simpl_block_cache`] — the set-associative confidence-counter cache bank
//!   used by [`phast::Phast`].
//! - [`phast`] — the path-hashed store-distance predictor.
//! - [`mem_dep_unit`] — [`mem_dep_unit::MemDepUnit`], the per-thread tracker
//!   tying instructions to PHAST predictions and replay/violation handling.
//! - [`associative_btb`] — a set-associative branch-target buffer.
//! - [`ittage`] — the tagged geometric-history indirect-branch predictor.

pub mod associative_btb;
pub mod ittage;
pub mod mem_dep_unit;
pub mod phast;
pub mod simpl_block_cache;
pub mod types;

pub use associative_btb::{AssociativeBtb, AssociativeBtbStats, BranchKind};
pub use ittage::{Ittage, IttagePrediction, IttageStats};
pub use mem_dep_unit::{MemDepUnit, MemDepUnitStats};
pub use phast::Phast;
pub use simpl_block_cache::SimplBlockCache;
pub use types::{
    BranchHistoryEntry, InstSeqNum, IssueSink, MemDepInfo, MemOpInfo, MemOpKind, StoreQueueView,
    ThreadId,
};
