//! Shared glue types for the out-of-order memory dependence and indirect-branch
//! prediction subsystem: sequence numbers, branch-history records, and the
//! small collaborator traits standing in for the instruction queue and
//! load/store queue.

/// Strictly monotonically assigned instruction sequence number.
///
/// Defines program order across the whole core; `MemDepUnit::squash` and
/// `completeInst`-equivalent bookkeeping both rely on these being assigned
/// in increasing order per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InstSeqNum(pub u64);

impl InstSeqNum {
    /// Wraps a raw sequence number.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }
}

/// Thread context identifier, indexing per-thread arrays.
pub type ThreadId = usize;

/// The kind of a memory (or barrier) operation, as seen by the predictors.
///
/// `DynInst` exposes these as independent boolean predicates
/// (`isLoad`/`isStore`/`isAtomic`/`isReadBarrier`/`isWriteBarrier`/`isHtmCmd`);
/// in practice they are mutually exclusive per instruction, so this subsystem
/// collapses them into a single tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOpKind {
    /// A load instruction.
    Load,
    /// A store instruction.
    Store,
    /// An atomic read-modify-write instruction (both produces and consumes).
    Atomic,
    /// A read (load) memory barrier.
    ReadBarrier,
    /// A write (store) memory barrier.
    WriteBarrier,
    /// A hardware transactional memory command (commit/abort), ordered w.r.t. both barrier kinds.
    HtmCmd,
}

impl MemOpKind {
    /// True for loads and atomics: instructions that consume load-barrier dependencies
    /// and may be the target of a predicted producer.
    #[must_use]
    pub const fn is_load_like(self) -> bool {
        matches!(self, Self::Load | Self::Atomic)
    }

    /// True for stores and atomics: instructions that consume store-barrier dependencies
    /// and can produce effective-address data for dependents.
    #[must_use]
    pub const fn is_store_like(self) -> bool {
        matches!(self, Self::Store | Self::Atomic)
    }

    /// True for read barriers and HTM commands: these populate `loadBarrierSNs`.
    #[must_use]
    pub const fn is_read_barrier_like(self) -> bool {
        matches!(self, Self::ReadBarrier | Self::HtmCmd)
    }

    /// True for write barriers and HTM commands: these populate `storeBarrierSNs`.
    #[must_use]
    pub const fn is_write_barrier_like(self) -> bool {
        matches!(self, Self::WriteBarrier | Self::HtmCmd)
    }

    /// True for any of the three barrier kinds.
    #[must_use]
    pub const fn is_barrier(self) -> bool {
        matches!(self, Self::ReadBarrier | Self::WriteBarrier | Self::HtmCmd)
    }
}

/// One entry in a branch-history snapshot, oldest-to-youngest ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchHistoryEntry {
    /// Sequence number of the branch instruction.
    pub seq_num: InstSeqNum,
    /// The branch's resolved (or predicted) target address.
    pub target: u64,
    /// Whether the branch was taken.
    pub taken: bool,
    /// Whether the branch is an indirect branch (target varies by path, not fixed by the opcode).
    pub indirect: bool,
}

/// Speculative memory-dependence metadata attached to an in-flight memory instruction.
///
/// Mirrors `DynInst::memDepInfo`: filled in by `MemDepUnit::insert` when PHAST
/// supplies a prediction, and consulted again at commit to score that prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemDepInfo {
    /// Whether this instruction was given a predicted producer.
    pub predicted: bool,
    /// Which PHAST table (by branch-history window index) produced the prediction.
    pub pred_branch_hist_length: usize,
    /// The hash used for that table's lookup, needed again to train it at commit.
    pub predictor_hash: u64,
    /// Predicted signed distance (in store-queue slots) to the producing store.
    pub store_queue_distance: i64,
    /// Effective address of the predicted producer, filled in once it resolves.
    pub pred_store_addr: u64,
    /// Effective access size of the predicted producer, filled in once it resolves.
    pub pred_store_size: u64,
}

/// Minimal read-only view of a memory operation, standing in for the fields of
/// `DynInst` this subsystem actually consults (decode, rename, and execution are
/// out of scope; see the crate's `SPEC_FULL.md` for the full interface boundary).
#[derive(Debug, Clone, Copy)]
pub struct MemOpInfo {
    /// Program-order sequence number.
    pub seq_num: InstSeqNum,
    /// Owning hardware thread context.
    pub thread: ThreadId,
    /// Program counter of the instruction.
    pub pc: u64,
    /// Effective address (meaningful for loads/stores/atomics).
    pub eff_addr: u64,
    /// Effective access size in bytes (meaningful for loads/stores/atomics).
    pub eff_size: u64,
    /// Load/store/barrier classification.
    pub kind: MemOpKind,
    /// Whether register operands are already available at dispatch.
    pub ready_to_issue: bool,
    /// Index of this instruction's slot in the store queue (stores/atomics only).
    pub sq_index: Option<usize>,
}

/// Sink the predicted-dependency-free or newly-ready instruction is forwarded to.
///
/// Stands in for the instruction queue's `addReadyMemInst`. Forwarding must be
/// idempotent per live instruction (an instruction woken by two different
/// dependency edges in the same cycle is only released once).
pub trait IssueSink {
    /// Makes `seq_num` eligible for issue.
    fn add_ready_mem_inst(&mut self, seq_num: InstSeqNum);
}

/// Read-only view of the load/store queue needed to resolve a PHAST distance
/// prediction into a concrete producing instruction.
pub trait StoreQueueView {
    /// Index of the oldest not-yet-committed store queue slot for `tid`.
    fn store_head(&self, tid: ThreadId) -> usize;

    /// Sequence number of the instruction occupying store-queue slot `index` for
    /// `tid`, if that slot is currently occupied.
    fn seq_num_at(&self, tid: ThreadId, index: usize) -> Option<InstSeqNum>;
}
