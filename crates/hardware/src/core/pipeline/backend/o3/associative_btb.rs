//! `AssociativeBtb`: a set-associative branch-target buffer with a pluggable
//! eviction strategy, feeding predicted branch targets into the fetched
//! branch-history stream that [`super::phast::Phast`] hashes over.
//!
//! Unlike the direct-mapped [`crate::core::units::bru::btb::Btb`] used by the
//! scalar direction predictors, this buffer supports multiple ways per set
//! and delegates eviction to one of the [`crate::core::units::cache::policies`]
//! strategies already used by the data-cache hierarchy — the spec's "capability
//! set" of `instantiateEntry`/`reset`/`touch`/`getVictim` collapses onto that
//! trait's `update`/`get_victim` pair, since none of the concrete policies
//! distinguish "touch an existing way" from "initialize a freshly installed
//! one" (see `DESIGN.md`).

use crate::config::{AssociativeBtbConfig, ReplacementPolicy as ReplacementPolicyKind};
use crate::core::units::cache::policies::{
    FifoPolicy, LruPolicy, MruPolicy, PlruPolicy, RandomPolicy, ReplacementPolicy,
};

use super::types::{InstSeqNum, ThreadId};

/// The kind of control-flow instruction a BTB entry was installed for.
///
/// Carried through for statistics only; lookup/update do not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// A direct (PC-relative) branch or jump.
    Direct,
    /// An indirect jump whose target is data-dependent.
    Indirect,
    /// A call instruction (also pushes a return address elsewhere).
    Call,
    /// A return instruction.
    Return,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    tag: u64,
    target: u64,
    tid: ThreadId,
    valid: bool,
    inst: Option<InstSeqNum>,
    pc: u64,
    kind: BranchKind,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            tag: 0,
            target: 0,
            tid: 0,
            valid: false,
            inst: None,
            pc: 0,
            kind: BranchKind::Direct,
        }
    }
}

/// Outcome counters, names normative with the rest of this crate's flat
/// counters-struct convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociativeBtbStats {
    /// Total `lookup` calls.
    pub lookups: u64,
    /// Successful lookups (valid, tag-matching entry found).
    pub hits: u64,
    /// Lookups that found no matching, valid entry.
    pub misses: u64,
    /// Updates that overwrote a different PC's entry sharing the same tag.
    pub conflicts: u64,
    /// Updates that installed into a way that held another, still-valid entry.
    pub evictions: u64,
}

fn make_policy(kind: ReplacementPolicyKind, num_sets: usize, assoc: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        ReplacementPolicyKind::Lru => Box::new(LruPolicy::new(num_sets, assoc)),
        ReplacementPolicyKind::Plru => Box::new(PlruPolicy::new(num_sets, assoc)),
        ReplacementPolicyKind::Fifo => Box::new(FifoPolicy::new(num_sets, assoc)),
        ReplacementPolicyKind::Random => Box::new(RandomPolicy::new(num_sets, assoc)),
        ReplacementPolicyKind::Mru => Box::new(MruPolicy::new(num_sets, assoc)),
    }
}

/// Set-associative branch-target buffer.
pub struct AssociativeBtb {
    entries: Vec<Entry>,
    assoc: usize,
    num_sets: usize,
    idx_mask: u64,
    idx_bits: u32,
    tag_mask: u64,
    inst_shift_amt: u32,
    tag_shift_amt: u32,
    policy: Box<dyn ReplacementPolicy>,
    stats: AssociativeBtbStats,
}

impl AssociativeBtb {
    /// Builds a fresh, empty BTB from configuration.
    ///
    /// # Panics
    ///
    /// Panics if `num_entries / assoc` is not a power of two, or `assoc` is zero.
    #[must_use]
    pub fn new(config: &AssociativeBtbConfig) -> Self {
        assert!(config.assoc > 0, "AssociativeBtb: associativity must be nonzero");
        assert!(
            config.num_entries % config.assoc == 0,
            "AssociativeBtb: num_entries must be a multiple of assoc"
        );
        let num_sets = config.num_entries / config.assoc;
        assert!(
            num_sets.is_power_of_two(),
            "AssociativeBtb: num_entries / assoc must be a power of 2"
        );
        let idx_bits = num_sets.trailing_zeros();
        let tag_bits = u32::try_from(config.tag_bits).unwrap_or(0);
        let inst_shift_amt = u32::try_from(config.inst_shift_amt).unwrap_or(0);

        Self {
            entries: vec![Entry::default(); config.num_entries],
            assoc: config.assoc,
            num_sets,
            idx_mask: (1u64 << idx_bits) - 1,
            idx_bits,
            tag_mask: if tag_bits >= 64 { u64::MAX } else { (1u64 << tag_bits) - 1 },
            inst_shift_amt,
            tag_shift_amt: inst_shift_amt + idx_bits,
            policy: make_policy(config.replacement_policy, num_sets, config.assoc),
            stats: AssociativeBtbStats::default(),
        }
    }

    /// Read-only access to lookup/update statistics.
    #[must_use]
    pub const fn stats(&self) -> &AssociativeBtbStats {
        &self.stats
    }

    /// Thread-salted set index: `tid` is shifted above the index bits so
    /// sibling hardware threads spread across sets rather than colliding on
    /// thread-independent PCs.
    fn set_index(&self, tid: ThreadId, pc: u64) -> usize {
        let shifted_pc = pc >> self.inst_shift_amt;
        let salted = shifted_pc ^ ((tid as u64) << self.idx_bits);
        (salted & self.idx_mask) as usize
    }

    fn tag_of(&self, pc: u64) -> u64 {
        (pc >> self.tag_shift_amt) & self.tag_mask
    }

    fn set_range(&self, set_idx: usize) -> std::ops::Range<usize> {
        let base = set_idx * self.assoc;
        base..base + self.assoc
    }

    fn find(&self, set_idx: usize, tag: u64, tid: ThreadId) -> Option<usize> {
        self.set_range(set_idx)
            .find(|&i| self.entries[i].valid && self.entries[i].tag == tag && self.entries[i].tid == tid)
    }

    /// Looks up the predicted target for `(tid, pc)`.
    ///
    /// On a hit, touches the set's replacement policy and returns the target.
    /// A miss has no side effects beyond the statistics counter.
    pub fn lookup(&mut self, tid: ThreadId, pc: u64, _kind: BranchKind) -> Option<u64> {
        self.stats.lookups += 1;
        let set_idx = self.set_index(tid, pc);
        let tag = self.tag_of(pc);
        let Some(way) = self.find(set_idx, tag, tid) else {
            self.stats.misses += 1;
            return None;
        };
        self.policy.update(set_idx, way - set_idx * self.assoc);
        self.stats.hits += 1;
        Some(self.entries[way].target)
    }

    /// True iff a matching, valid entry exists for `(tid, pc)`.
    #[must_use]
    pub fn valid(&self, tid: ThreadId, pc: u64) -> bool {
        let set_idx = self.set_index(tid, pc);
        let tag = self.tag_of(pc);
        self.find(set_idx, tag, tid).is_some()
    }

    /// Installs or refreshes a branch target.
    ///
    /// If no matching entry exists, asks the replacement policy for a victim
    /// way in the target set (counting a conflict if that way already held a
    /// different PC under the same tag), then installs the new entry and
    /// touches it.
    pub fn update(
        &mut self,
        tid: ThreadId,
        pc: u64,
        target: u64,
        kind: BranchKind,
        inst: Option<InstSeqNum>,
    ) {
        let set_idx = self.set_index(tid, pc);
        let tag = self.tag_of(pc);

        let way = match self.find(set_idx, tag, tid) {
            Some(idx) => {
                if self.entries[idx].pc != pc {
                    self.stats.conflicts += 1;
                }
                idx
            }
            None => {
                let victim_way = self.policy.get_victim(set_idx);
                let idx = set_idx * self.assoc + victim_way;
                if self.entries[idx].valid {
                    self.stats.evictions += 1;
                }
                idx
            }
        };

        self.entries[way] = Entry { tag, target, tid, valid: true, inst, pc, kind };
        self.policy.update(set_idx, way - set_idx * self.assoc);
    }
}
