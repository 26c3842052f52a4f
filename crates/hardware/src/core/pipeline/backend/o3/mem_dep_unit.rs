//! `MemDepUnit`: the per-thread memory dependence tracker sitting between
//! dispatch and issue for loads, stores, atomics, and memory barriers.
//!
//! Every memory op is registered here at dispatch. [`Phast`] is consulted for
//! a speculative producer; outstanding barriers add further dependencies.
//! Once every dependency is satisfied and operands are ready, the op is
//! forwarded to the issue queue through the [`IssueSink`] collaborator.
//! [`Self::violation`] and [`Self::commit`] feed training signal back into
//! the predictor; [`Self::squash`] discards everything younger than a
//! mispredicted branch or faulting instruction.
//!
//! Unlike the reference implementation, entries are not reference-counted:
//! dependents are recorded as [`InstSeqNum`]s and re-resolved through
//! [`MemDepUnit::mem_dep_hash`] on every wakeup. Squashing or completing an
//! instruction simply removes its entry from that map; a dependent whose
//! producer entry has vanished is treated as already resolved, which
//! supplants the reference implementation's separate "squashed" tombstone
//! flag and null-pointer checks.

use std::collections::{HashMap, HashSet, VecDeque};

use super::phast::Phast;
use super::types::{
    BranchHistoryEntry, InstSeqNum, IssueSink, MemDepInfo, MemOpInfo, MemOpKind, StoreQueueView,
    ThreadId,
};
use crate::config::MemDepUnitConfig;

/// Per-instruction bookkeeping tracked while a memory op is in flight.
#[derive(Debug, Clone)]
struct MemDepEntry {
    pc: u64,
    thread: ThreadId,
    kind: MemOpKind,
    mem_dep_info: MemDepInfo,
    /// Instructions waiting on this one, by sequence number.
    depend_insts: Vec<InstSeqNum>,
    regs_ready: bool,
    /// Count of unresolved producer/barrier dependencies.
    mem_deps: usize,
}

impl MemDepEntry {
    fn new(op: &MemOpInfo) -> Self {
        Self {
            pc: op.pc,
            thread: op.thread,
            kind: op.kind,
            mem_dep_info: MemDepInfo::default(),
            depend_insts: Vec::new(),
            regs_ready: false,
            mem_deps: 0,
        }
    }
}

/// Flat per-event counters, mirroring the rest of this codebase's plain
/// counters-struct convention rather than a stats-group framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemDepUnitStats {
    pub inserted_loads: u64,
    pub inserted_stores: u64,
    pub conflicting_loads: u64,
    pub conflicting_stores: u64,
    pub false_dependencies: u64,
    pub correct_predictions: u64,
}

/// Per-thread memory dependence predictor and dependency tracker.
pub struct MemDepUnit {
    mem_dep_hash: HashMap<InstSeqNum, MemDepEntry>,
    inst_list: Vec<Vec<InstSeqNum>>,
    insts_to_replay: VecDeque<(InstSeqNum, ThreadId)>,
    dep_pred: Phast,
    load_barrier_sns: HashSet<InstSeqNum>,
    store_barrier_sns: HashSet<InstSeqNum>,
    pub stats: MemDepUnitStats,
}

impl MemDepUnit {
    /// Builds a fresh unit with `max_threads` per-thread instruction lists.
    #[must_use]
    pub fn new(config: &MemDepUnitConfig) -> Self {
        Self {
            mem_dep_hash: HashMap::new(),
            inst_list: vec![Vec::new(); config.max_threads],
            insts_to_replay: VecDeque::new(),
            dep_pred: Phast::new(config),
            load_barrier_sns: HashSet::new(),
            store_barrier_sns: HashSet::new(),
            stats: MemDepUnitStats::default(),
        }
    }

    fn has_load_barrier(&self) -> bool {
        !self.load_barrier_sns.is_empty()
    }

    fn has_store_barrier(&self) -> bool {
        !self.store_barrier_sns.is_empty()
    }

    /// True once no instructions, replays, or barriers are outstanding.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.insts_to_replay.is_empty()
            && self.mem_dep_hash.is_empty()
            && self.inst_list.iter().all(Vec::is_empty)
    }

    /// Panics if the unit is not fully drained.
    ///
    /// # Panics
    ///
    /// Panics if any instruction, replay entry, or barrier is outstanding.
    pub fn drain_sanity_check(&self) {
        assert!(self.insts_to_replay.is_empty(), "MemDepUnit: replay list not drained");
        assert!(self.mem_dep_hash.is_empty(), "MemDepUnit: mem dep hash not drained");
        assert!(self.inst_list.iter().all(Vec::is_empty), "MemDepUnit: inst list not drained");
    }

    /// Resets barrier tracking and the predictor, as on a thread handoff.
    pub fn take_over_from(&mut self) {
        self.load_barrier_sns.clear();
        self.store_barrier_sns.clear();
        self.dep_pred.clear();
    }

    /// Resets just the dependence predictor's trained state.
    pub fn clear_dep_pred(&mut self) {
        self.dep_pred.clear();
    }

    /// Read-only access to a tracked instruction's speculative dependence metadata.
    #[must_use]
    pub fn mem_dep_info(&self, seq_num: InstSeqNum) -> Option<&MemDepInfo> {
        self.mem_dep_hash.get(&seq_num).map(|e| &e.mem_dep_info)
    }

    fn insert_barrier_sn(&mut self, seq_num: InstSeqNum, kind: MemOpKind) {
        if kind.is_read_barrier_like() {
            self.load_barrier_sns.insert(seq_num);
        }
        if kind.is_write_barrier_like() {
            self.store_barrier_sns.insert(seq_num);
        }
    }

    /// Registers a load, store, or atomic at dispatch.
    ///
    /// Consults [`Phast`] for a speculative producer (loads only, matching
    /// the predictor's own scope), adds outstanding barriers as further
    /// dependencies, and either forwards the instruction to `iq` immediately
    /// or parks it until its dependencies resolve.
    pub fn insert(
        &mut self,
        op: MemOpInfo,
        branch_history: &[BranchHistoryEntry],
        sqv: &impl StoreQueueView,
        iq: &mut impl IssueSink,
    ) {
        let mut entry = MemDepEntry::new(&op);
        let mut dependencies: Vec<InstSeqNum> = Vec::new();

        if op.kind == MemOpKind::Load {
            if let Some(pred) = self.dep_pred.check_inst(op.pc, op.seq_num, branch_history) {
                if let Some(sq_index) = op.sq_index {
                    let store_head = sqv.store_head(op.thread) as i64;
                    if sq_index as i64 >= store_head + pred.distance {
                        let target_index = (sq_index as i64 - pred.distance) as usize;
                        if let Some(producer_sn) = sqv.seq_num_at(op.thread, target_index) {
                            if self.mem_dep_hash.contains_key(&producer_sn) {
                                dependencies.push(producer_sn);
                                entry.mem_dep_info.predicted = true;
                                entry.mem_dep_info.pred_branch_hist_length = pred.table_index;
                                entry.mem_dep_info.predictor_hash = pred.hash;
                                entry.mem_dep_info.store_queue_distance = pred.distance;
                            }
                        }
                    }
                }
            }
        }

        if op.kind.is_load_like() && self.has_load_barrier() {
            for &sn in &self.load_barrier_sns {
                if self.mem_dep_hash.contains_key(&sn) {
                    dependencies.push(sn);
                }
            }
        }
        if op.kind.is_store_like() && self.has_store_barrier() {
            for &sn in &self.store_barrier_sns {
                if self.mem_dep_hash.contains_key(&sn) {
                    dependencies.push(sn);
                }
            }
        }

        if dependencies.is_empty() {
            if op.ready_to_issue {
                entry.regs_ready = true;
                iq.add_ready_mem_inst(op.seq_num);
            }
        } else {
            entry.mem_deps = dependencies.len();
            entry.regs_ready = op.ready_to_issue;
            for producer_sn in &dependencies {
                if let Some(producer) = self.mem_dep_hash.get_mut(producer_sn) {
                    producer.depend_insts.push(op.seq_num);
                }
            }
            if op.kind.is_load_like() {
                self.stats.conflicting_loads += 1;
            } else {
                self.stats.conflicting_stores += 1;
            }
        }

        self.mem_dep_hash.insert(op.seq_num, entry);
        self.inst_list[op.thread].push(op.seq_num);
        self.insert_barrier_sn(op.seq_num, op.kind);

        if op.kind.is_store_like() {
            self.dep_pred.insert_store();
            self.stats.inserted_stores += 1;
        } else if op.kind.is_load_like() {
            self.stats.inserted_loads += 1;
        } else {
            panic!("MemDepUnit::insert called with a barrier op");
        }
    }

    /// Registers a non-speculative memory op (e.g. an uncacheable access).
    ///
    /// Unlike [`Self::insert`], no PHAST lookup or barrier dependency is
    /// attached; the op becomes ready only when [`Self::non_spec_inst_ready`]
    /// is called for it.
    pub fn insert_non_spec(&mut self, op: MemOpInfo) {
        self.insert_barrier(op);

        if op.kind.is_store_like() {
            self.dep_pred.insert_store();
            self.stats.inserted_stores += 1;
        } else if op.kind.is_load_like() {
            self.stats.inserted_loads += 1;
        } else {
            panic!("MemDepUnit::insert_non_spec called with a barrier op");
        }
    }

    /// Registers a barrier instruction (read/write/HTM).
    pub fn insert_barrier(&mut self, op: MemOpInfo) {
        let entry = MemDepEntry::new(&op);
        self.mem_dep_hash.insert(op.seq_num, entry);
        self.inst_list[op.thread].push(op.seq_num);
        self.insert_barrier_sn(op.seq_num, op.kind);
    }

    fn move_to_ready(iq: &mut impl IssueSink, seq_num: InstSeqNum) {
        iq.add_ready_mem_inst(seq_num);
    }

    /// Marks an instruction's register operands as ready; forwards it to the
    /// issue queue if its memory dependencies are already resolved.
    pub fn regs_ready(&mut self, seq_num: InstSeqNum, iq: &mut impl IssueSink) {
        let Some(entry) = self.mem_dep_hash.get_mut(&seq_num) else { return };
        entry.regs_ready = true;
        if entry.mem_deps == 0 {
            Self::move_to_ready(iq, seq_num);
        }
    }

    /// Marks a non-speculative instruction ready, unconditionally forwarding it.
    pub fn non_spec_inst_ready(&mut self, seq_num: InstSeqNum, iq: &mut impl IssueSink) {
        if self.mem_dep_hash.contains_key(&seq_num) {
            Self::move_to_ready(iq, seq_num);
        }
    }

    /// Queues an instruction to be replayed (re-issued after a failed attempt).
    pub fn reschedule(&mut self, seq_num: InstSeqNum, tid: ThreadId) {
        self.insts_to_replay.push_back((seq_num, tid));
    }

    /// Moves every queued replay instruction to the issue queue.
    pub fn replay(&mut self, iq: &mut impl IssueSink) {
        while let Some((seq_num, _tid)) = self.insts_to_replay.pop_front() {
            if self.mem_dep_hash.contains_key(&seq_num) {
                Self::move_to_ready(iq, seq_num);
            }
        }
    }

    fn completed(&mut self, seq_num: InstSeqNum) {
        let Some(entry) = self.mem_dep_hash.remove(&seq_num) else { return };
        let list = &mut self.inst_list[entry.thread];
        if let Some(pos) = list.iter().position(|&sn| sn == seq_num) {
            list.remove(pos);
        }
    }

    /// Releases one dependency from every instruction waiting on `seq_num`,
    /// forwarding producer address/size once it resolves, and moves any
    /// fully-resolved, register-ready dependent to the issue queue.
    fn wake_dependents(
        &mut self,
        seq_num: InstSeqNum,
        kind: MemOpKind,
        eff_addr: u64,
        eff_size: u64,
        iq: &mut impl IssueSink,
    ) {
        // Only stores, atomics, and barriers have dependents.
        if !kind.is_store_like() && !kind.is_barrier() {
            return;
        }

        let Some(entry) = self.mem_dep_hash.get_mut(&seq_num) else { return };
        let dependents = std::mem::take(&mut entry.depend_insts);

        for dependent_sn in dependents {
            let Some(dependent) = self.mem_dep_hash.get_mut(&dependent_sn) else {
                // Already squashed or completed; nothing to wake.
                continue;
            };

            dependent.mem_deps -= 1;

            if dependent.mem_deps == 0 {
                if dependent.mem_dep_info.predicted && kind.is_store_like() {
                    dependent.mem_dep_info.pred_store_addr = eff_addr;
                    dependent.mem_dep_info.pred_store_size = eff_size;
                }
                if dependent.regs_ready {
                    Self::move_to_ready(iq, dependent_sn);
                }
            }
        }
    }

    /// Notifies the unit that `seq_num` has finished executing: wakes its
    /// dependents, removes its tracking entry, and clears any barrier it held.
    pub fn complete_inst(
        &mut self,
        seq_num: InstSeqNum,
        kind: MemOpKind,
        eff_addr: u64,
        eff_size: u64,
        iq: &mut impl IssueSink,
    ) {
        self.wake_dependents(seq_num, kind, eff_addr, eff_size, iq);
        self.completed(seq_num);

        if kind.is_write_barrier_like() {
            debug_assert!(self.has_store_barrier());
            self.store_barrier_sns.remove(&seq_num);
        }
        if kind.is_read_barrier_like() {
            debug_assert!(self.has_load_barrier());
            self.load_barrier_sns.remove(&seq_num);
        }
    }

    /// Discards every tracked instruction younger than `squashed_num` for `tid`.
    pub fn squash(&mut self, squashed_num: InstSeqNum, tid: ThreadId) {
        self.insts_to_replay.retain(|&(sn, sn_tid)| !(sn_tid == tid && sn > squashed_num));

        while let Some(&last) = self.inst_list[tid].last() {
            if last <= squashed_num {
                break;
            }
            self.inst_list[tid].pop();
            self.load_barrier_sns.remove(&last);
            self.store_barrier_sns.remove(&last);
            self.mem_dep_hash.remove(&last);
        }

        self.dep_pred.squash();
    }

    /// Trains the predictor on a detected memory-ordering violation between a
    /// younger load and an older store.
    ///
    /// `store_queue_distance` is the actual SQ-relative distance observed
    /// between the load and the violating store at the time of the
    /// violation, independent of whatever the load had (or hadn't) been
    /// predicted to depend on.
    pub fn violation(
        &mut self,
        load_seq_num: InstSeqNum,
        store_seq_num: InstSeqNum,
        store_queue_distance: i64,
        branch_history: &[BranchHistoryEntry],
    ) {
        let Some(load_entry) = self.mem_dep_hash.get(&load_seq_num) else { return };
        let load_pc = load_entry.pc;
        let info = load_entry.mem_dep_info;

        let prior = info.predicted.then_some((info.pred_branch_hist_length, info.predictor_hash));
        if info.predicted {
            self.stats.false_dependencies += 1;
        }

        self.dep_pred.violation(
            load_pc,
            store_seq_num,
            store_queue_distance,
            prior,
            branch_history,
        );
    }

    /// Forwards an issue event to the predictor (a no-op in PHAST, retained
    /// for interface symmetry with the dependence predictor it supersedes).
    pub fn issue(&mut self) {
        self.dep_pred.issue();
    }

    /// Scores a committing load's prediction, if it carried one.
    pub fn commit(
        &mut self,
        seq_num: InstSeqNum,
        load_addr: u64,
        load_size: u64,
    ) {
        let Some(entry) = self.mem_dep_hash.get(&seq_num) else { return };
        if entry.kind.is_store_like() {
            return;
        }
        if !entry.mem_dep_info.predicted {
            return;
        }

        let load_pc = entry.pc;
        let info = entry.mem_dep_info;
        let correct = self.dep_pred.commit(
            load_pc,
            load_addr,
            load_size,
            info.pred_branch_hist_length,
            info.predictor_hash,
            info.pred_store_addr,
            info.pred_store_size,
        );

        if correct {
            self.stats.correct_predictions += 1;
        } else {
            self.stats.false_dependencies += 1;
        }
    }
}
