//! PHAST: the Path-Hashed Store-distance predictor.
//!
//! Owns a bank of [`SimplBlockCache`]s, one per branch-history window length,
//! and predicts — for a dispatching load — the signed store-queue distance to
//! its most likely producing store by hashing the branch path leading up to
//! it. Geometric history lengths give a TAGE-style tradeoff between coverage
//! (short histories, trained quickly) and specificity (long histories, fewer
//! aliasing collisions).

use super::simpl_block_cache::{fold_to_width, SimplBlockCache};
use super::types::{BranchHistoryEntry, InstSeqNum};
use crate::config::MemDepUnitConfig;

/// Fixed branch-history window sizes PHAST maintains one table per.
const HISTORY_SIZES: [usize; 8] = [0, 2, 4, 6, 8, 12, 16, 32];

/// Number of low bits of a branch target folded into the path hash.
const SELECTED_TARGET_BITS: u32 = 5;

/// Mask corresponding to [`SELECTED_TARGET_BITS`].
const SELECTED_TARGET_MASK: u64 = 0x1F;

/// Outcome of a successful PHAST dispatch-time lookup.
#[derive(Debug, Clone, Copy)]
pub struct PhastPrediction {
    /// Index of the table (branch-history window) that produced the prediction.
    pub table_index: usize,
    /// The hash used for that table's lookup (needed again to train it later).
    pub hash: u64,
    /// Predicted signed distance, in store-queue slots, to the producing store.
    pub distance: i64,
}

/// Per-path read/write (query/train) counters, indexed 0..8 (paths 1..8 in the
/// spec's 1-based external naming).
///
/// Named by the operation actually performed: `reads[i]` increments on
/// `predict` (a query), `writes[i]` increments on `update`/`update_commit` (a
/// training write). The reference gem5 source increments its "writes" counter
/// from inside the predict path, which this implementation treats as a latent
/// naming bug in the source rather than behavior to reproduce (see DESIGN.md).
#[derive(Debug, Clone, Copy, Default)]
pub struct PathStats {
    /// Number of `predict` queries issued to each table.
    pub reads: [u64; 8],
    /// Number of `update`/`update_commit` training writes issued to each table.
    pub writes: [u64; 8],
}

/// Path-Hashed Store-distance predictor.
pub struct Phast {
    history_sizes: [usize; 8],
    paths: [SimplBlockCache; 8],
    max_branches: usize,
    dep_check_shift: u32,
    stats: PathStats,
}

impl Phast {
    /// Builds a fresh predictor bank from configuration.
    ///
    /// # Panics
    ///
    /// Panics if `phast_num_rows` is not a power of two: it names a row
    /// *count*, not a bit width, and `SimplBlockCache` is indexed by
    /// `log2(phast_num_rows)` set-index bits.
    #[must_use]
    pub fn new(config: &MemDepUnitConfig) -> Self {
        assert!(
            config.phast_num_rows.is_power_of_two(),
            "Phast: phast_num_rows must be a power of 2"
        );
        let set_bits = config.phast_num_rows.trailing_zeros();
        let tag_bits = u32::try_from(config.phast_tag_bits).unwrap_or(0);
        let make = || {
            SimplBlockCache::new(
                set_bits,
                config.phast_associativity,
                tag_bits,
                config.phast_max_counter,
            )
        };
        Self {
            history_sizes: HISTORY_SIZES,
            paths: [make(), make(), make(), make(), make(), make(), make(), make()],
            max_branches: 0,
            dep_check_shift: config.dep_check_shift,
            stats: PathStats::default(),
        }
    }

    /// Read-only access to the per-path query/train counters.
    #[must_use]
    pub const fn stats(&self) -> &PathStats {
        &self.stats
    }

    /// Locates `begin`: the smallest index into `bh` whose entry is not younger
    /// than `load_seq_num`. Returns `bh.len()` if no such entry exists.
    fn find_begin(bh: &[BranchHistoryEntry], load_seq_num: InstSeqNum) -> usize {
        bh.iter().position(|b| b.seq_num <= load_seq_num).unwrap_or(bh.len())
    }

    /// Accumulates the raw xor/shift path hash described in the spec, then
    /// folds it to `width` bits (a table's combined set+tag width) the same
    /// way `SimplBlockCache::predict`/`update` fold their own `pc ^ history`
    /// mix — two independent folds of two independently-derived values, not
    /// a double-fold of the same one.
    fn generate_branch_hash(bh: &[BranchHistoryEntry], begin: usize, n: usize, width: u32) -> u64 {
        let end = begin + n;
        if end >= bh.len() {
            return 0;
        }
        let mut h = bh[end].target & SELECTED_TARGET_MASK;
        for idx in (begin..end).rev() {
            let b = bh[idx];
            if b.indirect {
                h = (h << SELECTED_TARGET_BITS) ^ (b.target & SELECTED_TARGET_MASK);
            } else {
                h = (h << 1) | u64::from(b.taken);
            }
        }
        fold_to_width(h, width)
    }

    /// Dispatch-time prediction for a load.
    ///
    /// Clamps the active table range so that every queried table's history
    /// window fits within `bh`, then queries tables from the shortest history
    /// upward, returning the first nonzero distance found.
    pub fn check_inst(
        &mut self,
        load_pc: u64,
        load_seq_num: InstSeqNum,
        bh: &[BranchHistoryEntry],
    ) -> Option<PhastPrediction> {
        let begin = Self::find_begin(bh, load_seq_num);
        if begin >= bh.len() {
            return None;
        }

        if self.history_sizes[self.max_branches] > bh.len() {
            let mut i = 0;
            while i + 1 < self.history_sizes.len() && self.history_sizes[i + 1] <= bh.len() {
                i += 1;
            }
            self.max_branches = i;
        }

        for i in 0..=self.max_branches {
            let width = self.paths[i].combined_width();
            let hash = Self::generate_branch_hash(bh, begin, self.history_sizes[i], width);
            self.stats.reads[i] += 1;
            let distance = self.paths[i].predict(load_pc, hash);
            if distance != 0 {
                return Some(PhastPrediction { table_index: i, hash, distance });
            }
        }
        None
    }

    /// Counts branch-history entries strictly older than `store_seq_num`.
    fn count_older_than(bh: &[BranchHistoryEntry], store_seq_num: InstSeqNum) -> usize {
        bh.iter().filter(|b| b.seq_num < store_seq_num).count()
    }

    /// Quantizes `num_branches` down to the index of the largest history
    /// window size not exceeding it.
    fn quantize(&self, num_branches: usize) -> usize {
        if num_branches >= *self.history_sizes.last().unwrap_or(&0) {
            return self.history_sizes.len() - 1;
        }
        self.history_sizes
            .iter()
            .rposition(|&size| size <= num_branches)
            .unwrap_or(0)
    }

    /// Trains the predictor on a detected memory-order violation.
    ///
    /// `prior` is the load's existing prediction metadata, if it had one
    /// (`table_index`, `hash`), used to penalize the table that mispredicted.
    pub fn violation(
        &mut self,
        load_pc: u64,
        store_seq_num: InstSeqNum,
        store_queue_distance: i64,
        prior: Option<(usize, u64)>,
        bh: &[BranchHistoryEntry],
    ) {
        // bh is oldest-to-youngest; if even the oldest entry is not older than
        // the violating store, there is no usable anchor to train against.
        if bh.is_empty() || bh[0].seq_num >= store_seq_num {
            return;
        }

        let num_branches = Self::count_older_than(bh, store_seq_num);
        let i = self.quantize(num_branches);

        if let Some((pred_path, pred_hash)) = prior {
            self.stats.writes[pred_path] += 1;
            self.paths[pred_path].update_commit(load_pc, pred_hash, true);
        }

        let hash = Self::generate_branch_hash(bh, 0, num_branches, self.paths[i].combined_width());
        self.stats.writes[i] += 1;
        self.paths[i].update(load_pc, hash, store_queue_distance);
        self.max_branches = self.max_branches.max(i);
    }

    /// Scores a load's prediction at commit time by comparing effective
    /// address ranges at word-shift granularity.
    pub fn commit(
        &mut self,
        load_pc: u64,
        load_addr: u64,
        load_size: u64,
        pred_path: usize,
        pred_hash: u64,
        pred_store_addr: u64,
        pred_store_size: u64,
    ) -> bool {
        let load_lo = load_addr >> self.dep_check_shift;
        let load_hi = (load_addr + load_size.max(1) - 1) >> self.dep_check_shift;
        let store_lo = pred_store_addr >> self.dep_check_shift;
        let store_hi = (pred_store_addr + pred_store_size.max(1) - 1) >> self.dep_check_shift;
        let overlaps = load_lo <= store_hi && store_lo <= load_hi;

        self.stats.writes[pred_path] += 1;
        self.paths[pred_path].update_commit(load_pc, pred_hash, !overlaps);
        overlaps
    }

    /// Resets all tables and the adaptive `max_branches` window to a fresh state.
    pub fn clear(&mut self) {
        self.max_branches = 0;
        for path in &mut self.paths {
            path.clear();
        }
    }

    /// The store-side training hook. A no-op in this predictor (PHAST trains
    /// only from the load side, on violation and commit), retained so the
    /// `MemDepUnit` has a stable interface regardless of which predictor
    /// backs it.
    pub const fn insert_store(&mut self) {}

    /// The load-side insertion hook. Also currently a no-op; PHAST's only
    /// training points are `violation` and `commit`.
    pub const fn insert_load(&mut self) {}

    /// Forwarded from `MemDepUnit::squash`. A no-op: PHAST holds no
    /// per-instruction state that needs rolling back on squash, only
    /// aggregate table contents trained at violation/commit.
    pub const fn squash(&mut self) {}

    /// Forwarded from `MemDepUnit::issue`. A no-op for the same reason as
    /// [`Self::squash`].
    pub const fn issue(&mut self) {}
}
