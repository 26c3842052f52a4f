//! ITTAGE: an indirect-branch target predictor using tagged, geometric
//! history-length tables plus a previous-target base predictor.
//!
//! Structurally this mirrors [`crate::core::units::bru::tage::TagePredictor`]
//! (same tagged-table/useful-bit/allocation machinery) but predicts a
//! *target address* rather than a taken/not-taken direction, and folds both
//! the branch PC and the global history register into each table's index and
//! tag rather than sharing a single table mask across banks.
//!
//! One instance exists per hardware thread; [`Ittage::record_branch`] and
//! [`Ittage::push_path`] are called for every branch (direct and indirect) to
//! keep the global history register and path-history queue current, while
//! [`Ittage::predict`]/[`Ittage::update`] concern indirect branches only.

use std::collections::VecDeque;

use crate::config::IttageConfig;

use super::types::InstSeqNum;

/// One path-history record: the branch that produced it, its resolved
/// target, and the sequence number it can be popped at commit or truncated
/// at squash.
#[derive(Debug, Clone, Copy)]
pub struct PathHistoryEntry {
    /// PC of the branch instruction.
    pub pc: u64,
    /// The branch's resolved target address.
    pub target: u64,
    /// Sequence number of the branch instruction.
    pub seq_num: InstSeqNum,
}

#[derive(Debug, Clone, Copy)]
struct TaggedEntry {
    tag: u32,
    target: u64,
    counter: u8,
    useful: bool,
    valid: bool,
}

impl Default for TaggedEntry {
    fn default() -> Self {
        Self { tag: 0, target: 0, counter: 0, useful: false, valid: false }
    }
}

/// Which source a target prediction/training step came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// A tagged table, by index.
    Table(usize),
    /// The previous-target base predictor.
    Base,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    table_idx: usize,
    row: usize,
    tag: u32,
}

/// Outcome of [`Ittage::predict`].
#[derive(Debug, Clone, Copy)]
pub struct IttagePrediction {
    /// The predicted target address.
    pub target: u64,
    /// Which tagged table (if any) produced the prediction; `None` means
    /// the base predictor was used.
    pub table_index: Option<usize>,
}

/// Per-event counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IttageStats {
    /// `predict` calls satisfied by the main (longest-matching) tagged table.
    pub mainlookup_hit: u64,
    /// `predict` calls satisfied by the alternate tagged table.
    pub altlookup_hit: u64,
    /// `predict` calls that found no tagged hit and fell back to the base predictor.
    pub basepred_hit: u64,
    /// `update` calls confirming the main table's selected prediction was correct.
    pub mainpred_hit: u64,
    /// `update` calls confirming the alternate table's selected prediction was correct.
    pub altpred_hit: u64,
    /// Training calls that found the prediction correct (main, alt, or base).
    pub correct: u64,
    /// Training calls that found the prediction wrong.
    pub mispredicted: u64,
}

fn pow2_mask(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

fn log2_floor(n: usize) -> usize {
    (usize::BITS - n.leading_zeros() - 1) as usize
}

/// Folds `value` to `width` bits by xor-ing successive `width`-bit chunks.
fn fold_to_width(value: u64, width: usize) -> u64 {
    if width == 0 {
        return 0;
    }
    if width >= 64 {
        return value;
    }
    let mask = pow2_mask(width);
    let mut folded = 0u64;
    let mut shift = 0usize;
    while shift < 64 {
        folded ^= (value >> shift) & mask;
        shift += width;
    }
    folded & mask
}

/// Xors 8 successive 8-bit slices of `pc`, then masks/folds to `width` bits.
fn addr_fold(pc: u64, width: usize) -> u64 {
    let mut h = 0u64;
    for byte in 0..8 {
        h ^= (pc >> (byte * 8)) & 0xFF;
    }
    fold_to_width(h, width)
}

/// Indirect-branch target predictor (ITTAGE), one instance per hardware thread.
pub struct Ittage {
    ghr: u64,
    path_history: VecDeque<PathHistoryEntry>,
    path_length: usize,

    simple_btb: Vec<u64>,
    previous_target: u64,

    tables: Vec<Vec<TaggedEntry>>,
    hist_lengths: Vec<usize>,
    tag_bit_sizes: Vec<usize>,
    tag_pc_shifts: Vec<usize>,
    index_bits: Vec<usize>,

    use_alt: u8,
    reset_counter: u16,

    stats: IttageStats,
}

impl Ittage {
    /// Builds a fresh predictor from configuration.
    ///
    /// # Panics
    ///
    /// Panics if `table_sizes`, `tag_bit_sizes`, `tag_pc_shifts`, or
    /// `hist_lengths` have fewer than `num_predictors` entries, or if any
    /// table size is not a power of two.
    #[must_use]
    pub fn new(config: &IttageConfig) -> Self {
        let n = config.num_predictors;
        assert!(config.table_sizes.len() >= n, "ITTAGE: table_sizes shorter than num_predictors");
        assert!(config.tag_bit_sizes.len() >= n, "ITTAGE: tag_bit_sizes shorter than num_predictors");
        assert!(config.tag_pc_shifts.len() >= n, "ITTAGE: tag_pc_shifts shorter than num_predictors");
        assert!(config.hist_lengths.len() >= n, "ITTAGE: hist_lengths shorter than num_predictors");

        let mut tables = Vec::with_capacity(n);
        let mut index_bits = Vec::with_capacity(n);
        for i in 0..n {
            let size = config.table_sizes[i];
            assert!(size.is_power_of_two(), "ITTAGE: table sizes must be powers of 2");
            tables.push(vec![TaggedEntry::default(); size]);
            index_bits.push(log2_floor(size));
        }

        Self {
            ghr: 0,
            path_history: VecDeque::new(),
            path_length: config.indirect_path_length,
            simple_btb: vec![0; config.simple_btb_size],
            previous_target: 0,
            tables,
            hist_lengths: config.hist_lengths[..n].to_vec(),
            tag_bit_sizes: config.tag_bit_sizes[..n].to_vec(),
            tag_pc_shifts: config.tag_pc_shifts[..n].to_vec(),
            index_bits,
            use_alt: 0,
            reset_counter: 128,
            stats: IttageStats::default(),
        }
    }

    /// Read-only access to prediction/training counters.
    #[must_use]
    pub const fn stats(&self) -> &IttageStats {
        &self.stats
    }

    fn csr1(&self, ghr: u64, table_idx: usize) -> u64 {
        let masked = ghr & pow2_mask(self.hist_lengths[table_idx]);
        fold_to_width(masked, self.index_bits[table_idx])
    }

    /// A second, independently-folded history compression used to diversify
    /// the tag beyond what `csr1` alone would provide, folded to
    /// `tag_bits - 1` (TAGE's usual `csr2` width, floored at 1 bit).
    fn csr2(&self, ghr: u64, table_idx: usize) -> u64 {
        let masked = ghr & pow2_mask(self.hist_lengths[table_idx]);
        let width = self.tag_bit_sizes[table_idx].saturating_sub(1).max(1);
        fold_to_width(masked, width)
    }

    fn index_of(&self, pc: u64, ghr: u64, table_idx: usize) -> usize {
        let folded_pc = addr_fold(pc, self.index_bits[table_idx]);
        let idx = folded_pc ^ self.csr1(ghr, table_idx);
        (idx as usize) & (self.tables[table_idx].len() - 1)
    }

    fn tag_of(&self, pc: u64, ghr: u64, table_idx: usize) -> u32 {
        let shift = self.tag_pc_shifts[table_idx];
        let csr1 = self.csr1(ghr, table_idx);
        let csr2 = self.csr2(ghr, table_idx);
        let raw = (pc >> shift) ^ csr1 ^ (csr2 << 1);
        (raw & pow2_mask(self.tag_bit_sizes[table_idx])) as u32
    }

    /// Finds up to two tag hits across all tables, most-specific (longest
    /// history) first: `(main, alt)`.
    fn find_hits(&self, pc: u64, ghr: u64) -> (Option<Hit>, Option<Hit>) {
        let mut main = None;
        let mut alt = None;
        for i in (0..self.tables.len()).rev() {
            let row = self.index_of(pc, ghr, i);
            let tag = self.tag_of(pc, ghr, i);
            let e = &self.tables[i][row];
            if e.valid && e.tag == tag {
                let hit = Hit { table_idx: i, row, tag };
                if main.is_none() {
                    main = Some(hit);
                } else {
                    alt = Some(hit);
                    break;
                }
            }
        }
        (main, alt)
    }

    fn base_target(&self, pc: u64) -> u64 {
        let idx = (pc ^ self.previous_target) as usize % self.simple_btb.len();
        self.simple_btb[idx]
    }

    /// Chooses between `main`/`alt`/the base predictor, per the spec's
    /// `use_alt`-gated selection rule.
    fn select(&self, main: Option<Hit>, alt: Option<Hit>, pc: u64) -> (Source, u64) {
        let Some(m) = main else {
            return (Source::Base, self.base_target(pc));
        };
        let m_entry = self.tables[m.table_idx][m.row];
        let prefer_alt = self.use_alt > 10 && m_entry.counter == 1 && !m_entry.useful && alt.is_some_and(|a| self.tables[a.table_idx][a.row].counter > 0);

        if prefer_alt {
            let a = alt.expect("prefer_alt implies alt is Some");
            (Source::Table(a.table_idx), self.tables[a.table_idx][a.row].target)
        } else {
            (Source::Table(m.table_idx), m_entry.target)
        }
    }

    /// Predicts the target of an indirect branch at `pc` using the current
    /// (speculative) global history.
    #[must_use]
    pub fn predict(&mut self, pc: u64) -> IttagePrediction {
        let (main, alt) = self.find_hits(pc, self.ghr);
        let (source, target) = self.select(main, alt, pc);
        match source {
            Source::Table(i) => {
                if Some(i) == main.map(|h| h.table_idx) {
                    self.stats.mainlookup_hit += 1;
                } else {
                    self.stats.altlookup_hit += 1;
                }
                IttagePrediction { target, table_index: Some(i) }
            }
            Source::Base => {
                self.stats.basepred_hit += 1;
                IttagePrediction { target, table_index: None }
            }
        }
    }

    /// Trains the predictor on a resolved indirect branch, re-deriving the
    /// main/alt selection against the restored (post-squash) history `ghr`
    /// rather than trusting speculative state that may have since changed.
    pub fn update(&mut self, pc: u64, actual_target: u64, ghr: u64) {
        let (main, alt) = self.find_hits(pc, ghr);
        let (source, predicted_target) = self.select(main, alt, pc);
        let correct = predicted_target == actual_target;

        if correct {
            self.stats.correct += 1;
            if let Source::Table(i) = source {
                let is_main = main.is_some_and(|h| h.table_idx == i);
                let row = if is_main { main.unwrap().row } else { alt.unwrap().row };
                if is_main {
                    self.stats.mainpred_hit += 1;
                } else {
                    self.stats.altpred_hit += 1;
                }
                let e = &mut self.tables[i][row];
                e.counter = (e.counter + 1).min(3);
            }
        } else {
            self.stats.mispredicted += 1;

            let alt_target = match alt {
                Some(a) => Some(self.tables[a.table_idx][a.row].target),
                None => None,
            };
            let main_target = main.map(|m| self.tables[m.table_idx][m.row].target);

            if alt_target == Some(actual_target) {
                self.use_alt = self.use_alt.saturating_add(1).min(15);
            } else if main_target == Some(actual_target) && matches!(source, Source::Table(i) if main.is_some_and(|m| m.table_idx != i))
            {
                self.use_alt = self.use_alt.saturating_sub(1);
            }
            if main_target == Some(actual_target) {
                if let Some(m) = main {
                    self.tables[m.table_idx][m.row].useful = true;
                }
            }

            let selected_table_idx = match source {
                Source::Table(i) => Some(i),
                Source::Base => None,
            };

            if let Some(i) = selected_table_idx {
                let row = self.index_of(pc, ghr, i);
                let e = &mut self.tables[i][row];
                if e.counter > 0 {
                    e.counter -= 1;
                } else {
                    e.tag = self.tag_of(pc, ghr, i);
                    e.target = actual_target;
                    e.counter = 1;
                    e.useful = false;
                    e.valid = true;
                }
            }

            let start = selected_table_idx.map_or(0, |i| i + 1);
            let mut allocated = 0usize;
            for i in start..self.tables.len() {
                if allocated >= 2 {
                    break;
                }
                let row = self.index_of(pc, ghr, i);
                if !self.tables[i][row].useful {
                    let tag = self.tag_of(pc, ghr, i);
                    self.tables[i][row] = TaggedEntry { tag, target: actual_target, counter: 1, useful: false, valid: true };
                    allocated += 1;
                }
            }
            if allocated == 0 {
                self.reset_counter = self.reset_counter.saturating_sub(1);
                if self.reset_counter == 0 {
                    for table in &mut self.tables {
                        for e in table {
                            e.useful = false;
                        }
                    }
                    self.reset_counter = 128;
                }
            }
        }

        let base_idx = (pc ^ self.previous_target) as usize % self.simple_btb.len();
        self.simple_btb[base_idx] = actual_target;
        self.previous_target = actual_target;
    }

    /// Shifts the global history register by one bit per resolved branch
    /// (direct or indirect); called for every branch, not just indirect ones.
    pub fn record_branch(&mut self, taken: bool) {
        self.ghr = (self.ghr << 1) | u64::from(taken);
    }

    /// Current global history register value, for passing back to
    /// [`Self::update`] after a squash restores it.
    #[must_use]
    pub const fn ghr(&self) -> u64 {
        self.ghr
    }

    /// Restores the global history register, e.g. after a squash.
    pub fn restore_ghr(&mut self, ghr: u64) {
        self.ghr = ghr;
    }

    /// Appends a resolved branch to the path-history queue, dropping the
    /// oldest entry if the queue is already at `indirect_path_length`.
    pub fn push_path(&mut self, pc: u64, target: u64, seq_num: InstSeqNum) {
        if self.path_history.len() >= self.path_length {
            self.path_history.pop_front();
        }
        self.path_history.push_back(PathHistoryEntry { pc, target, seq_num });
    }

    /// Drops the oldest path-history entry at commit.
    pub fn pop_path_on_commit(&mut self) {
        self.path_history.pop_front();
    }

    /// Truncates the path-history queue to entries no younger than `seq_num`,
    /// on squash.
    pub fn squash_path(&mut self, seq_num: InstSeqNum) {
        while self.path_history.back().is_some_and(|e| e.seq_num > seq_num) {
            self.path_history.pop_back();
        }
    }

    /// Read-only view of the path-history queue.
    #[must_use]
    pub fn path_history(&self) -> &VecDeque<PathHistoryEntry> {
        &self.path_history
    }
}
