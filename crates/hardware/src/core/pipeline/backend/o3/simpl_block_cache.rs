//! `SimplBlockCache`: a set-associative, LRU-replaced cache mapping a hashed
//! `(pc, branch-history)` key to a signed store-queue distance and confidence
//! counter. One bank exists per PHAST history-window length.

/// Folds a 64-bit value down to `width` bits by xor-ing successive `width`-bit
/// chunks together (the remainder chunk, if any, is included as-is).
///
/// `width == 0` folds everything away to zero; `width >= 64` is a no-op mask.
///
/// Shared with [`super::phast::Phast`], which folds a raw branch-path hash to
/// a table's combined set+tag width before handing it to that table.
pub(super) fn fold_to_width(value: u64, width: u32) -> u64 {
    if width == 0 {
        return 0;
    }
    if width >= 64 {
        return value;
    }
    let mask = (1u64 << width) - 1;
    let mut folded = 0u64;
    let mut shift = 0u32;
    while shift < 64 {
        folded ^= (value >> shift) & mask;
        shift += width;
    }
    folded & mask
}

/// One way within a `SimplBlockCache` set.
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    tag: u64,
    distance: i64,
    counter: u32,
    lru: u32,
    valid: bool,
}

/// Set-associative cache of path-hashed store-distance predictions.
///
/// Indexed by a tag derived from `pc ^ history`; each way carries a saturating
/// confidence counter and the predicted signed store-queue distance.
#[derive(Debug, Clone)]
pub struct SimplBlockCache {
    entries: Vec<Entry>,
    set_bits: u32,
    tag_bits: u32,
    associativity: usize,
    max_counter: u32,
    lru_clock: u32,
}

impl SimplBlockCache {
    /// Allocates `2^set_bits` sets of `associativity` ways each, all invalid.
    ///
    /// # Panics
    ///
    /// Panics if `associativity` is zero.
    #[must_use]
    pub fn new(set_bits: u32, associativity: usize, tag_bits: u32, max_counter: u32) -> Self {
        assert!(associativity > 0, "SimplBlockCache: associativity must be nonzero");
        let num_sets = 1usize << set_bits;
        Self {
            entries: vec![Entry::default(); num_sets * associativity],
            set_bits,
            tag_bits,
            associativity,
            max_counter,
            lru_clock: 0,
        }
    }

    /// Combined set-index and tag width, the width [`Phast`](super::phast::Phast)
    /// folds its raw path hash down to before passing it in as `history`.
    #[must_use]
    pub(super) const fn combined_width(&self) -> u32 {
        self.set_bits + self.tag_bits
    }

    fn set_index(&self, pc: u64, history: u64) -> usize {
        let mixed_pc = pc ^ (pc >> 2) ^ (pc >> 5);
        fold_to_width(mixed_pc ^ history, self.set_bits) as usize
    }

    fn tag_of(&self, pc: u64, history: u64) -> u64 {
        let mixed_pc = pc ^ (pc >> 3) ^ (pc >> 7);
        fold_to_width(mixed_pc ^ history, self.tag_bits)
    }

    fn set_range(&self, set_idx: usize) -> std::ops::Range<usize> {
        let base = set_idx * self.associativity;
        base..base + self.associativity
    }

    fn touch(&mut self, idx: usize) {
        self.lru_clock += 1;
        self.entries[idx].lru = self.lru_clock;
    }

    /// Index, within a set, of the least-recently-touched way.
    fn lru_victim(&self, set_idx: usize) -> usize {
        self.set_range(set_idx)
            .min_by_key(|&i| self.entries[i].lru)
            .expect("associativity is nonzero")
    }

    fn find(&self, set_idx: usize, tag: u64) -> Option<usize> {
        self.set_range(set_idx)
            .find(|&i| self.entries[i].valid && self.entries[i].tag == tag)
    }

    /// Looks up the predicted distance for `(pc, history)`.
    ///
    /// Returns `0` (no prediction) unless a way in the indexed set has a
    /// matching tag, a nonzero counter, and a nonzero distance. A hit touches
    /// that way's LRU state; a miss has no side effects.
    pub fn predict(&mut self, pc: u64, history: u64) -> i64 {
        let set_idx = self.set_index(pc, history);
        let tag = self.tag_of(pc, history);
        let Some(idx) = self.find(set_idx, tag) else {
            return 0;
        };
        let entry = self.entries[idx];
        if entry.counter == 0 || entry.distance == 0 {
            return 0;
        }
        self.touch(idx);
        entry.distance
    }

    /// Trains the cache with an observed `(pc, history) -> distance` mapping.
    ///
    /// On a tag hit, refreshes the distance and resets the counter to
    /// `max_counter`. On a miss, evicts the set's LRU way. Either way, the
    /// installed/refreshed entry is touched.
    pub fn update(&mut self, pc: u64, history: u64, distance: i64) {
        let set_idx = self.set_index(pc, history);
        let tag = self.tag_of(pc, history);
        let idx = self.find(set_idx, tag).unwrap_or_else(|| self.lru_victim(set_idx));
        self.entries[idx] = Entry {
            tag,
            distance,
            counter: self.max_counter,
            lru: self.entries[idx].lru,
            valid: true,
        };
        self.touch(idx);
    }

    /// Scores a prior prediction at commit/violation time.
    ///
    /// A tag hit with a nonzero counter decrements the counter (saturating at
    /// 0) when `wrong`, or restores it to `max_counter` when correct, and
    /// touches the entry. A miss, or a hit whose counter is already zero, is a
    /// silent no-op (the original training signal has already decayed away).
    pub fn update_commit(&mut self, pc: u64, history: u64, wrong: bool) {
        let set_idx = self.set_index(pc, history);
        let tag = self.tag_of(pc, history);
        let Some(idx) = self.find(set_idx, tag) else {
            return;
        };
        if self.entries[idx].counter == 0 {
            return;
        }
        if wrong {
            self.entries[idx].counter = self.entries[idx].counter.saturating_sub(1);
        } else {
            self.entries[idx].counter = self.max_counter;
        }
        self.touch(idx);
    }

    /// Resets every entry to invalid/zeroed state.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = Entry::default();
        }
        self.lru_clock = 0;
    }
}
