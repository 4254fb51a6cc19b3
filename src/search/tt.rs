//! Transposition table for caching search results.
//!
//! 2-way set-associative: each bucket holds two (key, entry) slots.
//! Replacement is depth-preferred — deep entries survive shallow spam —
//! and at equal depth a non-EXACT entry is evicted before an EXACT one.
//!
//! Bucket indexing uses the high-multiplication mapping
//! `idx = (hash * buckets) >> 64`, which distributes evenly for good
//! Zobrist keys without constraining the table to a power-of-two size.

use crate::types::{Depth, Hash, Move, Score};
use std::collections::TryReserveError;
use std::mem;

/// Default table budget in megabytes.
pub const DEFAULT_SIZE_MB: usize = 1024;

/// Type of bound stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BoundType {
    /// Exact score (PV node).
    Exact,
    /// Lower bound (fail-high, score >= beta).
    LowerBound,
    /// Upper bound (fail-low, score <= alpha).
    UpperBound,
}

/// A single entry in the transposition table.
///
/// Mate scores are stored ply-absolute; callers apply
/// [`Score::from_tt`] after a probe and [`Score::to_tt`] before a
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub depth: i16,
    pub score: Score,
    pub flag: BoundType,
    pub best_move: Option<Move>,
    pub valid: bool,
}

impl TtEntry {
    /// An entry that has never been written.
    pub const fn invalid() -> Self {
        Self {
            depth: -1,
            score: Score::cp(0),
            flag: BoundType::Exact,
            best_move: None,
            valid: false,
        }
    }

    pub fn new(depth: Depth, score: Score, flag: BoundType, best_move: Option<Move>) -> Self {
        Self {
            depth: depth.raw() as i16,
            score,
            flag,
            best_move,
            valid: true,
        }
    }
}

impl Default for TtEntry {
    fn default() -> Self {
        Self::invalid()
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    key: Hash,
    entry: TtEntry,
}

impl Slot {
    const EMPTY: Slot = Slot {
        key: 0,
        entry: TtEntry::invalid(),
    };
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    a: Slot,
    b: Slot,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        a: Slot::EMPTY,
        b: Slot::EMPTY,
    };
}

/// Fixed-capacity cache of search results, keyed by Zobrist hash.
///
/// Single-threaded access only; the search owns it exclusively for the
/// duration of a think() call.
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    size_mb: usize,
}

impl TranspositionTable {
    /// Create a table sized to roughly `size_mb` megabytes.
    pub fn new(size_mb: usize) -> Self {
        let buckets = vec![Bucket::EMPTY; Self::bucket_count_for(size_mb)];
        Self { buckets, size_mb }
    }

    /// Fallible construction, for resizes requested at runtime: on
    /// allocation failure the caller keeps its previous table.
    pub fn try_new(size_mb: usize) -> Result<Self, TryReserveError> {
        let count = Self::bucket_count_for(size_mb);
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(count)?;
        buckets.resize(count, Bucket::EMPTY);
        Ok(Self { buckets, size_mb })
    }

    fn bucket_count_for(size_mb: usize) -> usize {
        let bytes = size_mb.max(1) * 1024 * 1024;
        (bytes / mem::size_of::<Bucket>()).max(1)
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Two slots per bucket.
    #[inline]
    pub fn approx_entry_capacity(&self) -> usize {
        self.buckets.len() * 2
    }

    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    /// High-multiplication bucket index.
    #[inline]
    pub fn bucket_index(&self, hash: Hash) -> usize {
        ((hash as u128 * self.buckets.len() as u128) >> 64) as usize
    }

    /// Return the entry stored for `hash`, or an invalid entry.
    #[inline]
    pub fn probe(&self, hash: Hash) -> TtEntry {
        let bucket = &self.buckets[self.bucket_index(hash)];
        if bucket.a.entry.valid && bucket.a.key == hash {
            return bucket.a.entry;
        }
        if bucket.b.entry.valid && bucket.b.key == hash {
            return bucket.b.entry;
        }
        TtEntry::invalid()
    }

    /// Store `entry` under `hash`. Invalid entries are ignored.
    ///
    /// Same-key writes replace only at greater-or-equal depth. A full
    /// bucket evicts the shallower slot; at equal depth a non-EXACT
    /// slot goes first, and slot A is the deterministic final choice.
    pub fn store(&mut self, hash: Hash, entry: TtEntry) {
        if !entry.valid {
            return;
        }

        let idx = self.bucket_index(hash);
        let bucket = &mut self.buckets[idx];

        if bucket.a.entry.valid && bucket.a.key == hash {
            if entry.depth >= bucket.a.entry.depth {
                bucket.a.entry = entry;
            }
            return;
        }
        if bucket.b.entry.valid && bucket.b.key == hash {
            if entry.depth >= bucket.b.entry.depth {
                bucket.b.entry = entry;
            }
            return;
        }

        if !bucket.a.entry.valid {
            bucket.a = Slot { key: hash, entry };
            return;
        }
        if !bucket.b.entry.valid {
            bucket.b = Slot { key: hash, entry };
            return;
        }

        let victim = Self::pick_victim(bucket);
        *victim = Slot { key: hash, entry };
    }

    fn pick_victim(bucket: &mut Bucket) -> &mut Slot {
        if bucket.a.entry.depth != bucket.b.entry.depth {
            if bucket.a.entry.depth < bucket.b.entry.depth {
                return &mut bucket.a;
            }
            return &mut bucket.b;
        }

        let a_exact = bucket.a.entry.flag == BoundType::Exact;
        let b_exact = bucket.b.entry.flag == BoundType::Exact;
        if a_exact != b_exact {
            if a_exact {
                return &mut bucket.b;
            }
            return &mut bucket.a;
        }

        &mut bucket.a
    }

    /// Zero all slots.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = Bucket::EMPTY;
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_MB)
    }
}
