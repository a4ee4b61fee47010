use crate::board::ChessMove;

use crate::types::{Score, MATE_BAND};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    Exact,
    LowerBound, // Beta cutoff (score >= beta)
    UpperBound, // Failed low (score <= alpha)
}

#[derive(Clone, Copy)]
pub struct TTEntry {
    pub key: u64, // Zobrist hash (full, for collision detection)
    pub depth: u8,
    pub score: Score,
    pub flag: TTFlag,
    pub best_move: Option<ChessMove>,
}

impl Default for TTEntry {
    fn default() -> Self {
        Self {
            key: 0,
            depth: 0,
            score: 0,
            flag: TTFlag::Exact,
            best_move: None,
        }
    }
}

/// Convert a ply-independent ("absolute") mate score into one relative to
/// the current ply, for reading out of the table.
pub fn denormalize_mate(score: Score, ply: usize) -> Score {
    if score > MATE_BAND {
        score - ply as Score
    } else if score < -MATE_BAND {
        score + ply as Score
    } else {
        score
    }
}

/// Convert a ply-relative mate score into the ply-independent form stored
/// in the table.
pub fn normalize_mate(score: Score, ply: usize) -> Score {
    if score > MATE_BAND {
        score + ply as Score
    } else if score < -MATE_BAND {
        score - ply as Score
    } else {
        score
    }
}

pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    mask: usize, // size - 1 (for fast modulo)
}

impl TranspositionTable {
    /// Create new TT with given size in megabytes
    pub fn new(mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = (mb * 1024 * 1024) / entry_size;
        // Round down to power of 2
        let size = num_entries.next_power_of_two() / 2;
        let size = size.max(1024); // Minimum 1024 entries

        Self {
            entries: vec![TTEntry::default(); size],
            mask: size - 1,
        }
    }

    /// Probe TT for given hash
    pub fn probe(&self, hash: u64, _ply: usize) -> Option<&TTEntry> {
        let idx = hash as usize & self.mask;
        let entry = &self.entries[idx];

        if entry.key == hash {
            Some(entry)
        } else {
            None
        }
    }

    /// Retrieve score from TT entry, adjusting mate scores for current ply
    pub fn retrieve_score(entry: &TTEntry, ply: usize, alpha: Score, beta: Score) -> Option<Score> {
        let score = denormalize_mate(entry.score, ply);

        match entry.flag {
            TTFlag::Exact => Some(score),
            TTFlag::LowerBound => {
                if score >= beta { Some(score) } else { None }
            }
            TTFlag::UpperBound => {
                if score <= alpha { Some(score) } else { None }
            }
        }
    }

    /// Store position in TT
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        score: Score,
        flag: TTFlag,
        best_move: Option<ChessMove>,
        ply: usize,
    ) {
        let idx = hash as usize & self.mask;
        let entry = &self.entries[idx];

        // Depth-preferred replacement: write if the slot is empty, the
        // fingerprint already matches, or the new entry searched at least as
        // deep. Otherwise leave it untouched -- the TT stays authoritative
        // across iterations and across games, not just within one search.
        let should_replace = entry.key == 0 || entry.key == hash || depth >= entry.depth;

        if !should_replace {
            return;
        }

        self.entries[idx] = TTEntry {
            key: hash,
            depth,
            score: normalize_mate(score, ply),
            flag,
            best_move,
        };
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TTEntry::default();
        }
    }
}


// TT is hashmap indexed by `zobrist_hash % table_size`. Each entry stores position's hash (for
// collision detection), search depth, score, bound type (exact/lower/upper) and best move found.
// Table uses depth-preferred replacement -> a store only overwrites an occupied, non-matching
// slot when it searched at least as deep; it stays authoritative across iterations and games.

// Mate score adjustment: Mate scores are stored relative to the root (ie. mate in 5 from root) but
// need to be adjusted to the current ply when probed (ie. mate in 3 from this node). This is done
// by adding/subtracting ply difference
