use crate::board::ChessMove;

pub type Score = i32;

/// Forced-mate score. Checkmate in `k` plies scores `MATE - k` for the
/// winning side. The reserved "mate band" is anything with `|s| > MATE_BAND`.
pub const MATE: Score = 100_000;
pub const MATE_BAND: Score = 90_000;
pub const SCORE_INFINITY: Score = MATE + 1_000;
pub const MAX_PLY: usize = 128;
pub const DEFAULT_DEPTH: u8 = 5;
pub const DEFAULT_HASH_MB: usize = 64;
pub const HISTORY_MAX: Score = 16_384;

/// Aspiration window half-width in centipawns.
pub const ASPIRATION_WINDOW: Score = 50;
/// Full-width search bounds used outside (or on failure of) an aspiration window.
pub const FULL_WIDTH: Score = 100_000;

pub struct EngineConfig {
    pub hash_mb: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
        }
    }
}

pub struct SearchResult {
    pub best_move: Option<ChessMove>,
    pub score: Score,
    pub depth: u8,
    pub nodes: u64,
}

