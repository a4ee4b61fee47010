use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::board::{Board, BoardStatus, ChessMove, Color, Piece};

use crate::evaluation::{capture_value, evaluate, game_phase};
use crate::movegen::{order_captures, order_moves};
use crate::tt::{self, TTFlag, TranspositionTable};
use crate::types::{
    Score, SearchResult, ASPIRATION_WINDOW, DEFAULT_HASH_MB, FULL_WIDTH, HISTORY_MAX, MATE,
    MATE_BAND, MAX_PLY,
};

/// Centipawn margin used by quiescence delta pruning.
const DELTA_MARGIN: Score = 100;
/// Delta pruning and en-passant captures are scored as a pawn for the victim.
const PAWN_VALUE: Score = 100;
/// Game phase at or below which delta pruning is disabled (late endgame).
const LATE_ENDGAME_PHASE: i32 = 4;
/// Null-move reduction.
const NULL_MOVE_REDUCTION: u8 = 2;

/// Mutable search state shared across recursion.
pub struct SearchState {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,
    pub ab_cutoffs: u64,
    pub start_time: Instant,
    pub stop: Arc<AtomicBool>,
    pub time_limit_ms: u64,
    pub killers: [[Option<ChessMove>; 2]; MAX_PLY],
    pub history: [[Score; 64]; 6],
    pub tt: TranspositionTable,
    pub root_best_move: Option<ChessMove>,
    pub position_history: Vec<u64>,
    /// Suppresses per-iteration `info` output (benchmarks don't want stdout noise).
    pub silent: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            nodes: 0,
            qnodes: 0,
            tt_probes: 0,
            tt_hits: 0,
            tt_cutoffs: 0,
            ab_cutoffs: 0,
            start_time: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            time_limit_ms: 0,
            killers: [[None; 2]; MAX_PLY],
            history: [[0; 64]; 6],
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            root_best_move: None,
            position_history: Vec::new(),
            silent: false,
        }
    }

    pub fn reset(&mut self) {
        self.nodes = 0;
        self.qnodes = 0;
        self.tt_probes = 0;
        self.tt_hits = 0;
        self.tt_cutoffs = 0;
        self.ab_cutoffs = 0;
        self.stop.store(false, Ordering::SeqCst);
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[0; 64]; 6];
        self.start_time = Instant::now();
        self.root_best_move = None;
    }

    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    fn check_time(&self) {
        if self.time_limit_ms > 0 {
            let elapsed = self.start_time.elapsed().as_millis() as u64;
            if elapsed >= self.time_limit_ms {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Threefold repetition: the current hash has already occurred at least
    /// twice earlier in the game/search line.
    fn is_threefold_repetition(&self, hash: u64) -> bool {
        self.position_history.iter().filter(|&&h| h == hash).count() >= 2
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract principal variation by following the TT hash move chain.
fn extract_pv(board: &Board, tt: &TranspositionTable, max_moves: usize) -> Vec<ChessMove> {
    let mut pv = Vec::new();
    let mut current_board = *board;
    let mut seen: Vec<u64> = Vec::new();

    for _ in 0..max_moves {
        let hash = current_board.get_hash();
        if seen.contains(&hash) {
            break;
        }
        seen.push(hash);

        let Some(entry) = tt.probe(hash, 0) else { break };
        let Some(mv) = entry.best_move else { break };
        if !current_board.legal(mv) {
            break;
        }
        pv.push(mv);
        current_board = current_board.make_move_new(mv);
    }

    pv
}

/// Format a score for UCI output (centipawns or mate-in-N).
pub fn format_score(score: Score) -> String {
    if score.abs() > MATE_BAND {
        let mate_ply = MATE - score.abs();
        let mate_moves = (mate_ply + 1) / 2;
        if score > 0 {
            format!("score mate {}", mate_moves)
        } else {
            format!("score mate -{}", mate_moves)
        }
    } else {
        format!("score cp {}", score)
    }
}

/// Iterative deepening search with aspiration windows. Returns the best move found.
pub fn search(board: &Board, state: &mut SearchState, max_depth: u8) -> SearchResult {
    let mut best_move: Option<ChessMove> = None;
    let mut best_score: Score = 0;

    for depth in 1..=max_depth {
        state.nodes = 0;
        state.qnodes = 0;
        state.root_best_move = None;

        let (alpha0, beta0) = if depth >= 2 && best_score != 0 {
            (best_score - ASPIRATION_WINDOW, best_score + ASPIRATION_WINDOW)
        } else {
            (-FULL_WIDTH, FULL_WIDTH)
        };

        let mut score = minimax(board, state, depth, 0, alpha0, beta0);

        if !state.is_stopped() && (score <= alpha0 || score >= beta0) && (alpha0, beta0) != (-FULL_WIDTH, FULL_WIDTH) {
            // Aspiration window missed: re-search once at full width.
            score = minimax(board, state, depth, 0, -FULL_WIDTH, FULL_WIDTH);
        }

        if state.is_stopped() {
            // Interrupted: only adopt a partial result if we have nothing yet.
            if best_move.is_none() {
                best_move = state.root_best_move;
            }
            break;
        }

        best_score = score;
        if let Some(mv) = state.root_best_move {
            best_move = Some(mv);
        }

        let elapsed_ms = state.start_time.elapsed().as_millis().max(1) as u64;
        let nps = state.nodes * 1000 / elapsed_ms;

        let pv = extract_pv(board, &state.tt, depth as usize);
        let pv_str: String = pv.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ");

        if !state.silent {
            let hit_rate = if state.tt_probes > 0 { state.tt_hits * 100 / state.tt_probes } else { 0 };
            let q_pct = if state.nodes > 0 { state.qnodes * 100 / state.nodes } else { 0 };

            println!(
                "info depth {} {} nodes {} time {} nps {} pv {} tthits {} hitrate {}% ttcutoffs {} abcutoffs {} qnodes {} qnodepct {}%",
                depth,
                format_score(best_score),
                state.nodes,
                elapsed_ms,
                nps,
                pv_str,
                state.tt_hits,
                hit_rate,
                state.tt_cutoffs,
                state.ab_cutoffs,
                state.qnodes,
                q_pct,
            );
        }

        // Soft time limit: don't start the next iteration past half the budget.
        if state.time_limit_ms > 0 {
            let elapsed = state.start_time.elapsed().as_millis() as u64;
            if elapsed > state.time_limit_ms / 2 {
                break;
            }
        }

        if best_score.abs() > MATE_BAND {
            break;
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        depth: max_depth,
        nodes: state.nodes,
    }
}

fn is_capture(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_dest()).is_some() || board.en_passant() == Some(mv.get_dest())
}

/// Classical fail-hard alpha-beta, side-to-move-aware (White maximizes,
/// Black minimizes). Not negamax: child scores are used as-is, always in
/// White-positive absolute terms, and every cutoff returns the correct edge
/// for whichever side is on move at this node.
fn minimax(
    board: &Board,
    state: &mut SearchState,
    depth: u8,
    ply: usize,
    mut alpha: Score,
    mut beta: Score,
) -> Score {
    state.nodes += 1;
    if state.nodes & 2047 == 0 {
        state.check_time();
    }
    if state.is_stopped() {
        return 0;
    }

    let hash = board.get_hash();
    let white = board.side_to_move() == Color::White;

    // Entry guard 1: draw by repetition or the 50-move rule. Unconditional on
    // ply, same as the 50-move check: a position already a 3-fold repeat at
    // the search root must be caught too, not just repeats found mid-tree.
    if state.is_threefold_repetition(hash) || board.halfmove_clock() >= 100 {
        if ply == 0 {
            // Root is itself a draw: still surface a legal move so `search()`
            // has something to report instead of an empty best_move.
            use crate::board::MoveGen;
            state.root_best_move = MoveGen::new_legal(board).next();
        }
        return 0;
    }

    // Entry guard 2: terminal position.
    if board.status() != BoardStatus::Ongoing {
        return evaluate(board, ply);
    }

    // Entry guard 3: leaf node, hand off to quiescence.
    if depth == 0 {
        return quiescence(board, state, ply, alpha, beta);
    }

    let original_alpha = alpha;
    let original_beta = beta;

    // TT probe.
    let mut hash_move: Option<ChessMove> = None;
    state.tt_probes += 1;
    if let Some(entry) = state.tt.probe(hash, ply) {
        state.tt_hits += 1;
        hash_move = entry.best_move;
        if entry.depth >= depth {
            let adjusted = tt::denormalize_mate(entry.score, ply);
            match entry.flag {
                TTFlag::Exact => {
                    state.tt_cutoffs += 1;
                    return adjusted;
                }
                TTFlag::LowerBound => {
                    if adjusted > alpha {
                        alpha = adjusted;
                    }
                }
                TTFlag::UpperBound => {
                    if adjusted < beta {
                        beta = adjusted;
                    }
                }
            }
            if alpha >= beta {
                state.tt_cutoffs += 1;
                return if white { alpha } else { beta };
            }
        }
    }

    let in_check = !board.checkers().is_empty();

    // Null-move pruning: "if I skip my turn and still beat beta/alpha, my
    // real position must be even better." Disabled at the root and in
    // zugzwang-prone positions (side to move has only pawns and a king).
    if !in_check && depth >= 3 && ply > 0 {
        let our_pieces = board.color_combined(board.side_to_move());
        let pawns_and_king = board.pieces(Piece::Pawn) | board.pieces(Piece::King);
        let has_non_pawn_material = !(our_pieces & !pawns_and_king).is_empty();

        if has_non_pawn_material {
            if let Some(null_board) = board.null_move() {
                let reduced_depth = depth.saturating_sub(1 + NULL_MOVE_REDUCTION);
                let null_score = minimax(&null_board, state, reduced_depth, ply + 1, alpha, beta);

                if state.is_stopped() {
                    return 0;
                }
                if white && null_score >= beta {
                    return beta;
                }
                if !white && null_score <= alpha {
                    return alpha;
                }
            }
        }
    }

    let moves = order_moves(board, hash_move, &state.killers[ply], &state.history, ply);
    if moves.is_empty() {
        return evaluate(board, ply);
    }

    state.position_history.push(hash);

    let mut best_score: Score = if white { -FULL_WIDTH } else { FULL_WIDTH };
    let mut best_move: Option<ChessMove> = Some(moves[0].mv);
    if ply == 0 {
        // Emergency fallback: guarantee a move even if the very first
        // recursive call aborts on a tight time budget.
        state.root_best_move = Some(moves[0].mv);
    }

    for scored_move in &moves {
        if state.is_stopped() {
            break;
        }

        let mv = scored_move.mv;
        let captured = is_capture(board, mv);
        let new_board = board.make_move_new(mv);

        let score = minimax(&new_board, state, depth - 1, ply + 1, alpha, beta);

        if state.is_stopped() {
            break;
        }

        if white {
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                if ply == 0 {
                    state.root_best_move = Some(mv);
                }
            }
            if score > alpha {
                alpha = score;
            }
        } else {
            if score < best_score {
                best_score = score;
                best_move = Some(mv);
                if ply == 0 {
                    state.root_best_move = Some(mv);
                }
            }
            if score < beta {
                beta = score;
            }
        }

        if alpha >= beta {
            state.ab_cutoffs += 1;
            if !captured && ply < MAX_PLY {
                if state.killers[ply][0] != Some(mv) {
                    state.killers[ply][1] = state.killers[ply][0];
                    state.killers[ply][0] = Some(mv);
                }
                if let Some(piece) = board.piece_on(mv.get_source()) {
                    let pi = piece_to_index(piece);
                    let to = mv.get_dest().to_index();
                    state.history[pi][to] += (depth as Score) * (depth as Score);
                    if state.history[pi][to] > HISTORY_MAX {
                        state.history[pi][to] = HISTORY_MAX;
                    }
                }
            }
            break;
        }
    }

    state.position_history.pop();

    if state.is_stopped() {
        return best_score;
    }

    let flag = if best_score <= original_alpha {
        TTFlag::UpperBound
    } else if best_score >= original_beta {
        TTFlag::LowerBound
    } else {
        TTFlag::Exact
    };

    state.tt.store(hash, depth, best_score, flag, best_move, ply);

    best_score
}

/// Quiescence search: extends beyond the nominal depth horizon over captures
/// (and all legal evasions while in check) until the position is quiet.
fn quiescence(board: &Board, state: &mut SearchState, ply: usize, mut alpha: Score, mut beta: Score) -> Score {
    state.nodes += 1;
    state.qnodes += 1;

    if ply >= MAX_PLY || board.status() != BoardStatus::Ongoing {
        return evaluate(board, ply);
    }

    let white = board.side_to_move() == Color::White;
    let in_check = !board.checkers().is_empty();

    if in_check {
        // Standing pat is illegal while in check: search every legal evasion.
        let moves = order_moves(board, None, &state.killers[ply], &state.history, ply);
        for scored_move in &moves {
            let new_board = board.make_move_new(scored_move.mv);
            let score = quiescence(&new_board, state, ply + 1, alpha, beta);

            if state.is_stopped() {
                return if white { alpha } else { beta };
            }

            if white {
                if score >= beta {
                    return beta;
                }
                if score > alpha {
                    alpha = score;
                }
            } else {
                if score <= alpha {
                    return alpha;
                }
                if score < beta {
                    beta = score;
                }
            }
        }
        return if white { alpha } else { beta };
    }

    let stand_pat = evaluate(board, ply);
    if white {
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
    } else {
        if stand_pat <= alpha {
            return alpha;
        }
        if stand_pat < beta {
            beta = stand_pat;
        }
    }

    let phase = game_phase(board);
    let delta_pruning_active = phase > LATE_ENDGAME_PHASE;
    let captures = order_captures(board);

    for scored_move in &captures {
        let mv = scored_move.mv;
        let is_ep = board.en_passant() == Some(mv.get_dest());
        let is_promo = mv.get_promotion().is_some();

        if delta_pruning_active && !is_promo {
            let victim_value = if is_ep {
                PAWN_VALUE
            } else {
                capture_value(board.piece_on(mv.get_dest()).expect("capture has a victim"))
            };
            if white && stand_pat + victim_value + DELTA_MARGIN < alpha {
                continue;
            }
            if !white && stand_pat - victim_value - DELTA_MARGIN > beta {
                continue;
            }
        }

        let new_board = board.make_move_new(mv);
        let score = quiescence(&new_board, state, ply + 1, alpha, beta);

        if state.is_stopped() {
            return if white { alpha } else { beta };
        }

        if white {
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        } else {
            if score <= alpha {
                return alpha;
            }
            if score < beta {
                beta = score;
            }
        }
    }

    if white { alpha } else { beta }
}

fn piece_to_index(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => 0,
        Piece::Knight => 1,
        Piece::Bishop => 2,
        Piece::Rook => 3,
        Piece::Queen => 4,
        Piece::King => 5,
    }
}


// Iterative deepening: search depth 1 -> 2 -> 3 ..., each iteration reusing
// TT entries from the previous one. Classical side-to-move-aware alpha-beta
// (not negamax) so every fail-hard cutoff returns the maximizer's alpha or
// the minimizer's beta exactly as prescribed, never an unconditional edge.
