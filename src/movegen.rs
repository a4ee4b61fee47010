use arrayvec::ArrayVec;
use crate::board::{BitBoard, Board, ChessMove, MoveGen, Piece, EMPTY};

use crate::pst::MVV_VALUE;
use crate::types::Score;

/// Scored above every ordinary move; the TT move is conceptually "prepended"
/// ahead of the sorted remainder rather than competing on score.
const HASH_MOVE_SCORE: Score = 3_000_000;
const PROMOTION_SCORE: Score = 2_000_000;
const CAPTURE_BASE_SCORE: Score = 1_000_000;
const KILLER_1_SCORE: Score = 900_000;
const KILLER_2_SCORE: Score = 800_000;

pub struct ScoredMove {
    pub mv: ChessMove,
    pub score: Score,
}

/// MVV-LVA score for a capture: `1_000_000 + 10*victim - attacker`.
fn capture_score(victim_idx: usize, attacker_idx: usize) -> Score {
    CAPTURE_BASE_SCORE + 10 * MVV_VALUE[victim_idx] - MVV_VALUE[attacker_idx]
}

/// Generates and orders moves for a position.
/// Priority: (1) Hash move, (2) Promotions, (3) Captures by MVV-LVA,
/// (4) Killer moves, (5) History heuristic, (6) Remaining quiet moves.
pub fn order_moves(
    board: &Board,
    hash_move: Option<ChessMove>,
    killers: &[Option<ChessMove>; 2],
    history: &[[Score; 64]; 6],
    _ply: usize,
) -> ArrayVec<ScoredMove, 256> {
    let mut scored: ArrayVec<ScoredMove, 256> = ArrayVec::new();

    let mut movegen = MoveGen::new_legal(board);

    // First pass: captures (pieces on enemy squares), including capturing promotions.
    let targets = board.color_combined(!board.side_to_move());
    movegen.set_iterator_mask(targets);

    for mv in &mut movegen {
        let score = if Some(mv) == hash_move {
            HASH_MOVE_SCORE
        } else {
            let victim = board.piece_on(mv.get_dest()).unwrap();
            let attacker = board.piece_on(mv.get_source()).unwrap();
            let s = capture_score(piece_to_index(victim), piece_to_index(attacker));
            if mv.get_promotion().is_some() { s + PROMOTION_SCORE } else { s }
        };
        scored.push(ScoredMove { mv, score });
    }

    // Second pass: en passant captures (destination square is empty, so missed above).
    if let Some(ep_sq) = board.en_passant() {
        movegen.set_iterator_mask(BitBoard::from_square(ep_sq));
        for mv in &mut movegen {
            let score = if Some(mv) == hash_move {
                HASH_MOVE_SCORE
            } else {
                capture_score(0, 0) // pawn captures pawn
            };
            scored.push(ScoredMove { mv, score });
        }
    }

    // Third pass: quiet moves (includes non-capturing promotions).
    movegen.set_iterator_mask(!EMPTY);
    for mv in &mut movegen {
        let score = if Some(mv) == hash_move {
            HASH_MOVE_SCORE
        } else if mv.get_promotion().is_some() {
            PROMOTION_SCORE
        } else if Some(mv) == killers[0] {
            KILLER_1_SCORE
        } else if Some(mv) == killers[1] {
            KILLER_2_SCORE
        } else if let Some(piece) = board.piece_on(mv.get_source()) {
            let pi = piece_to_index(piece);
            let to = mv.get_dest().to_index();
            history[pi][to]
        } else {
            0
        };
        scored.push(ScoredMove { mv, score });
    }

    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Generates only capture moves for quiescence search, ordered by MVV-LVA
/// (promotions, including capturing ones, sort above plain captures).
pub fn order_captures(board: &Board) -> ArrayVec<ScoredMove, 256> {
    let mut scored: ArrayVec<ScoredMove, 256> = ArrayVec::new();

    let mut movegen = MoveGen::new_legal(board);
    let targets = board.color_combined(!board.side_to_move());
    movegen.set_iterator_mask(targets);

    for mv in &mut movegen {
        let victim = board.piece_on(mv.get_dest()).unwrap();
        let attacker = board.piece_on(mv.get_source()).unwrap();
        let mut score = capture_score(piece_to_index(victim), piece_to_index(attacker));
        if mv.get_promotion().is_some() {
            score += PROMOTION_SCORE;
        }
        scored.push(ScoredMove { mv, score });
    }

    // En passant captures (destination square is empty, so missed above).
    if let Some(ep_sq) = board.en_passant() {
        movegen.set_iterator_mask(BitBoard::from_square(ep_sq));
        for mv in &mut movegen {
            scored.push(ScoredMove { mv, score: capture_score(0, 0) });
        }
    }

    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn hash_move_sorts_first() {
        let board = Board::default();
        let mut movegen = MoveGen::new_legal(&board);
        let any_move = movegen.next().unwrap();
        let history = [[0; 64]; 6];
        let ordered = order_moves(&board, Some(any_move), &[None, None], &history, 0);
        assert_eq!(ordered[0].mv, any_move);
    }

    #[test]
    fn capturing_promotion_outranks_plain_capture() {
        // White pawn on b7 can capture-promote on a8 or c8; a rook sits on a1 for a plain capture.
        let board = Board::from_str("n1n1k3/1P6/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let history = [[0; 64]; 6];
        let ordered = order_moves(&board, None, &[None, None], &history, 0);
        let top = &ordered[0];
        assert!(top.mv.get_promotion().is_some(), "highest scored move should be a promotion");
    }

    #[test]
    fn killers_outrank_history_but_not_captures() {
        let board = Board::default();
        let mut movegen = MoveGen::new_legal(&board);
        let quiet_moves: Vec<_> = (&mut movegen).collect();
        let killer = quiet_moves[0];
        let mut history = [[0; 64]; 6];
        history[0][0] = 50_000; // still far below killer score
        let ordered = order_moves(&board, None, &[Some(killer), None], &history, 0);
        let killer_pos = ordered.iter().position(|s| s.mv == killer).unwrap();
        assert!(ordered[killer_pos].score >= KILLER_1_SCORE);
    }
}
