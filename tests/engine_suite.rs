use std::str::FromStr;
use std::time::Instant;

use mindforge::board::Board;
use mindforge::search::{search, SearchState};
use mindforge::types::{MATE, MATE_BAND};

#[test]
fn finds_back_rank_mate_in_one() {
    mindforge::board::init();
    let board = Board::from_str("7k/5ppp/8/8/8/8/5PPP/6RK w - - 0 1").unwrap();
    let mut state = SearchState::new();
    state.silent = true;
    let result = search(&board, &mut state, 3);
    assert!(result.score.abs() > MATE_BAND, "expected mate score, got {}", result.score);
}

#[test]
fn avoids_stalemating_a_lone_king() {
    mindforge::board::init();
    let board = Board::from_str("7k/8/6Q1/8/8/8/8/7K w - - 0 1").unwrap();
    let mut state = SearchState::new();
    state.silent = true;
    let result = search(&board, &mut state, 4);
    let mv = result.best_move.expect("a legal move must be found");
    let after = board.make_move_new(mv);
    use mindforge::board::BoardStatus;
    assert_ne!(after.status(), BoardStatus::Stalemate);
}

#[test]
fn claims_threefold_repetition_after_knight_shuffle() {
    mindforge::board::init();
    let mut board = Board::default();
    let mut state = SearchState::new();
    state.silent = true;
    state.position_history.push(board.get_hash());

    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
    for uci in shuffle {
        let mv = find_legal(&board, uci);
        board = board.make_move_new(mv);
        state.position_history.push(board.get_hash());
    }

    let result = search(&board, &mut state, 4);
    assert_eq!(result.score, 0, "repeated position should be scored as a draw, got {}", result.score);
}

#[test]
fn respects_a_short_movetime_budget() {
    mindforge::board::init();
    let board = Board::default();
    let mut state = SearchState::new();
    state.silent = true;
    state.time_limit_ms = 200;
    state.start_time = Instant::now();

    let start = Instant::now();
    let result = search(&board, &mut state, 64);
    let elapsed = start.elapsed();

    assert!(result.best_move.is_some());
    assert!(
        elapsed.as_millis() < 350,
        "search should respect its time budget, took {:?}",
        elapsed
    );
}

#[test]
fn prefers_the_faster_of_two_available_mates() {
    mindforge::board::init();
    // Black's king is boxed into the corner by White's own king (covering
    // g7/h7), so any rook move onto the back rank mates at once (Ra1-a8#).
    // A quiet rook move first (Ra1-b1) still forces mate, just one move
    // later, since Black's king has nowhere to go but shuffle between g8
    // and h8. Both lines are genuine forced mates; the engine must pick
    // the one-mover over the two-mover.
    let board = Board::from_str("7k/8/6K1/8/8/8/8/R7 w - - 0 1").unwrap();
    let mut state = SearchState::new();
    state.silent = true;
    let result = search(&board, &mut state, 4);

    let mv = result.best_move.expect("a legal move must be found");
    assert_eq!(mv.to_string(), "a1a8", "expected the immediate mate, got {}", mv);
    assert_eq!(result.score, MATE - 1, "expected a mate-in-one score, got {}", result.score);
}

#[test]
fn quiescence_resolves_full_capture_sequence_at_depth_one() {
    mindforge::board::init();
    // White is down a pawn. Capturing on d6 only looks like it equalizes
    // material if the search stops right after the capture -- Black's c7
    // pawn recaptures, leaving White down a pawn again. A depth-1 search
    // hands every leaf to quiescence, which must walk through that
    // recapture instead of stopping mid-exchange.
    let board = Board::from_str("4k3/2p5/3p4/4P3/8/8/8/4K3 w - - 0 1").unwrap();
    let mut state = SearchState::new();
    state.silent = true;
    let result = search(&board, &mut state, 1);
    assert!(
        result.score < -40,
        "quiescence should see through to the recapture, leaving Black up a pawn; got {}",
        result.score
    );
}

fn find_legal(board: &Board, uci: &str) -> mindforge::board::ChessMove {
    let mut movegen = mindforge::board::MoveGen::new_legal(board);
    (&mut movegen)
        .find(|m| m.to_string() == uci)
        .unwrap_or_else(|| panic!("no legal move {}", uci))
}
