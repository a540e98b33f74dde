//! Thin adapter over the chess-rules collaborator.
//!
//! Board state, legal-move generation, FEN parsing and move notation are
//! explicitly out of scope for this crate (§1); they live in `shakmaty`.
//! Nothing in this module implements chess rules; it only re-exports the
//! types PIS needs and provides the couple of conversions (FEN parsing,
//! long-algebraic rendering) that the rest of the crate calls repeatedly.

use shakmaty::fen::Fen;
use shakmaty::uci::Uci;
pub use shakmaty::{CastlingMode, Chess, Color, Move, Position, Role, Square};

#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("illegal move")]
    IllegalMove,
}

/// Parses a FEN string into a legal starting `Chess` position.
pub fn parse_fen(fen: &str) -> Result<Chess, ChessError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| ChessError::InvalidFen(format!("{e}")))
}

/// Legal moves for a position, in whatever order the collaborator yields.
pub fn legal_moves(pos: &Chess) -> Vec<Move> {
    pos.legal_moves().into_iter().collect()
}

/// Plays `mv` from `pos`, returning the successor position.
pub fn play(pos: &Chess, mv: &Move) -> Result<Chess, ChessError> {
    pos.clone().play(mv).map_err(|_| ChessError::IllegalMove)
}

/// Renders a move in long algebraic (UCI-style) notation, e.g. `"e2e4"`.
pub fn to_long_algebraic(mv: &Move) -> String {
    Uci::from_standard(mv).to_string()
}

/// Renders `pos` as a FEN string, for log events that carry `position_fen`.
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), shakmaty::EnPassantMode::Legal).to_string()
}

const CENTRAL_SQUARES: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// True when `mv` is a capture, including en passant.
pub fn is_capture(mv: &Move) -> bool {
    mv.capture().is_some() || mv.is_en_passant()
}

/// True when `mv`'s destination is one of the four central squares.
pub fn is_central_destination(mv: &Move) -> bool {
    CENTRAL_SQUARES.contains(&mv.to())
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn parses_standard_start_position() {
        let pos = parse_fen(START_FEN).unwrap();
        assert_eq!(legal_moves(&pos).len(), 20);
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(parse_fen("not a fen").is_err());
    }

    #[test]
    fn pawn_double_push_to_e4_is_central_and_not_a_capture() {
        let pos = parse_fen(START_FEN).unwrap();
        let e4 = legal_moves(&pos)
            .into_iter()
            .find(|m| to_long_algebraic(m) == "e2e4")
            .expect("e2e4 is legal from the start position");
        assert!(is_central_destination(&e4));
        assert!(!is_capture(&e4));
    }

    #[test]
    fn fen_round_trips_the_starting_position() {
        let pos = parse_fen(START_FEN).unwrap();
        assert_eq!(to_fen(&pos), START_FEN);
    }

    #[test]
    fn playing_a_move_advances_the_position() {
        let pos = parse_fen(START_FEN).unwrap();
        let mv = legal_moves(&pos).into_iter().next().unwrap();
        let next = play(&pos, &mv).unwrap();
        assert_eq!(next.turn(), Color::Black);
    }
}
