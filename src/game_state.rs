//! Classification of a position: check, checkmate, stalemate and draws.

use std::fmt;

use crate::attacks::is_king_in_check;
use crate::board::{Board, Color, PieceKind};
use crate::error::Result;
use crate::movegen::MoveGenerator;

/// Plies without a pawn move or capture after which the game is drawn.
pub const FIFTY_MOVE_PLIES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            DrawReason::Stalemate => "stalemate",
            DrawReason::InsufficientMaterial => "insufficient material",
            DrawReason::FiftyMoveRule => "fifty-move rule",
            DrawReason::ThreefoldRepetition => "threefold repetition",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate { winner: Color },
    Draw(DrawReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Ongoing => f.write_str("game in progress"),
            Outcome::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            Outcome::Draw(reason) => write!(f, "draw by {reason}"),
        }
    }
}

/// Derived status of a board for one side. Never stored on its own; it is
/// recomputed from the board after every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub side_to_move: Color,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    /// Draws other than stalemate.
    pub draw: Option<DrawReason>,
}

impl GameState {
    /// Classifies `board` for `side`. Checkmate and stalemate only apply to
    /// the side on move; for the other side only the check flag is reported.
    pub fn evaluate(board: &Board, side: Color) -> Result<GameState> {
        let check = is_king_in_check(board, side)?;

        let (checkmate, stalemate) = if side == board.side_to_move {
            let no_moves = MoveGenerator::new().all_legal_moves(board, side)?.is_empty();
            (no_moves && check, no_moves && !check)
        } else {
            (false, false)
        };

        let draw = if is_insufficient_material(board) {
            Some(DrawReason::InsufficientMaterial)
        } else if board.halfmove_clock >= FIFTY_MOVE_PLIES {
            Some(DrawReason::FiftyMoveRule)
        } else {
            None
        };

        Ok(GameState {
            side_to_move: side,
            check,
            checkmate,
            stalemate,
            draw,
        })
    }

    pub fn outcome(&self) -> Outcome {
        if self.checkmate {
            Outcome::Checkmate {
                winner: self.side_to_move.opposite(),
            }
        } else if self.stalemate {
            Outcome::Draw(DrawReason::Stalemate)
        } else if let Some(reason) = self.draw {
            Outcome::Draw(reason)
        } else {
            Outcome::Ongoing
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome() != Outcome::Ongoing
    }
}

/// K v K, K+minor v K, and K+B v K+B with bishops on the same color.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut minors = Vec::new();
    for (square, piece) in board.pieces() {
        match piece.kind {
            PieceKind::King => {}
            PieceKind::Knight | PieceKind::Bishop => minors.push((square, piece)),
            _ => return false,
        }
    }

    match minors.as_slice() {
        [] | [_] => true,
        [(sq_a, a), (sq_b, b)] => {
            a.kind == PieceKind::Bishop
                && b.kind == PieceKind::Bishop
                && a.color != b.color
                && sq_a.is_light() == sq_b.is_light()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn test_initial_position_is_ongoing() {
        let state = GameState::evaluate(&Board::new(), Color::White).unwrap();
        assert!(!state.check && !state.checkmate && !state.stalemate);
        assert_eq!(state.draw, None);
        assert_eq!(state.outcome(), Outcome::Ongoing);
    }

    #[test]
    fn test_checkmate() {
        let b = board("6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1");
        assert_eq!(GameState::evaluate(&b, Color::Black).unwrap().outcome(), Outcome::Ongoing);

        let b = board("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        let state = GameState::evaluate(&b, Color::Black).unwrap();
        // back-rank mate
        assert!(state.check);
        assert!(state.checkmate);
        assert!(!state.stalemate);
        assert_eq!(state.outcome(), Outcome::Checkmate { winner: Color::White });
    }

    #[test]
    fn test_stalemate() {
        let b = board("8/8/8/8/8/1q6/2k5/K7 w - - 0 1");
        let state = GameState::evaluate(&b, Color::White).unwrap();
        assert!(state.stalemate);
        assert!(!state.check);
        assert!(!state.checkmate);
        assert_eq!(state.outcome(), Outcome::Draw(DrawReason::Stalemate));
    }

    #[test]
    fn test_side_not_on_move_is_never_mated() {
        let b = board("8/8/8/8/8/1q6/2k5/K7 w - - 0 1");
        let state = GameState::evaluate(&b, Color::Black).unwrap();
        assert!(!state.stalemate && !state.checkmate && !state.check);
    }

    #[test]
    fn test_insufficient_material() {
        assert!(is_insufficient_material(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(is_insufficient_material(&board("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(is_insufficient_material(&board("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1")));
        // c1 and f8 are both dark squares
        assert!(is_insufficient_material(&board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!is_insufficient_material(&board("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!is_insufficient_material(&board("4k3/8/8/8/8/8/8/1NN1K3 w - - 0 1")));
        assert!(!is_insufficient_material(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));

        let state = GameState::evaluate(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1"), Color::White).unwrap();
        assert_eq!(state.outcome(), Outcome::Draw(DrawReason::InsufficientMaterial));
    }

    #[test]
    fn test_fifty_move_rule() {
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 99 80");
        assert_eq!(GameState::evaluate(&b, Color::White).unwrap().draw, None);
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 100 80");
        assert_eq!(
            GameState::evaluate(&b, Color::White).unwrap().draw,
            Some(DrawReason::FiftyMoveRule)
        );
    }
}
