//! Error types for the engine core.

use thiserror::Error;

use crate::board::Color;
use crate::game_state::Outcome;
use crate::movegen::Move;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// The requested move is not in the legal set for its source square.
    #[error("illegal move: {mv}")]
    IllegalMove { mv: Move },

    /// A promotion was requested on a move that cannot promote, or to a piece
    /// a pawn cannot become.
    #[error("invalid promotion on move {mv}")]
    InvalidPromotion { mv: Move },

    /// A board invariant is broken. The game cannot continue on this board.
    #[error("corrupt board state: {0}")]
    CorruptState(String),

    #[error("{side} has no legal move")]
    NoLegalMove { side: Color },

    #[error("game is over: {0}")]
    GameOver(Outcome),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    #[error("invalid move text: {0:?}")]
    InvalidMove(String),
}

pub type Result<T> = std::result::Result<T, ChessError>;
