//! Chess engine core: board values, legal move generation, check and game
//! state detection, and minimax search for an automated opponent.
//!
//! Boards are values. Applying a move returns a new board and never touches
//! the input, so any number of callers or search threads can share one.

pub mod attacks;
pub mod board;
pub mod error;
pub mod evaluation;
pub mod game_state;
pub mod movegen;
pub mod search;
pub mod session;

pub use attacks::{find_king, is_king_in_check, is_square_attacked};
pub use board::{Board, CastleSide, CastlingRights, Color, Piece, PieceKind, Square};
pub use error::{ChessError, Result};
pub use evaluation::Evaluator;
pub use game_state::{DrawReason, GameState, Outcome};
pub use movegen::{Move, MoveGenerator, SpecialMove};
pub use search::{Search, SearchConfig, SearchResult, MATE_SCORE};
pub use session::{GameSession, MoveRecord};

/// The standard starting position.
pub fn initial_board() -> Board {
    Board::new()
}

/// Legal moves of the piece on `square`; empty for an empty square or a
/// piece whose side is not on move.
pub fn legal_moves(board: &Board, square: Square) -> Result<Vec<Move>> {
    MoveGenerator::new().legal_moves(board, square)
}

/// Every legal move of `color`, in generator order.
pub fn all_legal_moves(board: &Board, color: Color) -> Result<Vec<Move>> {
    MoveGenerator::new().all_legal_moves(board, color)
}

/// Returns the board after `mv`. Fails with [`ChessError::IllegalMove`] if
/// the move is not legal from `mv.from`.
pub fn apply_move(board: &Board, mv: &Move) -> Result<Board> {
    let resolved = MoveGenerator::new().resolve(board, mv)?;
    board.after_move(&resolved)
}

pub fn evaluate_game_state(board: &Board, side: Color) -> Result<GameState> {
    GameState::evaluate(board, side)
}

/// Searches `depth` plies for `side`. Fails with [`ChessError::NoLegalMove`]
/// when `side` has nothing to play, including when it is not on move.
pub fn best_move(board: &Board, side: Color, depth: u32) -> Result<Move> {
    if side != board.side_to_move {
        return Err(ChessError::NoLegalMove { side });
    }
    let mut search = Search::with_config(SearchConfig::default().with_depth(depth));
    Ok(search.find_best_move(board)?.best_move)
}
