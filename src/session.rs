//! A game in progress, owned by the caller.
//!
//! The session holds the current board, the boards that preceded it, the
//! move log and the derived game state. Every accepted move replaces the
//! board with a new value; nothing is shared between sessions.

use std::fmt;

use tracing::{error, info};

use crate::board::{Board, Piece, Square};
use crate::error::{ChessError, Result};
use crate::game_state::{DrawReason, GameState, Outcome};
use crate::movegen::{Move, MoveGenerator, SpecialMove};
use crate::search::{Search, SearchConfig};

/// Number of occurrences of a position that draws the game.
const REPETITION_LIMIT: usize = 3;

/// One entry of the move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    /// Full-move number the move was played in.
    pub number: u32,
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}-{}", self.piece.kind.name(), self.mv.from, self.mv.to)?;
        if let Some(kind) = self.mv.promotion {
            write!(f, "={}", kind.name())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    history: Vec<Board>,
    positions: Vec<Board>,
    log: Vec<MoveRecord>,
    state: GameState,
    move_generator: MoveGenerator,
    search: Search,
}

impl GameSession {
    /// A new game from the standard starting position.
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::from_board(Board::new(), config)
    }

    pub fn from_board(board: Board, config: SearchConfig) -> Result<Self> {
        board.validate()?;
        let state = GameState::evaluate(&board, board.side_to_move)?;
        let move_generator = MoveGenerator::new();
        let position = repetition_key(&move_generator, &board)?;
        Ok(Self {
            board,
            history: Vec::new(),
            positions: vec![position],
            log: Vec::new(),
            state,
            move_generator,
            search: Search::with_config(config),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn log(&self) -> &[MoveRecord] {
        &self.log
    }

    /// Boards before each move, oldest first.
    pub fn history(&self) -> &[Board] {
        &self.history
    }

    pub fn search_config(&self) -> SearchConfig {
        self.search.config()
    }

    pub fn set_depth(&mut self, depth: u32) {
        self.search.set_max_depth(depth);
    }

    pub fn legal_moves(&self, square: Square) -> Result<Vec<Move>> {
        if self.state.is_over() {
            return Ok(Vec::new());
        }
        self.move_generator.legal_moves(&self.board, square)
    }

    /// Validates and applies `mv` for the side to move, then reclassifies
    /// the position.
    pub fn play(&mut self, mv: Move) -> Result<GameState> {
        if self.state.is_over() {
            return Err(ChessError::GameOver(self.state.outcome()));
        }

        let resolved = self.move_generator.resolve(&self.board, &mv)?;
        let next = self.board.after_move(&resolved).map_err(|e| self.corrupt(e))?;
        let mut state = GameState::evaluate(&next, next.side_to_move).map_err(|e| self.corrupt(e))?;

        let position = repetition_key(&self.move_generator, &next).map_err(|e| self.corrupt(e))?;
        let occurrences = 1 + self
            .positions
            .iter()
            .filter(|b| b.same_position(&position))
            .count();
        if occurrences >= REPETITION_LIMIT && state.draw.is_none() {
            state.draw = Some(DrawReason::ThreefoldRepetition);
        }

        let piece = self.board.piece_at(resolved.from).ok_or_else(|| {
            self.corrupt(ChessError::CorruptState(format!(
                "resolved move {resolved} has no piece"
            )))
        })?;
        let captured = match resolved.special {
            SpecialMove::EnPassant => {
                self.board.piece_at(Square::new(resolved.from.row, resolved.to.col))
            }
            _ => self.board.piece_at(resolved.to),
        };
        let record = MoveRecord {
            number: self.board.fullmove_number,
            mv: resolved,
            piece,
            captured,
        };

        info!(side = %piece.color, mv = %record, "move played");
        self.history.push(self.board);
        self.positions.push(position);
        self.board = next;
        self.log.push(record);
        self.state = state;

        if state.is_over() {
            info!(outcome = %state.outcome(), "game over");
        }
        Ok(state)
    }

    /// Searches for the side to move and applies the chosen move as one
    /// transition.
    pub fn play_engine_move(&mut self) -> Result<Move> {
        if self.state.is_over() {
            return Err(ChessError::GameOver(self.state.outcome()));
        }
        let result = self.search.find_best_move(&self.board)?;
        self.play(result.best_move)?;
        Ok(result.best_move)
    }

    /// Back to the starting position, keeping the search settings.
    pub fn reset(&mut self) -> Result<()> {
        let config = self.search.config();
        *self = Self::new(config)?;
        Ok(())
    }

    fn corrupt(&self, err: ChessError) -> ChessError {
        if let ChessError::CorruptState(reason) = &err {
            error!(%reason, fen = %self.board.to_fen(), "session board is corrupt");
        }
        err
    }
}

/// `board` with its en-passant target dropped unless the capture is legal,
/// so a double push that allows no capture repeats the plain position.
fn repetition_key(move_generator: &MoveGenerator, board: &Board) -> Result<Board> {
    let mut key = *board;
    if board.en_passant.is_some() {
        let capturable = move_generator
            .generate_moves(board)?
            .iter()
            .any(|mv| mv.special == SpecialMove::EnPassant);
        if !capturable {
            key.en_passant = None;
        }
    }
    Ok(key)
}
