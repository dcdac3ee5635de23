use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::attacks::{
    is_king_in_check, is_square_attacked, DIAGONALS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONALS,
};
use crate::board::{Board, CastleSide, Color, Piece, PieceKind, Square};
use crate::error::{ChessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialMove {
    None,
    Castle(CastleSide),
    EnPassant,
}

/// A transition from one square to another. Moves describe changes; they
/// never mutate a board themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub special: SpecialMove,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            special: SpecialMove::None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            promotion: Some(promotion),
            ..Self::new(from, to)
        }
    }

    pub fn castle(from: Square, to: Square, side: CastleSide) -> Self {
        Self {
            special: SpecialMove::Castle(side),
            ..Self::new(from, to)
        }
    }

    pub fn en_passant(from: Square, to: Square) -> Self {
        Self {
            special: SpecialMove::EnPassant,
            ..Self::new(from, to)
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Parses coordinate notation such as `e2e4` or `e7e8q`. The special-move tag
/// is left unset; the generator fills it in when the move is resolved.
impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
            return Err(ChessError::InvalidMove(s.to_string()));
        }
        let from: Square = s[0..2].parse()?;
        let to: Square = s[2..4].parse()?;
        match s[4..].chars().next() {
            None => Ok(Move::new(from, to)),
            Some(c) => match PieceKind::from_letter(c) {
                Some(kind) if kind.is_promotion_target() => Ok(Move::with_promotion(from, to, kind)),
                _ => Err(ChessError::InvalidMove(s.to_string())),
            },
        }
    }
}

/// Stateless move generator. Squares are visited row-major and each piece
/// emits moves in a fixed order, so the output is reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Moves for the piece on `square`, ignoring whether they leave its own
    /// king attacked.
    pub fn pseudo_legal_moves(&self, board: &Board, square: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        let Some(piece) = board.piece_at(square) else {
            return moves;
        };
        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(board, square, piece.color, &mut moves),
            PieceKind::Knight => self.step_moves(board, square, piece.color, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Bishop => self.slide_moves(board, square, piece.color, &DIAGONALS, &mut moves),
            PieceKind::Rook => self.slide_moves(board, square, piece.color, &ORTHOGONALS, &mut moves),
            PieceKind::Queen => {
                self.slide_moves(board, square, piece.color, &DIAGONALS, &mut moves);
                self.slide_moves(board, square, piece.color, &ORTHOGONALS, &mut moves);
            }
            PieceKind::King => {
                self.step_moves(board, square, piece.color, &KING_OFFSETS, &mut moves);
                self.castling_moves(board, square, piece.color, &mut moves);
            }
        }
        moves
    }

    fn pawn_moves(&self, board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
        let dir = color.forward();

        if let Some(one) = from.offset(dir, 0) {
            if board.piece_at(one).is_none() {
                self.push_pawn_move(from, one, color, moves);
                if from.row == color.pawn_row() {
                    if let Some(two) = from.offset(2 * dir, 0) {
                        if board.piece_at(two).is_none() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for dc in [-1, 1] {
            let Some(to) = from.offset(dir, dc) else {
                continue;
            };
            match board.piece_at(to) {
                Some(target) if target.color != color => self.push_pawn_move(from, to, color, moves),
                None if board.en_passant == Some(to) => {
                    let victim = Square::new(from.row, to.col);
                    if board.piece_at(victim) == Some(Piece::new(PieceKind::Pawn, color.opposite())) {
                        moves.push(Move::en_passant(from, to));
                    }
                }
                _ => {}
            }
        }
    }

    fn push_pawn_move(&self, from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
        if to.row == color.promotion_row() {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move::with_promotion(from, to, kind));
            }
        } else {
            moves.push(Move::new(from, to));
        }
    }

    fn step_moves(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(dr, dc) in offsets {
            if let Some(to) = from.offset(dr, dc) {
                if board.piece_at(to).map_or(true, |p| p.color != color) {
                    moves.push(Move::new(from, to));
                }
            }
        }
    }

    fn slide_moves(
        &self,
        board: &Board,
        from: Square,
        color: Color,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(dr, dc) in directions {
            let mut current = from.offset(dr, dc);
            while let Some(to) = current {
                match board.piece_at(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(p) => {
                        if p.color != color {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                current = to.offset(dr, dc);
            }
        }
    }

    fn castling_moves(&self, board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
        let row = color.back_row();
        if from != Square::new(row, 4) {
            return;
        }
        let enemy = color.opposite();
        if is_square_attacked(board, from, enemy) {
            return;
        }

        for side in [CastleSide::KingSide, CastleSide::QueenSide] {
            if !board.castling_rights.has(color, side) {
                continue;
            }
            let rook_from = Square::new(row, side.rook_from_col());
            if board.piece_at(rook_from) != Some(Piece::new(PieceKind::Rook, color)) {
                continue;
            }

            let (low, high) = match side {
                CastleSide::KingSide => (5, 6),
                CastleSide::QueenSide => (1, 3),
            };
            if (low..=high).any(|col| board.piece_at(Square::new(row, col)).is_some()) {
                continue;
            }

            // The king's transit and destination squares; b1/b8 only has to be empty.
            let king_to = side.king_to_col();
            let transit = side.rook_to_col();
            if [transit, king_to]
                .iter()
                .any(|&col| is_square_attacked(board, Square::new(row, col), enemy))
            {
                continue;
            }

            moves.push(Move::castle(from, Square::new(row, king_to), side));
        }
    }

    /// Legal moves for the piece on `square`. Empty when the square is empty
    /// or holds a piece of the side not on move.
    pub fn legal_moves(&self, board: &Board, square: Square) -> Result<Vec<Move>> {
        let Some(piece) = board.piece_at(square) else {
            return Ok(Vec::new());
        };
        if piece.color != board.side_to_move {
            return Ok(Vec::new());
        }

        let mut legal = Vec::new();
        for mv in self.pseudo_legal_moves(board, square) {
            let next = board.after_move(&mv)?;
            if !is_king_in_check(&next, piece.color)? {
                legal.push(mv);
            }
        }
        Ok(legal)
    }

    /// Every legal move of `color`, ordered by source square (row-major).
    pub fn all_legal_moves(&self, board: &Board, color: Color) -> Result<Vec<Move>> {
        let mut moves = Vec::new();
        if color != board.side_to_move {
            return Ok(moves);
        }
        for (square, piece) in board.pieces() {
            if piece.color == color {
                moves.extend(self.legal_moves(board, square)?);
            }
        }
        Ok(moves)
    }

    pub fn generate_moves(&self, board: &Board) -> Result<Vec<Move>> {
        self.all_legal_moves(board, board.side_to_move)
    }

    /// Matches a requested move against the legal set and returns the
    /// generated move, with its special-move tag filled in. A pawn move to
    /// the last rank without a promotion choice promotes to a queen.
    pub fn resolve(&self, board: &Board, requested: &Move) -> Result<Move> {
        let piece = board.piece_at(requested.from);
        let reaches_last_rank = piece.map_or(false, |p| {
            p.kind == PieceKind::Pawn && requested.to.row == p.color.promotion_row()
        });

        let promotion = match requested.promotion {
            Some(kind) if !reaches_last_rank || !kind.is_promotion_target() => {
                warn!(mv = %requested, "promotion on a move that cannot promote");
                return Err(ChessError::InvalidPromotion { mv: *requested });
            }
            Some(kind) => Some(kind),
            None if reaches_last_rank => Some(PieceKind::Queen),
            None => None,
        };

        self.legal_moves(board, requested.from)?
            .into_iter()
            .find(|mv| {
                mv.to == requested.to
                    && mv.promotion == promotion
                    && (requested.special == SpecialMove::None || requested.special == mv.special)
            })
            .ok_or_else(|| {
                warn!(mv = %requested, fen = %board.to_fen(), "rejected illegal move");
                ChessError::IllegalMove { mv: *requested }
            })
    }

    /// Counts leaf nodes of the legal move tree to `depth`.
    pub fn perft(&self, board: &Board, depth: u32) -> Result<u64> {
        if depth == 0 {
            return Ok(1);
        }
        let moves = self.generate_moves(board)?;
        if depth == 1 {
            return Ok(moves.len() as u64);
        }
        let mut nodes = 0;
        for mv in moves {
            nodes += self.perft(&board.after_move(&mv)?, depth - 1)?;
        }
        Ok(nodes)
    }
}
