//! Attack and check detection.
//!
//! Attacks are found by scanning outward from the target square with each
//! piece's movement pattern and looking for a matching attacker, so the
//! detector never generates moves and never recurses into castling rules.

use tracing::error;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::error::{ChessError, Result};

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// True iff a piece of `by` could capture on `square`. Pawns count only
/// their diagonal captures.
pub fn is_square_attacked(board: &Board, square: Square, by: Color) -> bool {
    let is = |sq: Option<Square>, kind: PieceKind| {
        sq.and_then(|s| board.piece_at(s)) == Some(Piece::new(kind, by))
    };

    // A pawn of `by` attacks from one row behind the target, relative to its
    // direction of travel.
    let pawn_row = -by.forward();
    if is(square.offset(pawn_row, -1), PieceKind::Pawn)
        || is(square.offset(pawn_row, 1), PieceKind::Pawn)
    {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(dr, dc)| is(square.offset(dr, dc), PieceKind::Knight))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(dr, dc)| is(square.offset(dr, dc), PieceKind::King))
    {
        return true;
    }

    slider_attacks(board, square, by, &DIAGONALS, PieceKind::Bishop)
        || slider_attacks(board, square, by, &ORTHOGONALS, PieceKind::Rook)
}

fn slider_attacks(
    board: &Board,
    square: Square,
    by: Color,
    directions: &[(i8, i8)],
    kind: PieceKind,
) -> bool {
    for &(dr, dc) in directions {
        let mut current = square.offset(dr, dc);
        while let Some(target) = current {
            if let Some(piece) = board.piece_at(target) {
                if piece.color == by && (piece.kind == kind || piece.kind == PieceKind::Queen) {
                    return true;
                }
                break;
            }
            current = target.offset(dr, dc);
        }
    }
    false
}

/// Locates the king of `color`. A missing king means the board is corrupt.
pub fn find_king(board: &Board, color: Color) -> Result<Square> {
    board
        .pieces()
        .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
        .map(|(sq, _)| sq)
        .ok_or_else(|| {
            error!(%color, fen = %board.to_fen(), "king missing from board");
            ChessError::CorruptState(format!("no {color} king on the board"))
        })
}

pub fn is_king_in_check(board: &Board, color: Color) -> Result<bool> {
    let king = find_king(board, color)?;
    Ok(is_square_attacked(board, king, color.opposite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_pawn_attacks_are_diagonal_only() {
        let b = board("4k3/8/8/8/4p3/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&b, sq("d3"), Color::Black));
        assert!(is_square_attacked(&b, sq("f3"), Color::Black));
        assert!(!is_square_attacked(&b, sq("e3"), Color::Black));

        let b = board("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&b, sq("d5"), Color::White));
        assert!(!is_square_attacked(&b, sq("d3"), Color::White));
    }

    #[test]
    fn test_sliders_are_blocked() {
        let b = board("4k3/8/8/8/8/8/4P3/r3K2R w - - 0 1");
        assert!(is_square_attacked(&b, sq("d1"), Color::Black));
        assert!(!is_square_attacked(&b, sq("f1"), Color::Black));
        assert!(is_square_attacked(&b, sq("h8"), Color::White));
        assert!(!is_square_attacked(&b, sq("e8"), Color::White));
    }

    #[test]
    fn test_knight_and_king_attacks() {
        let b = board("4k3/8/8/8/8/5n2/8/K7 w - - 0 1");
        assert!(is_square_attacked(&b, sq("e1"), Color::Black));
        assert!(is_square_attacked(&b, sq("g1"), Color::Black));
        assert!(!is_square_attacked(&b, sq("f1"), Color::Black));
        assert!(is_square_attacked(&b, sq("b2"), Color::White));
        assert!(is_square_attacked(&b, sq("d7"), Color::Black));
    }

    #[test]
    fn test_check_detection() {
        let b = board("4k3/8/8/8/8/8/8/2Q1K3 b - - 0 1");
        assert!(!is_king_in_check(&b, Color::Black).unwrap());
        let b = board("4k3/8/8/8/8/8/8/4KQ2 b - - 0 1");
        assert!(!is_king_in_check(&b, Color::Black).unwrap());
        let b = board("4k3/8/8/8/Q7/8/8/4K3 b - - 0 1");
        assert!(is_king_in_check(&b, Color::Black).unwrap());
    }

    #[test]
    fn test_find_king_reports_corrupt_board() {
        let b = Board::new().with_piece(sq("e1"), None);
        assert_eq!(find_king(&Board::new(), Color::White).unwrap(), sq("e1"));
        assert!(matches!(
            find_king(&b, Color::White),
            Err(ChessError::CorruptState(_))
        ));
    }
}
