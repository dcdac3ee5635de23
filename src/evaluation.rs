use crate::board::{Board, Color, PieceKind};

/// Static evaluation in centipawns. Positive favors white.
///
/// Tables are laid out from white's point of view with row 0 as the far
/// (eighth) rank; black pieces read them with the row mirrored.
#[derive(Debug, Clone)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Positional bonuses
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],
    pub king_position_bonus: [[i32; 8]; 8],
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 300,
            bishop_value: 300,
            rook_value: 500,
            queen_value: 900,
            king_value: 10000,

            // Rewards advancement and central pawns
            pawn_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            knight_position_bonus: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            bishop_position_bonus: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 10, 10, 5, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            // Seventh rank and central files
            rook_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            queen_position_bonus: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // Keeps the king sheltered behind its pawns
            king_position_bonus: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],
        }
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        let mut score = 0;
        for (square, piece) in board.pieces() {
            let row = match piece.color {
                Color::White => square.row as usize,
                Color::Black => 7 - square.row as usize,
            };
            let value = self.get_piece_value(piece.kind, row, square.col as usize);
            score += if piece.color == Color::White { value } else { -value };
        }
        score
    }

    pub fn material_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => self.king_value,
        }
    }

    fn get_piece_value(&self, kind: PieceKind, row: usize, col: usize) -> i32 {
        let position_bonus = match kind {
            PieceKind::Pawn => self.pawn_position_bonus[row][col],
            PieceKind::Knight => self.knight_position_bonus[row][col],
            PieceKind::Bishop => self.bishop_position_bonus[row][col],
            PieceKind::Rook => self.rook_position_bonus[row][col],
            PieceKind::Queen => self.queen_position_bonus[row][col],
            PieceKind::King => self.king_position_bonus[row][col],
        };
        self.material_value(kind) + position_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(fen: &str) -> i32 {
        Evaluator::new().evaluate(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn test_initial_position_is_balanced() {
        assert_eq!(Evaluator::new().evaluate(&Board::new()), 0);
    }

    #[test]
    fn test_mirrored_positions_cancel() {
        assert_eq!(eval("4k3/8/8/3n4/3N4/8/8/4K3 w - - 0 1"), 0);
        assert_eq!(eval("4k3/pp6/8/8/8/8/PP6/4K3 w - - 0 1"), 0);
    }

    #[test]
    fn test_material_sign() {
        assert!(eval("4k3/8/8/8/8/8/8/3QK3 w - - 0 1") > 800);
        assert!(eval("3qk3/8/8/8/8/8/8/4K3 w - - 0 1") < -800);
    }

    #[test]
    fn test_positional_bonus() {
        // kings on e1/e8 cancel, so only the knight counts
        assert_eq!(eval("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1"), 300 + 20);
        assert_eq!(eval("4k3/8/8/8/8/8/8/N3K3 w - - 0 1"), 300 - 50);
        // an advanced pawn is worth more than one at home
        assert!(eval("4k3/P7/8/8/8/8/8/4K3 w - - 0 1") > eval("4k3/8/8/8/8/8/P7/4K3 w - - 0 1"));
    }
}
