use std::fmt;
use std::str::FromStr;

use crate::error::{ChessError, Result};
use crate::movegen::{Move, SpecialMove};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Promotion choices in generation order.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// Lowercase letter as used in FEN and coordinate notation.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is_promotion_target(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row step of a pawn advance. Row 0 is black's back rank.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn back_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    pub fn pawn_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// The row on which this side's pawns promote.
    pub fn promotion_row(self) -> u8 {
        self.opposite().back_row()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

/// A board coordinate. Row 0 is rank 8, column 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Self { row, col }
    }

    pub fn try_new(row: i8, col: i8) -> Option<Self> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        Self::try_new(self.row as i8 + dr, self.col as i8 + dc)
    }

    /// All 64 squares in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square::new(row, col)))
    }

    pub fn is_light(self) -> bool {
        (self.row + self.col) % 2 == 0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        Ok(Square::new(b'8' - rank, file - b'a'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    pub fn king_to_col(self) -> u8 {
        match self {
            CastleSide::KingSide => 6,
            CastleSide::QueenSide => 2,
        }
    }

    pub fn rook_from_col(self) -> u8 {
        match self {
            CastleSide::KingSide => 7,
            CastleSide::QueenSide => 0,
        }
    }

    pub fn rook_to_col(self) -> u8 {
        match self {
            CastleSide::KingSide => 5,
            CastleSide::QueenSide => 3,
        }
    }
}

/// Castling availability, 4 bits: KQkq.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    fn bit(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::KingSide) => 0b0001,
            (Color::White, CastleSide::QueenSide) => 0b0010,
            (Color::Black, CastleSide::KingSide) => 0b0100,
            (Color::Black, CastleSide::QueenSide) => 0b1000,
        }
    }

    pub fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::bit(color, side) != 0
    }

    pub fn insert(&mut self, color: Color, side: CastleSide) {
        self.0 |= Self::bit(color, side);
    }

    pub fn remove(&mut self, color: Color, side: CastleSide) {
        self.0 &= !Self::bit(color, side);
    }

    pub fn remove_color(&mut self, color: Color) {
        self.remove(color, CastleSide::KingSide);
        self.remove(color, CastleSide::QueenSide);
    }

    /// Drops the right tied to a rook home square, if `square` is one.
    fn remove_rook_home(&mut self, square: Square) {
        for color in [Color::White, Color::Black] {
            if square.row != color.back_row() {
                continue;
            }
            for side in [CastleSide::KingSide, CastleSide::QueenSide] {
                if square.col == side.rook_from_col() {
                    self.remove(color, side);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    grid: [[Option<Piece>; 8]; 8],
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.grid[color.back_row() as usize][col] = Some(Piece::new(*kind, color));
                board.grid[color.pawn_row() as usize][col] = Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        board.castling_rights = CastlingRights::ALL;
        board
    }

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            grid: [[None; 8]; 8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.grid[square.row as usize][square.col as usize]
    }

    pub fn with_piece(mut self, square: Square, piece: Option<Piece>) -> Self {
        self.set(square, piece);
        self
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.grid[square.row as usize][square.col as usize] = piece;
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Checks the one-king-per-color invariant.
    pub fn validate(&self) -> Result<()> {
        for color in [Color::White, Color::Black] {
            let kings = self
                .pieces()
                .filter(|(_, p)| p.kind == PieceKind::King && p.color == color)
                .count();
            if kings != 1 {
                return Err(ChessError::CorruptState(format!(
                    "expected one {color} king, found {kings}"
                )));
            }
        }
        Ok(())
    }

    /// Same placement, side, castling rights and en-passant target.
    /// Clocks are ignored.
    pub fn same_position(&self, other: &Board) -> bool {
        self.grid == other.grid
            && self.side_to_move == other.side_to_move
            && self.castling_rights == other.castling_rights
            && self.en_passant == other.en_passant
    }

    /// Produces the board after `mv`. Legality is not checked here; the move
    /// must come from the generator.
    pub(crate) fn after_move(&self, mv: &Move) -> Result<Board> {
        let piece = self.piece_at(mv.from).ok_or_else(|| {
            ChessError::CorruptState(format!("no piece on {} for move {mv}", mv.from))
        })?;
        let color = piece.color;
        let mut next = *self;

        let captured = if mv.special == SpecialMove::EnPassant {
            let victim = Square::new(mv.from.row, mv.to.col);
            next.set(victim, None);
            Some(Piece::new(PieceKind::Pawn, color.opposite()))
        } else {
            self.piece_at(mv.to)
        };

        let placed = match mv.promotion {
            Some(kind) => Piece::new(kind, color),
            None if piece.kind == PieceKind::Pawn && mv.to.row == color.promotion_row() => {
                Piece::new(PieceKind::Queen, color)
            }
            None => piece,
        };
        next.set(mv.from, None);
        next.set(mv.to, Some(placed));

        if let SpecialMove::Castle(side) = mv.special {
            let row = mv.from.row;
            let rook_from = Square::new(row, side.rook_from_col());
            let rook_to = Square::new(row, side.rook_to_col());
            let rook = next.piece_at(rook_from);
            next.set(rook_from, None);
            next.set(rook_to, rook);
        }

        match piece.kind {
            PieceKind::King => next.castling_rights.remove_color(color),
            PieceKind::Rook => next.castling_rights.remove_rook_home(mv.from),
            _ => {}
        }
        if captured.is_some() {
            next.castling_rights.remove_rook_home(mv.to);
        }

        next.en_passant = if piece.kind == PieceKind::Pawn && mv.from.row.abs_diff(mv.to.row) == 2 {
            Some(Square::new((mv.from.row + mv.to.row) / 2, mv.from.col))
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || captured.is_some() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }
        if color == Color::Black {
            next.fullmove_number += 1;
        }

        next.side_to_move = color.opposite();
        Ok(next)
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let invalid = |msg: &str| ChessError::InvalidFen(format!("{msg} in {fen:?}"));
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid("expected 4 to 6 fields"));
        }

        let mut board = Board::empty();
        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != 8 {
            return Err(invalid("expected 8 ranks"));
        }
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid("bad empty-square count"));
                    }
                    col = col
                        .checked_add(skip as u8)
                        .filter(|&n| n <= 8)
                        .ok_or_else(|| invalid("rank too long"))?;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(|| invalid("bad piece letter"))?;
                    if col >= 8 {
                        return Err(invalid("rank too long"));
                    }
                    board.set(Square::new(row as u8, col), Some(piece));
                    col += 1;
                }
            }
            if col != 8 {
                return Err(invalid("rank does not cover 8 files"));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(invalid("bad side to move")),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                let (color, side) = match c {
                    'K' => (Color::White, CastleSide::KingSide),
                    'Q' => (Color::White, CastleSide::QueenSide),
                    'k' => (Color::Black, CastleSide::KingSide),
                    'q' => (Color::Black, CastleSide::QueenSide),
                    _ => return Err(invalid("bad castling field")),
                };
                board.castling_rights.insert(color, side);
            }
        }

        board.en_passant = match fields[3] {
            "-" => None,
            text => Some(text.parse().map_err(|_| invalid("bad en-passant square"))?),
        };

        if let Some(text) = fields.get(4) {
            board.halfmove_clock = text.parse().map_err(|_| invalid("bad half-move clock"))?;
        }
        if let Some(text) = fields.get(5) {
            board.fullmove_number = text.parse().map_err(|_| invalid("bad full-move number"))?;
        }

        board
            .validate()
            .map_err(|e| ChessError::InvalidFen(e.to_string()))?;
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for row in 0..8u8 {
            let mut empty = 0;
            for col in 0..8u8 {
                match self.piece_at(Square::new(row, col)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        let rights = self.castling_rights;
        let mut any = false;
        for (color, side, c) in [
            (Color::White, CastleSide::KingSide, 'K'),
            (Color::White, CastleSide::QueenSide, 'Q'),
            (Color::Black, CastleSide::KingSide, 'k'),
            (Color::Black, CastleSide::QueenSide, 'q'),
        ] {
            if rights.has(color, side) {
                fen.push(c);
                any = true;
            }
        }
        if !any {
            fen.push('-');
        }

        fen.push(' ');
        match self.en_passant {
            Some(square) => fen.push_str(&square.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..8u8 {
            write!(f, "{} ", 8 - row)?;
            for col in 0..8u8 {
                let c = self
                    .piece_at(Square::new(row, col))
                    .map_or('.', |piece| piece.fen_char());
                write!(f, "{c}")?;
                if col < 7 {
                    f.write_str(" ")?;
                }
            }
            f.write_str("\n")?;
        }
        f.write_str("  a b c d e f g h\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_initial_layout() {
        let board = Board::new();
        assert_eq!(
            board.piece_at(sq("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.piece_at(sq("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.castling_rights, CastlingRights::ALL);
        assert_eq!(board.en_passant, None);
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.side_to_move, Color::White);
    }

    #[test]
    fn test_square_notation() {
        assert_eq!(sq("a8"), Square::new(0, 0));
        assert_eq!(sq("h1"), Square::new(7, 7));
        assert_eq!(sq("e4").to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("e9".parse::<Square>().is_err());
        assert!("e".parse::<Square>().is_err());
    }

    #[test]
    fn test_fen_round_trip_start() {
        let board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(board, Board::new());
        assert_eq!(Board::new().to_fen(), START_FEN);
    }

    #[test]
    fn test_fen_fields() {
        let fen = "r3k2r/8/8/3pP3/8/8/8/R3K2R w Kq d6 3 17";
        let board = Board::from_fen(fen).unwrap();
        assert!(board.castling_rights.has(Color::White, CastleSide::KingSide));
        assert!(!board.castling_rights.has(Color::White, CastleSide::QueenSide));
        assert!(board.castling_rights.has(Color::Black, CastleSide::QueenSide));
        assert_eq!(board.en_passant, Some(sq("d6")));
        assert_eq!(board.halfmove_clock, 3);
        assert_eq!(board.fullmove_number, 17);
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn test_fen_rejects_bad_input() {
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - -").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4KK2 w - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/44/4K3 w - - 0 1").is_ok());
        assert!(Board::from_fen("4k3/8/8/8/8/8/09/4K3 w - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/53/4K3 w - - 0 1").is_ok());
        assert!(Board::from_fen("4k3/8/8/8/8/8/54/4K3 w - - 0 1").is_err());
        let wrapping = format!("4k3/8/8/8/8/8/{}3/4K3 w - - 0 1", "9".repeat(9));
        assert!(matches!(Board::from_fen(&wrapping), Err(ChessError::InvalidFen(_))));
        let long = format!("4k3/8/8/8/8/8/{}/4K3 w - - 0 1", "9".repeat(29));
        assert!(matches!(Board::from_fen(&long), Err(ChessError::InvalidFen(_))));
    }

    #[test]
    fn test_validate_missing_king() {
        let board = Board::new().with_piece(sq("e8"), None);
        assert!(matches!(board.validate(), Err(ChessError::CorruptState(_))));
    }

    #[test]
    fn test_display() {
        let text = Board::new().to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "8 r n b q k b n r");
        assert!(text.ends_with("  a b c d e f g h\n"));
    }
}
