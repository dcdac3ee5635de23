//! Depth-bounded minimax with alpha-beta pruning.
//!
//! White maximizes and black minimizes. Moves are searched in generator
//! order and the first move reaching the best score wins, so a given board
//! and depth always yield the same move.

use std::thread;

use tracing::{debug, trace};

use crate::attacks::is_king_in_check;
use crate::board::{Board, Color, PieceKind};
use crate::error::{ChessError, Result};
use crate::evaluation::Evaluator;
use crate::movegen::{Move, MoveGenerator};

/// Score of a mate delivered at the root. Mates found deeper score lower.
pub const MATE_SCORE: i32 = 1_000_000;
const INFINITY: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies to search. Values below 1 are treated as 1.
    pub depth: u32,
    /// Alpha-beta pruning. Disabling it runs a full minimax.
    pub pruning: bool,
    /// Worker threads for the root moves.
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            pruning: true,
            threads: 1,
        }
    }
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i32,
    pub nodes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Search {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    config: SearchConfig,
    nodes_searched: u64,
}

impl Search {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            config,
            nodes_searched: 0,
        }
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.depth = depth;
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    /// Picks a move for the side to move on `board`.
    pub fn find_best_move(&mut self, board: &Board) -> Result<SearchResult> {
        self.nodes_searched = 0;
        let side = board.side_to_move;
        let moves = self.candidate_moves(board)?;
        if moves.is_empty() {
            return Err(ChessError::NoLegalMove { side });
        }

        let depth = self.config.depth.max(1);
        let (index, score) = if self.config.threads > 1 && moves.len() > 1 {
            self.search_root_parallel(board, &moves, depth)?
        } else {
            self.search_root(board, &moves, depth)?
        };

        let best_move = moves[index];
        debug!(
            %side,
            depth,
            nodes = self.nodes_searched,
            score,
            best = %best_move,
            "search complete"
        );
        Ok(SearchResult {
            best_move,
            score,
            nodes: self.nodes_searched,
        })
    }

    /// Legal moves with promotions limited to a queen.
    fn candidate_moves(&self, board: &Board) -> Result<Vec<Move>> {
        let mut moves = self.move_generator.generate_moves(board)?;
        moves.retain(|mv| mv.promotion.map_or(true, |kind| kind == PieceKind::Queen));
        Ok(moves)
    }

    /// Returns the index into `moves` of the best move and its score.
    fn search_root(&mut self, board: &Board, moves: &[Move], depth: u32) -> Result<(usize, i32)> {
        let maximizing = board.side_to_move == Color::White;
        let mut alpha = -INFINITY;
        let mut beta = INFINITY;
        let mut best: Option<(usize, i32)> = None;

        for (index, mv) in moves.iter().enumerate() {
            let child = board.after_move(mv)?;
            let score = self.minimax(&child, depth - 1, 1, alpha, beta)?;
            trace!(mv = %mv, score, "root candidate");

            let better = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if better {
                best = Some((index, score));
            }

            if self.config.pruning {
                if maximizing {
                    alpha = alpha.max(score);
                } else {
                    beta = beta.min(score);
                }
            }
        }

        best.ok_or(ChessError::NoLegalMove {
            side: board.side_to_move,
        })
    }

    /// Splits the root moves into contiguous chunks, one per worker. Each
    /// worker keeps its own bounds; merging in chunk order keeps the earliest
    /// move on ties, matching the serial result.
    fn search_root_parallel(
        &mut self,
        board: &Board,
        moves: &[Move],
        depth: u32,
    ) -> Result<(usize, i32)> {
        let threads = self.config.threads.min(moves.len());
        let chunk_size = moves.len().div_ceil(threads);
        let template = Search {
            nodes_searched: 0,
            ..self.clone()
        };

        let results: Vec<Result<(usize, i32, u64)>> = thread::scope(|scope| {
            let handles: Vec<_> = moves
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    let mut worker = template.clone();
                    scope.spawn(move || {
                        let (index, score) = worker.search_root(board, chunk, depth)?;
                        Ok((chunk_index * chunk_size + index, score, worker.nodes_searched))
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ChessError::CorruptState("search worker panicked".to_string()))
                    })
                })
                .collect()
        });

        let maximizing = board.side_to_move == Color::White;
        let mut best: Option<(usize, i32)> = None;
        for result in results {
            let (index, score, nodes) = result?;
            self.nodes_searched += nodes;
            let better = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if better {
                best = Some((index, score));
            }
        }

        best.ok_or(ChessError::NoLegalMove {
            side: board.side_to_move,
        })
    }

    fn minimax(
        &mut self,
        board: &Board,
        depth: u32,
        ply: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<i32> {
        self.nodes_searched += 1;

        if depth == 0 {
            return Ok(self.evaluator.evaluate(board));
        }

        let moves = self.candidate_moves(board)?;
        if moves.is_empty() {
            return self.terminal_score(board, ply);
        }

        let maximizing = board.side_to_move == Color::White;
        let mut best = if maximizing { -INFINITY } else { INFINITY };

        for mv in &moves {
            let child = board.after_move(mv)?;
            let score = self.minimax(&child, depth - 1, ply + 1, alpha, beta)?;

            if maximizing {
                best = best.max(score);
                if self.config.pruning {
                    alpha = alpha.max(score);
                }
            } else {
                best = best.min(score);
                if self.config.pruning {
                    beta = beta.min(score);
                }
            }

            if self.config.pruning && beta <= alpha {
                break;
            }
        }

        Ok(best)
    }

    /// Score of a node with no legal moves: mate for the side to move if it
    /// is in check, otherwise a stalemate.
    fn terminal_score(&self, board: &Board, ply: i32) -> Result<i32> {
        if !is_king_in_check(board, board.side_to_move)? {
            return Ok(0);
        }
        Ok(match board.side_to_move {
            Color::White => -(MATE_SCORE - ply),
            Color::Black => MATE_SCORE - ply,
        })
    }
}
