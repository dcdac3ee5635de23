use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chesscore::{Board, ChessError, Color, GameSession, Move, SearchConfig, Square};
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Play chess against the engine in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Search depth in plies
    #[arg(short, long, default_value_t = 3)]
    depth: u32,

    /// Worker threads for the engine's search
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Side played by the human
    #[arg(long, value_enum, default_value_t = Side::White)]
    play_as: Side,

    /// Start from this position instead of the initial one
    #[arg(long)]
    fen: Option<String>,
}

struct Console {
    session: GameSession,
    human: Color,
}

impl Console {
    fn new(args: &Args) -> Result<Self> {
        let config = SearchConfig::default()
            .with_depth(args.depth)
            .with_threads(args.threads);
        let board = match &args.fen {
            Some(fen) => Board::from_fen(fen).context("could not load --fen position")?,
            None => Board::new(),
        };
        Ok(Self {
            session: GameSession::from_board(board, config)?,
            human: args.play_as.into(),
        })
    }

    /// Lets the engine move while it is its turn and the game is running.
    fn engine_turn(&mut self) -> Result<String> {
        let mut out = String::new();
        if self.session.board().side_to_move != self.human && !self.session.state().is_over() {
            let mv = self.session.play_engine_move().context("engine failed to move")?;
            out.push_str(&format!("engine plays {mv}\n"));
        }
        out.push_str(&self.status());
        Ok(out)
    }

    fn status(&self) -> String {
        let mut out = self.session.board().to_string();
        let state = self.session.state();
        if state.is_over() {
            out.push_str(&format!("{}\n", state.outcome()));
        } else if state.check {
            out.push_str(&format!("{} is in check\n", state.side_to_move));
        }
        out
    }

    fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "board" => Ok(self.status()),
            "fen" => Ok(format!("{}\n", self.session.board().to_fen())),
            "new" => {
                self.session.reset()?;
                self.engine_turn()
            }
            "history" => Ok(self.history()),
            "moves" => self.moves(parts.get(1).copied()),
            "depth" => Ok(self.depth(parts.get(1).copied())),
            "help" => Ok(HELP.to_string()),
            text => self.human_move(text),
        }
    }

    fn human_move(&mut self, text: &str) -> Result<String> {
        let mv: Move = match text.parse() {
            Ok(mv) => mv,
            Err(_) => return Ok(format!("unknown command {text:?}, try `help`\n")),
        };
        match self.session.play(mv) {
            Ok(_) => self.engine_turn(),
            Err(err @ (ChessError::IllegalMove { .. }
            | ChessError::InvalidPromotion { .. }
            | ChessError::GameOver(_))) => {
                warn!(%err, "move rejected");
                Ok(format!("{err}\n"))
            }
            Err(err) => Err(err).context("game aborted"),
        }
    }

    fn moves(&self, square: Option<&str>) -> Result<String> {
        let squares: Vec<Square> = match square.map(str::parse) {
            Some(Ok(square)) => vec![square],
            Some(Err(err @ ChessError::InvalidSquare(_))) => return Ok(format!("{err}\n")),
            Some(Err(err)) => return Err(err.into()),
            None => Square::all().collect(),
        };
        let mut listed = Vec::new();
        for square in squares {
            for mv in self.session.legal_moves(square)? {
                listed.push(mv.to_string());
            }
        }
        Ok(format!("{}\n", listed.join(" ")))
    }

    fn depth(&mut self, value: Option<&str>) -> String {
        match value.map(str::parse::<u32>) {
            Some(Ok(depth)) if depth > 0 => {
                self.session.set_depth(depth);
                format!("search depth set to {depth}\n")
            }
            Some(_) => "depth must be a positive number\n".to_string(),
            None => format!("search depth is {}\n", self.session.search_config().depth),
        }
    }

    fn history(&self) -> String {
        let mut out = String::new();
        for record in self.session.log() {
            out.push_str(&format!("{}. {}\n", record.number, record));
        }
        out
    }

    fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        print!("{}", self.engine_turn()?);
        stdout.flush()?;

        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            print!("{}", self.handle_command(command)?);
            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }
}

const HELP: &str = "\
commands:
  e2e4, e7e8q   play a move in coordinate notation
  moves [e2]    list legal moves, optionally from one square
  depth [n]     show or set the engine's search depth
  board         show the board
  fen           print the position as FEN
  history       list the moves played
  new           start a new game
  quit          leave
";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut console = Console::new(&args)?;
    console.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(extra: &[&str]) -> Console {
        let mut argv = vec!["chesscore", "--depth", "1"];
        argv.extend_from_slice(extra);
        Console::new(&Args::parse_from(argv)).unwrap()
    }

    #[test]
    fn test_human_move_gets_engine_reply() {
        let mut c = console(&[]);
        let out = c.handle_command("e2e4").unwrap();
        assert!(out.contains("engine plays"));
        assert_eq!(c.session.log().len(), 2);
        assert_eq!(c.session.board().side_to_move, Color::White);
    }

    #[test]
    fn test_illegal_move_is_reported_not_fatal() {
        let mut c = console(&[]);
        let out = c.handle_command("e2e5").unwrap();
        assert!(out.contains("illegal move"));
        assert!(c.session.log().is_empty());
        let out = c.handle_command("xyz").unwrap();
        assert!(out.contains("unknown command"));
    }

    #[test]
    fn test_bad_square_is_reported_not_fatal() {
        let mut c = console(&[]);
        let out = c.handle_command("moves z9").unwrap();
        assert!(out.contains("invalid square"));
        assert_eq!(c.handle_command("moves e2").unwrap(), "e2e3 e2e4\n");
    }

    #[test]
    fn test_depth_command() {
        let mut c = console(&[]);
        assert_eq!(c.handle_command("depth").unwrap(), "search depth is 1\n");
        assert_eq!(c.handle_command("depth 4").unwrap(), "search depth set to 4\n");
        assert_eq!(c.session.search_config().depth, 4);
        assert!(c.handle_command("depth zero").unwrap().contains("positive"));
        assert!(c.handle_command("depth 0").unwrap().contains("positive"));
        assert_eq!(c.session.search_config().depth, 4);
    }

    #[test]
    fn test_engine_opens_when_human_plays_black() {
        let mut c = console(&["--play-as", "black"]);
        c.engine_turn().unwrap();
        assert_eq!(c.session.log().len(), 1);
        assert_eq!(c.session.board().side_to_move, Color::Black);
    }

    #[test]
    fn test_moves_and_history_listing() {
        let mut c = console(&[]);
        assert_eq!(c.handle_command("moves b1").unwrap(), "b1a3 b1c3\n");
        c.handle_command("d2d4").unwrap();
        assert!(c.handle_command("history").unwrap().starts_with("1. pawn d2-d4\n"));
    }

    #[test]
    fn test_fen_option() {
        let c = console(&["--fen", "4k3/8/8/8/8/8/8/4K2R w K - 0 1"]);
        assert_eq!(c.session.board().to_fen(), "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    }
}
