use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::board::position::{Move, Position};
use crate::board::zobrist::init_zobrist;
use crate::movegen::magic::init_attack_tables;
use crate::movegen::moves::generate_moves;
use crate::search::alphabeta::Searcher;

const ENGINE_NAME: &str = "Opal";
const ENGINE_AUTHOR: &str = "Opal authors";
const DEFAULT_DEPTH: i32 = 6;

/// Synchronous UCI front end: one position, one searcher, no background
/// threads. `go` blocks until the search reports its best move.
pub struct UciEngine {
    position: Position,
    searcher: Searcher,
    debug: bool,
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UciEngine {
    pub fn new() -> Self {
        init_attack_tables();
        init_zobrist();

        Self {
            position: Position::startpos(),
            searcher: Searcher::new(),
            debug: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();

        for line in stdin.lock().lines() {
            let command = line.context("failed to read from stdin")?;
            let trimmed = command.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !self.handle_command(trimmed) {
                break;
            }
            io::stdout().flush().ok();
        }

        Ok(())
    }

    /// Dispatches one command line; returns `false` on `quit`.
    pub fn handle_command(&mut self, command: &str) -> bool {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return true;
        }

        match parts[0] {
            "uci" => self.uci_command(),
            "debug" => self.debug = parts.get(1) == Some(&"on"),
            "isready" => println!("readyok"),
            "ucinewgame" => self.position = Position::startpos(),
            "position" => self.position_command(&parts),
            "go" => self.go_command(&parts),
            "d" | "display" => self.position.print(),
            "quit" => return false,
            other => self.debug_message(&format!("unknown command: {other}")),
        }

        true
    }

    fn uci_command(&self) {
        println!("id name {ENGINE_NAME}");
        println!("id author {ENGINE_AUTHOR}");
        println!("uciok");
    }

    fn position_command(&mut self, parts: &[&str]) {
        if parts.len() < 2 {
            return;
        }

        let mut moves_index = None;
        let mut new_position = None;

        match parts[1] {
            "startpos" => {
                new_position = Some(Position::startpos());
                moves_index = parts.iter().position(|&p| p == "moves").map(|i| i + 1);
            }
            "fen" => {
                let fen_end = parts
                    .iter()
                    .position(|&p| p == "moves")
                    .unwrap_or(parts.len());
                let fen = parts[2..fen_end].join(" ");
                match Position::from_fen(&fen) {
                    Ok(pos) => {
                        new_position = Some(pos);
                        if fen_end < parts.len() {
                            moves_index = Some(fen_end + 1);
                        }
                    }
                    Err(err) => {
                        self.debug_message(&format!("invalid fen '{fen}': {err}"));
                        return;
                    }
                }
            }
            other => {
                self.debug_message(&format!("invalid position command: {other}"));
                return;
            }
        }

        let Some(mut pos) = new_position else {
            return;
        };

        if let Some(index) = moves_index {
            for &token in &parts[index..] {
                let applied = parse_move(&pos, token).and_then(|mv| pos.make_move(mv));
                match applied {
                    Some(next) => pos = next,
                    None => {
                        // An unknown or illegal move invalidates the rest of
                        // the list.
                        self.debug_message(&format!("illegal move: {token}"));
                        break;
                    }
                }
            }
        }

        self.position = pos;
    }

    fn go_command(&mut self, parts: &[&str]) {
        let mut depth = DEFAULT_DEPTH;
        if let Some(index) = parts.iter().position(|&p| p == "depth") {
            if let Some(value) = parts.get(index + 1).and_then(|v| v.parse::<i32>().ok()) {
                depth = value;
            }
        }

        self.searcher.search(&self.position, depth);
        println!("bestmove {}", self.searcher.best_move.to_uci());
    }

    fn debug_message(&self, message: &str) {
        if self.debug {
            println!("info string {message}");
        }
    }

    #[cfg(test)]
    fn position(&self) -> &Position {
        &self.position
    }
}

/// Resolves a coordinate-notation token against the generated move list.
pub fn parse_move(pos: &Position, token: &str) -> Option<Move> {
    generate_moves(pos).into_iter().find(|mv| mv.to_uci() == token)
}

pub fn run_uci() -> Result<()> {
    UciEngine::new().run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::bitboard::algebraic_to_square;
    use crate::board::position::{Side, NO_SQUARE, START_FEN};

    #[test]
    fn test_parse_move_round_trip() {
        let pos = Position::startpos();
        let mv = parse_move(&pos, "e2e4").unwrap();
        assert_eq!(mv.to_uci(), "e2e4");
        assert!(mv.is_double_push());
        assert!(parse_move(&pos, "e2e5").is_none());
        assert!(parse_move(&pos, "junk").is_none());
    }

    #[test]
    fn test_parse_move_promotion_letters() {
        let pos = Position::from_fen("8/P3k3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        for token in ["a7a8q", "a7a8r", "a7a8b", "a7a8n"] {
            let mv = parse_move(&pos, token).unwrap();
            assert_eq!(mv.to_uci(), token);
        }
    }

    #[test]
    fn test_position_startpos_with_moves() {
        let mut engine = UciEngine::new();
        engine.handle_command("position startpos moves e2e4 e7e5 g1f3");
        let pos = engine.position();
        assert_eq!(pos.side_to_move, Side::Black);
        assert_eq!(pos.fullmove_number, 2);
        assert_eq!(
            pos.piece_at(algebraic_to_square("f3").unwrap()),
            crate::board::position::Piece::WhiteKnight
        );
    }

    #[test]
    fn test_position_fen_with_moves() {
        let mut engine = UciEngine::new();
        engine.handle_command(
            "position fen r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1 moves e1g1",
        );
        let pos = engine.position();
        assert_eq!(
            pos.piece_at(algebraic_to_square("f1").unwrap()),
            crate::board::position::Piece::WhiteRook
        );
    }

    #[test]
    fn test_illegal_move_stops_application() {
        let mut engine = UciEngine::new();
        engine.handle_command("position startpos moves e2e4 e2e4 e7e5");
        let pos = engine.position();
        // Only the first move applies; the duplicate is rejected and the
        // remainder is dropped.
        assert_eq!(pos.side_to_move, Side::Black);
        assert_eq!(pos.en_passant_square, algebraic_to_square("e3").unwrap());
    }

    #[test]
    fn test_invalid_fen_keeps_previous_position() {
        let mut engine = UciEngine::new();
        engine.handle_command("position fen not a real fen at all 0 1");
        assert_eq!(engine.position().to_fen(), START_FEN);
    }

    #[test]
    fn test_ucinewgame_resets() {
        let mut engine = UciEngine::new();
        engine.handle_command("position startpos moves e2e4");
        engine.handle_command("ucinewgame");
        assert_eq!(engine.position().to_fen(), START_FEN);
        assert_eq!(engine.position().en_passant_square, NO_SQUARE);
    }

    #[test]
    fn test_quit_ends_loop() {
        let mut engine = UciEngine::new();
        assert!(engine.handle_command("isready"));
        assert!(!engine.handle_command("quit"));
    }
}
