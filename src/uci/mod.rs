//! UCI (Universal Chess Interface) protocol support.
//!
//! Translates line-oriented text commands into engine calls and search
//! telemetry into protocol output. Everything engine-side stays in
//! [`crate::engine`]; this module only parses, dispatches and prints.

mod handler;
mod parser;

pub use handler::UciHandler;
pub use parser::{parse_command, UciCommand};

use crate::types::{Board, Move, MoveGen};
use std::str::FromStr;

pub const ENGINE_NAME: &str = "Basalt";
pub const ENGINE_AUTHOR: &str = "Basalt authors";

/// Errors surfaced by the protocol loop itself. Malformed commands are
/// not errors — they are reported as info strings and skipped.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// An I/O error occurred while reading from stdin.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Parameters of a "go" command. Times are in milliseconds, as on the
/// wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParams {
    pub wtime: Option<i64>,
    pub btime: Option<i64>,
    pub winc: Option<i64>,
    pub binc: Option<i64>,
    pub movestogo: Option<i32>,
    pub depth: Option<i32>,
    pub movetime: Option<i64>,
    pub infinite: bool,
    pub ponder: bool,
}

/// Parse a long-algebraic move string ("e2e4", "e7e8q") against the
/// legal moves of `board`.
pub fn parse_move(board: &Board, move_str: &str) -> Option<Move> {
    let move_str = move_str.trim();
    if move_str.len() < 4 {
        return None;
    }

    let from = chess::Square::from_str(&move_str[0..2]).ok()?;
    let to = chess::Square::from_str(&move_str[2..4]).ok()?;

    let promo = if move_str.len() > 4 {
        match move_str.chars().nth(4)? {
            'q' | 'Q' => Some(chess::Piece::Queen),
            'r' | 'R' => Some(chess::Piece::Rook),
            'b' | 'B' => Some(chess::Piece::Bishop),
            'n' | 'N' => Some(chess::Piece::Knight),
            _ => return None,
        }
    } else {
        None
    };

    MoveGen::new_legal(board)
        .find(|m| m.get_source() == from && m.get_dest() == to && m.get_promotion() == promo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_moves() {
        let board = Board::default();
        let m = parse_move(&board, "e2e4").expect("legal move");
        assert_eq!(m.to_string(), "e2e4");
    }

    #[test]
    fn rejects_illegal_and_garbage() {
        let board = Board::default();
        assert!(parse_move(&board, "e2e5").is_none());
        assert!(parse_move(&board, "e2").is_none());
        assert!(parse_move(&board, "zz9x").is_none());
    }

    #[test]
    fn parses_promotions() {
        let board = Board::from_str("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let m = parse_move(&board, "b7b8q").expect("legal promotion");
        assert_eq!(m.get_promotion(), Some(chess::Piece::Queen));
        assert!(parse_move(&board, "b7b8").is_none());
    }
}
