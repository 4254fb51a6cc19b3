//! Opening book.
//!
//! The book file is newline-separated games. Each game is a
//! whitespace-separated list of SAN tokens terminated by a result token
//! ("1-0", "0-1" or "1/2-1/2"); games without a valid result token are
//! discarded silently. At load time every SAN token is resolved to long
//! algebraic form by replaying the game from the start position, so
//! lookups are plain string comparisons against the recorded move
//! history.

use crate::types::{Board, Color, Move, MoveGen};
use rand::seq::SliceRandom;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// One book game: resolved moves in long algebraic form plus outcome.
#[derive(Debug, Clone)]
struct GameEntry {
    moves: Vec<String>,
    /// 1 = white win, -1 = black win, 0 = draw.
    result: i8,
}

/// File-backed lookup of canned opening moves.
pub struct Book {
    games: Vec<GameEntry>,
    history: Vec<Move>,
}

impl Book {
    /// Load a book file. A missing or unreadable file yields an empty
    /// book; the engine then always falls through to search.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let book = Self::from_games_text(&contents);
                info!(path = %path.display(), games = book.len(), "opening book loaded");
                book
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "opening book unavailable");
                Self {
                    games: Vec::new(),
                    history: Vec::new(),
                }
            }
        }
    }

    /// Parse book contents; one game per line.
    pub fn from_games_text(contents: &str) -> Self {
        let mut games = Vec::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(result) = tokens.pop().and_then(parse_result_token) else {
                continue;
            };

            let moves = resolve_san_tokens(&tokens);
            if !moves.is_empty() {
                games.push(GameEntry { moves, result });
            }
        }

        let mut book = Self {
            games,
            history: Vec::new(),
        };
        book.shuffle();
        book
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Record a move actually played, so lookups follow the game line.
    pub fn add_move(&mut self, m: Move) {
        self.history.push(m);
    }

    /// Clear the move history and reshuffle, so a new game may pick a
    /// different line.
    pub fn reset(&mut self) {
        self.history.clear();
        self.shuffle();
    }

    fn shuffle(&mut self) {
        self.games.shuffle(&mut rand::thread_rng());
    }

    /// Find a canned move: the first game won by `us` whose opening
    /// strictly extends the recorded history and whose next move is
    /// legal in `board`.
    pub fn probe(&self, board: &Board, us: Color) -> Option<Move> {
        let wanted = match us {
            Color::White => 1,
            Color::Black => -1,
        };

        for game in &self.games {
            if game.result != wanted {
                continue;
            }
            if self.history.len() >= game.moves.len() {
                continue;
            }

            let matches = self
                .history
                .iter()
                .zip(&game.moves)
                .all(|(played, recorded)| played.to_string() == *recorded);
            if !matches {
                continue;
            }

            let next = &game.moves[self.history.len()];
            if let Some(m) = MoveGen::new_legal(board).find(|m| m.to_string() == *next) {
                return Some(m);
            }
        }

        None
    }
}

fn parse_result_token(token: &str) -> Option<i8> {
    match token {
        "1-0" => Some(1),
        "0-1" => Some(-1),
        "1/2-1/2" => Some(0),
        _ => None,
    }
}

/// Replay SAN tokens from the start position, collecting the long
/// algebraic form of each. An unresolvable token truncates the game.
fn resolve_san_tokens(tokens: &[&str]) -> Vec<String> {
    let mut board = Board::default();
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        let san = token.trim_end_matches(['+', '#', '!', '?']);
        if san.is_empty() {
            continue;
        }
        let Ok(m) = Move::from_san(&board, san) else {
            break;
        };
        out.push(m.to_string());
        board = board.make_move_new(m);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BOOK: &str = "\
e4 e5 Nf3 Nc6 Bc4 Bc5 c3 Nf6 1-0
d4 d5 c4 e6 Nc3 Nf6 0-1
";

    fn start() -> Board {
        Board::default()
    }

    #[test]
    fn missing_file_yields_empty_book() {
        let book = Book::load("folderdoesntexist/filedoesntexist.txt");
        assert_eq!(book.len(), 0);
    }

    #[test]
    fn empty_book_returns_no_move() {
        let book = Book::load("folderdoesntexist/filedoesntexist.txt");
        assert!(book.probe(&start(), Color::White).is_none());
    }

    #[test]
    fn games_are_parsed_and_resolved() {
        let book = Book::from_games_text(TEST_BOOK);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn game_without_result_token_is_discarded() {
        let book = Book::from_games_text("e4 e5 Nf3\nd4 d5 1-0\nc4 c5 *\n");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn white_win_feeds_white_move() {
        let book = Book::from_games_text(TEST_BOOK);
        let m = book.probe(&start(), Color::White).expect("book move");
        assert_eq!(m.to_string(), "e2e4");
    }

    #[test]
    fn wrong_color_returns_no_move() {
        let book = Book::from_games_text("e4 e5 Nf3 Nc6 1-0\n");
        assert!(book.probe(&start(), Color::Black).is_none());
    }

    #[test]
    fn follows_the_game_line() {
        let mut book = Book::from_games_text("e4 e5 Nf3 Nc6 Bc4 Bc5 c3 Nf6 1-0\n");
        let expected = ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "c2c3", "g8f6"];

        let mut board = start();
        for (i, lan) in expected.iter().enumerate() {
            let us = if i % 2 == 0 { Color::White } else { Color::Black };
            if us == Color::White {
                let m = book.probe(&board, us).expect("book move");
                assert_eq!(m.to_string(), *lan);
                book.add_move(m);
                board = board.make_move_new(m);
            } else {
                // Opponent plays the book line too.
                let m = MoveGen::new_legal(&board)
                    .find(|m| m.to_string() == *lan)
                    .expect("legal reply");
                book.add_move(m);
                board = board.make_move_new(m);
            }
        }
    }

    #[test]
    fn history_mismatch_returns_no_move() {
        let mut book = Book::from_games_text("e4 e5 Nf3 Nc6 1-0\n");
        let board = start();
        let bogus = MoveGen::new_legal(&board)
            .find(|m| m.to_string() == "a2a3")
            .unwrap();
        book.add_move(bogus);
        let board = board.make_move_new(bogus);

        assert!(book.probe(&board, Color::White).is_none());
    }

    #[test]
    fn history_exhausting_a_game_returns_no_move() {
        let mut book = Book::from_games_text("e4 1-0\n");
        let board = start();
        let e4 = book.probe(&board, Color::White).unwrap();
        book.add_move(e4);
        let board = board.make_move_new(e4);

        assert!(book.probe(&board, Color::White).is_none());
    }

    #[test]
    fn reset_clears_history() {
        let mut book = Book::from_games_text("e4 e5 Nf3 Nc6 1-0\n");
        let board = start();
        let m = book.probe(&board, Color::White).unwrap();
        book.add_move(m);

        book.reset();
        let m = book.probe(&start(), Color::White).expect("book move");
        assert_eq!(m.to_string(), "e2e4");
    }

    #[test]
    fn returned_move_is_legal() {
        let book = Book::from_games_text(TEST_BOOK);
        let board = start();
        let m = book.probe(&board, Color::White).expect("book move");
        assert!(MoveGen::new_legal(&board).any(|legal| legal == m));
    }

    #[test]
    fn candidate_games_yield_one_of_their_first_moves() {
        let book = Book::from_games_text("e4 e5 1-0\nd4 d5 1-0\n");
        let m = book.probe(&start(), Color::White).expect("book move");
        let lan = m.to_string();
        assert!(lan == "e2e4" || lan == "d2d4", "got {}", lan);
    }

    #[test]
    fn unresolvable_token_truncates_the_game() {
        // "Zz9" is not SAN; the game keeps its resolvable prefix.
        let book = Book::from_games_text("e4 Zz9 d5 1-0\n");
        assert_eq!(book.len(), 1);
        let m = book.probe(&start(), Color::White).expect("book move");
        assert_eq!(m.to_string(), "e2e4");
    }
}
