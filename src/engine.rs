//! Engine facade: opening book, time budget, and the timer agent
//! around the iterative search.
//!
//! `think()` runs the search on the calling thread while a timer agent
//! sleeps on a condvar with the move budget as timeout. Whichever
//! happens first — deadline or search completion — the timer exits,
//! and it is always joined before `think()` returns.

use crate::book::Book;
use crate::search::{SearchStats, Searcher, StopFlag, TimeControl, TimeController};
use crate::types::{Board, Move};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Default iterative-deepening depth cap.
const DEFAULT_MAX_DEPTH: i32 = 64;

/// Default opening book location.
const BOOK_PATH: &str = "res/books/mainbook.txt";

pub struct Engine {
    searcher: Searcher,
    book: Book,
    time: TimeController,
    max_depth: i32,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_hash_size(16)
    }

    pub fn with_hash_size(hash_mb: usize) -> Self {
        Self {
            searcher: Searcher::with_hash_size(hash_mb),
            book: Book::load(BOOK_PATH),
            time: TimeController::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Shared stop flag; setting it cancels an in-flight think().
    pub fn stop_handle(&self) -> Arc<StopFlag> {
        self.searcher.stop_handle()
    }

    pub fn set_max_depth(&mut self, depth: i32) {
        self.max_depth = depth.max(1);
    }

    pub fn set_overhead_us(&mut self, us: i64) {
        self.time.overhead_us = us.max(0);
    }

    pub fn set_min_budget_us(&mut self, us: i64) {
        self.time.min_budget_us = us.max(0);
    }

    /// Replace the transposition table. On allocation failure the
    /// previous table is kept.
    pub fn set_hash_size(&mut self, size_mb: usize) {
        match crate::search::TranspositionTable::try_new(size_mb) {
            Ok(tt) => {
                self.searcher.tt = tt;
                info!(size_mb, "transposition table resized");
            }
            Err(err) => {
                warn!(size_mb, %err, "transposition table resize failed, keeping previous table");
            }
        }
    }

    /// Reset for a new game: clear the table and the book history.
    pub fn new_game(&mut self) {
        self.searcher.tt.clear();
        self.book.reset();
    }

    /// Record a played move so the book can follow its game lines.
    pub fn add_book_move(&mut self, m: Move) {
        self.book.add_move(m);
    }

    /// Reset only the book history (position was rebuilt from startpos).
    pub fn reset_book(&mut self) {
        self.book.reset();
    }

    /// Pick a move for the side to move under the given clock.
    ///
    /// Book hits return immediately with depth-0 stats. Otherwise the
    /// timer agent is armed with the computed budget and the iterative
    /// search runs until depth cap, deadline, or external stop.
    pub fn think(&mut self, board: &Board, tc: &TimeControl) -> SearchStats {
        if let Some(book_move) = self.book.probe(board, board.side_to_move()) {
            let stats = SearchStats {
                selected_move: Some(book_move),
                ..Default::default()
            };
            info!(best = %book_move, "book move");
            return stats;
        }

        let budget_us = self.time.budget_us(tc, board.side_to_move());
        let stop = self.stop_handle();
        // Cleared before the timer is armed, so a deadline raised for a
        // zero budget is never lost.
        stop.clear();

        let done = Arc::new((Mutex::new(false), Condvar::new()));
        let timer = {
            let done = Arc::clone(&done);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                if budget_us <= 0 {
                    stop.set();
                    return;
                }
                let (lock, cvar) = &*done;
                let guard = lock.lock().expect("timer mutex poisoned");
                let (guard, timeout) = cvar
                    .wait_timeout_while(guard, Duration::from_micros(budget_us as u64), |finished| {
                        !*finished
                    })
                    .expect("timer mutex poisoned");
                if timeout.timed_out() && !*guard {
                    stop.set();
                }
            })
        };

        let stats = self.searcher.iterative_search(board, self.max_depth);

        {
            let (lock, cvar) = &*done;
            *lock.lock().expect("timer mutex poisoned") = true;
            cvar.notify_one();
        }
        if timer.join().is_err() {
            warn!("timer agent panicked");
        }

        info!(
            depth = stats.depth,
            score = %stats.score,
            nodes = stats.nodes,
            nps = stats.nps(),
            time_ms = stats.time_ms(),
            best = %stats
                .selected_move
                .map(|m| m.to_string())
                .unwrap_or_else(|| "0000".to_string()),
            "search finished"
        );

        stats
    }

    /// Spend exactly `budget_us` on this move (modulo scheduling slack).
    pub fn think_fixed_time(&mut self, board: &Board, budget_us: i64) -> SearchStats {
        let mut tc = TimeControl {
            movestogo: 1,
            ..Default::default()
        };
        match board.side_to_move() {
            crate::types::Color::White => tc.wtime_us = budget_us,
            crate::types::Color::Black => tc.btime_us = budget_us,
        }
        self.set_overhead_us(0);
        self.think(board, &tc)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveGen;
    use std::str::FromStr;
    use std::time::Instant;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn is_legal(board: &Board, m: Move) -> bool {
        MoveGen::new_legal(board).any(|legal| legal == m)
    }

    #[test]
    fn returns_a_legal_move_on_startpos() {
        let mut engine = Engine::new();
        engine.set_max_depth(6);
        let board = Board::from_str(STARTPOS).unwrap();

        let tc = TimeControl {
            wtime_us: 200_000,
            ..Default::default()
        };
        let stats = engine.think(&board, &tc);
        assert!(is_legal(&board, stats.selected_move.expect("move selected")));
    }

    #[test]
    fn respects_a_fixed_time_budget() {
        let mut engine = Engine::new();
        engine.set_min_budget_us(0);
        let board = Board::from_str(STARTPOS).unwrap();

        let budget_us: i64 = 30_000;
        let slack = Duration::from_millis(50);

        let start = Instant::now();
        let stats = engine.think_fixed_time(&board, budget_us);
        let elapsed = start.elapsed();

        assert!(is_legal(&board, stats.selected_move.expect("move selected")));
        assert!(
            elapsed <= Duration::from_micros(budget_us as u64) + slack,
            "took {:?}",
            elapsed
        );
    }

    #[test]
    fn tiny_budget_does_not_hang() {
        let mut engine = Engine::new();
        engine.set_min_budget_us(0);
        let board = Board::from_str(STARTPOS).unwrap();

        let start = Instant::now();
        let stats = engine.think_fixed_time(&board, 1_000);
        assert!(start.elapsed() < Duration::from_millis(100));
        // Even an immediate stop leaves a playable move or none; the
        // protocol layer substitutes when none.
        if let Some(m) = stats.selected_move {
            assert!(is_legal(&board, m));
        }
    }

    #[test]
    fn does_not_mutate_the_root_position() {
        let mut engine = Engine::new();
        engine.set_max_depth(8);
        let board = Board::from_str(STARTPOS).unwrap();
        let hash_before = board.get_hash();

        let tc = TimeControl {
            wtime_us: 50_000,
            ..Default::default()
        };
        engine.think(&board, &tc);

        assert_eq!(board.get_hash(), hash_before);
    }

    #[test]
    fn external_stop_cancels_within_bounded_latency() {
        let mut engine = Engine::new();
        let board = Board::from_str(STARTPOS).unwrap();
        let stop = engine.stop_handle();

        let setter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stop.set();
        });

        let start = Instant::now();
        // Long budget; only the external stop ends this early.
        engine.think_fixed_time(&board, 10_000_000);
        setter.join().unwrap();

        assert!(start.elapsed() < Duration::from_millis(2000));
    }
}
