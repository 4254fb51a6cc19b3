//! Search module.
//!
//! # Architecture
//! - `Searcher`: iterative-deepening driver with aspiration windows
//! - `pvs`: principal-variation alpha-beta core
//! - `qsearch`: tactical extension past the main horizon
//! - `ordering`: move ordering
//! - `tt`: transposition table
//! - `limits`: clock state → per-move budget
//!
//! The principal variation is reconstructed from the transposition
//! table after every completed iteration rather than threaded through
//! child calls, with a Zobrist cycle guard to stop on repetitions.

mod limits;
mod ordering;
mod pvs;
mod qsearch;
pub mod tt;

pub use limits::{TimeControl, TimeController};
pub use tt::TranspositionTable;

use crate::types::{Board, Move, MoveGen, NodeCount, Ply, Score, SCORE_MATE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Longest principal variation kept.
const MAX_PV: usize = 64;

/// Scores within this margin of mate count as "mate found".
const MATE_FOUND_MARGIN: i32 = 256;

/// Cooperative cancellation signal.
///
/// Owned by the driver and shared by `Arc` with the timer agent and the
/// protocol layer. Set is sticky until the next root call clears it.
#[derive(Debug, Default)]
pub struct StopFlag(AtomicBool);

impl StopFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Telemetry for one search.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub nodes: NodeCount,
    pub elapsed_us: u64,
    pub q_depth_reached: i32,
    pub depth: i32,
    pub score: Score,
    pub mate_found: bool,
    pub selected_move: Option<Move>,
    pub pv: Vec<Move>,
}

impl SearchStats {
    fn reset(&mut self) {
        *self = SearchStats::default();
    }

    /// Nodes per second; 0 when no time has elapsed.
    pub fn nps(&self) -> u64 {
        if self.elapsed_us > 0 {
            self.nodes * 1_000_000 / self.elapsed_us
        } else {
            0
        }
    }

    pub fn time_ms(&self) -> u64 {
        self.elapsed_us / 1000
    }
}

/// Iterative-deepening search driver.
///
/// Owns the transposition table and the stop flag for the lifetime of
/// the engine. The table persists between searches; "new game" clears
/// it.
pub struct Searcher {
    pub tt: TranspositionTable,
    pub(crate) stats: SearchStats,
    pub(crate) stop: Arc<StopFlag>,
    pub(crate) max_qdepth: i32,
}

/// Default TT size for a searcher; the UCI `Hash` option default.
const DEFAULT_HASH_MB: usize = 16;

/// Quiescence recursion cap.
const DEFAULT_MAX_QDEPTH: i32 = 50;

impl Searcher {
    pub fn new() -> Self {
        Self::with_hash_size(DEFAULT_HASH_MB)
    }

    pub fn with_hash_size(size_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(size_mb),
            stats: SearchStats::default(),
            stop: Arc::new(StopFlag::new()),
            max_qdepth: DEFAULT_MAX_QDEPTH,
        }
    }

    /// Shared handle to the stop flag, for the timer agent and the
    /// protocol layer.
    pub fn stop_handle(&self) -> Arc<StopFlag> {
        Arc::clone(&self.stop)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Run iterative deepening up to `max_depth` and return the final
    /// telemetry. A stop mid-depth keeps the stats of the last
    /// completed depth.
    ///
    /// The stop flag is cleared by the root caller (`Engine::think`)
    /// before the timer agent is armed, never here — a deadline raised
    /// for an already-exhausted budget must not be lost.
    pub fn iterative_search(&mut self, board: &Board, max_depth: i32) -> SearchStats {
        self.stats.reset();

        for depth in 1..=max_depth.max(1) {
            self.search_root(board, depth);
            if self.stop.is_set() {
                break;
            }
        }

        self.stats.clone()
    }

    /// One iteration at `depth`, with an aspiration window seeded from
    /// the previous iteration's score.
    fn search_root(&mut self, board: &Board, depth: i32) {
        const ASP_START: i32 = 35;
        const ASP_GROW: i32 = 2;
        const ASP_TRIES: i32 = 6;
        const MATE_GUARD: i32 = 2000;

        let prev = self.stats.score.raw();
        let use_asp = depth >= 2 && prev.abs() < SCORE_MATE - MATE_GUARD;

        let center = prev;
        let mut delta = ASP_START;

        let (mut alpha, mut beta) = if use_asp {
            ((center - delta).max(-SCORE_MATE), (center + delta).min(SCORE_MATE))
        } else {
            (-SCORE_MATE, SCORE_MATE)
        };

        let mut score = Score::draw();
        let attempts = if use_asp { ASP_TRIES } else { 1 };

        for _ in 0..attempts {
            score = self.timed_root_call(board, depth, alpha, beta);
            if self.stop.is_set() {
                return;
            }
            if !use_asp {
                break;
            }

            if score.raw() <= alpha || score.raw() >= beta {
                delta *= ASP_GROW;
                if delta >= SCORE_MATE {
                    // Window widened past any meaningful bound: run the
                    // full window exactly once.
                    score = self.timed_root_call(board, depth, -SCORE_MATE, SCORE_MATE);
                    if self.stop.is_set() {
                        return;
                    }
                    break;
                }
                alpha = (center - delta).max(-SCORE_MATE);
                beta = (center + delta).min(SCORE_MATE);
                continue;
            }
            break;
        }

        let pv = self.extract_pv(board, depth);

        self.stats.depth = depth;
        self.stats.score = score;
        self.stats.pv = pv;
        self.stats.selected_move = self.stats.pv.first().copied();
        self.stats.mate_found = score.raw().abs() >= SCORE_MATE - MATE_FOUND_MARGIN;

        debug!(
            depth,
            score = %score,
            nodes = self.stats.nodes,
            qdepth = self.stats.q_depth_reached,
            "iteration complete"
        );
    }

    fn timed_root_call(&mut self, board: &Board, depth: i32, alpha: i32, beta: i32) -> Score {
        let start = Instant::now();
        let score = pvs::pvs(
            self,
            board,
            Ply::ZERO,
            crate::types::Depth::new(depth),
            Score::cp(alpha),
            Score::cp(beta),
            false,
        );
        self.stats.elapsed_us += start.elapsed().as_micros() as u64;
        score
    }

    /// Walk best-move chains out of the TT, replaying them on a scratch
    /// board. Stops on an invalid entry, a null or illegal move, the
    /// ply limit, or a repeated Zobrist key (cycle guard).
    fn extract_pv(&self, root: &Board, max_plies: i32) -> Vec<Move> {
        let mut out = Vec::new();
        let mut board = *root;
        let mut seen: Vec<u64> = Vec::with_capacity(MAX_PV + 1);

        let limit = (max_plies.max(0) as usize).min(MAX_PV);
        while out.len() < limit {
            let hash = board.get_hash();
            if seen.contains(&hash) {
                break;
            }
            seen.push(hash);

            let entry = self.tt.probe(hash);
            if !entry.valid {
                break;
            }
            let Some(m) = entry.best_move else {
                break;
            };
            if !MoveGen::new_legal(&board).any(|legal| legal == m) {
                break;
            }

            out.push(m);
            board = board.make_move_new(m);
        }

        out
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}
