//! Basalt — a UCI chess engine.
//!
//! Board representation and move generation come from the `chess`
//! crate; this crate provides the search-and-evaluation core (tapered
//! hand-crafted evaluation, PVS with a transposition table, quiescence,
//! iterative deepening under a time budget), a SAN-text opening book,
//! and the UCI front end.

pub mod book;
pub mod engine;
pub mod eval;
pub mod search;
pub mod types;
pub mod uci;

pub use engine::Engine;
pub use search::{SearchStats, Searcher, StopFlag, TimeControl, TimeController};
