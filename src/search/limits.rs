//! Time control and per-move budget computation.
//!
//! Converts the clock state reported by the GUI into a single per-move
//! budget in microseconds. The timer agent in [`crate::engine`] arms a
//! deadline with that budget.

use crate::types::Color;

/// Clock state for a search, all times in microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeControl {
    pub wtime_us: i64,
    pub btime_us: i64,
    pub winc_us: i64,
    pub binc_us: i64,
    /// Moves until the next time control; 0 if unknown.
    pub movestogo: i32,
}

/// Budget policy: how much of the clock a single move may spend.
#[derive(Debug, Clone, Copy)]
pub struct TimeController {
    /// Safety margin subtracted from every budget.
    pub overhead_us: i64,
    /// Floor below which a budget is never cut (before overhead).
    pub min_budget_us: i64,
    /// Never spend more than time / max_fraction on one move.
    pub max_fraction: i64,
}

impl Default for TimeController {
    fn default() -> Self {
        Self {
            overhead_us: 5_000,
            min_budget_us: 2_000,
            max_fraction: 3,
        }
    }
}

impl TimeController {
    /// Per-move budget in microseconds for `side`.
    pub fn budget_us(&self, tc: &TimeControl, side: Color) -> i64 {
        let (time, inc) = match side {
            Color::White => (tc.wtime_us, tc.winc_us),
            Color::Black => (tc.btime_us, tc.binc_us),
        };
        let time = time.max(0);
        let inc = inc.max(0);

        let mut budget = if tc.movestogo > 0 {
            let mtg = i64::from(tc.movestogo.max(1));
            time / (mtg + 3) + inc / 2
        } else {
            time / 30 + inc / 2
        };

        if self.max_fraction > 0 {
            budget = budget.min(time / self.max_fraction);
        }
        budget = budget.max(self.min_budget_us);

        (budget - self.overhead_us).max(0)
    }
}
