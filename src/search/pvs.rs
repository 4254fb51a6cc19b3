//! Principal-variation alpha-beta search.
//!
//! Fail-soft negamax with:
//! - Transposition-table cuts (mate scores normalized to the current ply)
//! - Reverse-futility and futility pruning at shallow non-PV nodes
//! - Late move reduction with a null-window re-search ladder
//! - Full-window search for checking moves (tactical accuracy on
//!   forcing lines)
//!
//! A search aborted by the stop flag returns alpha before reaching any
//! TT store, so aborted subtrees never pollute the table.

use super::ordering;
use super::qsearch::quiescence;
use super::tt::{BoundType, TtEntry};
use super::Searcher;
use crate::eval;
use crate::types::{is_capture, Board, Depth, Move, MoveGen, Ply, Score, EMPTY};

/// Futility margin per remaining ply.
const FUTILITY_MARGIN: i32 = 220;
/// Reverse-futility margin per remaining ply.
const RFP_MARGIN: i32 = 150;

pub fn pvs(
    searcher: &mut Searcher,
    board: &Board,
    ply: Ply,
    depth: Depth,
    mut alpha: Score,
    mut beta: Score,
    reduced: bool,
) -> Score {
    searcher.stats.nodes += 1;
    if searcher.stop.is_set() {
        return alpha;
    }

    if depth.is_qs() {
        return quiescence(searcher, board, ply, 0, alpha, beta);
    }

    let orig_alpha = alpha;
    let orig_beta = beta;
    let hash = board.get_hash();

    let mut tt_move: Option<Move> = None;
    let probe = searcher.tt.probe(hash);
    if probe.valid {
        tt_move = probe.best_move;

        if i32::from(probe.depth) >= depth.raw() {
            let tt_score = probe.score.from_tt(ply.raw());

            match probe.flag {
                BoundType::Exact => return tt_score,
                BoundType::LowerBound => alpha = alpha.max(tt_score),
                BoundType::UpperBound => beta = beta.min(tt_score),
            }
            if alpha >= beta {
                return alpha;
            }
        }
    }

    let in_check = *board.checkers() != EMPTY;
    let pv_node = (beta.raw() - alpha.raw()) > 1;

    // Shallow non-PV nodes: a static eval far outside the window makes
    // the full search pointless.
    if !pv_node && depth.raw() <= 2 && !in_check {
        let eval = eval::evaluate(board, board.side_to_move());

        if eval.raw() + FUTILITY_MARGIN * depth.raw() <= alpha.raw() {
            return quiescence(searcher, board, ply, 0, alpha, beta);
        }
        if eval.raw() - RFP_MARGIN * depth.raw() >= beta.raw() {
            return beta;
        }
    }

    let mut moves: Vec<Move> = MoveGen::new_legal(board).collect();
    if moves.is_empty() {
        if in_check {
            return Score::mated_in(ply.raw());
        }
        return Score::draw();
    }
    ordering::order_moves(board, &mut moves, tt_move);

    let mut best_score = Score::cp(-(crate::types::SCORE_MATE + 1));
    let mut best_move: Option<Move> = None;

    for (i, &m) in moves.iter().enumerate() {
        let child = board.make_move_new(m);
        let gives_check = *child.checkers() != EMPTY;

        let reduction = if !pv_node
            && i > 3
            && depth.raw() >= 3
            && !reduced
            && !is_capture(board, m)
        {
            1
        } else {
            0
        };

        let score = if i == 0 || gives_check {
            -pvs(searcher, &child, ply.next(), depth - 1, -beta, -alpha, reduced)
        } else {
            let null = -alpha - Score::cp(1);
            let mut s = -pvs(
                searcher,
                &child,
                ply.next(),
                depth - 1 - reduction,
                null,
                -alpha,
                reduction > 0,
            );
            if s > alpha && reduction > 0 {
                s = -pvs(searcher, &child, ply.next(), depth - 1, null, -alpha, false);
            }
            if s > alpha && s < beta {
                s = -pvs(searcher, &child, ply.next(), depth - 1, -beta, -alpha, false);
            }
            s
        };

        if searcher.stop.is_set() {
            return alpha;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(m);
        }

        if score > alpha {
            alpha = score;
            best_move = Some(m);
        }

        if score >= beta {
            searcher.tt.store(
                hash,
                TtEntry::new(depth, score.to_tt(ply.raw()), BoundType::LowerBound, Some(m)),
            );
            return score;
        }
    }

    let flag = if alpha <= orig_alpha {
        BoundType::UpperBound
    } else if alpha >= orig_beta {
        BoundType::LowerBound
    } else {
        BoundType::Exact
    };
    searcher.tt.store(
        hash,
        TtEntry::new(depth, alpha.to_tt(ply.raw()), flag, best_move),
    );

    alpha
}
