//! Hand-crafted evaluation.
//!
//! Tapered blend of middlegame and endgame terms:
//! - Material and piece-square tables
//! - Mobility
//! - Pawn structure (doubled, isolated, connected, passed)
//! - Bishop pair, rook file/rank terms
//! - King safety and check status (midgame only)
//! - Tempo

use crate::types::{attackers_to, in_check, Score};
use chess::{BitBoard, Board, Color, Piece, Square, EMPTY};

// ============================================================================
// PIECE VALUES (centipawns)
// ============================================================================

const MG_VALUE: [i32; 5] = [100, 320, 330, 500, 900]; // P N B R Q
const EG_VALUE: [i32; 5] = [120, 300, 320, 520, 900];

// ============================================================================
// PIECE-SQUARE TABLES (a1 = index 0; white reads directly, black mirrors)
// ============================================================================

#[rustfmt::skip]
const MG_PAWN: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    10, 10, 10,-10,-10, 10, 10, 10,
     5,  5, 10, 20, 20, 10,  5,  5,
     0,  0,  0, 25, 25,  0,  0,  0,
     5, -5,-10, 10, 10,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
    10, 10, 10,-10,-10, 10, 10, 10,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const EG_PAWN: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    20, 20, 20, 20, 20, 20, 20, 20,
    15, 15, 15, 15, 15, 15, 15, 15,
    10, 10, 10, 12, 12, 10, 10, 10,
     6,  6,  6,  8,  8,  6,  6,  6,
     3,  3,  3,  4,  4,  3,  3,  3,
     1,  1,  1,  0,  0,  1,  1,  1,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const MG_KNIGHT: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const EG_KNIGHT: [i32; 64] = [
   -40,-30,-20,-20,-20,-20,-30,-40,
   -30,-10,  0,  0,  0,  0,-10,-30,
   -20,  0, 10, 10, 10, 10,  0,-20,
   -20,  0, 10, 15, 15, 10,  0,-20,
   -20,  0, 10, 15, 15, 10,  0,-20,
   -20,  0, 10, 10, 10, 10,  0,-20,
   -30,-10,  0,  0,  0,  0,-10,-30,
   -40,-30,-20,-20,-20,-20,-30,-40,
];

#[rustfmt::skip]
const MG_BISHOP: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const EG_BISHOP: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10,  0, 10, 15, 15, 10,  0,-10,
   -10,  0, 10, 15, 15, 10,  0,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const MG_ROOK: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const EG_ROOK: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     5,  5,  5,  5,  5,  5,  5,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const MG_QUEEN: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const EG_QUEEN: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  0,  5,  5,  5,  5,  0,-10,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const MG_KING: [i32; 64] = [
    20, 30, 10,  0,  0, 10, 30, 20,
    20, 20,  0,  0,  0,  0, 20, 20,
   -10,-20,-20,-20,-20,-20,-20,-10,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
];

#[rustfmt::skip]
const EG_KING: [i32; 64] = [
   -50,-30,-30,-30,-30,-30,-30,-50,
   -30,-10,  0,  0,  0,  0,-10,-30,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  0, 15, 25, 25, 15,  0,-30,
   -30,  0, 15, 25, 25, 15,  0,-30,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,-10,  0,  0,  0,  0,-10,-30,
   -50,-30,-30,-30,-30,-30,-30,-50,
];

// ============================================================================
// GAME PHASE
// ============================================================================

/// Phase weights per piece type {P, N, B, R, Q}; sums over all non-king
/// pieces on the board, clamped to [0, 24]. 24 = full middlegame.
const PHASE_WEIGHT: [i32; 5] = [0, 1, 1, 2, 4];

const NON_KING_PIECES: [Piece; 5] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
];

#[inline]
fn game_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for (i, &pt) in NON_KING_PIECES.iter().enumerate() {
        phase += board.pieces(pt).popcnt() as i32 * PHASE_WEIGHT[i];
    }
    phase.min(24)
}

#[inline]
fn blend(mg: i32, eg: i32, phase: i32) -> i32 {
    (mg * phase + eg * (24 - phase)) / 24
}

// ============================================================================
// HELPERS
// ============================================================================

/// PST lookup: white reads the table directly (a1 = 0), black mirrors
/// ranks.
#[inline]
fn pst(table: &[i32; 64], color: Color, sq: usize) -> i32 {
    match color {
        Color::White => table[sq],
        Color::Black => table[sq ^ 56],
    }
}

#[inline]
const fn file_mask(file: usize) -> u64 {
    0x0101_0101_0101_0101u64 << file
}

#[inline]
const fn file_of(sq: usize) -> usize {
    sq & 7
}

#[inline]
const fn rank_of(sq: usize) -> usize {
    sq >> 3
}

#[inline]
fn side_pawns(board: &Board, color: Color) -> BitBoard {
    *board.pieces(Piece::Pawn) & *board.color_combined(color)
}

fn pawn_file_counts(pawns: BitBoard) -> [i32; 8] {
    let mut counts = [0; 8];
    for sq in pawns {
        counts[file_of(sq.to_index())] += 1;
    }
    counts
}

fn attacks_from(board: &Board, pt: Piece, sq: Square) -> BitBoard {
    let occ = *board.combined();
    match pt {
        Piece::Knight => chess::get_knight_moves(sq),
        Piece::Bishop => chess::get_bishop_moves(sq, occ),
        Piece::Rook => chess::get_rook_moves(sq, occ),
        Piece::Queen => chess::get_bishop_moves(sq, occ) | chess::get_rook_moves(sq, occ),
        Piece::King => chess::get_king_moves(sq),
        Piece::Pawn => EMPTY,
    }
}

// ============================================================================
// TERMS — each symmetric: added for `us`, subtracted for the opponent
// ============================================================================

fn material(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    let them = !us;
    for (i, &pt) in NON_KING_PIECES.iter().enumerate() {
        let ours = (*board.pieces(pt) & *board.color_combined(us)).popcnt() as i32;
        let theirs = (*board.pieces(pt) & *board.color_combined(them)).popcnt() as i32;
        *mg += (ours - theirs) * MG_VALUE[i];
        *eg += (ours - theirs) * EG_VALUE[i];
    }
}

fn piece_square_tables(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    const TABLES: [(Piece, &[i32; 64], &[i32; 64]); 6] = [
        (Piece::Pawn, &MG_PAWN, &EG_PAWN),
        (Piece::Knight, &MG_KNIGHT, &EG_KNIGHT),
        (Piece::Bishop, &MG_BISHOP, &EG_BISHOP),
        (Piece::Rook, &MG_ROOK, &EG_ROOK),
        (Piece::Queen, &MG_QUEEN, &EG_QUEEN),
        (Piece::King, &MG_KING, &EG_KING),
    ];

    for &(pt, mg_table, eg_table) in &TABLES {
        for color in [us, !us] {
            let sign = if color == us { 1 } else { -1 };
            for sq in *board.pieces(pt) & *board.color_combined(color) {
                *mg += sign * pst(mg_table, color, sq.to_index());
                *eg += sign * pst(eg_table, color, sq.to_index());
            }
        }
    }
}

fn mobility(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    // (piece, mg weight, eg weight) per reachable square
    const WEIGHTS: [(Piece, i32, i32); 4] = [
        (Piece::Knight, 4, 4),
        (Piece::Bishop, 4, 4),
        (Piece::Rook, 2, 3),
        (Piece::Queen, 1, 2),
    ];

    for &(pt, mg_w, eg_w) in &WEIGHTS {
        for color in [us, !us] {
            let sign = if color == us { 1 } else { -1 };
            let own = *board.color_combined(color);
            for sq in *board.pieces(pt) & own {
                let targets = (attacks_from(board, pt, sq) & !own).popcnt() as i32;
                *mg += sign * targets * mg_w;
                *eg += sign * targets * eg_w;
            }
        }
    }
}

fn pawn_structure(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    for color in [us, !us] {
        let sign = if color == us { 1 } else { -1 };
        let pawns = side_pawns(board, color);
        let enemy_pawns = side_pawns(board, !color);
        let counts = pawn_file_counts(pawns);

        // Doubled pawns, per extra pawn on a file.
        for &count in &counts {
            if count > 1 {
                *mg += sign * -12 * (count - 1);
                *eg += sign * -10 * (count - 1);
            }
        }

        for sq in pawns {
            let idx = sq.to_index();
            let file = file_of(idx);
            let rank = rank_of(idx);

            let left = file > 0 && counts[file - 1] > 0;
            let right = file < 7 && counts[file + 1] > 0;
            if !left && !right {
                *mg += sign * -10;
                *eg += sign * -8;
            }

            // Connected: adjacent pawn on the same rank.
            let mut connected = false;
            if file > 0 && pawns & BitBoard::new(1u64 << (rank * 8 + file - 1)) != EMPTY {
                connected = true;
            }
            if file < 7 && pawns & BitBoard::new(1u64 << (rank * 8 + file + 1)) != EMPTY {
                connected = true;
            }
            if connected {
                *mg += sign * 4;
                *eg += sign * 6;
            }

            if is_passed(enemy_pawns, color, idx) {
                let advance = match color {
                    Color::White => rank as i32,
                    Color::Black => 7 - rank as i32,
                };
                *mg += sign * (8 + advance * 2);
                *eg += sign * (18 + advance * 6);
            }
        }
    }
}

/// No enemy pawn on the pawn's file or an adjacent file, ahead of it.
fn is_passed(enemy_pawns: BitBoard, color: Color, sq: usize) -> bool {
    let file = file_of(sq) as i32;
    let rank = rank_of(sq) as i32;

    let mut span = 0u64;
    for df in -1..=1 {
        let f = file + df;
        if !(0..8).contains(&f) {
            continue;
        }
        match color {
            Color::White => {
                for r in rank + 1..8 {
                    span |= 1u64 << (r * 8 + f);
                }
            }
            Color::Black => {
                for r in 0..rank {
                    span |= 1u64 << (r * 8 + f);
                }
            }
        }
    }
    enemy_pawns & BitBoard::new(span) == EMPTY
}

fn bishop_pair(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    for color in [us, !us] {
        let sign = if color == us { 1 } else { -1 };
        if (*board.pieces(Piece::Bishop) & *board.color_combined(color)).popcnt() >= 2 {
            *mg += sign * 25;
            *eg += sign * 35;
        }
    }
}

fn rook_terms(board: &Board, us: Color, mg: &mut i32, eg: &mut i32) {
    let mut total = 0;
    for color in [us, !us] {
        let sign = if color == us { 1 } else { -1 };
        let our_pawns = side_pawns(board, color);
        let their_pawns = side_pawns(board, !color);

        for sq in *board.pieces(Piece::Rook) & *board.color_combined(color) {
            let idx = sq.to_index();
            let mask = BitBoard::new(file_mask(file_of(idx)));
            let own_pawn = our_pawns & mask != EMPTY;
            let enemy_pawn = their_pawns & mask != EMPTY;

            if !own_pawn && !enemy_pawn {
                total += sign * 18;
            } else if !own_pawn && enemy_pawn {
                total += sign * 10;
            }

            let seventh = match color {
                Color::White => 6,
                Color::Black => 1,
            };
            if rank_of(idx) == seventh {
                total += sign * 15;
            }
        }
    }
    *mg += total;
    *eg += total / 2;
}

fn king_safety(board: &Board, us: Color, mg: &mut i32) {
    *mg += king_safety_for(board, us) - king_safety_for(board, !us);
}

fn king_safety_for(board: &Board, color: Color) -> i32 {
    let ksq = board.king_square(color);
    let kf = file_of(ksq.to_index()) as i32;
    let kr = rank_of(ksq.to_index()) as i32;

    let our_pawns = side_pawns(board, color);
    let all_pawns = *board.pieces(Piece::Pawn);
    let dir: i32 = match color {
        Color::White => 1,
        Color::Black => -1,
    };

    // Pawn shield in the 3x2 rectangle one and two ranks ahead of the king.
    let mut shield = 0;
    for df in -1..=1 {
        let f = kf + df;
        if !(0..8).contains(&f) {
            continue;
        }
        for steps in 1..=2 {
            let r = kr + steps * dir;
            if !(0..8).contains(&r) {
                continue;
            }
            if our_pawns & BitBoard::new(1u64 << (r * 8 + f)) != EMPTY {
                shield += 1;
            }
        }
    }

    let mut score = -(6 - shield) * 10;

    if all_pawns & BitBoard::new(file_mask(kf as usize)) == EMPTY {
        score -= 14;
    }

    // Pressure: enemy attackers over the king zone.
    let occ = *board.combined();
    let zone = chess::get_king_moves(ksq) | BitBoard::from_square(ksq);
    let mut pressure = 0;
    for sq in zone {
        pressure += attackers_to(board, sq, !color, occ).popcnt() as i32;
    }
    score - pressure * 2
}

fn check_status(board: &Board, us: Color, mg: &mut i32) {
    if in_check(board, us) {
        *mg -= 20;
    }
    if in_check(board, !us) {
        *mg += 20;
    }
}

// ============================================================================
// MAIN EVALUATION FUNCTION
// ============================================================================

/// Static evaluation from `us`'s perspective, in centipawns.
///
/// Depends only on the position; the opponent's view is the negation.
pub fn evaluate(board: &Board, us: Color) -> Score {
    let phase = game_phase(board);
    let mut mg = 0;
    let mut eg = 0;

    material(board, us, &mut mg, &mut eg);
    piece_square_tables(board, us, &mut mg, &mut eg);
    mobility(board, us, &mut mg, &mut eg);
    pawn_structure(board, us, &mut mg, &mut eg);
    bishop_pair(board, us, &mut mg, &mut eg);
    rook_terms(board, us, &mut mg, &mut eg);
    king_safety(board, us, &mut mg);
    check_status(board, us, &mut mg);

    mg += if board.side_to_move() == us { 10 } else { -10 };

    Score::cp(blend(mg, eg, phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn eval_stm(fen: &str) -> i32 {
        let board = Board::from_str(fen).unwrap();
        evaluate(&board, board.side_to_move()).raw()
    }

    #[test]
    fn start_position_near_zero() {
        let s = eval_stm("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(s > -80 && s < 80, "start eval {}", s);
    }

    #[test]
    fn tempo_is_side_to_move_relative() {
        let w = eval_stm("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        let b = eval_stm("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(w, b);
    }

    #[test]
    fn extra_queen_is_huge() {
        let s = eval_stm("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(s > 600, "queen-up eval {}", s);
    }

    #[test]
    fn material_up_side_scores_positive() {
        // White is a rook up; score from white's perspective.
        let s = eval_stm("1nbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(s > 0);
    }

    #[test]
    fn mirrored_position_roughly_negates() {
        let s1 = eval_stm("rnbqkbnr/pppp1ppp/4p3/8/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 2");
        let s2 = eval_stm("rnbqkb1r/pppp1ppp/5n2/4p3/8/4P3/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        assert!((s1 + s2).abs() < 80, "s1 {} s2 {}", s1, s2);
    }

    #[test]
    fn check_penalty_is_applied() {
        let checked = eval_stm("4k3/4R3/8/8/8/8/8/4K3 b - - 0 1");
        let quiet = eval_stm("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1");
        assert!(checked < quiet);
    }

    #[test]
    fn bishop_pair_beats_bishop_and_knight() {
        let pair = eval_stm("4k3/8/8/8/8/8/2B1B3/4K3 w - - 0 1");
        let mixed = eval_stm("4k3/8/8/8/8/8/2B1N3/4K3 w - - 0 1");
        assert!(pair > mixed);
    }

    #[test]
    fn passed_pawn_beats_blocked_pawn() {
        let passed = eval_stm("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1");
        let blocked = eval_stm("4k3/8/4p3/4P3/8/8/8/4K3 w - - 0 1");
        assert!(passed > blocked);
    }

    #[test]
    fn doubled_pawns_are_penalized() {
        let doubled = eval_stm("4k3/8/8/8/8/2P5/2P5/4K3 w - - 0 1");
        let healthy = eval_stm("4k3/8/8/8/8/8/2PP4/4K3 w - - 0 1");
        assert!(healthy > doubled);
    }

    #[test]
    fn isolated_pawn_is_penalized() {
        let isolated = eval_stm("4k3/8/8/8/8/8/P7/4K3 w - - 0 1");
        let connected = eval_stm("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1");
        assert!(connected > isolated);
    }

    #[test]
    fn rook_on_seventh_is_rewarded() {
        let seventh = eval_stm("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1");
        let sixth = eval_stm("4k3/8/4R3/8/8/8/8/4K3 w - - 0 1");
        assert!(seventh > sixth);
    }

    #[test]
    fn rook_open_file_bonus() {
        let open = eval_stm("4k3/p7/8/8/8/8/8/4R1K1 w - - 0 1");
        let semi = eval_stm("4k3/4p3/8/8/8/8/8/4R1K1 w - - 0 1");
        assert!(open > semi);
    }

    #[test]
    fn king_file_without_pawn_is_penalized() {
        let open = eval_stm("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        let shielded = eval_stm("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert!(shielded > open);
    }

    #[test]
    fn knight_centralization_helps() {
        let center = eval_stm("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1");
        let corner = eval_stm("4k3/8/8/8/8/8/N7/4K3 w - - 0 1");
        assert!(center > corner);
    }

    #[test]
    fn score_is_bounded_on_simple_positions() {
        let s = eval_stm("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        assert!(s > -5000 && s < 5000);
    }

    #[test]
    fn perspective_negates() {
        let board =
            Board::from_str("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let white = evaluate(&board, Color::White).raw();
        let black = evaluate(&board, Color::Black).raw();
        assert_eq!(white, -black);
    }
}
