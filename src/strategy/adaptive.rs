use crate::engine::{Board, Session, Tile};
use crate::evaluator::{corner_bonus, empty_linear, log2_tile, monotonicity, smoothness};

/// Game phase, bucketed by the current maximum tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Max tile up to 64.
    Early,
    /// Max tile above 64, up to 512.
    Mid,
    /// Max tile above 512.
    Late,
}

impl Phase {
    pub fn of(max_tile: Tile) -> Phase {
        match max_tile {
            0..=64 => Phase::Early,
            65..=512 => Phase::Mid,
            _ => Phase::Late,
        }
    }
}

const EARLY_CORNER_BONUS: f64 = 500.0;
const EARLY_GAIN_WEIGHT: f64 = 2.0;
const EARLY_EMPTY_WEIGHT: f64 = 50.0;

const MID_MONOTONICITY_BASE: f64 = 40.0;
const MID_EMPTY_BASE: f64 = 120.0;
const MID_SMOOTHNESS_WEIGHT: f64 = 10.0;
const MID_CORNER_BONUS: f64 = 300.0;

const LATE_CORNER_BONUS: f64 = 2000.0;
const LATE_GRADIENT_WEIGHT: f64 = 50.0;
const LATE_EMPTY_WEIGHT: f64 = 30.0;
const LATE_ISOLATION_PENALTY: f64 = 1500.0;
/// Smallest tile that can count as isolated.
const ISOLATION_THRESHOLD: Tile = 256;

const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 3), (3, 0), (3, 3)];

/// Score of `after`, a probe of `before`, under the phase of `before`.
pub(crate) fn score(before: &Session, after: &Session) -> f64 {
    let gain = (after.score() - before.score()) as f64;
    let board = after.board();
    match Phase::of(before.highest_tile()) {
        Phase::Early => early_game_score(&board) + EARLY_GAIN_WEIGHT * gain,
        Phase::Mid => mid_game_score(&board) + gain,
        Phase::Late => late_game_score(&board) + gain,
    }
}

/// Corner anchoring plus free space.
pub fn early_game_score(board: &Board) -> f64 {
    EARLY_CORNER_BONUS * corner_bonus(board) + EARLY_EMPTY_WEIGHT * empty_linear(board)
}

/// Monotonicity weighs more as the board fills up, free space less.
pub fn mid_game_score(board: &Board) -> f64 {
    let empty = empty_linear(board);
    let (monotonicity_weight, empty_weight) = mid_weights(board.count_empty());
    monotonicity_weight * monotonicity(board)
        + empty_weight * empty
        + MID_SMOOTHNESS_WEIGHT * smoothness(board)
        + MID_CORNER_BONUS * corner_bonus(board)
}

/// `(monotonicity, empty)` weights for a mid-game board with `empty` free cells.
fn mid_weights(empty: usize) -> (f64, f64) {
    let ratio = empty as f64 / 16.0;
    (MID_MONOTONICITY_BASE * (2.0 - ratio), MID_EMPTY_BASE * ratio)
}

/// Late-game position score.
///
/// Rewards the maximum tile in a corner and a monotone decrease away from
/// that corner. Every tile >= 256 without an orthogonal neighbour of at
/// least half its value is penalised.
///
/// ```
/// use ai_2048_heuristics::engine::Board;
/// use ai_2048_heuristics::strategy::late_game_score;
/// let lonely = Board::from_rows([[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
/// let paired = Board::from_rows([[2048, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
/// assert!(late_game_score(&paired) > late_game_score(&lonely));
/// ```
pub fn late_game_score(board: &Board) -> f64 {
    let max = board.highest_tile();
    let anchor = CORNERS.into_iter().find(|&(r, c)| max != 0 && board.tile(r, c) == max);
    let mut score = match anchor {
        Some(corner) => LATE_CORNER_BONUS + LATE_GRADIENT_WEIGHT * gradient_from(board, corner),
        None => -LATE_CORNER_BONUS,
    };
    score += LATE_EMPTY_WEIGHT * empty_linear(board);
    score -= LATE_ISOLATION_PENALTY * isolated_large_tiles(board) as f64;
    score
}

// +1 for every adjacent pair that does not grow when walking away from the
// corner, minus the log2 step of every pair that does.
fn gradient_from(board: &Board, (corner_row, corner_col): (usize, usize)) -> f64 {
    let away = |anchor: usize| -> [usize; 4] {
        if anchor == 0 {
            [0, 1, 2, 3]
        } else {
            [3, 2, 1, 0]
        }
    };
    let cols = away(corner_col);
    let rows = away(corner_row);
    let mut total = 0.0;
    for i in 0..4 {
        for k in 0..3 {
            let along_row = (board.tile(i, cols[k]), board.tile(i, cols[k + 1]));
            let along_col = (board.tile(rows[k], i), board.tile(rows[k + 1], i));
            for (near, far) in [along_row, along_col] {
                if far <= near {
                    total += 1.0;
                } else {
                    total -= log2_tile(far) - log2_tile(near);
                }
            }
        }
    }
    total
}

fn isolated_large_tiles(board: &Board) -> usize {
    let mut count = 0;
    for r in 0..4 {
        for c in 0..4 {
            let value = board.tile(r, c);
            if value < ISOLATION_THRESHOLD {
                continue;
            }
            let neighbours = [
                (r.wrapping_sub(1), c),
                (r + 1, c),
                (r, c.wrapping_sub(1)),
                (r, c + 1),
            ];
            let supported = neighbours
                .into_iter()
                .filter(|&(nr, nc)| nr < 4 && nc < 4)
                .any(|(nr, nc)| board.tile(nr, nc) >= value / 2);
            if !supported {
                count += 1;
            }
        }
    }
    count
}
