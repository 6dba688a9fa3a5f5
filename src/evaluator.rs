//! Board scoring components and their weighted combination.
//!
//! Every component is a pure `&Board -> f64`. Tile comparisons use the log2
//! exponent, with empty cells counted as `0`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{Board, Tile, SPAWN_FOUR_PROBABILITY, SPAWN_TWO_PROBABILITY};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown evaluation component {0:?}")]
    UnknownComponent(String),
    #[error("invalid weight {value} for {component}: weights must be finite and >= 0")]
    InvalidWeight { component: Component, value: f64 },
}

/// log2 of a tile value, 0 for an empty cell.
#[inline]
pub fn log2_tile(value: Tile) -> f64 {
    if value == 0 {
        0.0
    } else {
        f64::from(value.trailing_zeros())
    }
}

// Four rows followed by four columns.
fn lines(board: &Board) -> impl Iterator<Item = [Tile; 4]> + '_ {
    (0..4).map(move |r| board.row(r)).chain((0..4).map(move |c| board.column(c)))
}

/// Sum over all 8 lines of the longer run direction among adjacent non-zero pairs.
///
/// A fully sorted row such as `[2, 4, 8, 16]` contributes 3.
pub fn monotonicity(board: &Board) -> f64 {
    lines(board)
        .map(|line| {
            let (mut inc, mut dec) = (0u32, 0u32);
            for pair in line.windows(2) {
                if pair[0] == 0 || pair[1] == 0 {
                    continue;
                }
                let (a, b) = (log2_tile(pair[0]), log2_tile(pair[1]));
                if b >= a {
                    inc += 1;
                }
                if b <= a {
                    dec += 1;
                }
            }
            f64::from(inc.max(dec))
        })
        .sum()
}

/// Negative sum of log2 differences between each tile and its nearest
/// non-empty neighbour to the right and below. Never positive.
pub fn smoothness(board: &Board) -> f64 {
    let rows = board.rows();
    let mut penalty = 0.0;
    for r in 0..4 {
        for c in 0..4 {
            let value = rows[r][c];
            if value == 0 {
                continue;
            }
            let here = log2_tile(value);
            if let Some(right) = (c + 1..4).map(|k| rows[r][k]).find(|&v| v != 0) {
                penalty += (here - log2_tile(right)).abs();
            }
            if let Some(down) = (r + 1..4).map(|k| rows[k][c]).find(|&v| v != 0) {
                penalty += (here - log2_tile(down)).abs();
            }
        }
    }
    -penalty
}

#[inline]
pub fn empty_log2(board: &Board) -> f64 {
    ((board.count_empty() + 1) as f64).log2()
}

#[inline]
pub fn empty_linear(board: &Board) -> f64 {
    board.count_empty() as f64
}

/// 1.0 if the maximum tile sits in a corner, else 0.0.
#[inline]
pub fn corner_bonus(board: &Board) -> f64 {
    if board.max_in_corner() {
        1.0
    } else {
        0.0
    }
}

// Value of one tile from every adjacent equal non-zero pair, both axes.
fn equal_pairs(board: &Board) -> impl Iterator<Item = Tile> + '_ {
    lines(board).flat_map(|line| {
        (0..3).filter_map(move |i| (line[i] != 0 && line[i] == line[i + 1]).then_some(line[i]))
    })
}

/// Sum of tile values over every adjacent equal pair.
pub fn merge_opportunity(board: &Board) -> f64 {
    equal_pairs(board).map(f64::from).sum()
}

/// Twice the value of every centre tile, plus the tile again once it reaches 128.
pub fn center(board: &Board) -> f64 {
    [(1, 1), (1, 2), (2, 1), (2, 2)]
        .iter()
        .map(|&(r, c)| {
            let v = f64::from(board.tile(r, c));
            if v >= 128.0 {
                3.0 * v
            } else {
                2.0 * v
            }
        })
        .sum()
}

pub fn opportunistic(board: &Board) -> f64 {
    let pairs: f64 = equal_pairs(board).map(|v| 2.0 * f64::from(v)).sum();
    pairs + 50.0 * empty_linear(board)
}

/// Chance node: expectation of `leaf` over every possible spawn.
///
/// Empty cells are equally likely; each cell gets a 2 or a 4 with the spawn
/// probabilities. A full board is scored by `leaf` directly.
pub fn chance_value<F>(board: &Board, leaf: F) -> f64
where
    F: Fn(&Board) -> f64,
{
    let empty = board.count_empty();
    if empty == 0 {
        return leaf(board);
    }
    let total: f64 = board
        .empty_cells()
        .map(|(r, c)| {
            SPAWN_TWO_PROBABILITY * leaf(&board.with_tile(r, c, 2))
                + SPAWN_FOUR_PROBABILITY * leaf(&board.with_tile(r, c, 4))
        })
        .sum();
    total / empty as f64
}

/// Expected maximum tile once the next tile has spawned.
///
/// ```
/// use ai_2048_heuristics::engine::Board;
/// use ai_2048_heuristics::evaluator::expected_max_tile;
/// let b = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
/// // A spawned 4 lifts the max with probability 0.1.
/// assert!((expected_max_tile(&b) - 2.2).abs() < 1e-9);
/// ```
pub fn expected_max_tile(board: &Board) -> f64 {
    chance_value(board, |b| f64::from(b.highest_tile()))
}

/// A named scoring term of the weighted combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Monotonicity,
    Smoothness,
    Empty,
    Corner,
    Merge,
    Center,
    Opportunistic,
    Expectimax,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::Monotonicity,
        Component::Smoothness,
        Component::Empty,
        Component::Corner,
        Component::Merge,
        Component::Center,
        Component::Opportunistic,
        Component::Expectimax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Monotonicity => "monotonicity",
            Component::Smoothness => "smoothness",
            Component::Empty => "empty",
            Component::Corner => "corner",
            Component::Merge => "merge",
            Component::Center => "center",
            Component::Opportunistic => "opportunistic",
            Component::Expectimax => "expectimax",
        }
    }

    /// Unweighted value of this component for `board`.
    pub fn score(self, board: &Board) -> f64 {
        match self {
            Component::Monotonicity => monotonicity(board),
            Component::Smoothness => smoothness(board),
            Component::Empty => empty_log2(board),
            Component::Corner => corner_bonus(board),
            Component::Merge => merge_opportunity(board),
            Component::Center => center(board),
            Component::Opportunistic => opportunistic(board),
            Component::Expectimax => expected_max_tile(board),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Component::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| EvalError::UnknownComponent(s.to_string()))
    }
}

/// Per-component weights of the linear combination.
///
/// Missing fields deserialize as 0, which disables the component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub monotonicity: f64,
    pub smoothness: f64,
    pub empty: f64,
    pub corner: f64,
    pub merge: f64,
    pub center: f64,
    pub opportunistic: f64,
    pub expectimax: f64,
}

impl Weights {
    pub const ZERO: Weights = Weights {
        monotonicity: 0.0,
        smoothness: 0.0,
        empty: 0.0,
        corner: 0.0,
        merge: 0.0,
        center: 0.0,
        opportunistic: 0.0,
        expectimax: 0.0,
    };

    /// Weights used by the `monotonicity` strategy.
    pub const MONOTONICITY: Weights = Weights {
        monotonicity: 1.0,
        smoothness: 0.1,
        empty: 2.7,
        corner: 1.0,
        ..Weights::ZERO
    };

    /// Default weights of the `weighted-combo` strategy.
    pub const COMBO: Weights = Weights {
        monotonicity: 1.0,
        smoothness: 0.1,
        empty: 2.7,
        corner: 1.5,
        merge: 1.0,
        center: 0.0,
        opportunistic: 1.0,
        expectimax: 0.5,
    };

    /// Build from `(name, weight)` pairs; unnamed components stay at 0.
    ///
    /// ```
    /// use ai_2048_heuristics::evaluator::Weights;
    /// let w = Weights::from_pairs([("empty", 2.0), ("corner", 1.0)]).unwrap();
    /// assert_eq!(w.empty, 2.0);
    /// assert!(Weights::from_pairs([("sparkle", 1.0)]).is_err());
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut weights = Weights::ZERO;
        for (name, value) in pairs {
            let component: Component = name.as_ref().parse()?;
            weights.set(component, value)?;
        }
        Ok(weights)
    }

    #[inline]
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Monotonicity => self.monotonicity,
            Component::Smoothness => self.smoothness,
            Component::Empty => self.empty,
            Component::Corner => self.corner,
            Component::Merge => self.merge,
            Component::Center => self.center,
            Component::Opportunistic => self.opportunistic,
            Component::Expectimax => self.expectimax,
        }
    }

    pub fn set(&mut self, component: Component, value: f64) -> Result<(), EvalError> {
        check_weight(component, value)?;
        let slot = match component {
            Component::Monotonicity => &mut self.monotonicity,
            Component::Smoothness => &mut self.smoothness,
            Component::Empty => &mut self.empty,
            Component::Corner => &mut self.corner,
            Component::Merge => &mut self.merge,
            Component::Center => &mut self.center,
            Component::Opportunistic => &mut self.opportunistic,
            Component::Expectimax => &mut self.expectimax,
        };
        *slot = value;
        Ok(())
    }

    /// Check every weight; needed after deserialization.
    pub fn validate(&self) -> Result<(), EvalError> {
        Component::ALL.into_iter().try_for_each(|c| check_weight(c, self.get(c)))
    }

    /// Linear combination over the non-zero components.
    pub fn evaluate(&self, board: &Board) -> f64 {
        Component::ALL
            .into_iter()
            .filter_map(|c| {
                let w = self.get(c);
                (w != 0.0).then(|| w * c.score(board))
            })
            .sum()
    }
}

fn check_weight(component: Component, value: f64) -> Result<(), EvalError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EvalError::InvalidWeight { component, value })
    }
}
