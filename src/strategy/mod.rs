//! Move-selection strategies.
//!
//! A [`Strategy`] is resolved once from its name and then asked for one move
//! per turn. Every strategy answers with a direction that changes the board
//! whenever one exists; lookahead never touches the game's RNG.

use log::{debug, error};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::engine::{Move, Session};
use crate::evaluator::{EvalError, Weights};

mod adaptive;
mod fixed_order;
mod lookahead;

pub use adaptive::{early_game_score, late_game_score, mid_game_score, Phase};
pub use fixed_order::{CENTER_ORDER, CORNER_ORDER};
pub use lookahead::BranchEval;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("unknown strategy {0:?} (expected one of: {names})", names = Strategy::NAMES.join(", "))]
    UnknownStrategy(String),
    #[error("invalid weights: {0}")]
    Weights(#[from] EvalError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// First of `[Down, Left, Right, Up]` that changes the board.
    Corner,
    /// First of `[Down, Right, Up, Left]` that changes the board.
    Center,
    /// First scoring move, otherwise [`Strategy::Corner`].
    Opportunistic,
    /// Argmax of [`Weights::MONOTONICITY`] over the probed boards.
    Monotonicity,
    /// One-ply expectimax on the expected maximum tile.
    Expectimax,
    /// Phase-dependent scoring, see [`Phase`].
    Adaptive,
    /// Argmax of a custom linear combination.
    WeightedCombo(Weights),
    /// Uniform over all four directions.
    Random,
}

impl Strategy {
    pub const NAMES: [&'static str; 8] = [
        "corner",
        "center",
        "opportunistic",
        "monotonicity",
        "expectimax",
        "adaptive",
        "weighted-combo",
        "random",
    ];

    /// Weighted-combo strategy with validated weights.
    pub fn weighted(weights: Weights) -> Result<Self, StrategyError> {
        weights.validate()?;
        Ok(Strategy::WeightedCombo(weights))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Corner => "corner",
            Strategy::Center => "center",
            Strategy::Opportunistic => "opportunistic",
            Strategy::Monotonicity => "monotonicity",
            Strategy::Expectimax => "expectimax",
            Strategy::Adaptive => "adaptive",
            Strategy::WeightedCombo(_) => "weighted-combo",
            Strategy::Random => "random",
        }
    }

    /// Pick the next direction for `session`.
    ///
    /// ```
    /// use ai_2048_heuristics::engine::{Board, Move, Session};
    /// use ai_2048_heuristics::strategy::Strategy;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let b = Board::from_rows([[0; 4], [0; 4], [0; 4], [2, 0, 0, 0]]).unwrap();
    /// let s = Session::from_parts(b, 0);
    /// let mut rng = StdRng::seed_from_u64(0);
    /// assert_eq!(Strategy::Corner.select_move(&s, &mut rng), Move::Right);
    /// ```
    pub fn select_move<R: Rng + ?Sized>(&self, session: &Session, rng: &mut R) -> Move {
        let chosen = match self {
            Strategy::Corner => fixed_order::first_changing(session, &CORNER_ORDER),
            Strategy::Center => fixed_order::first_changing(session, &CENTER_ORDER),
            Strategy::Opportunistic => fixed_order::opportunistic(session),
            Strategy::Random => return random_move(rng),
            _ => self.branch_evals(session).and_then(|branches| lookahead::best_branch(&branches)),
        };
        match chosen {
            Some(dir) => dir,
            None => self.fallback(session, rng),
        }
    }

    /// Per-direction evaluation in `Move::ALL` order, for the scored strategies.
    ///
    /// Fixed-order and random strategies return `None`.
    pub fn branch_evals(&self, session: &Session) -> Option<[BranchEval; 4]> {
        let branches = match self {
            Strategy::Monotonicity => lookahead::evaluate_branches(session, |_, next| {
                Weights::MONOTONICITY.evaluate(&next.board())
            }),
            Strategy::Expectimax => lookahead::evaluate_branches(session, |_, next| {
                crate::evaluator::expected_max_tile(&next.board())
            }),
            Strategy::Adaptive => lookahead::evaluate_branches(session, adaptive::score),
            Strategy::WeightedCombo(weights) => {
                lookahead::evaluate_branches(session, |_, next| weights.evaluate(&next.board()))
            }
            Strategy::Corner | Strategy::Center | Strategy::Opportunistic | Strategy::Random => {
                return None
            }
        };
        Some(branches)
    }

    fn fallback<R: Rng + ?Sized>(&self, session: &Session, rng: &mut R) -> Move {
        let terminal = session.is_terminal();
        if terminal {
            debug!("{}: no direction changes a terminal board, moving at random", self.name());
        } else {
            error!(
                "{}: found no move on a live board {:?}, falling back to random",
                self.name(),
                session.board()
            );
        }
        debug_assert!(terminal, "{} fell back on a non-terminal board", self.name());
        random_move(rng)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    /// `weighted-combo` resolves with [`Weights::COMBO`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corner" => Ok(Strategy::Corner),
            "center" => Ok(Strategy::Center),
            "opportunistic" => Ok(Strategy::Opportunistic),
            "monotonicity" => Ok(Strategy::Monotonicity),
            "expectimax" => Ok(Strategy::Expectimax),
            "adaptive" => Ok(Strategy::Adaptive),
            "weighted-combo" | "weighted_combo" => Ok(Strategy::WeightedCombo(Weights::COMBO)),
            "random" => Ok(Strategy::Random),
            _ => Err(StrategyError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Resolve `name` and pick a move in one call.
pub fn select_move<R: Rng + ?Sized>(
    name: &str,
    session: &Session,
    rng: &mut R,
) -> Result<Move, StrategyError> {
    let strategy: Strategy = name.parse()?;
    Ok(strategy.select_move(session, rng))
}

#[inline]
pub(crate) fn random_move<R: Rng + ?Sized>(rng: &mut R) -> Move {
    Move::ALL[rng.gen_range(0..Move::ALL.len())]
}
