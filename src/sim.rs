//! Whole-game simulation: single games, seeded parallel batches and summaries.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::engine::{Move, MoveSequence, Score, Session, Tile};
use crate::strategy::Strategy;

/// Source of moves for one phase of a game.
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    Strategy(Strategy),
    Sequence(MoveSequence),
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Controller::Strategy(s) => write!(f, "strategy {s}"),
            Controller::Sequence(seq) => write!(f, "sequence {seq}"),
        }
    }
}

/// Hand over to `controller` once the max tile reaches `tile`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSwitch {
    pub tile: Tile,
    pub controller: Controller,
}

/// How a game is played: an opening controller and an optional sticky switch.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePlan {
    pub opening: Controller,
    pub switch: Option<PhaseSwitch>,
}

impl GamePlan {
    pub fn single(controller: Controller) -> Self {
        GamePlan { opening: controller, switch: None }
    }

    pub fn two_phase(opening: Controller, tile: Tile, closing: Controller) -> Self {
        GamePlan { opening, switch: Some(PhaseSwitch { tile, controller: closing }) }
    }
}

impl fmt::Display for GamePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opening)?;
        if let Some(switch) = &self.switch {
            write!(f, ", then {} from tile {}", switch.controller, switch.tile)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Cap on accepted moves per game; `None` plays until the game ends.
    pub max_moves: Option<u64>,
    /// End the game as soon as a tile reaches 2048.
    pub stop_on_win: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_moves: Some(20_000), stop_on_win: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Terminal,
    Won,
    MoveCap,
    /// A fixed sequence went a full cycle without changing the board.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub max_tile: Tile,
    pub score: Score,
    /// Accepted moves.
    pub moves: u64,
    pub won: bool,
    pub end: EndReason,
    /// Move index at which the plan switched controllers.
    pub switched_at: Option<u64>,
    /// Accepted moves in order.
    #[serde(skip)]
    pub trace: Vec<Move>,
}

/// Play one game to completion.
///
/// ```
/// use ai_2048_heuristics::sim::{play_game, Controller, GamePlan, Limits};
/// use ai_2048_heuristics::strategy::Strategy;
/// use rand::{SeedableRng, rngs::StdRng};
/// let plan = GamePlan::single(Controller::Strategy(Strategy::Corner));
/// let out = play_game(&plan, &mut StdRng::seed_from_u64(7), &Limits::default());
/// assert!(out.max_tile >= 4);
/// assert_eq!(out.moves as usize, out.trace.len());
/// ```
pub fn play_game<R: Rng + ?Sized>(plan: &GamePlan, rng: &mut R, limits: &Limits) -> GameOutcome {
    play_game_observed(plan, rng, limits, |_, _| {})
}

/// Like [`play_game`], calling `observe` with the session after every accepted move.
pub fn play_game_observed<R, F>(
    plan: &GamePlan,
    rng: &mut R,
    limits: &Limits,
    mut observe: F,
) -> GameOutcome
where
    R: Rng + ?Sized,
    F: FnMut(&Session, Move),
{
    let mut session = Session::new(rng);
    let mut trace = Vec::new();
    let mut controller = &plan.opening;
    let mut switched_at = None;
    let mut seq_idx = 0usize;
    let mut dead_attempts = 0usize;

    let end = loop {
        if switched_at.is_none() {
            if let Some(switch) = plan.switch.as_ref().filter(|s| session.highest_tile() >= s.tile) {
                controller = &switch.controller;
                switched_at = Some(trace.len() as u64);
                seq_idx = 0;
                dead_attempts = 0;
            }
        }
        if limits.stop_on_win && session.has_won() {
            break EndReason::Won;
        }
        if session.is_terminal() {
            break EndReason::Terminal;
        }
        if limits.max_moves.is_some_and(|cap| trace.len() as u64 >= cap) {
            break EndReason::MoveCap;
        }
        let dir = match controller {
            Controller::Strategy(strategy) => strategy.select_move(&session, rng),
            Controller::Sequence(seq) => {
                let dir = seq.get(seq_idx);
                seq_idx += 1;
                dir
            }
        };

        if session.apply_move(dir, rng) {
            trace.push(dir);
            dead_attempts = 0;
            observe(&session, dir);
        } else {
            dead_attempts += 1;
            if let Controller::Sequence(seq) = controller {
                if dead_attempts >= seq.len() {
                    break EndReason::Stalled;
                }
            }
        }
    };

    let outcome = GameOutcome {
        max_tile: session.highest_tile(),
        score: session.score(),
        moves: trace.len() as u64,
        won: session.has_won(),
        end,
        switched_at,
        trace,
    };
    debug!(
        "game over ({:?}): max tile {}, score {}, {} moves",
        outcome.end, outcome.max_tile, outcome.score, outcome.moves
    );
    outcome
}

/// Play `runs` games in parallel; game `i` is seeded with `seed + i`.
///
/// Outcomes come back in game order whatever the thread scheduling.
/// `on_done` is called from worker threads as each game finishes.
pub fn run_batch<F>(
    plan: &GamePlan,
    runs: usize,
    seed: u64,
    limits: &Limits,
    on_done: F,
) -> Vec<GameOutcome>
where
    F: Fn(&GameOutcome) + Sync + Send,
{
    info!("playing {runs} games ({plan}), seed {seed}");
    (0..runs)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let outcome = play_game(plan, &mut rng, limits);
            on_done(&outcome);
            outcome
        })
        .collect()
}

/// Aggregate statistics over a batch of games.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub runs: usize,
    pub avg_max_tile: f64,
    pub best_tile: Tile,
    /// Percentage of games that reached `best_tile`.
    pub best_tile_pct: f64,
    /// Percentage of games that reached 2048.
    pub win_pct: f64,
    pub avg_score: f64,
    pub best_score: Score,
    pub avg_moves: f64,
    pub stalled: usize,
    pub tile_histogram: BTreeMap<Tile, usize>,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[GameOutcome]) -> Self {
        let runs = outcomes.len();
        let mut tile_histogram: BTreeMap<Tile, usize> = BTreeMap::new();
        for outcome in outcomes {
            *tile_histogram.entry(outcome.max_tile).or_insert(0) += 1;
        }
        let best_tile = outcomes.iter().map(|o| o.max_tile).max().unwrap_or(0);
        let best_count = tile_histogram.get(&best_tile).copied().unwrap_or(0);
        let mean = |total: f64| if runs == 0 { 0.0 } else { total / runs as f64 };
        let pct = |count: usize| mean(count as f64) * 100.0;
        Summary {
            runs,
            avg_max_tile: mean(outcomes.iter().map(|o| f64::from(o.max_tile)).sum()),
            best_tile,
            best_tile_pct: pct(best_count),
            win_pct: pct(outcomes.iter().filter(|o| o.won).count()),
            avg_score: mean(outcomes.iter().map(|o| o.score as f64).sum()),
            best_score: outcomes.iter().map(|o| o.score).max().unwrap_or(0),
            avg_moves: mean(outcomes.iter().map(|o| o.moves as f64).sum()),
            stalled: outcomes.iter().filter(|o| o.end == EndReason::Stalled).count(),
            tile_histogram,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games played:     {}", self.runs)?;
        writeln!(f, "Average max tile: {:.1}", self.avg_max_tile)?;
        writeln!(f, "Best tile:        {} ({:.1}% of games)", self.best_tile, self.best_tile_pct)?;
        writeln!(f, "Win rate:         {:.1}%", self.win_pct)?;
        writeln!(f, "Average score:    {:.1} (best {})", self.avg_score, self.best_score)?;
        writeln!(f, "Average moves:    {:.1}", self.avg_moves)?;
        if self.stalled > 0 {
            writeln!(f, "Stalled games:    {}", self.stalled)?;
        }
        writeln!(f, "Max tile distribution:")?;
        for (tile, count) in &self.tile_histogram {
            writeln!(f, "  {tile:>6}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sequence(keys: &str) -> Controller {
        Controller::Sequence(keys.parse().unwrap())
    }

    fn outcome(max_tile: Tile, score: Score, moves: u64, end: EndReason) -> GameOutcome {
        GameOutcome {
            max_tile,
            score,
            moves,
            won: max_tile >= 2048,
            end,
            switched_at: None,
            trace: Vec::new(),
        }
    }

    #[test]
    fn batches_are_reproducible() {
        let plan = GamePlan::single(Controller::Strategy(Strategy::Corner));
        let limits = Limits { max_moves: Some(300), ..Limits::default() };
        let a = run_batch(&plan, 6, 17, &limits, |_| {});
        let b = run_batch(&plan, 6, 17, &limits, |_| {});
        assert_eq!(a, b);
        let single = play_game(&plan, &mut StdRng::seed_from_u64(17 + 2), &limits);
        assert_eq!(a[2], single);
    }

    #[test]
    fn on_done_sees_every_game() {
        let plan = GamePlan::single(Controller::Strategy(Strategy::Random));
        let done = AtomicUsize::new(0);
        let outcomes = run_batch(&plan, 5, 0, &Limits::default(), |_| {
            done.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(outcomes.len(), 5);
        assert_eq!(done.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn all_up_sequence_stalls() {
        let plan = GamePlan::single(sequence("w"));
        let out = play_game(&plan, &mut StdRng::seed_from_u64(5), &Limits::default());
        assert_eq!(out.end, EndReason::Stalled);
        assert!(out.trace.iter().all(|&m| m == Move::Up));
    }

    #[test]
    fn cycling_sequence_ends() {
        let plan = GamePlan::single(sequence("sdsa"));
        let out = play_game(&plan, &mut StdRng::seed_from_u64(8), &Limits::default());
        assert!(matches!(out.end, EndReason::Terminal | EndReason::Stalled | EndReason::Won));
        assert!(out.max_tile >= 4);
    }

    #[test]
    fn move_cap_is_respected() {
        let plan = GamePlan::single(Controller::Strategy(Strategy::Expectimax));
        let limits = Limits { max_moves: Some(10), stop_on_win: true };
        let out = play_game(&plan, &mut StdRng::seed_from_u64(1), &limits);
        assert_eq!(out.moves, 10);
        assert_eq!(out.end, EndReason::MoveCap);
        assert_eq!(out.trace.len(), 10);
    }

    #[test]
    fn two_phase_switch_is_immediate_at_low_tile() {
        // Opening tiles are at least 2, so the switch fires before the first move.
        let plan = GamePlan::two_phase(sequence("w"), 2, Controller::Strategy(Strategy::Corner));
        let limits = Limits { max_moves: Some(50), stop_on_win: true };
        let out = play_game(&plan, &mut StdRng::seed_from_u64(3), &limits);
        assert_eq!(out.switched_at, Some(0));
        assert_ne!(out.end, EndReason::Stalled);
        assert!(out.moves <= 50);
    }

    #[test]
    fn two_phase_switch_happens_at_tile() {
        let plan = GamePlan::two_phase(
            Controller::Strategy(Strategy::Corner),
            64,
            Controller::Strategy(Strategy::Adaptive),
        );
        let limits = Limits { max_moves: None, stop_on_win: true };
        let mut rng = StdRng::seed_from_u64(21);
        let mut observed_max = Vec::new();
        let out = play_game_observed(&plan, &mut rng, &limits, |s, _| observed_max.push(s.highest_tile()));
        assert_eq!(observed_max.len() as u64, out.moves);
        match out.switched_at {
            Some(at) => {
                let at = at as usize;
                assert!(at > 0);
                assert!(observed_max[at - 1] >= 64);
                assert!(observed_max[..at - 1].iter().all(|&t| t < 64));
            }
            None => assert!(out.max_tile < 64),
        }
    }

    #[test]
    fn summary_statistics() {
        let outcomes = vec![
            outcome(2048, 20_000, 900, EndReason::Won),
            outcome(1024, 12_000, 700, EndReason::Terminal),
            outcome(2048, 22_000, 950, EndReason::Won),
            outcome(256, 2_000, 200, EndReason::Stalled),
        ];
        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(summary.runs, 4);
        assert_eq!(summary.best_tile, 2048);
        assert_eq!(summary.best_tile_pct, 50.0);
        assert_eq!(summary.win_pct, 50.0);
        assert_eq!(summary.avg_max_tile, (2048.0 + 1024.0 + 2048.0 + 256.0) / 4.0);
        assert_eq!(summary.avg_score, 14_000.0);
        assert_eq!(summary.best_score, 22_000);
        assert_eq!(summary.avg_moves, 687.5);
        assert_eq!(summary.stalled, 1);
        assert_eq!(summary.tile_histogram.get(&2048), Some(&2));
        assert_eq!(summary.tile_histogram.len(), 3);

        let text = summary.to_string();
        assert!(text.contains("Win rate:         50.0%"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["best_tile"], 2048);
        assert_eq!(json["tile_histogram"]["1024"], 1);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = Summary::from_outcomes(&[]);
        assert_eq!(summary.runs, 0);
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.best_tile, 0);
        assert!(summary.tile_histogram.is_empty());
    }

    #[test]
    fn limits_deserialize_with_defaults() {
        let limits: Limits = toml::from_str("stop_on_win = false").unwrap();
        assert_eq!(limits, Limits { max_moves: Some(20_000), stop_on_win: false });
        assert!(toml::from_str::<Limits>("max_rounds = 3").is_err());
    }

    #[test]
    fn plan_display() {
        let plan = GamePlan::two_phase(
            Controller::Strategy(Strategy::Adaptive),
            512,
            sequence("sdsa"),
        );
        assert_eq!(plan.to_string(), "strategy adaptive, then sequence sdsa from tile 512");
    }
}
