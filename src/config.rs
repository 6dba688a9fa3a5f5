//! TOML run configuration.
//!
//! ```toml
//! runs = 50
//! seed = 7
//! opening = { strategy = "adaptive" }
//!
//! [switch]
//! tile = 512
//! controller = { sequence = "sdsa" }
//!
//! [limits]
//! max_moves = 20000
//! stop_on_win = true
//!
//! # only used by "weighted-combo"
//! [weights]
//! monotonicity = 1.0
//! empty = 2.7
//! ```

use std::io::Read;
use std::path::Path;

use crate::engine::{EngineError, MoveSequence, Tile};
use crate::evaluator::{EvalError, Weights};
use crate::sim::{Controller, GamePlan, Limits, PhaseSwitch};
use crate::strategy::{Strategy, StrategyError};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("runs must be at least 1")]
    InvalidRuns,
    #[error("switch tile {0} is not a power of two >= 2")]
    InvalidSwitchTile(Tile),
}

/// A controller as written in the file: a strategy name or a move sequence.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerSpec {
    Strategy(String),
    Sequence(String),
}

impl ControllerSpec {
    /// Resolve into a playable controller; `weights` override the
    /// weighted-combo defaults.
    pub fn resolve(&self, weights: Option<&Weights>) -> Result<Controller, ConfigError> {
        match self {
            ControllerSpec::Strategy(name) => {
                let strategy = match (name.parse::<Strategy>()?, weights) {
                    (Strategy::WeightedCombo(_), Some(w)) => Strategy::weighted(*w)?,
                    (strategy, _) => strategy,
                };
                Ok(Controller::Strategy(strategy))
            }
            ControllerSpec::Sequence(keys) => Ok(Controller::Sequence(keys.parse::<MoveSequence>()?)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct SwitchSpec {
    pub tile: Tile,
    pub controller: ControllerSpec,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "defaults::runs")]
    pub runs: usize,
    /// Batch seed; the binary draws one at random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    pub opening: ControllerSpec,
    #[serde(default)]
    pub switch: Option<SwitchSpec>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub weights: Option<Weights>,
}

impl Config {
    /// Default settings around a single controller.
    pub fn new(opening: ControllerSpec) -> Self {
        Config {
            runs: defaults::runs(),
            seed: None,
            opening,
            switch: None,
            limits: Limits::default(),
            weights: None,
        }
    }

    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::InvalidRuns);
        }
        if let Some(switch) = &self.switch {
            if switch.tile < 2 || !switch.tile.is_power_of_two() {
                return Err(ConfigError::InvalidSwitchTile(switch.tile));
            }
        }
        if let Some(weights) = &self.weights {
            weights.validate()?;
        }
        Ok(())
    }

    /// Resolve every controller name into a [`GamePlan`].
    pub fn plan(&self) -> Result<GamePlan, ConfigError> {
        let weights = self.weights.as_ref();
        let opening = self.opening.resolve(weights)?;
        let switch = match &self.switch {
            Some(spec) => Some(PhaseSwitch { tile: spec.tile, controller: spec.controller.resolve(weights)? }),
            None => None,
        };
        Ok(GamePlan { opening, switch })
    }
}

mod defaults {
    pub fn runs() -> usize { 50 }
}
