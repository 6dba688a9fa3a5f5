//! ai-2048-heuristics: a 2048 game engine + heuristic move selection
//!
//! This crate provides:
//! - A `Board`/`Session` engine with deterministic slides and seeded spawns (`engine`)
//! - Board scoring components and weighted combinations (`evaluator`)
//! - Fixed-order, lookahead and phase-adaptive strategies (`strategy`)
//! - A seeded, parallel game simulator with summary statistics (`sim`)
//! - TOML run configuration (`config`)
//!
//! Quick start:
//! ```
//! use ai_2048_heuristics::engine::Session;
//! use ai_2048_heuristics::strategy::Strategy;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic session with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut session = Session::new(&mut rng);
//! let strategy: Strategy = "adaptive".parse().unwrap();
//! while !session.is_terminal() && !session.has_won() {
//!     let dir = strategy.select_move(&session, &mut rng);
//!     assert!(session.apply_move(dir, &mut rng));
//! }
//! assert!(session.highest_tile() >= 16);
//! ```
//!
//! Note: For convenience, there are also free functions mirroring the `Session` methods
//! (e.g., `engine::new_session`, `engine::apply_move`) that use thread-local RNG.
//! Prefer the methods when you need determinism.
//!
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod sim;
pub mod strategy;
