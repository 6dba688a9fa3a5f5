use ai_2048_heuristics::config::{Config, ControllerSpec, SwitchSpec};
use ai_2048_heuristics::engine::Tile;
use ai_2048_heuristics::sim::{self, Limits, Summary};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.cmd {
        Cmd::Simulate(sim_args) => simulate(sim_args),
        Cmd::Play { controller, seed, max_moves } => play(controller, seed, max_moves),
    }
}

#[derive(Debug, Parser)]
#[command(name = "ai-2048-heuristics", about = "Play and benchmark heuristic 2048 strategies")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Simulate many games and print summary statistics
    Simulate(SimulateArgs),
    /// Play one game, printing the board after every move
    Play {
        #[command(flatten)]
        controller: ControllerArgs,
        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
    },
}

#[derive(Debug, clap::Args)]
struct ControllerArgs {
    /// Strategy name (corner, center, opportunistic, monotonicity, expectimax, adaptive, weighted-combo, random)
    #[arg(long, conflicts_with = "sequence")]
    strategy: Option<String>,
    /// Move sequence, as WASD keys ("sdsa") or names ("down,right")
    #[arg(long)]
    sequence: Option<String>,
}

impl ControllerArgs {
    fn spec(&self) -> Option<ControllerSpec> {
        match (&self.strategy, &self.sequence) {
            (Some(name), _) => Some(ControllerSpec::Strategy(name.clone())),
            (None, Some(keys)) => Some(ControllerSpec::Sequence(keys.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Debug, clap::Args)]
struct SimulateArgs {
    /// TOML run configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(flatten)]
    controller: ControllerArgs,
    /// Number of games
    #[arg(long)]
    runs: Option<usize>,
    /// Batch seed; game i uses seed + i
    #[arg(long)]
    seed: Option<u64>,
    /// Switch controllers once this tile is reached
    #[arg(long)]
    switch_tile: Option<Tile>,
    /// Strategy used after the switch
    #[arg(long, conflicts_with = "then_sequence", requires = "switch_tile")]
    then_strategy: Option<String>,
    /// Move sequence used after the switch
    #[arg(long, requires = "switch_tile")]
    then_sequence: Option<String>,
    /// Per-game cap on accepted moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    plan: String,
    seed: u64,
    elapsed_s: f64,
    summary: &'a Summary,
}

fn build_config(args: &SimulateArgs) -> Result<Config> {
    let mut cfg = match (&args.config, args.controller.spec()) {
        (Some(path), spec) => {
            let mut cfg = Config::from_toml(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            if let Some(spec) = spec {
                cfg.opening = spec;
            }
            cfg
        }
        (None, Some(spec)) => Config::new(spec),
        (None, None) => bail!("pass --config FILE or one of --strategy / --sequence"),
    };
    if let Some(runs) = args.runs {
        cfg.runs = runs;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    if let Some(max_moves) = args.max_moves {
        cfg.limits.max_moves = Some(max_moves);
    }
    if let Some(tile) = args.switch_tile {
        let controller = match (&args.then_strategy, &args.then_sequence) {
            (Some(name), _) => ControllerSpec::Strategy(name.clone()),
            (None, Some(keys)) => ControllerSpec::Sequence(keys.clone()),
            (None, None) => match cfg.switch.take() {
                Some(existing) => existing.controller,
                None => bail!("--switch-tile needs --then-strategy or --then-sequence"),
            },
        };
        cfg.switch = Some(SwitchSpec { tile, controller });
    }
    cfg.validate()?;
    Ok(cfg)
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let cfg = build_config(&args)?;
    let plan = cfg.plan()?;
    let seed = cfg.seed.unwrap_or_else(rand::random);
    let runs = cfg.runs;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(runs as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:40}] {pos}/{len} games ({per_sec})")?
                .progress_chars("=> "),
        );
        pb
    };

    let start = Instant::now();
    let outcomes = sim::run_batch(&plan, runs, seed, &cfg.limits, |_| pb.inc(1));
    pb.finish_and_clear();
    let elapsed = start.elapsed().as_secs_f64();
    let summary = Summary::from_outcomes(&outcomes);
    info!("{runs} games in {elapsed:.2}s");

    if args.json {
        let report = Report { plan: plan.to_string(), seed, elapsed_s: elapsed, summary: &summary };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Plan: {plan} (seed {seed})");
        print!("{summary}");
    }
    Ok(())
}

fn play(controller: ControllerArgs, seed: Option<u64>, max_moves: Option<u64>) -> Result<()> {
    let spec = controller.spec().unwrap_or_else(|| ControllerSpec::Strategy("adaptive".to_string()));
    let mut cfg = Config::new(spec);
    cfg.limits = Limits { max_moves, stop_on_win: false };
    let plan = cfg.plan()?;
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    info!("playing {plan} with seed {seed}");
    let outcome = sim::play_game_observed(&plan, &mut rng, &cfg.limits, |session, dir| {
        println!("{dir} (score {})", session.score());
        println!("{}", session.board());
    });
    println!(
        "Game over ({:?}): max tile {}, score {}, moves {}",
        outcome.end, outcome.max_tile, outcome.score, outcome.moves
    );
    Ok(())
}
