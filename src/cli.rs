use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::combat::export_csv::write_log_csv;
use crate::combat::rng::{entropy_seed, Rng};
use crate::combat::{BattleSetup, TraceMode};
use crate::data::catalog::{load_catalog, load_data_tuning, Catalog, DEFAULT_DATA_DIR, PRESETS_FILE};
use crate::data::roster::{load_matchup, load_presets, Matchup, Roster};
use crate::data::tuning::TuningTable;
use crate::data::validate::{validate_dataset, ValidationSeverity};
use crate::parallel::WorkerPool;
use crate::server::{self, AppState};
use crate::simulation::{simulate_parallel, AggregateResult, SeedSequence, SkillTrigger, TOP_TRIGGER_COUNT};

pub const DATA_DIR_ENV: &str = "SHINSEN_DATA_DIR";
pub const DEFAULT_MATCHUP_FILE: &str = "matchup.json";
pub const DEFAULT_RUNS: u32 = 500;

const USAGE: &str = "usage: shinsen <simulate|battle|validate|serve>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Simulate,
    Battle,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("simulate") => Some(Command::Simulate),
        Some("battle") => Some(Command::Battle),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Battle) => handle_battle(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// Data directory from `SHINSEN_DATA_DIR`, or `data/`.
pub fn data_dir() -> PathBuf {
    env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Options shared by the commands that take a matchup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Options {
    positional: Vec<String>,
    workers: Option<usize>,
    presets: Option<(String, String)>,
    json: bool,
    csv: bool,
}

fn parse_options(args: &[String]) -> Options {
    let mut opts = Options::default();
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => opts.json = true,
            "--csv" => opts.csv = true,
            "--workers" => {
                opts.workers = Some(parse_u32_arg(rest.next(), "workers", 0) as usize);
            }
            "--vs" => match (rest.next(), rest.next()) {
                (Some(a), Some(b)) => opts.presets = Some((a.clone(), b.clone())),
                _ => eprintln!("--vs needs two preset names, ignoring"),
            },
            _ => opts.positional.push(arg.clone()),
        }
    }
    opts
}

struct Loaded {
    catalog: Catalog,
    tuning: TuningTable,
    matchup: Matchup,
}

fn load_inputs(data_dir: &Path, opts: &Options) -> Result<Loaded, String> {
    let catalog = load_catalog(data_dir).map_err(|e| e.to_string())?;
    let tuning = load_data_tuning(data_dir).map_err(|e| e.to_string())?;
    let matchup = match &opts.presets {
        Some((a, b)) => {
            let presets = load_presets(data_dir.join(PRESETS_FILE)).map_err(|e| e.to_string())?;
            let side = |name: &String| {
                presets
                    .get(name)
                    .map(|preset| preset.entries.clone())
                    .ok_or_else(|| format!("unknown preset '{name}'"))
            };
            Matchup {
                a: side(a)?,
                b: side(b)?,
            }
        }
        None => {
            let path = opts
                .positional
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(DEFAULT_MATCHUP_FILE));
            load_matchup(&path).map_err(|e| e.to_string())?
        }
    };
    Ok(Loaded {
        catalog,
        tuning,
        matchup,
    })
}

fn build_rosters(loaded: &Loaded) -> Result<(Roster, Roster), String> {
    loaded.matchup.build(&loaded.catalog).map_err(|e| e.to_string())
}

/// Index of the first positional argument after the matchup file. With `--vs`
/// there is no matchup file, so numbers start at position 0.
fn numeric_start(opts: &Options) -> usize {
    usize::from(opts.presets.is_none())
}

fn handle_serve() -> i32 {
    let bind_addr = server::bind_addr_from_env();
    let state = match AppState::load(data_dir()) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("failed to load data: {err}");
            return 1;
        }
    };
    match server::run_server(&bind_addr, state) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationReport<'a> {
    generated_at: String,
    seed: u64,
    n: u32,
    workers: usize,
    top_triggers: Vec<SkillTrigger>,
    result: &'a AggregateResult,
}

fn handle_simulate(args: &[String]) -> i32 {
    let opts = parse_options(args);
    let start = numeric_start(&opts);
    let runs = parse_u32_arg(opts.positional.get(start), "n", DEFAULT_RUNS);
    let seed = parse_seed_arg(opts.positional.get(start + 1));
    let pool = opts.workers.map_or_else(WorkerPool::default_workers, WorkerPool::with_workers);

    let loaded = match load_inputs(&data_dir(), &opts) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load inputs: {err}");
            return 1;
        }
    };
    let (roster_a, roster_b) = match build_rosters(&loaded) {
        Ok(rosters) => rosters,
        Err(err) => {
            eprintln!("invalid matchup: {err}");
            return 1;
        }
    };

    let result = match simulate_parallel(
        &roster_a,
        &roster_b,
        &loaded.tuning,
        &SeedSequence::new(seed),
        runs as usize,
        &pool,
    ) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if opts.json {
        let report = SimulationReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            seed,
            n: runs,
            workers: pool.effective_workers(),
            top_triggers: result.top_triggers(TOP_TRIGGER_COUNT),
            result: &result,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize simulation result: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", format_summary(&result, seed));
    }

    0
}

/// Plain-text summary of a batch.
pub fn format_summary(result: &AggregateResult, seed: u64) -> String {
    let mut out = String::new();
    let pct = |rate: f64| rate * 100.0;
    let _ = writeln!(out, "runs: {}  seed: {}", result.runs, seed);
    let _ = writeln!(
        out,
        "A wins: {} ({:.1}%)  B wins: {} ({:.1}%)  draws: {} ({:.1}%)",
        result.counts.a_wins,
        pct(result.win_rate_a),
        result.counts.b_wins,
        pct(result.win_rate_b),
        result.counts.draws,
        pct(result.draw_rate),
    );
    for (side, stats) in [("A", &result.loss_a), ("B", &result.loss_b)] {
        let _ = writeln!(
            out,
            "loss {side}: mean {:.3}  median {:.3}  min {:.3}  max {:.3}  stdev {:.3}",
            stats.mean, stats.median, stats.min, stats.max, stats.stdev
        );
    }
    let _ = writeln!(
        out,
        "mean turns: {:.2}  turn-limit battles: {}",
        result.mean_turns, result.turn_limit_runs
    );
    let top = result.top_triggers(TOP_TRIGGER_COUNT);
    if !top.is_empty() {
        let _ = writeln!(out, "top skill triggers:");
        for trigger in top {
            let _ = writeln!(out, "  {}\t{}", trigger.skill_id, trigger.count);
        }
    }
    out
}

fn handle_battle(args: &[String]) -> i32 {
    let opts = parse_options(args);
    let seed = parse_seed_arg(opts.positional.get(numeric_start(&opts)));

    let loaded = match load_inputs(&data_dir(), &opts) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("failed to load inputs: {err}");
            return 1;
        }
    };
    let (roster_a, roster_b) = match build_rosters(&loaded) {
        Ok(rosters) => rosters,
        Err(err) => {
            eprintln!("invalid matchup: {err}");
            return 1;
        }
    };

    let outcome = BattleSetup::new(&roster_a, &roster_b, &loaded.tuning)
        .map_err(|err| err.to_string())
        .and_then(|setup| {
            setup
                .trace(TraceMode::Events)
                .run(&mut Rng::new(seed))
                .map_err(|err| err.to_string())
        });
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("battle failed: {err}");
            return 1;
        }
    };

    if opts.csv {
        if let Err(err) = write_log_csv(&outcome, std::io::stdout().lock()) {
            eprintln!("failed to write csv: {err}");
            return 1;
        }
        return 0;
    }
    match serde_json::to_string_pretty(&outcome) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize battle outcome: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let dir = args.get(2).map(PathBuf::from).unwrap_or_else(data_dir);

    match validate_dataset(&dir) {
        Ok(report) => {
            for diag in &report.diagnostics {
                eprintln!("- {diag}");
            }
            if report.has_errors() {
                eprintln!(
                    "validation failed: {} error(s)",
                    report.count(ValidationSeverity::Error)
                );
                1
            } else {
                println!("validation passed: {}", dir.display());
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn parse_u32_arg(raw: Option<&String>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                tracing::warn!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

/// Seed from the argument, or fresh OS entropy when it is absent or invalid.
fn parse_seed_arg(raw: Option<&String>) -> u64 {
    if let Some(seed) = raw.and_then(|value| value.parse::<u64>().ok()) {
        return seed;
    }
    if let Some(value) = raw {
        tracing::warn!("invalid seed '{value}', drawing one from the OS");
    }
    match entropy_seed() {
        Ok(seed) => {
            tracing::info!(seed, "using random seed");
            seed
        }
        Err(err) => {
            tracing::warn!(error = %err, "entropy unavailable, using seed 0");
            0
        }
    }
}
