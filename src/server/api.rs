use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::rng::entropy_seed;
use crate::data::catalog::{load_catalog, load_data_tuning, Catalog, PRESETS_FILE};
use crate::data::roster::{load_presets, Presets, Roster, RosterEntry, Side};
use crate::data::tuning::TuningTable;
use crate::error::{ConfigError, DataError, SimError};
use crate::parallel::WorkerPool;
use crate::simulation::{simulate_parallel, AggregateResult, SeedSequence, SkillTrigger, TOP_TRIGGER_COUNT};

pub const DEFAULT_RUNS: u32 = 500;
pub const MAX_RUNS: u32 = 100_000;

/// Catalog, tuning and presets loaded once at startup and shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub tuning: TuningTable,
    pub presets: Presets,
    pub pool: WorkerPool,
}

impl AppState {
    pub fn new(catalog: Catalog, tuning: TuningTable) -> Self {
        Self {
            catalog,
            tuning,
            presets: Presets::new(),
            pool: WorkerPool::default(),
        }
    }

    /// Load the data directory; `presets.json` is optional.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let data_dir = data_dir.as_ref();
        let mut state = Self::new(load_catalog(data_dir)?, load_data_tuning(data_dir)?);
        let presets_path = data_dir.join(PRESETS_FILE);
        if presets_path.exists() {
            state.presets = load_presets(&presets_path)?;
        }
        Ok(state)
    }
}

pub fn health_payload(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "shinsen-api",
        "version": env!("CARGO_PKG_VERSION"),
        "units": state.catalog.unit_count(),
        "skills": state.catalog.skill_count(),
    }))
}

pub fn units_payload(state: &AppState) -> Result<String, serde_json::Error> {
    let units: Vec<_> = state.catalog.units().collect();
    serde_json::to_string_pretty(&units)
}

pub fn skills_payload(state: &AppState) -> Result<String, serde_json::Error> {
    let skills: Vec<_> = state.catalog.skills().collect();
    serde_json::to_string_pretty(&skills)
}

pub fn tuning_payload(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&state.tuning)
}

pub fn presets_payload(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&state.presets)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateRequest {
    #[serde(alias = "A")]
    pub a: Vec<RosterEntry>,
    #[serde(alias = "B")]
    pub b: Vec<RosterEntry>,
    pub n: Option<u32>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub status: &'static str,
    pub n: u32,
    pub seed: u64,
    pub win_rate_a_95_ci: [f64; 2],
    pub top_triggers: Vec<SkillTrigger>,
    pub result: AggregateResult,
}

#[derive(Debug)]
pub enum SimulateError {
    Parse(serde_json::Error),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for SimulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Internal(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for SimulateError {}

impl From<SimError> for SimulateError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::Configuration(config) => Self::Config(config),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Normal-approximation interval for a win rate.
fn binomial_95_ci(wins: u64, n: u64) -> [f64; 2] {
    if n == 0 {
        return [0.0, 0.0];
    }
    let p = wins as f64 / n as f64;
    let z = 1.96;
    let se = (p * (1.0 - p) / n as f64).sqrt();
    [(p - z * se).max(0.0), (p + z * se).min(1.0)]
}

pub fn simulate_payload(state: &AppState, body: &str) -> Result<String, SimulateError> {
    let req: SimulateRequest = serde_json::from_str(body).map_err(SimulateError::Parse)?;
    let n = req.n.unwrap_or(DEFAULT_RUNS).min(MAX_RUNS);
    let seed = match req.seed {
        Some(seed) => seed,
        None => entropy_seed().map_err(|e| SimulateError::Internal(e.to_string()))?,
    };

    let roster_a = Roster::from_catalog(Side::A, &state.catalog, &req.a).map_err(SimulateError::Config)?;
    let roster_b = Roster::from_catalog(Side::B, &state.catalog, &req.b).map_err(SimulateError::Config)?;
    let result = simulate_parallel(
        &roster_a,
        &roster_b,
        &state.tuning,
        &SeedSequence::new(seed),
        n as usize,
        &state.pool,
    )?;

    let response = SimulateResponse {
        status: "ok",
        n,
        seed,
        win_rate_a_95_ci: binomial_95_ci(result.counts.a_wins, result.runs),
        top_triggers: result.top_triggers(TOP_TRIGGER_COUNT),
        result,
    };
    serde_json::to_string_pretty(&response).map_err(|e| SimulateError::Internal(e.to_string()))
}
