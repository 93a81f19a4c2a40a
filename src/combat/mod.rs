pub mod engine;
pub mod export_csv;
pub mod formulas;
pub mod rng;
pub mod state;
pub mod targeting;

pub use engine::{
    effect_kinds, resolve, Action, BattleSetup, Decision, EffectRecord, LogEntry, Outcome, Phase,
    TraceMode, TurnSnapshot, UnitOutcome, Winner,
};
pub use export_csv::{log_to_csv_string, write_log_csv, CSV_COLUMNS};
pub use formulas::{required_keys, BattleRules, CoefficientModel, DamageModel, StatLine};
pub use rng::{derive_seed, RandomSource, Rng, ScriptedSource};
pub use state::{BattleState, UnitRef, MAX_TURNS};
pub use targeting::{select_targets, weakest_allies};
