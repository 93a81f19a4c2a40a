//! Error taxonomy for the battle engine and its data layer.
//!
//! The engine itself only ever fails with [SimError]: either the inputs were
//! unusable ([ConfigError]) or a formula produced a state that must not exist
//! (`InvariantViolation`). File loading lives outside the engine and has its
//! own [DataError].

use std::path::PathBuf;

use thiserror::Error;

use crate::data::roster::Side;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("roster for side {0} has no units")]
    EmptyRoster(Side),

    #[error("roster for side {side} has {len} units (at most {max} allowed)")]
    RosterTooLarge { side: Side, len: usize, max: usize },

    #[error("unit '{unit_id}' appears more than once in side {side}")]
    DuplicateUnit { side: Side, unit_id: String },

    #[error("unit '{0}' has no innate skill")]
    MissingInnateSkill(String),

    #[error("unit '{unit_id}' has more than one {slot} skill")]
    DuplicateSlot { unit_id: String, slot: &'static str },

    #[error("unknown unit id '{0}'")]
    UnknownUnit(String),

    #[error("unit '{unit_id}' references unknown skill '{skill_id}'")]
    UnknownSkill { unit_id: String, skill_id: String },

    #[error("skill '{skill_id}' has activation probability {value} outside [0, 1]")]
    ProbabilityOutOfRange { skill_id: String, value: f64 },

    #[error("skill '{0}' declares no effects")]
    EmptyEffects(String),

    #[error("skill '{skill_id}' has an invalid effect: {reason}")]
    InvalidEffect { skill_id: String, reason: String },

    #[error("unit '{0}' enters battle with zero troops")]
    NoTroops(String),

    #[error("tuning table is missing required key '{0}'")]
    MissingTuningKey(String),

    #[error("tuning key '{key}' has unusable value {value}")]
    InvalidTuningValue { key: String, value: f64 },

    #[error("simulation batch size must be at least 1")]
    EmptyBatch,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl SimError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse json '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to parse yaml '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate {kind} id '{id}' in catalog")]
    DuplicateId { kind: &'static str, id: String },
}

pub type SimResult<T> = std::result::Result<T, SimError>;
