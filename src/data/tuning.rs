//! Tuning table: named numeric knobs consumed by the damage and heal formulas.
//!
//! Files may be JSON or YAML. Boolean entries (e.g. `"confusion_skip_action": true`)
//! are accepted and stored as `1.0` / `0.0`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DataError};

/// Coefficient names understood by the standard formulas.
pub mod keys {
    pub const NORMAL_ATTACK_RATE: &str = "normal_attack_rate";
    pub const ATTACK_MIX_LEA: &str = "attack_mix_lea";
    pub const DEFENSE_FACTOR_PHYSICAL: &str = "defense_factor_physical";
    pub const PHYSICAL_SCALE: &str = "physical_scale";
    pub const DEFENSE_FACTOR_STRATEGY: &str = "defense_factor_strategy";
    pub const STRATEGY_SCALE: &str = "strategy_scale";
    pub const HEAL_SCALE: &str = "heal_scale";
    pub const RANDOM_MIN: &str = "random_min";
    pub const RANDOM_MAX: &str = "random_max";
    pub const CONFUSION_SKIP_ACTION: &str = "confusion_skip_action";
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Flag(bool),
}

impl From<RawValue> for f64 {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Number(v) => v,
            RawValue::Flag(true) => 1.0,
            RawValue::Flag(false) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, RawValue>", into = "BTreeMap<String, f64>")]
pub struct TuningTable {
    values: BTreeMap<String, f64>,
}

impl From<BTreeMap<String, RawValue>> for TuningTable {
    fn from(raw: BTreeMap<String, RawValue>) -> Self {
        Self {
            values: raw.into_iter().map(|(k, v)| (k, f64::from(v))).collect(),
        }
    }
}

impl From<TuningTable> for BTreeMap<String, f64> {
    fn from(table: TuningTable) -> Self {
        table.values
    }
}

impl TuningTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference coefficients for every formula the engine ships with.
    pub fn standard() -> Self {
        Self::new()
            .with(keys::NORMAL_ATTACK_RATE, 1.0)
            .with(keys::ATTACK_MIX_LEA, 0.5)
            .with(keys::DEFENSE_FACTOR_PHYSICAL, 0.7)
            .with(keys::PHYSICAL_SCALE, 20.0)
            .with(keys::DEFENSE_FACTOR_STRATEGY, 0.8)
            .with(keys::STRATEGY_SCALE, 22.0)
            .with(keys::HEAL_SCALE, 18.0)
            .with(keys::RANDOM_MIN, 0.95)
            .with(keys::RANDOM_MAX, 1.05)
            .with(keys::CONFUSION_SKIP_ACTION, 1.0)
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Looks up a key that a formula depends on. Missing keys are a
    /// configuration error; nothing is defaulted here.
    pub fn require(&self, key: &str) -> Result<f64, ConfigError> {
        let value = self
            .get(key)
            .ok_or_else(|| ConfigError::MissingTuningKey(key.to_string()))?;
        if !value.is_finite() {
            return Err(ConfigError::InvalidTuningValue {
                key: key.to_string(),
                value,
            });
        }
        Ok(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Load a tuning table from a `.json`, `.yaml` or `.yml` file.
pub fn load_tuning(path: impl AsRef<Path>) -> Result<TuningTable, DataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|source| DataError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&raw).map_err(|source| DataError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
