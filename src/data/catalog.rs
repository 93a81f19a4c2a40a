//! Immutable lookup of unit and skill records.
//! Files live under the data directory as `units.json` and `skills.json` (flat JSON arrays).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::data::skill::SkillRecord;
use crate::data::tuning::{load_tuning, TuningTable};
use crate::data::unit::UnitRecord;
use crate::error::{ConfigError, DataError};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const UNITS_FILE: &str = "units.json";
pub const SKILLS_FILE: &str = "skills.json";
pub const TUNING_FILE: &str = "tuning.json";
pub const TUNING_YAML_FILE: &str = "tuning.yaml";
pub const PRESETS_FILE: &str = "presets.json";

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: BTreeMap<String, UnitRecord>,
    skills: BTreeMap<String, SkillRecord>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate identifiers.
    pub fn new(units: Vec<UnitRecord>, skills: Vec<SkillRecord>) -> Result<Self, DataError> {
        let mut catalog = Self::default();
        for unit in units {
            if catalog.units.contains_key(&unit.unit_id) {
                return Err(DataError::DuplicateId {
                    kind: "unit",
                    id: unit.unit_id,
                });
            }
            catalog.units.insert(unit.unit_id.clone(), unit);
        }
        for skill in skills {
            if catalog.skills.contains_key(&skill.skill_id) {
                return Err(DataError::DuplicateId {
                    kind: "skill",
                    id: skill.skill_id,
                });
            }
            catalog.skills.insert(skill.skill_id.clone(), skill);
        }
        Ok(catalog)
    }

    pub fn unit(&self, unit_id: &str) -> Option<&UnitRecord> {
        self.units.get(unit_id)
    }

    pub fn skill(&self, skill_id: &str) -> Option<&SkillRecord> {
        self.skills.get(skill_id)
    }

    pub fn require_unit(&self, unit_id: &str) -> Result<&UnitRecord, ConfigError> {
        self.unit(unit_id)
            .ok_or_else(|| ConfigError::UnknownUnit(unit_id.to_string()))
    }

    pub fn require_skill(&self, unit_id: &str, skill_id: &str) -> Result<&SkillRecord, ConfigError> {
        self.skill(skill_id).ok_or_else(|| ConfigError::UnknownSkill {
            unit_id: unit_id.to_string(),
            skill_id: skill_id.to_string(),
        })
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitRecord> {
        self.units.values()
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillRecord> {
        self.skills.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_units(path: impl AsRef<Path>) -> Result<Vec<UnitRecord>, DataError> {
    read_json(path.as_ref())
}

pub fn load_skills(path: impl AsRef<Path>) -> Result<Vec<SkillRecord>, DataError> {
    read_json(path.as_ref())
}

pub fn load_catalog(data_dir: impl AsRef<Path>) -> Result<Catalog, DataError> {
    let data_dir = data_dir.as_ref();
    let units = load_units(data_dir.join(UNITS_FILE))?;
    let skills = load_skills(data_dir.join(SKILLS_FILE))?;
    tracing::debug!(
        units = units.len(),
        skills = skills.len(),
        dir = %data_dir.display(),
        "loaded catalog"
    );
    Catalog::new(units, skills)
}

/// Path of the tuning file in `data_dir`: `tuning.json` if present, else `tuning.yaml`.
pub fn tuning_path(data_dir: impl AsRef<Path>) -> PathBuf {
    let data_dir = data_dir.as_ref();
    let json = data_dir.join(TUNING_FILE);
    let yaml = data_dir.join(TUNING_YAML_FILE);
    if json.exists() {
        if yaml.exists() {
            tracing::warn!(dir = %data_dir.display(), "both tuning.json and tuning.yaml present, using json");
        }
        return json;
    }
    if yaml.exists() {
        yaml
    } else {
        json
    }
}

pub fn load_data_tuning(data_dir: impl AsRef<Path>) -> Result<TuningTable, DataError> {
    load_tuning(tuning_path(data_dir))
}
