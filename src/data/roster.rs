//! Rosters: one side's units with their assigned skills, built from catalog ids.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::catalog::Catalog;
use crate::data::skill::{SkillRecord, SkillSlot};
use crate::data::unit::UnitRecord;
use crate::error::{ConfigError, DataError};

pub const MAX_ROSTER_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog identifiers plus slot assignment for one roster position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub unit_id: String,
    /// Starting troops; defaults to the unit's maximum and is clamped to it.
    #[serde(default, alias = "soldiers", skip_serializing_if = "Option::is_none")]
    pub troops: Option<u32>,
    #[serde(default, alias = "learn20", skip_serializing_if = "Option::is_none")]
    pub learned: Option<String>,
    #[serde(default, alias = "awaken", skip_serializing_if = "Option::is_none")]
    pub awakened: Option<String>,
}

impl RosterEntry {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            troops: None,
            learned: None,
            awakened: None,
        }
    }

    pub fn with_troops(mut self, troops: u32) -> Self {
        self.troops = Some(troops);
        self
    }

    pub fn with_learned(mut self, skill_id: impl Into<String>) -> Self {
        self.learned = Some(skill_id.into());
        self
    }

    pub fn with_awakened(mut self, skill_id: impl Into<String>) -> Self {
        self.awakened = Some(skill_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquippedSkill {
    pub slot: SkillSlot,
    pub skill: SkillRecord,
}

/// A unit ready for battle: catalog record, starting troops and equipped skills.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combatant {
    pub unit: UnitRecord,
    pub troops: u32,
    pub skills: Vec<EquippedSkill>,
}

impl Combatant {
    pub fn new(unit: UnitRecord, troops: u32, skills: Vec<EquippedSkill>) -> Self {
        Self {
            unit,
            troops,
            skills,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit.unit_id
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.troops == 0 {
            return Err(ConfigError::NoTroops(self.unit.unit_id.clone()));
        }
        let mut seen = HashSet::new();
        for equipped in &self.skills {
            if !seen.insert(equipped.slot) {
                return Err(ConfigError::DuplicateSlot {
                    unit_id: self.unit.unit_id.clone(),
                    slot: equipped.slot.label(),
                });
            }
            equipped.skill.validate()?;
        }
        if !seen.contains(&SkillSlot::Innate) {
            return Err(ConfigError::MissingInnateSkill(self.unit.unit_id.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    units: Vec<Combatant>,
}

impl Roster {
    /// Wraps combatants without checking them; [Roster::validate] runs before every battle.
    pub fn new(units: Vec<Combatant>) -> Self {
        Self { units }
    }

    /// Resolve entries against the catalog. Skills come out in slot order:
    /// innate, level 20, awakened.
    pub fn from_catalog(
        side: Side,
        catalog: &Catalog,
        entries: &[RosterEntry],
    ) -> Result<Self, ConfigError> {
        let mut units = Vec::with_capacity(entries.len());
        for entry in entries {
            let unit = catalog.require_unit(&entry.unit_id)?;
            let mut skills = vec![EquippedSkill {
                slot: SkillSlot::Innate,
                skill: catalog
                    .require_skill(&unit.unit_id, &unit.innate_skill_id)?
                    .clone(),
            }];
            for (slot, skill_id) in [
                (SkillSlot::Learned, &entry.learned),
                (SkillSlot::Awakened, &entry.awakened),
            ] {
                if let Some(skill_id) = skill_id {
                    skills.push(EquippedSkill {
                        slot,
                        skill: catalog.require_skill(&unit.unit_id, skill_id)?.clone(),
                    });
                }
            }
            let troops = entry
                .troops
                .map_or(unit.max_troops, |troops| troops.min(unit.max_troops));
            units.push(Combatant::new(unit.clone(), troops, skills));
        }
        let roster = Self::new(units);
        roster.validate(side)?;
        Ok(roster)
    }

    pub fn validate(&self, side: Side) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::EmptyRoster(side));
        }
        if self.units.len() > MAX_ROSTER_SIZE {
            return Err(ConfigError::RosterTooLarge {
                side,
                len: self.units.len(),
                max: MAX_ROSTER_SIZE,
            });
        }
        let mut ids = HashSet::new();
        for combatant in &self.units {
            if !ids.insert(combatant.unit_id()) {
                return Err(ConfigError::DuplicateUnit {
                    side,
                    unit_id: combatant.unit_id().to_string(),
                });
            }
            combatant.validate()?;
        }
        Ok(())
    }

    pub fn units(&self) -> &[Combatant] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total_troops(&self) -> u64 {
        self.units.iter().map(|c| u64::from(c.troops)).sum()
    }
}

/// Both sides of a battle as catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    #[serde(alias = "A")]
    pub a: Vec<RosterEntry>,
    #[serde(alias = "B")]
    pub b: Vec<RosterEntry>,
}

impl Matchup {
    pub fn build(&self, catalog: &Catalog) -> Result<(Roster, Roster), ConfigError> {
        Ok((
            Roster::from_catalog(Side::A, catalog, &self.a)?,
            Roster::from_catalog(Side::B, catalog, &self.b)?,
        ))
    }
}

/// A saved side-A lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(rename = "A", alias = "a")]
    pub entries: Vec<RosterEntry>,
}

pub type Presets = BTreeMap<String, Preset>;

pub fn load_presets(path: impl AsRef<Path>) -> Result<Presets, DataError> {
    load_json_file(path.as_ref())
}

pub fn load_matchup(path: impl AsRef<Path>) -> Result<Matchup, DataError> {
    load_json_file(path.as_ref())
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}
