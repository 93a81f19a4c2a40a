use serde::{Deserialize, Serialize};

/// Default troop ceiling for a unit record that does not declare one.
pub const DEFAULT_MAX_TROOPS: u32 = 10_000;

/// Base combat attributes of a unit (valour, intellect, leadership, speed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    #[serde(default, rename = "str")]
    pub strength: f64,
    #[serde(default, rename = "int")]
    pub intellect: f64,
    #[serde(default, rename = "lea")]
    pub leadership: f64,
    #[serde(default, rename = "spd")]
    pub speed: f64,
}

impl BaseStats {
    pub const fn new(strength: f64, intellect: f64, leadership: f64, speed: f64) -> Self {
        Self {
            strength,
            intellect,
            leadership,
            speed,
        }
    }
}

/// A commander as it appears in the unit catalog. Never mutated by a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit_id: String,
    pub name: String,
    #[serde(default)]
    pub base_stats: BaseStats,
    #[serde(default = "default_max_troops", alias = "max_soldiers")]
    pub max_troops: u32,
    #[serde(alias = "unique_skill_id")]
    pub innate_skill_id: String,
}

fn default_max_troops() -> u32 {
    DEFAULT_MAX_TROOPS
}

impl UnitRecord {
    pub fn new(
        unit_id: impl Into<String>,
        name: impl Into<String>,
        base_stats: BaseStats,
        max_troops: u32,
        innate_skill_id: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            name: name.into(),
            base_stats,
            max_troops,
            innate_skill_id: innate_skill_id.into(),
        }
    }
}
