pub mod catalog;
pub mod roster;
pub mod skill;
pub mod tuning;
pub mod unit;
pub mod validate;

pub use catalog::{load_catalog, Catalog, DEFAULT_DATA_DIR};
pub use roster::{Combatant, EquippedSkill, Matchup, Preset, Presets, Roster, RosterEntry, Side};
pub use skill::{
    Duration, Effect, EffectKind, ModifierStat, SkillRecord, SkillSlot, StatusKind, TargetSelector,
    Timing,
};
pub use tuning::{keys, load_tuning, TuningTable};
pub use unit::{BaseStats, UnitRecord};
