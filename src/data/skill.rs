use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Assignment category a skill occupies on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSlot {
    /// 固有: the unit's own skill, always present.
    #[serde(alias = "unique")]
    Innate,
    /// 20Lv: unlocked at level twenty.
    #[serde(alias = "learn20")]
    Learned,
    /// 覚醒: unlocked by awakening.
    #[serde(alias = "awaken")]
    Awakened,
}

impl Default for SkillSlot {
    fn default() -> Self {
        Self::Learned
    }
}

impl SkillSlot {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Innate => "固有",
            Self::Learned => "20Lv",
            Self::Awakened => "覚醒",
        }
    }
}

/// When in the turn a skill is checked for activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    #[serde(alias = "start")]
    TurnStart,
    AfterAttack,
}

impl Default for Timing {
    fn default() -> Self {
        Self::AfterAttack
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelector {
    #[serde(rename = "self")]
    SelfUnit,
    /// The living ally with the fewest troops (the actor included).
    #[serde(alias = "ally_lowest")]
    Ally,
    AllAllies,
    /// One living enemy, picked uniformly.
    Enemy,
    AllEnemies,
    /// Every living unit on both sides.
    All,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self::Enemy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierStat {
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "int")]
    Intellect,
    #[serde(rename = "lea")]
    Leadership,
    #[serde(rename = "spd")]
    Speed,
    /// Fractional change to damage this unit deals.
    DamageDealt,
    /// Fractional change to damage this unit receives.
    DamageTaken,
}

/// How long a modifier or status lasts once applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    ThisTurn,
    Turns(u32),
    Battle,
}

impl Default for Duration {
    fn default() -> Self {
        Self::Battle
    }
}

impl Duration {
    /// Number of end-of-turn ticks the effect survives; `None` means permanent.
    pub const fn ticks(self) -> Option<u32> {
        match self {
            Self::ThisTurn => Some(1),
            Self::Turns(n) => Some(n),
            Self::Battle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The unit loses its actions while the status lasts.
    Confusion,
}

fn unit_rate() -> f64 {
    1.0
}

fn one_turn() -> u32 {
    1
}

fn one_target() -> u32 {
    1
}

/// One operation a skill performs when it fires. `target` overrides the
/// skill's selector for this effect only. Unknown fields are rejected so a
/// misspelled parameter never silently falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Effect {
    #[serde(alias = "physical")]
    PhysicalDamage {
        #[serde(default = "unit_rate")]
        rate: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
    #[serde(alias = "strategy")]
    StrategyDamage {
        #[serde(default = "unit_rate")]
        rate: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
    FixedDamage {
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
    Heal {
        #[serde(default = "unit_rate")]
        rate: f64,
        /// With the `ally` selector, how many of the weakest living allies are healed.
        #[serde(default = "one_target")]
        count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
    Modifier {
        stat: ModifierStat,
        amount: f64,
        #[serde(default)]
        duration: Duration,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
    Status {
        kind: StatusKind,
        #[serde(default = "one_turn")]
        turns: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<TargetSelector>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    PhysicalDamage,
    StrategyDamage,
    FixedDamage,
    Heal,
    Modifier,
    Status,
}

impl EffectKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PhysicalDamage => "physical_damage",
            Self::StrategyDamage => "strategy_damage",
            Self::FixedDamage => "fixed_damage",
            Self::Heal => "heal",
            Self::Modifier => "modifier",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::PhysicalDamage { .. } => EffectKind::PhysicalDamage,
            Self::StrategyDamage { .. } => EffectKind::StrategyDamage,
            Self::FixedDamage { .. } => EffectKind::FixedDamage,
            Self::Heal { .. } => EffectKind::Heal,
            Self::Modifier { .. } => EffectKind::Modifier,
            Self::Status { .. } => EffectKind::Status,
        }
    }

    pub fn target_override(&self) -> Option<TargetSelector> {
        match self {
            Self::PhysicalDamage { target, .. }
            | Self::StrategyDamage { target, .. }
            | Self::FixedDamage { target, .. }
            | Self::Heal { target, .. }
            | Self::Modifier { target, .. }
            | Self::Status { target, .. } => *target,
        }
    }

    /// How many units the `ally` selector picks for this effect.
    pub fn ally_count(&self) -> usize {
        match self {
            Self::Heal { count, .. } => *count as usize,
            _ => 1,
        }
    }

    fn validate(&self, skill_id: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEffect {
            skill_id: skill_id.to_string(),
            reason,
        };
        match self {
            Self::PhysicalDamage { rate, .. }
            | Self::StrategyDamage { rate, .. }
            | Self::Heal { rate, .. } => {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(invalid(format!("{} rate {rate} must be finite and >= 0", self.kind())));
                }
                if let Self::Heal { count: 0, .. } = self {
                    return Err(invalid("heal targets zero allies".to_string()));
                }
            }
            Self::FixedDamage { amount, .. } => {
                if !amount.is_finite() || *amount < 0.0 {
                    return Err(invalid(format!("fixed damage {amount} must be finite and >= 0")));
                }
            }
            Self::Modifier {
                amount, duration, ..
            } => {
                if !amount.is_finite() {
                    return Err(invalid(format!("modifier amount {amount} is not finite")));
                }
                if *duration == Duration::Turns(0) {
                    return Err(invalid("modifier lasts zero turns".to_string()));
                }
            }
            Self::Status { turns, .. } => {
                if *turns == 0 {
                    return Err(invalid("status lasts zero turns".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// A combat skill (戦法) as stored in the skill catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub skill_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub slot: SkillSlot,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub target: TargetSelector,
    /// Activation probability in [0, 1].
    #[serde(rename = "proc", alias = "activation")]
    pub activation: f64,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl SkillRecord {
    pub fn new(
        skill_id: impl Into<String>,
        name: impl Into<String>,
        timing: Timing,
        target: TargetSelector,
        activation: f64,
        effects: Vec<Effect>,
    ) -> Self {
        Self {
            skill_id: skill_id.into(),
            name: name.into(),
            display_name: None,
            slot: SkillSlot::default(),
            timing,
            target,
            activation,
            effects,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Checks the record's own invariants: probability range and a non-empty,
    /// well-formed effect list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.activation.is_finite() || !(0.0..=1.0).contains(&self.activation) {
            return Err(ConfigError::ProbabilityOutOfRange {
                skill_id: self.skill_id.clone(),
                value: self.activation,
            });
        }
        if self.effects.is_empty() {
            return Err(ConfigError::EmptyEffects(self.skill_id.clone()));
        }
        for effect in &self.effects {
            effect.validate(&self.skill_id)?;
        }
        Ok(())
    }
}
