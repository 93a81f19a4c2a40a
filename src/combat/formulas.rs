//! Damage and heal formulas.
//!
//! The turn loop never computes a number itself: it hands the effective stats
//! of both parties to a [DamageModel] and applies modifiers, variance and
//! clamping to whatever comes back. [CoefficientModel] is the standard model,
//! driven entirely by named coefficients from the tuning table.

use std::collections::BTreeSet;

use crate::data::skill::EffectKind;
use crate::data::tuning::{keys, TuningTable};
use crate::error::{ConfigError, SimError};

/// Effective attributes of one party at the moment an effect is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLine {
    pub strength: f64,
    pub intellect: f64,
    pub leadership: f64,
    /// Current troops over starting troops, in [0, 1].
    pub troop_fraction: f64,
}

pub trait DamageModel {
    /// Damage of a formula-driven effect before variance and modifiers.
    fn damage(
        &self,
        kind: EffectKind,
        attacker: &StatLine,
        defender: &StatLine,
        rate: f64,
    ) -> Result<f64, SimError>;

    /// Troops restored by a heal before variance.
    fn heal(&self, healer: &StatLine, rate: f64) -> Result<f64, SimError>;

    /// Map one uniform draw onto a variance multiplier.
    fn variance(&self, draw: f64) -> Result<f64, SimError>;
}

/// Tuning keys a given effect kind reads.
pub fn required_keys(kind: EffectKind) -> &'static [&'static str] {
    match kind {
        EffectKind::PhysicalDamage => &[
            keys::ATTACK_MIX_LEA,
            keys::DEFENSE_FACTOR_PHYSICAL,
            keys::PHYSICAL_SCALE,
            keys::RANDOM_MIN,
            keys::RANDOM_MAX,
        ],
        EffectKind::StrategyDamage => &[
            keys::DEFENSE_FACTOR_STRATEGY,
            keys::STRATEGY_SCALE,
            keys::RANDOM_MIN,
            keys::RANDOM_MAX,
        ],
        EffectKind::Heal => &[keys::HEAL_SCALE, keys::RANDOM_MIN, keys::RANDOM_MAX],
        EffectKind::Status => &[keys::CONFUSION_SKIP_ACTION],
        EffectKind::FixedDamage | EffectKind::Modifier => &[],
    }
}

/// Whether an effect kind draws a variance multiplier when applied.
pub const fn uses_variance(kind: EffectKind) -> bool {
    matches!(
        kind,
        EffectKind::PhysicalDamage | EffectKind::StrategyDamage | EffectKind::Heal
    )
}

/// Turn-loop switches that come from the tuning table rather than from skills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleRules {
    /// Rate of the physical normal attack; 0 disables normal attacks.
    pub normal_attack_rate: f64,
    pub confusion_skips_action: bool,
}

impl BattleRules {
    pub fn from_tuning(tuning: &TuningTable) -> Result<Self, ConfigError> {
        let normal_attack_rate = tuning.require(keys::NORMAL_ATTACK_RATE)?;
        if normal_attack_rate < 0.0 {
            return Err(ConfigError::InvalidTuningValue {
                key: keys::NORMAL_ATTACK_RATE.to_string(),
                value: normal_attack_rate,
            });
        }
        // Only consulted when a status effect is in play; absent means "skip".
        let confusion_skips_action = tuning
            .get(keys::CONFUSION_SKIP_ACTION)
            .map_or(true, |v| v != 0.0);
        Ok(Self {
            normal_attack_rate,
            confusion_skips_action,
        })
    }

    pub fn normal_attacks_enabled(&self) -> bool {
        self.normal_attack_rate > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PhysicalCoefficients {
    attack_mix_lea: f64,
    defense_factor: f64,
    scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StrategyCoefficients {
    defense_factor: f64,
    scale: f64,
}

/// Standard formulas:
///
/// - physical: `max(0, str + mix·lea − factor·def_lea) · rate · scale · troop_fraction`
/// - strategy: `max(0, int − factor·def_int) · rate · scale · troop_fraction`
/// - heal: `int · rate · scale` (a depleted healer heals at full strength)
/// - variance: uniform in `[random_min, random_max]`
///
/// Only the coefficient groups needed by the effect kinds in play are loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientModel {
    physical: Option<PhysicalCoefficients>,
    strategy: Option<StrategyCoefficients>,
    heal_scale: Option<f64>,
    variance_range: Option<(f64, f64)>,
}

impl CoefficientModel {
    /// Load the coefficients `kinds` depend on. Every missing key is a
    /// configuration error raised here, before any battle starts.
    pub fn from_tuning(
        tuning: &TuningTable,
        kinds: &BTreeSet<EffectKind>,
    ) -> Result<Self, ConfigError> {
        for kind in kinds {
            for key in required_keys(*kind) {
                tuning.require(key)?;
            }
        }

        let mut model = Self::default();
        if kinds.contains(&EffectKind::PhysicalDamage) {
            model.physical = Some(PhysicalCoefficients {
                attack_mix_lea: tuning.require(keys::ATTACK_MIX_LEA)?,
                defense_factor: tuning.require(keys::DEFENSE_FACTOR_PHYSICAL)?,
                scale: tuning.require(keys::PHYSICAL_SCALE)?,
            });
        }
        if kinds.contains(&EffectKind::StrategyDamage) {
            model.strategy = Some(StrategyCoefficients {
                defense_factor: tuning.require(keys::DEFENSE_FACTOR_STRATEGY)?,
                scale: tuning.require(keys::STRATEGY_SCALE)?,
            });
        }
        if kinds.contains(&EffectKind::Heal) {
            model.heal_scale = Some(tuning.require(keys::HEAL_SCALE)?);
        }
        if kinds.iter().any(|kind| uses_variance(*kind)) {
            let min = tuning.require(keys::RANDOM_MIN)?;
            let max = tuning.require(keys::RANDOM_MAX)?;
            if min < 0.0 {
                return Err(ConfigError::InvalidTuningValue {
                    key: keys::RANDOM_MIN.to_string(),
                    value: min,
                });
            }
            if max < min {
                return Err(ConfigError::InvalidTuningValue {
                    key: keys::RANDOM_MAX.to_string(),
                    value: max,
                });
            }
            model.variance_range = Some((min, max));
        }
        Ok(model)
    }

    /// Model with every coefficient group loaded.
    pub fn full(tuning: &TuningTable) -> Result<Self, ConfigError> {
        let kinds = [
            EffectKind::PhysicalDamage,
            EffectKind::StrategyDamage,
            EffectKind::Heal,
        ]
        .into_iter()
        .collect();
        Self::from_tuning(tuning, &kinds)
    }
}

fn not_loaded(kind: &str) -> SimError {
    SimError::invariant(format!("{kind} coefficients were not loaded for this battle"))
}

impl DamageModel for CoefficientModel {
    fn damage(
        &self,
        kind: EffectKind,
        attacker: &StatLine,
        defender: &StatLine,
        rate: f64,
    ) -> Result<f64, SimError> {
        match kind {
            EffectKind::PhysicalDamage => {
                let c = self.physical.ok_or_else(|| not_loaded("physical"))?;
                let attack = attacker.strength + c.attack_mix_lea * attacker.leadership;
                let base = (attack - c.defense_factor * defender.leadership).max(0.0);
                Ok(base * rate * c.scale * attacker.troop_fraction)
            }
            EffectKind::StrategyDamage => {
                let c = self.strategy.ok_or_else(|| not_loaded("strategy"))?;
                let base = (attacker.intellect - c.defense_factor * defender.intellect).max(0.0);
                Ok(base * rate * c.scale * attacker.troop_fraction)
            }
            other => Err(SimError::invariant(format!(
                "{other} is not a formula-driven damage effect"
            ))),
        }
    }

    fn heal(&self, healer: &StatLine, rate: f64) -> Result<f64, SimError> {
        let scale = self.heal_scale.ok_or_else(|| not_loaded("heal"))?;
        Ok(healer.intellect * rate * scale)
    }

    fn variance(&self, draw: f64) -> Result<f64, SimError> {
        let (min, max) = self.variance_range.ok_or_else(|| not_loaded("variance"))?;
        Ok(min + (max - min) * draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    fn line(strength: f64, intellect: f64, leadership: f64) -> StatLine {
        StatLine {
            strength,
            intellect,
            leadership,
            troop_fraction: 1.0,
        }
    }

    #[test]
    fn physical_damage_mixes_leadership_and_subtracts_defense() {
        let model = CoefficientModel::full(&TuningTable::standard()).expect("model");
        // (100 + 0.5*80 - 0.7*90) * 1.0 * 20 = 77 * 20
        let dmg = model
            .damage(
                EffectKind::PhysicalDamage,
                &line(100.0, 0.0, 80.0),
                &line(0.0, 0.0, 90.0),
                1.0,
            )
            .expect("damage");
        approx_eq(dmg, 1540.0);
    }

    #[test]
    fn strategy_damage_never_negative_and_scales_with_troops() {
        let model = CoefficientModel::full(&TuningTable::standard()).expect("model");
        let weak = model
            .damage(
                EffectKind::StrategyDamage,
                &line(0.0, 10.0, 0.0),
                &line(0.0, 200.0, 0.0),
                2.0,
            )
            .expect("damage");
        approx_eq(weak, 0.0);

        let mut half = line(0.0, 100.0, 0.0);
        half.troop_fraction = 0.5;
        let dmg = model
            .damage(EffectKind::StrategyDamage, &half, &line(0.0, 50.0, 0.0), 1.0)
            .expect("damage");
        approx_eq(dmg, (100.0 - 40.0) * 22.0 * 0.5);
    }

    #[test]
    fn heal_ignores_healer_troop_fraction() {
        let model = CoefficientModel::full(&TuningTable::standard()).expect("model");
        let mut depleted = line(0.0, 100.0, 0.0);
        depleted.troop_fraction = 0.25;
        let full = model.heal(&line(0.0, 100.0, 0.0), 1.5).expect("heal");
        approx_eq(full, 100.0 * 1.5 * 18.0);
        approx_eq(model.heal(&depleted, 1.5).expect("heal"), full);
    }

    #[test]
    fn variance_maps_draw_onto_configured_range() {
        let model = CoefficientModel::full(&TuningTable::standard()).expect("model");
        approx_eq(model.variance(0.0).expect("variance"), 0.95);
        approx_eq(model.variance(0.5).expect("variance"), 1.0);
    }

    #[test]
    fn missing_key_for_used_kind_is_configuration_error() {
        let mut tuning = TuningTable::standard();
        tuning.remove(keys::HEAL_SCALE);
        let kinds: BTreeSet<_> = [EffectKind::Heal].into_iter().collect();
        assert_eq!(
            CoefficientModel::from_tuning(&tuning, &kinds),
            Err(ConfigError::MissingTuningKey("heal_scale".to_string()))
        );

        let only_fixed: BTreeSet<_> = [EffectKind::FixedDamage].into_iter().collect();
        assert!(CoefficientModel::from_tuning(&tuning, &only_fixed).is_ok());
    }

    #[test]
    fn inverted_variance_range_is_rejected() {
        let tuning = TuningTable::standard()
            .with(keys::RANDOM_MIN, 1.2)
            .with(keys::RANDOM_MAX, 0.8);
        assert!(matches!(
            CoefficientModel::full(&tuning),
            Err(ConfigError::InvalidTuningValue { .. })
        ));
    }

    #[test]
    fn unloaded_group_surfaces_as_invariant_violation() {
        let model = CoefficientModel::default();
        let err = model.heal(&line(0.0, 50.0, 0.0), 1.0).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation(_)));
    }

    #[test]
    fn rules_require_normal_attack_rate() {
        let tuning = TuningTable::new();
        assert_eq!(
            BattleRules::from_tuning(&tuning),
            Err(ConfigError::MissingTuningKey("normal_attack_rate".to_string()))
        );
        let rules = BattleRules::from_tuning(&TuningTable::new().with(keys::NORMAL_ATTACK_RATE, 0.0))
            .expect("rules");
        assert!(!rules.normal_attacks_enabled());
        assert!(rules.confusion_skips_action);
    }
}
