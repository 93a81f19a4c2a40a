//! Turn-based combat resolution.
//!
//! A battle runs at most [MAX_TURNS] turns. Each turn:
//!
//! 1. living units are ordered by effective speed (ties: side A, then slot);
//! 2. turn-start pass: every acting unit checks its `turn_start` skills;
//! 3. attack pass: every acting unit makes its normal attack (when enabled)
//!    and then checks its `after_attack` skills;
//! 4. the decisive check runs, then statuses and modifiers tick.
//!
//! Every skill of an acting unit consumes exactly one activation draw in its
//! phase, whether or not it later finds a target. Formula effects consume one
//! more draw per target for variance, and a single-enemy pick consumes one draw
//! when more than one enemy is alive. Given the same draws, the same rosters and
//! the same tuning, the outcome is identical.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::combat::formulas::{BattleRules, CoefficientModel, DamageModel};
use crate::combat::rng::RandomSource;
use crate::combat::state::{BattleState, UnitRef, MAX_TURNS};
use crate::combat::targeting::{select_targets, weakest_allies};
use crate::data::roster::{EquippedSkill, Roster, Side};
use crate::data::skill::{Effect, EffectKind, SkillSlot, StatusKind, TargetSelector, Timing};
use crate::data::tuning::TuningTable;
use crate::error::{ConfigError, SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// Keep only the per-turn troop snapshots.
    Off,
    /// Record one log entry per action.
    #[default]
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Winner {
    A,
    B,
    #[serde(rename = "draw")]
    Draw,
}

impl Winner {
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::A => Some(Side::A),
            Self::B => Some(Side::B),
            Self::Draw => None,
        }
    }
}

/// How the battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// One side lost all its troops.
    Elimination,
    /// Both sides lost all their troops in the same turn.
    MutualElimination,
    /// Nobody was eliminated by the last turn; remaining troop ratios decide.
    TurnLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    TurnStart,
    Attack,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnStart => "turn_start",
            Self::Attack => "attack",
        }
    }

    const fn timing(self) -> Timing {
        match self {
            Self::TurnStart => Timing::TurnStart,
            Self::Attack => Timing::AfterAttack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    NormalAttack,
    Skill { skill_id: String, slot: SkillSlot },
    /// The unit was confused and lost this phase.
    Confused,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectRecord {
    pub target: UnitRef,
    pub target_id: String,
    pub effect: EffectKind,
    /// Troops removed or restored, modifier amount, or status turns.
    pub magnitude: f64,
    pub target_troops: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub turn: u32,
    pub phase: Phase,
    pub actor: UnitRef,
    pub actor_id: String,
    pub action: Action,
    pub effects: Vec<EffectRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnSnapshot {
    pub turn: u32,
    pub troops_a: u64,
    pub troops_b: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    pub at: UnitRef,
    pub unit_id: String,
    pub starting_troops: u32,
    pub remaining_troops: u32,
}

impl UnitOutcome {
    pub fn loss_ratio(&self) -> f64 {
        if self.starting_troops == 0 {
            return 0.0;
        }
        f64::from(self.starting_troops - self.remaining_troops) / f64::from(self.starting_troops)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub winner: Winner,
    pub decision: Decision,
    /// Turn at which the battle was decided, or [MAX_TURNS] at the limit.
    pub turns: u32,
    pub units: Vec<UnitOutcome>,
    pub loss_ratio_a: f64,
    pub loss_ratio_b: f64,
    /// Activation count per skill id.
    pub triggers: BTreeMap<String, u32>,
    pub snapshots: Vec<TurnSnapshot>,
    pub log: Vec<LogEntry>,
}

impl Outcome {
    pub fn loss_ratio(&self, side: Side) -> f64 {
        match side {
            Side::A => self.loss_ratio_a,
            Side::B => self.loss_ratio_b,
        }
    }

    pub fn remaining_troops(&self, side: Side) -> u64 {
        self.units
            .iter()
            .filter(|u| u.at.side == side)
            .map(|u| u64::from(u.remaining_troops))
            .sum()
    }
}

/// Effect kinds a battle between these rosters can apply, including the
/// physical normal attack when it is enabled.
pub fn effect_kinds(roster_a: &Roster, roster_b: &Roster, rules: &BattleRules) -> BTreeSet<EffectKind> {
    let mut kinds: BTreeSet<EffectKind> = roster_a
        .units()
        .iter()
        .chain(roster_b.units())
        .flat_map(|c| c.skills.iter())
        .flat_map(|s| s.skill.effects.iter())
        .map(Effect::kind)
        .collect();
    if rules.normal_attacks_enabled() {
        kinds.insert(EffectKind::PhysicalDamage);
    }
    kinds
}

/// A validated battle configuration. All configuration errors surface when
/// the setup is built; [BattleSetup::run] can then be called any number of
/// times with independent random sources.
#[derive(Debug, Clone)]
pub struct BattleSetup<'a, M = CoefficientModel> {
    roster_a: &'a Roster,
    roster_b: &'a Roster,
    model: M,
    rules: BattleRules,
    trace: TraceMode,
}

impl<'a> BattleSetup<'a, CoefficientModel> {
    pub fn new(
        roster_a: &'a Roster,
        roster_b: &'a Roster,
        tuning: &TuningTable,
    ) -> Result<Self, ConfigError> {
        roster_a.validate(Side::A)?;
        roster_b.validate(Side::B)?;
        let rules = BattleRules::from_tuning(tuning)?;
        let model = CoefficientModel::from_tuning(tuning, &effect_kinds(roster_a, roster_b, &rules))?;
        Ok(Self {
            roster_a,
            roster_b,
            model,
            rules,
            trace: TraceMode::default(),
        })
    }
}

impl<'a, M: DamageModel> BattleSetup<'a, M> {
    /// Use a custom damage model instead of the tuning-table coefficients.
    pub fn with_model(
        roster_a: &'a Roster,
        roster_b: &'a Roster,
        model: M,
        rules: BattleRules,
    ) -> Result<Self, ConfigError> {
        roster_a.validate(Side::A)?;
        roster_b.validate(Side::B)?;
        Ok(Self {
            roster_a,
            roster_b,
            model,
            rules,
            trace: TraceMode::default(),
        })
    }

    pub fn trace(mut self, mode: TraceMode) -> Self {
        self.trace = mode;
        self
    }

    pub fn run<R: RandomSource + ?Sized>(&self, rng: &mut R) -> SimResult<Outcome> {
        Battle {
            model: &self.model,
            rules: self.rules,
            trace: self.trace,
            state: BattleState::new(self.roster_a, self.roster_b),
            rng,
            triggers: BTreeMap::new(),
            snapshots: Vec::with_capacity(MAX_TURNS as usize),
            log: Vec::new(),
        }
        .play()
    }
}

/// Run one battle to completion or to the turn limit.
pub fn resolve<R: RandomSource + ?Sized>(
    roster_a: &Roster,
    roster_b: &Roster,
    tuning: &TuningTable,
    rng: &mut R,
) -> SimResult<Outcome> {
    BattleSetup::new(roster_a, roster_b, tuning)?.run(rng)
}

struct Battle<'a, 'b, M, R: ?Sized> {
    model: &'b M,
    rules: BattleRules,
    trace: TraceMode,
    state: BattleState<'a>,
    rng: &'b mut R,
    triggers: BTreeMap<String, u32>,
    snapshots: Vec<TurnSnapshot>,
    log: Vec<LogEntry>,
}

impl<'a, 'b, M: DamageModel, R: RandomSource + ?Sized> Battle<'a, 'b, M, R> {
    fn play(mut self) -> SimResult<Outcome> {
        for turn in 1..=MAX_TURNS {
            self.state.turn = turn;
            let order = self.state.acting_order();
            for phase in [Phase::TurnStart, Phase::Attack] {
                for &actor in &order {
                    self.act(actor, phase)?;
                }
            }
            self.state.check_invariants()?;

            let troops_a = self.state.total_troops(Side::A);
            let troops_b = self.state.total_troops(Side::B);
            self.snapshots.push(TurnSnapshot {
                turn,
                troops_a,
                troops_b,
            });

            let decided = match (troops_a == 0, troops_b == 0) {
                (true, true) => Some((Winner::Draw, Decision::MutualElimination)),
                (false, true) => Some((Winner::A, Decision::Elimination)),
                (true, false) => Some((Winner::B, Decision::Elimination)),
                (false, false) => None,
            };
            if let Some((winner, decision)) = decided {
                return Ok(self.finish(winner, decision, turn));
            }
            self.state.tick_end_of_turn();
        }

        let winner = self.turn_limit_winner();
        Ok(self.finish(winner, Decision::TurnLimit, MAX_TURNS))
    }

    /// Higher remaining troop ratio wins; equal ratios draw. Compared exactly
    /// by cross-multiplying integer troop counts.
    fn turn_limit_winner(&self) -> Winner {
        let a = u128::from(self.state.total_troops(Side::A)) * u128::from(self.state.starting_troops(Side::B));
        let b = u128::from(self.state.total_troops(Side::B)) * u128::from(self.state.starting_troops(Side::A));
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Winner::A,
            std::cmp::Ordering::Less => Winner::B,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    fn act(&mut self, actor: usize, phase: Phase) -> SimResult<()> {
        if !self.state.units[actor].is_alive() {
            return Ok(());
        }
        if self.rules.confusion_skips_action
            && self.state.units[actor].has_status(StatusKind::Confusion)
        {
            self.record(phase, actor, Action::Confused, Vec::new());
            return Ok(());
        }

        if phase == Phase::Attack && self.rules.normal_attacks_enabled() {
            let targets = select_targets(TargetSelector::Enemy, actor, &self.state, &mut *self.rng);
            if !targets.is_empty() {
                let mut records = Vec::with_capacity(targets.len());
                for target in targets {
                    records.push(self.formula_damage(
                        actor,
                        target,
                        EffectKind::PhysicalDamage,
                        self.rules.normal_attack_rate,
                    )?);
                }
                self.record(phase, actor, Action::NormalAttack, records);
            }
        }

        let combatant = self.state.units[actor].combatant;
        let timing = phase.timing();
        for equipped in combatant.skills.iter().filter(|s| s.skill.timing == timing) {
            if !self.state.units[actor].is_alive() {
                break;
            }
            let draw = self.rng.next_f64();
            if draw < equipped.skill.activation {
                self.fire(actor, phase, equipped)?;
            }
        }
        Ok(())
    }

    fn fire(&mut self, actor: usize, phase: Phase, equipped: &'a EquippedSkill) -> SimResult<()> {
        let skill = &equipped.skill;
        let primary = select_targets(skill.target, actor, &self.state, &mut *self.rng);
        if primary.is_empty() {
            tracing::trace!(skill = %skill.skill_id, turn = self.state.turn, "skill fired without a target");
            return Ok(());
        }
        *self.triggers.entry(skill.skill_id.clone()).or_insert(0) += 1;

        let mut records = Vec::new();
        for effect in &skill.effects {
            let selector = effect.target_override().unwrap_or(skill.target);
            let targets: Vec<usize> = match effect.target_override() {
                _ if selector == TargetSelector::Ally && effect.ally_count() > 1 => {
                    weakest_allies(actor, &self.state, effect.ally_count())
                }
                Some(selector) => select_targets(selector, actor, &self.state, &mut *self.rng),
                None => primary
                    .iter()
                    .copied()
                    .filter(|idx| self.state.units[*idx].is_alive())
                    .collect(),
            };
            for target in targets {
                records.push(self.apply_effect(actor, target, effect)?);
            }
        }
        self.record(
            phase,
            actor,
            Action::Skill {
                skill_id: skill.skill_id.clone(),
                slot: equipped.slot,
            },
            records,
        );
        Ok(())
    }

    fn apply_effect(&mut self, actor: usize, target: usize, effect: &Effect) -> SimResult<EffectRecord> {
        match effect {
            Effect::PhysicalDamage { rate, .. } => {
                self.formula_damage(actor, target, EffectKind::PhysicalDamage, *rate)
            }
            Effect::StrategyDamage { rate, .. } => {
                self.formula_damage(actor, target, EffectKind::StrategyDamage, *rate)
            }
            Effect::FixedDamage { amount, .. } => {
                let scaled = amount
                    * self.state.units[actor].damage_dealt_multiplier()
                    * self.state.units[target].damage_taken_multiplier();
                let troops = to_troops(scaled, false)?;
                let lost = self.state.units[target].take_damage(troops);
                Ok(self.effect_record(target, EffectKind::FixedDamage, f64::from(lost)))
            }
            Effect::Heal { rate, .. } => {
                let healer = self.state.units[actor].stat_line();
                let raw = self.model.heal(&healer, *rate)?;
                let variance = self.model.variance(self.rng.next_f64())?;
                let troops = to_troops(raw * variance, true)?;
                let gained = self.state.units[target].restore(troops);
                Ok(self.effect_record(target, EffectKind::Heal, f64::from(gained)))
            }
            Effect::Modifier {
                stat,
                amount,
                duration,
                ..
            } => {
                self.state.units[target].add_modifier(*stat, *amount, *duration);
                Ok(self.effect_record(target, EffectKind::Modifier, *amount))
            }
            Effect::Status { kind, turns, .. } => {
                self.state.units[target].add_status(*kind, *turns);
                Ok(self.effect_record(target, EffectKind::Status, f64::from(*turns)))
            }
        }
    }

    fn formula_damage(
        &mut self,
        actor: usize,
        target: usize,
        kind: EffectKind,
        rate: f64,
    ) -> SimResult<EffectRecord> {
        let attacker = self.state.units[actor].stat_line();
        let defender = self.state.units[target].stat_line();
        let raw = self.model.damage(kind, &attacker, &defender, rate)?;
        let variance = self.model.variance(self.rng.next_f64())?;
        let scaled = raw
            * variance
            * self.state.units[actor].damage_dealt_multiplier()
            * self.state.units[target].damage_taken_multiplier();
        let troops = to_troops(scaled, true)?;
        let lost = self.state.units[target].take_damage(troops);
        Ok(self.effect_record(target, kind, f64::from(lost)))
    }

    fn effect_record(&self, target: usize, effect: EffectKind, magnitude: f64) -> EffectRecord {
        let unit = &self.state.units[target];
        EffectRecord {
            target: unit.at,
            target_id: unit.unit_id().to_string(),
            effect,
            magnitude,
            target_troops: unit.troops,
        }
    }

    fn record(&mut self, phase: Phase, actor: usize, action: Action, effects: Vec<EffectRecord>) {
        if self.trace == TraceMode::Off {
            return;
        }
        let unit = &self.state.units[actor];
        self.log.push(LogEntry {
            turn: self.state.turn,
            phase,
            actor: unit.at,
            actor_id: unit.unit_id().to_string(),
            action,
            effects,
        });
    }

    fn finish(self, winner: Winner, decision: Decision, turns: u32) -> Outcome {
        let loss_ratio = |side: Side| {
            let start = self.state.starting_troops(side);
            if start == 0 {
                return 0.0;
            }
            let remaining = self.state.total_troops(side);
            (start - remaining) as f64 / start as f64
        };
        let loss_ratio_a = loss_ratio(Side::A);
        let loss_ratio_b = loss_ratio(Side::B);
        let units = self
            .state
            .units
            .iter()
            .map(|u| UnitOutcome {
                at: u.at,
                unit_id: u.unit_id().to_string(),
                starting_troops: u.starting_troops,
                remaining_troops: u.troops,
            })
            .collect();
        tracing::trace!(?winner, ?decision, turns, "battle resolved");
        Outcome {
            winner,
            decision,
            turns,
            units,
            loss_ratio_a,
            loss_ratio_b,
            triggers: self.triggers,
            snapshots: self.snapshots,
            log: self.log,
        }
    }
}

/// Convert an effect value into whole troops. Formula effects always move at
/// least one troop.
fn to_troops(value: f64, at_least_one: bool) -> SimResult<u32> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::invariant(format!(
            "effect produced an unusable troop amount {value}"
        )));
    }
    let mut troops = value.floor();
    if at_least_one {
        troops = troops.max(1.0);
    }
    Ok(if troops >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        troops as u32
    })
}
