//! Per-battle working copy of both rosters.
//!
//! A [BattleState] belongs to exactly one `resolve` call. Catalog records are
//! borrowed, never mutated; troops, modifiers and statuses live here.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::combat::formulas::StatLine;
use crate::data::roster::{Combatant, Roster, Side};
use crate::data::skill::{Duration, ModifierStat, StatusKind};
use crate::error::SimError;

pub const MAX_TURNS: u32 = 8;

/// Position of a unit in the battle: side plus roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UnitRef {
    pub side: Side,
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveModifier {
    stat: ModifierStat,
    amount: f64,
    /// End-of-turn ticks left; `None` lasts the whole battle.
    remaining: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct UnitState<'a> {
    pub combatant: &'a Combatant,
    pub at: UnitRef,
    pub starting_troops: u32,
    pub troops: u32,
    modifiers: Vec<ActiveModifier>,
    statuses: BTreeMap<StatusKind, u32>,
}

impl<'a> UnitState<'a> {
    pub fn new(combatant: &'a Combatant, at: UnitRef) -> Self {
        Self {
            combatant,
            at,
            starting_troops: combatant.troops,
            troops: combatant.troops,
            modifiers: Vec::new(),
            statuses: BTreeMap::new(),
        }
    }

    pub fn unit_id(&self) -> &'a str {
        &self.combatant.unit.unit_id
    }

    pub fn is_alive(&self) -> bool {
        self.troops > 0
    }

    fn modifier_total(&self, stat: ModifierStat) -> f64 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.amount)
            .sum()
    }

    fn effective(&self, base: f64, stat: ModifierStat) -> f64 {
        (base + self.modifier_total(stat)).max(0.0)
    }

    pub fn stat_line(&self) -> StatLine {
        let base = &self.combatant.unit.base_stats;
        let troop_fraction = if self.starting_troops == 0 {
            0.0
        } else {
            f64::from(self.troops) / f64::from(self.starting_troops)
        };
        StatLine {
            strength: self.effective(base.strength, ModifierStat::Strength),
            intellect: self.effective(base.intellect, ModifierStat::Intellect),
            leadership: self.effective(base.leadership, ModifierStat::Leadership),
            troop_fraction,
        }
    }

    pub fn speed(&self) -> f64 {
        self.effective(self.combatant.unit.base_stats.speed, ModifierStat::Speed)
    }

    pub fn damage_dealt_multiplier(&self) -> f64 {
        (1.0 + self.modifier_total(ModifierStat::DamageDealt)).max(0.0)
    }

    pub fn damage_taken_multiplier(&self) -> f64 {
        (1.0 + self.modifier_total(ModifierStat::DamageTaken)).max(0.0)
    }

    /// Remove up to `amount` troops; returns how many were actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.troops);
        self.troops -= lost;
        lost
    }

    /// Restore up to `amount` troops without passing the starting count.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let room = self.starting_troops.saturating_sub(self.troops);
        let gained = amount.min(room);
        self.troops += gained;
        gained
    }

    pub fn add_modifier(&mut self, stat: ModifierStat, amount: f64, duration: Duration) {
        self.modifiers.push(ActiveModifier {
            stat,
            amount,
            remaining: duration.ticks(),
        });
    }

    /// Apply or extend a status; a re-applied status keeps the longer duration.
    pub fn add_status(&mut self, kind: StatusKind, turns: u32) {
        let entry = self.statuses.entry(kind).or_insert(0);
        *entry = (*entry).max(turns);
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.get(&kind).is_some_and(|turns| *turns > 0)
    }

    pub fn tick_end_of_turn(&mut self) {
        self.statuses.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
        self.modifiers.retain_mut(|m| match m.remaining.as_mut() {
            None => true,
            Some(left) => {
                *left = left.saturating_sub(1);
                *left > 0
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct BattleState<'a> {
    pub turn: u32,
    /// Side A units in slot order, then side B units in slot order.
    pub units: Vec<UnitState<'a>>,
}

impl<'a> BattleState<'a> {
    pub fn new(roster_a: &'a Roster, roster_b: &'a Roster) -> Self {
        let mut units = Vec::with_capacity(roster_a.len() + roster_b.len());
        for (side, roster) in [(Side::A, roster_a), (Side::B, roster_b)] {
            for (slot, combatant) in roster.units().iter().enumerate() {
                units.push(UnitState::new(combatant, UnitRef { side, slot }));
            }
        }
        Self { turn: 0, units }
    }

    pub fn indices_of(&self, side: Side) -> impl Iterator<Item = usize> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(move |(_, u)| u.at.side == side)
            .map(|(idx, _)| idx)
    }

    pub fn alive_of(&self, side: Side) -> Vec<usize> {
        self.indices_of(side)
            .filter(|idx| self.units[*idx].is_alive())
            .collect()
    }

    pub fn total_troops(&self, side: Side) -> u64 {
        self.indices_of(side)
            .map(|idx| u64::from(self.units[idx].troops))
            .sum()
    }

    pub fn starting_troops(&self, side: Side) -> u64 {
        self.indices_of(side)
            .map(|idx| u64::from(self.units[idx].starting_troops))
            .sum()
    }

    /// Units that act this turn: living units by effective speed, fastest
    /// first. Ties keep side A ahead of side B, then slot order.
    pub fn acting_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.units.len())
            .filter(|idx| self.units[*idx].is_alive())
            .collect();
        // Stable sort: the initial order already is side A then slot.
        order.sort_by(|a, b| self.units[*b].speed().total_cmp(&self.units[*a].speed()));
        order
    }

    pub fn tick_end_of_turn(&mut self) {
        for unit in self.units.iter_mut().filter(|u| u.is_alive()) {
            unit.tick_end_of_turn();
        }
    }

    pub fn check_invariants(&self) -> Result<(), SimError> {
        if self.turn > MAX_TURNS {
            return Err(SimError::invariant(format!(
                "turn counter reached {} (limit {MAX_TURNS})",
                self.turn
            )));
        }
        for unit in &self.units {
            if unit.troops > unit.starting_troops {
                return Err(SimError::invariant(format!(
                    "unit '{}' holds {} troops, above its starting {}",
                    unit.unit_id(),
                    unit.troops,
                    unit.starting_troops
                )));
            }
        }
        Ok(())
    }
}
