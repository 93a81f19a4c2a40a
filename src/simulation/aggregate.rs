//! Folding battle outcomes into batch statistics.
//!
//! [RunTally] keeps exact integer counters plus the per-run loss ratios in run
//! order, so the final numbers do not depend on which worker finished first.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::combat::engine::{Decision, Outcome, Winner};

/// Number of skills listed in [AggregateResult::top_triggers] by default.
pub const TOP_TRIGGER_COUNT: usize = 15;

/// The parts of an [Outcome] a batch keeps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub winner: Winner,
    pub decision: Decision,
    pub turns: u32,
    pub loss_ratio_a: f64,
    pub loss_ratio_b: f64,
    pub triggers: BTreeMap<String, u32>,
}

impl From<Outcome> for RunSummary {
    fn from(outcome: Outcome) -> Self {
        Self {
            winner: outcome.winner,
            decision: outcome.decision,
            turns: outcome.turns,
            loss_ratio_a: outcome.loss_ratio_a,
            loss_ratio_b: outcome.loss_ratio_b,
            triggers: outcome.triggers,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub a_wins: u64,
    pub b_wins: u64,
    pub draws: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.a_wins + self.b_wins + self.draws
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LossStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub stdev: f64,
}

impl LossStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean,
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            stdev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillTrigger {
    pub skill_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTally {
    counts: OutcomeCounts,
    turn_limit_runs: u64,
    turns_sum: u64,
    losses_a: Vec<f64>,
    losses_b: Vec<f64>,
    triggers: BTreeMap<String, u64>,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> u64 {
        self.counts.total()
    }

    pub fn record(&mut self, run: &RunSummary) {
        match run.winner {
            Winner::A => self.counts.a_wins += 1,
            Winner::B => self.counts.b_wins += 1,
            Winner::Draw => self.counts.draws += 1,
        }
        if run.decision == Decision::TurnLimit {
            self.turn_limit_runs += 1;
        }
        self.turns_sum += u64::from(run.turns);
        self.losses_a.push(run.loss_ratio_a);
        self.losses_b.push(run.loss_ratio_b);
        for (skill_id, count) in &run.triggers {
            *self.triggers.entry(skill_id.clone()).or_insert(0) += u64::from(*count);
        }
    }

    /// Append `other`, whose runs come after this tally's runs.
    pub fn merge(&mut self, other: RunTally) {
        self.counts.a_wins += other.counts.a_wins;
        self.counts.b_wins += other.counts.b_wins;
        self.counts.draws += other.counts.draws;
        self.turn_limit_runs += other.turn_limit_runs;
        self.turns_sum += other.turns_sum;
        self.losses_a.extend(other.losses_a);
        self.losses_b.extend(other.losses_b);
        for (skill_id, count) in other.triggers {
            *self.triggers.entry(skill_id).or_insert(0) += count;
        }
    }

    pub fn finish(self) -> AggregateResult {
        let runs = self.runs();
        let rate = |count: u64| {
            if runs == 0 {
                0.0
            } else {
                count as f64 / runs as f64
            }
        };
        AggregateResult {
            runs,
            counts: self.counts,
            win_rate_a: rate(self.counts.a_wins),
            win_rate_b: rate(self.counts.b_wins),
            draw_rate: rate(self.counts.draws),
            turn_limit_runs: self.turn_limit_runs,
            mean_turns: rate(self.turns_sum),
            loss_a: LossStats::from_samples(&self.losses_a),
            loss_b: LossStats::from_samples(&self.losses_b),
            triggers: self.triggers,
        }
    }
}

impl FromIterator<RunSummary> for RunTally {
    fn from_iter<I: IntoIterator<Item = RunSummary>>(iter: I) -> Self {
        let mut tally = Self::new();
        for run in iter {
            tally.record(&run);
        }
        tally
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub runs: u64,
    pub counts: OutcomeCounts,
    pub win_rate_a: f64,
    pub win_rate_b: f64,
    pub draw_rate: f64,
    /// Runs that reached the turn limit without an elimination.
    pub turn_limit_runs: u64,
    pub mean_turns: f64,
    pub loss_a: LossStats,
    pub loss_b: LossStats,
    pub triggers: BTreeMap<String, u64>,
}

impl AggregateResult {
    /// Most frequently activated skills, ties broken by skill id.
    pub fn top_triggers(&self, limit: usize) -> Vec<SkillTrigger> {
        let mut all: Vec<SkillTrigger> = self
            .triggers
            .iter()
            .map(|(skill_id, count)| SkillTrigger {
                skill_id: skill_id.clone(),
                count: *count,
            })
            .collect();
        all.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill_id.cmp(&b.skill_id)));
        all.truncate(limit);
        all
    }
}
