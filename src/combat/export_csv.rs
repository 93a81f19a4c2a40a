//! Export a battle log as CSV: one row per applied effect, plus one row for
//! actions that applied nothing (a confused unit, a skill whose effects all missed).

use std::io;

use serde::Serialize;

use crate::combat::engine::{Action, LogEntry, Outcome};

pub const CSV_COLUMNS: [&str; 12] = [
    "turn",
    "phase",
    "side",
    "slot",
    "actor",
    "action",
    "target_side",
    "target_slot",
    "target",
    "effect",
    "magnitude",
    "target_troops",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    turn: u32,
    phase: &'static str,
    side: &'static str,
    slot: usize,
    actor: &'a str,
    action: &'a str,
    target_side: Option<&'static str>,
    target_slot: Option<usize>,
    target: Option<&'a str>,
    effect: Option<&'static str>,
    magnitude: Option<f64>,
    target_troops: Option<u32>,
}

fn action_label(action: &Action) -> &str {
    match action {
        Action::NormalAttack => "normal_attack",
        Action::Skill { skill_id, .. } => skill_id,
        Action::Confused => "confused",
    }
}

fn rows(entry: &LogEntry) -> Vec<CsvRow<'_>> {
    let base = || CsvRow {
        turn: entry.turn,
        phase: entry.phase.as_str(),
        side: entry.actor.side.as_str(),
        slot: entry.actor.slot,
        actor: &entry.actor_id,
        action: action_label(&entry.action),
        target_side: None,
        target_slot: None,
        target: None,
        effect: None,
        magnitude: None,
        target_troops: None,
    };
    if entry.effects.is_empty() {
        return vec![base()];
    }
    entry
        .effects
        .iter()
        .map(|record| CsvRow {
            target_side: Some(record.target.side.as_str()),
            target_slot: Some(record.target.slot),
            target: Some(&record.target_id),
            effect: Some(record.effect.as_str()),
            magnitude: Some(record.magnitude),
            target_troops: Some(record.target_troops),
            ..base()
        })
        .collect()
}

pub fn write_log_csv<W: io::Write>(outcome: &Outcome, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    if outcome.log.is_empty() {
        out.write_record(CSV_COLUMNS)?;
    }
    for entry in &outcome.log {
        for row in rows(entry) {
            out.serialize(row)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn log_to_csv_string(outcome: &Outcome) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_log_csv(outcome, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
