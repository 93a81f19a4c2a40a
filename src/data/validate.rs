//! Dataset checks for the unit/skill catalog and tuning table, run before a
//! data drop is used for simulation.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use crate::combat::formulas::required_keys;
use crate::data::catalog::{load_catalog, load_data_tuning, Catalog};
use crate::data::skill::{EffectKind, SkillSlot};
use crate::data::tuning::{keys, TuningTable};
use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_catalog(catalog: &Catalog, tuning: &TuningTable) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut innate_ids = HashSet::new();

    for unit in catalog.units() {
        let context = format!("unit {}", unit.unit_id);
        if unit.max_troops == 0 {
            report.push(ValidationSeverity::Error, &context, "max_troops is zero");
        }
        let stats = &unit.base_stats;
        if stats.strength == 0.0 && stats.intellect == 0.0 && stats.leadership == 0.0 {
            report.push(ValidationSeverity::Warning, &context, "all base stats are zero");
        }
        match catalog.skill(&unit.innate_skill_id) {
            None => report.push(
                ValidationSeverity::Error,
                &context,
                format!("innate skill '{}' is not in the catalog", unit.innate_skill_id),
            ),
            Some(skill) if skill.slot != SkillSlot::Innate => report.push(
                ValidationSeverity::Warning,
                &context,
                format!(
                    "innate skill '{}' is catalogued as a {} skill",
                    skill.skill_id,
                    skill.slot.label()
                ),
            ),
            Some(_) => {}
        }
        innate_ids.insert(unit.innate_skill_id.as_str());
    }

    let mut kinds = BTreeSet::new();
    for skill in catalog.skills() {
        let context = format!("skill {}", skill.skill_id);
        if let Err(err) = skill.validate() {
            report.push(ValidationSeverity::Error, &context, err.to_string());
        }
        if skill.slot == SkillSlot::Innate && !innate_ids.contains(skill.skill_id.as_str()) {
            report.push(ValidationSeverity::Info, &context, "innate skill not owned by any unit");
        }
        kinds.extend(skill.effects.iter().map(|effect| effect.kind()));
    }

    validate_tuning(tuning, &mut kinds, &mut report);
    report
}

fn validate_tuning(tuning: &TuningTable, kinds: &mut BTreeSet<EffectKind>, report: &mut ValidationReport) {
    match tuning.require(keys::NORMAL_ATTACK_RATE) {
        Ok(rate) if rate > 0.0 => {
            kinds.insert(EffectKind::PhysicalDamage);
        }
        Ok(_) => {}
        Err(err) => report.push(ValidationSeverity::Error, "tuning", err.to_string()),
    }

    let mut known: BTreeSet<&str> = [keys::NORMAL_ATTACK_RATE].into_iter().collect();
    for kind in [
        EffectKind::PhysicalDamage,
        EffectKind::StrategyDamage,
        EffectKind::Heal,
        EffectKind::Status,
    ] {
        known.extend(required_keys(kind).iter().copied());
    }

    let mut reported = BTreeSet::new();
    for kind in kinds.iter() {
        for key in required_keys(*kind) {
            if let Err(err) = tuning.require(key) {
                if reported.insert(*key) {
                    report.push(
                        ValidationSeverity::Error,
                        "tuning",
                        format!("{err} (needed by {kind})"),
                    );
                }
            }
        }
    }

    for key in tuning.keys().filter(|key| !known.contains(key)) {
        report.push(
            ValidationSeverity::Info,
            "tuning",
            format!("key '{key}' is not read by any formula"),
        );
    }
}

/// Load `units.json`, `skills.json` and the tuning file from `data_dir` and validate them.
pub fn validate_dataset(data_dir: impl AsRef<Path>) -> Result<ValidationReport, DataError> {
    let data_dir = data_dir.as_ref();
    let catalog = load_catalog(data_dir)?;
    let tuning = load_data_tuning(data_dir)?;
    Ok(validate_catalog(&catalog, &tuning))
}
