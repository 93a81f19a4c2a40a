use proptest::prelude::*;
use shinsen::combat::{
    log_to_csv_string, resolve, Action, BattleRules, BattleSetup, DamageModel, Decision, Outcome,
    Phase, Rng, ScriptedSource, StatLine, TraceMode, Winner, CSV_COLUMNS, MAX_TURNS,
};
use shinsen::data::{
    keys, load_catalog, BaseStats, Combatant, Duration, Effect, EffectKind, EquippedSkill, Matchup,
    ModifierStat, Roster, RosterEntry, Side, SkillRecord, SkillSlot, StatusKind, TargetSelector,
    Timing, TuningTable, UnitRecord,
};
use shinsen::error::{ConfigError, SimError};

fn skill(id: &str, timing: Timing, target: TargetSelector, activation: f64, effects: Vec<Effect>) -> SkillRecord {
    SkillRecord::new(id, id, timing, target, activation, effects)
}

fn fixed(amount: f64) -> Effect {
    Effect::FixedDamage {
        amount,
        target: None,
    }
}

fn unit(id: &str, stats: BaseStats, troops: u32, skills: Vec<(SkillSlot, SkillRecord)>) -> Combatant {
    let innate_id = skills
        .iter()
        .find(|(slot, _)| *slot == SkillSlot::Innate)
        .map(|(_, s)| s.skill_id.clone())
        .unwrap_or_default();
    Combatant::new(
        UnitRecord::new(id, id, stats, troops, innate_id),
        troops,
        skills
            .into_iter()
            .map(|(slot, skill)| EquippedSkill { slot, skill })
            .collect(),
    )
}

fn innate_only(id: &str, troops: u32, skill: SkillRecord) -> Combatant {
    unit(id, BaseStats::default(), troops, vec![(SkillSlot::Innate, skill)])
}

fn idle_skill(id: &str) -> SkillRecord {
    skill(id, Timing::AfterAttack, TargetSelector::Enemy, 0.0, vec![fixed(100.0)])
}

fn no_normal_attacks() -> TuningTable {
    TuningTable::new().with(keys::NORMAL_ATTACK_RATE, 0.0)
}

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

fn data_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn sample_rosters() -> (Roster, Roster) {
    let catalog = load_catalog(data_dir()).expect("sample catalog should load");
    let matchup: Matchup = serde_json::from_str(
        &std::fs::read_to_string(data_dir().join("matchup.json")).expect("matchup file"),
    )
    .expect("matchup json");
    matchup.build(&catalog).expect("sample matchup should be valid")
}

fn scenario_one() -> (Roster, Roster) {
    let a = Roster::new(vec![innate_only(
        "U1",
        1000,
        skill("S_A", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(100.0)]),
    )]);
    let b = Roster::new(vec![innate_only("U2", 250, idle_skill("S_B"))]);
    (a, b)
}

#[test]
fn certain_fixed_damage_eliminates_in_three_turns() {
    let (a, b) = scenario_one();
    let mut rng = ScriptedSource::constant(0.5);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut rng).expect("battle should resolve");

    assert_eq!(outcome.winner, Winner::A);
    assert_eq!(outcome.decision, Decision::Elimination);
    assert_eq!(outcome.turns, 3);
    approx_eq(outcome.loss_ratio_b, 1.0, 1e-12);
    approx_eq(outcome.loss_ratio_a, 0.0, 1e-12);
    assert_eq!(outcome.triggers.get("S_A"), Some(&3));
    assert_eq!(outcome.triggers.get("S_B"), None);
    let troops_b: Vec<u64> = outcome.snapshots.iter().map(|s| s.troops_b).collect();
    assert_eq!(troops_b, vec![150, 50, 0]);
    // One activation draw per living actor per turn; B is dead before acting in turn 3.
    assert_eq!(rng.consumed(), 5);
}

#[test]
fn inert_mirror_match_is_a_turn_limit_draw() {
    let a = Roster::new(vec![innate_only("U1", 1000, idle_skill("S_A"))]);
    let b = Roster::new(vec![innate_only("U2", 1000, idle_skill("S_B"))]);
    let mut rng = ScriptedSource::constant(0.99);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut rng).expect("battle should resolve");

    assert_eq!(outcome.winner, Winner::Draw);
    assert_eq!(outcome.decision, Decision::TurnLimit);
    assert_eq!(outcome.turns, MAX_TURNS);
    assert_eq!(outcome.snapshots.len(), MAX_TURNS as usize);
    assert!(outcome.triggers.is_empty());
    assert!(outcome.log.is_empty());
    assert_eq!(rng.consumed(), 2 * MAX_TURNS as usize);
}

#[test]
fn normal_attack_uses_physical_formula_with_variance() {
    let tuning = TuningTable::standard().with(keys::ATTACK_MIX_LEA, 0.0);
    let a = Roster::new(vec![unit(
        "U1",
        BaseStats::new(100.0, 0.0, 50.0, 10.0),
        10_000,
        vec![(SkillSlot::Innate, idle_skill("S_A"))],
    )]);
    let b = Roster::new(vec![unit(
        "U2",
        BaseStats::new(0.0, 0.0, 100.0, 0.0),
        10_000,
        vec![(SkillSlot::Innate, idle_skill("S_B"))],
    )]);
    let mut rng = ScriptedSource::constant(0.33);
    let outcome = resolve(&a, &b, &tuning, &mut rng).expect("battle should resolve");

    // (100 - 0.7 * 100) * 20 * 0.983 = 589.8
    let first = &outcome.log[0];
    assert_eq!(first.turn, 1);
    assert_eq!(first.phase, Phase::Attack);
    assert_eq!(first.actor_id, "U1");
    assert_eq!(first.action, Action::NormalAttack);
    assert_eq!(first.effects[0].effect, EffectKind::PhysicalDamage);
    approx_eq(first.effects[0].magnitude, 589.0, 1e-9);
    assert_eq!(first.effects[0].target_troops, 9_411);

    // B's formula yields nothing, but every formula hit moves at least one troop.
    let second = &outcome.log[1];
    assert_eq!(second.actor_id, "U2");
    approx_eq(second.effects[0].magnitude, 1.0, 1e-9);
    assert_eq!(outcome.snapshots[0].troops_a, 9_999);
    assert_eq!(outcome.snapshots[0].troops_b, 9_411);
}

#[test]
fn heals_never_exceed_starting_troops() {
    let tuning = no_normal_attacks()
        .with(keys::HEAL_SCALE, 18.0)
        .with(keys::RANDOM_MIN, 1.0)
        .with(keys::RANDOM_MAX, 1.0);
    let heal = skill(
        "S_HEAL",
        Timing::TurnStart,
        TargetSelector::Ally,
        1.0,
        vec![Effect::Heal {
            rate: 1.0,
            count: 1,
            target: None,
        }],
    );
    let a = Roster::new(vec![unit(
        "U1",
        BaseStats::new(0.0, 100.0, 0.0, 0.0),
        1000,
        vec![(SkillSlot::Innate, heal)],
    )]);
    let b = Roster::new(vec![innate_only(
        "U2",
        500,
        skill("S_HIT", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(10.0)]),
    )]);
    let outcome = resolve(&a, &b, &tuning, &mut ScriptedSource::constant(0.5)).expect("battle should resolve");

    let heals: Vec<f64> = outcome
        .log
        .iter()
        .flat_map(|entry| entry.effects.iter())
        .filter(|record| record.effect == EffectKind::Heal)
        .map(|record| record.magnitude)
        .collect();
    assert_eq!(heals.len(), MAX_TURNS as usize);
    approx_eq(heals[0], 0.0, 1e-12);
    assert!(heals[1..].iter().all(|gained| (*gained - 10.0).abs() < 1e-12));

    assert_eq!(outcome.units[0].remaining_troops, 990);
    assert_eq!(outcome.winner, Winner::B);
    assert_eq!(outcome.decision, Decision::TurnLimit);
}

#[test]
fn heal_with_count_restores_the_weakest_allies() {
    let tuning = no_normal_attacks()
        .with(keys::HEAL_SCALE, 0.5)
        .with(keys::RANDOM_MIN, 1.0)
        .with(keys::RANDOM_MAX, 1.0);
    let mass_heal: SkillRecord = serde_json::from_str(
        r#"{
            "skill_id": "S_MEND",
            "name": "mend",
            "timing": "turn_start",
            "target": "self",
            "proc": 1.0,
            "effects": [{"type": "heal", "target": "ally_lowest", "count": 2, "rate": 1.0}]
        }"#,
    )
    .expect("heal skill should parse");

    let a = Roster::new(vec![
        unit("A0", BaseStats::new(0.0, 100.0, 0.0, 10.0), 1000, vec![(SkillSlot::Innate, mass_heal)]),
        unit("A1", BaseStats::default(), 1000, vec![(SkillSlot::Innate, idle_skill("S_A1"))]),
        unit("A2", BaseStats::default(), 1000, vec![(SkillSlot::Innate, idle_skill("S_A2"))]),
    ]);
    let b = Roster::new(vec![unit(
        "B0",
        BaseStats::new(0.0, 0.0, 0.0, 90.0),
        1000,
        vec![
            (
                SkillSlot::Innate,
                skill("S_SWEEP", Timing::TurnStart, TargetSelector::AllEnemies, 1.0, vec![fixed(100.0)]),
            ),
            (
                SkillSlot::Learned,
                skill("S_PIERCE", Timing::TurnStart, TargetSelector::Enemy, 1.0, vec![fixed(300.0)]),
            ),
        ],
    )]);

    // B0 acts first: everyone on A drops to 900, then the 0.5 draw sends the
    // second hit to slot 1 (600). A0 then heals A1 and itself, not A2.
    let outcome = BattleSetup::new(&a, &b, &tuning)
        .expect("setup should validate")
        .trace(TraceMode::Events)
        .run(&mut ScriptedSource::constant(0.5))
        .expect("battle should resolve");

    let heals: Vec<(&str, f64, u32)> = outcome
        .log
        .iter()
        .filter(|entry| entry.turn == 1)
        .flat_map(|entry| entry.effects.iter())
        .filter(|record| record.effect == EffectKind::Heal)
        .map(|record| (record.target_id.as_str(), record.magnitude, record.target_troops))
        .collect();
    assert_eq!(heals, vec![("A1", 50.0, 650), ("A0", 50.0, 950)]);
}

#[test]
fn mutual_elimination_is_a_draw() {
    let blast = skill("S_BLAST", Timing::TurnStart, TargetSelector::All, 1.0, vec![fixed(1000.0)]);
    let a = Roster::new(vec![innate_only("U1", 400, blast)]);
    let b = Roster::new(vec![innate_only("U2", 300, idle_skill("S_B"))]);
    let mut rng = ScriptedSource::constant(0.5);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut rng).expect("battle should resolve");

    assert_eq!(outcome.winner, Winner::Draw);
    assert_eq!(outcome.decision, Decision::MutualElimination);
    assert_eq!(outcome.turns, 1);
    approx_eq(outcome.loss_ratio_a, 1.0, 1e-12);
    approx_eq(outcome.loss_ratio_b, 1.0, 1e-12);
    assert!(outcome.units.iter().all(|u| u.remaining_troops == 0));
    // Only U1's activation: U2 is gone before it acts.
    assert_eq!(rng.consumed(), 1);
}

fn attrition_matchup(hit_a: f64, hit_b: f64) -> (Roster, Roster) {
    let a = Roster::new(vec![innate_only(
        "U1",
        1000,
        skill("S_A", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(hit_a)]),
    )]);
    let b = Roster::new(vec![innate_only(
        "U2",
        500,
        skill("S_B", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(hit_b)]),
    )]);
    (a, b)
}

#[test]
fn turn_limit_compares_remaining_ratios_not_troops() {
    // A: 1000 - 8*50 = 600 (0.6); B: 500 - 8*25 = 300 (0.6).
    let (a, b) = attrition_matchup(25.0, 50.0);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.5))
        .expect("battle should resolve");
    assert_eq!(outcome.decision, Decision::TurnLimit);
    assert_eq!(outcome.winner, Winner::Draw);
    assert_eq!(outcome.units[0].remaining_troops, 600);
    assert_eq!(outcome.units[1].remaining_troops, 300);

    // A keeps 520 troops (0.52) against B's 300 (0.6): fewer troops, better ratio.
    let (a, b) = attrition_matchup(25.0, 60.0);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.5))
        .expect("battle should resolve");
    assert_eq!(outcome.decision, Decision::TurnLimit);
    assert_eq!(outcome.units[0].remaining_troops, 520);
    assert_eq!(outcome.winner, Winner::B);
}

/// Every formula effect hits for a flat 42 per unit of rate.
struct FlatModel;

impl DamageModel for FlatModel {
    fn damage(
        &self,
        _kind: EffectKind,
        _attacker: &StatLine,
        _defender: &StatLine,
        rate: f64,
    ) -> Result<f64, SimError> {
        Ok(42.0 * rate)
    }

    fn heal(&self, _healer: &StatLine, _rate: f64) -> Result<f64, SimError> {
        Ok(0.0)
    }

    fn variance(&self, _draw: f64) -> Result<f64, SimError> {
        Ok(1.0)
    }
}

#[test]
fn custom_damage_model_drives_the_turn_loop() {
    let a = Roster::new(vec![innate_only("U1", 1000, idle_skill("S_A"))]);
    let b = Roster::new(vec![innate_only("U2", 1000, idle_skill("S_B"))]);
    let rules = BattleRules {
        normal_attack_rate: 1.0,
        confusion_skips_action: true,
    };
    let outcome = BattleSetup::with_model(&a, &b, FlatModel, rules)
        .expect("setup should validate")
        .trace(TraceMode::Events)
        .run(&mut ScriptedSource::constant(0.5))
        .expect("battle should resolve");

    let first = &outcome.log[0];
    assert_eq!(first.action, Action::NormalAttack);
    assert_eq!(first.effects[0].effect, EffectKind::PhysicalDamage);
    approx_eq(first.effects[0].magnitude, 42.0, 1e-12);
    assert_eq!(outcome.snapshots[0].troops_b, 958);

    assert_eq!(outcome.decision, Decision::TurnLimit);
    assert_eq!(outcome.winner, Winner::Draw);
    assert!(outcome.units.iter().all(|u| u.remaining_troops == 1000 - 8 * 42));

    let empty = Roster::new(Vec::new());
    assert!(BattleSetup::with_model(&a, &empty, FlatModel, rules).is_err());
}

fn confusion_matchup() -> (Roster, Roster) {
    let confuse = skill(
        "S_CONFUSE",
        Timing::TurnStart,
        TargetSelector::Enemy,
        1.0,
        vec![Effect::Status {
            kind: StatusKind::Confusion,
            turns: 1,
            target: None,
        }],
    );
    let a = Roster::new(vec![unit(
        "U1",
        BaseStats::new(0.0, 0.0, 0.0, 50.0),
        1000,
        vec![(SkillSlot::Innate, confuse)],
    )]);
    let b = Roster::new(vec![innate_only(
        "U2",
        1000,
        skill("S_HIT", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(50.0)]),
    )]);
    (a, b)
}

#[test]
fn confused_units_lose_their_actions() {
    let (a, b) = confusion_matchup();
    let tuning = no_normal_attacks().with(keys::CONFUSION_SKIP_ACTION, 1.0);
    let outcome = resolve(&a, &b, &tuning, &mut ScriptedSource::constant(0.5)).expect("battle should resolve");

    assert_eq!(outcome.triggers.get("S_HIT"), None);
    assert_eq!(outcome.triggers.get("S_CONFUSE"), Some(&MAX_TURNS));
    assert!(outcome
        .log
        .iter()
        .any(|entry| entry.actor_id == "U2" && entry.action == Action::Confused));
    assert_eq!(outcome.winner, Winner::Draw);
    approx_eq(outcome.loss_ratio_a, 0.0, 1e-12);
}

#[test]
fn confusion_can_be_disabled_by_tuning() {
    let (a, b) = confusion_matchup();
    let tuning = no_normal_attacks().with(keys::CONFUSION_SKIP_ACTION, 0.0);
    let outcome = resolve(&a, &b, &tuning, &mut ScriptedSource::constant(0.5)).expect("battle should resolve");

    assert_eq!(outcome.triggers.get("S_HIT"), Some(&MAX_TURNS));
    assert_eq!(outcome.units[0].remaining_troops, 1000 - 50 * MAX_TURNS);
    assert_eq!(outcome.winner, Winner::B);
}

#[test]
fn this_turn_modifiers_expire_and_stack_with_fixed_damage() {
    let expose = skill(
        "S_EXPOSE",
        Timing::TurnStart,
        TargetSelector::Enemy,
        1.0,
        vec![Effect::Modifier {
            stat: ModifierStat::DamageTaken,
            amount: 0.5,
            duration: Duration::ThisTurn,
            target: None,
        }],
    );
    let strike = skill("S_STRIKE", Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(100.0)]);
    let a = Roster::new(vec![unit(
        "U1",
        BaseStats::default(),
        1000,
        vec![(SkillSlot::Innate, expose), (SkillSlot::Learned, strike)],
    )]);
    let b = Roster::new(vec![innate_only("U2", 1000, idle_skill("S_B"))]);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.5)).expect("battle should resolve");

    let troops_b: Vec<u64> = outcome.snapshots.iter().take(3).map(|s| s.troops_b).collect();
    assert_eq!(troops_b, vec![850, 700, 550]);
}

#[test]
fn faster_units_act_first_and_ties_favor_side_a() {
    let strike = |id: &str| skill(id, Timing::AfterAttack, TargetSelector::Enemy, 1.0, vec![fixed(1.0)]);
    let a = Roster::new(vec![unit(
        "SLOW",
        BaseStats::new(0.0, 0.0, 0.0, 10.0),
        100,
        vec![(SkillSlot::Innate, strike("S_SLOW"))],
    )]);
    let b = Roster::new(vec![
        unit("FAST", BaseStats::new(0.0, 0.0, 0.0, 90.0), 100, vec![(SkillSlot::Innate, strike("S_FAST"))]),
        unit("TIED", BaseStats::new(0.0, 0.0, 0.0, 10.0), 100, vec![(SkillSlot::Innate, strike("S_TIED"))]),
    ]);
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.0)).expect("battle should resolve");

    let first_turn: Vec<&str> = outcome
        .log
        .iter()
        .filter(|entry| entry.turn == 1)
        .map(|entry| entry.actor_id.as_str())
        .collect();
    assert_eq!(first_turn, vec!["FAST", "SLOW", "TIED"]);
}

#[test]
fn same_seed_reproduces_the_same_battle() {
    let (a, b) = sample_rosters();
    let tuning = TuningTable::standard();
    let setup = BattleSetup::new(&a, &b, &tuning).expect("valid setup");
    let first = setup.run(&mut Rng::new(2024)).expect("battle");
    let second = setup.run(&mut Rng::new(2024)).expect("battle");
    assert_eq!(first, second);

    let quiet = BattleSetup::new(&a, &b, &tuning)
        .expect("valid setup")
        .trace(TraceMode::Off)
        .run(&mut Rng::new(2024))
        .expect("battle");
    assert!(quiet.log.is_empty());
    assert_eq!(quiet.winner, first.winner);
    assert_eq!(quiet.snapshots, first.snapshots);
}

#[test]
fn empty_and_oversized_rosters_are_rejected() {
    let (a, _) = scenario_one();
    let tuning = no_normal_attacks();
    let empty = Roster::new(Vec::new());
    let err = resolve(&a, &empty, &tuning, &mut ScriptedSource::constant(0.5)).unwrap_err();
    assert!(matches!(err, SimError::Configuration(ConfigError::EmptyRoster(Side::B))));

    let crowd = Roster::new(
        (0..4)
            .map(|i| innate_only(&format!("U{i}"), 100, idle_skill(&format!("S{i}"))))
            .collect(),
    );
    let err = resolve(&crowd, &a, &tuning, &mut ScriptedSource::constant(0.5)).unwrap_err();
    assert!(matches!(
        err,
        SimError::Configuration(ConfigError::RosterTooLarge { side: Side::A, len: 4, .. })
    ));
}

#[test]
fn duplicate_units_and_bad_probabilities_are_rejected() {
    let tuning = no_normal_attacks();
    let (_, b) = scenario_one();
    let twins = Roster::new(vec![
        innate_only("U1", 100, idle_skill("S1")),
        innate_only("U1", 100, idle_skill("S1")),
    ]);
    let err = resolve(&twins, &b, &tuning, &mut ScriptedSource::constant(0.5)).unwrap_err();
    assert!(matches!(err, SimError::Configuration(ConfigError::DuplicateUnit { .. })));

    let reckless = Roster::new(vec![innate_only(
        "U1",
        100,
        skill("S_BAD", Timing::AfterAttack, TargetSelector::Enemy, 1.5, vec![fixed(1.0)]),
    )]);
    let err = resolve(&reckless, &b, &tuning, &mut ScriptedSource::constant(0.5)).unwrap_err();
    assert!(matches!(
        err,
        SimError::Configuration(ConfigError::ProbabilityOutOfRange { .. })
    ));
}

#[test]
fn missing_tuning_keys_fail_before_any_draw() {
    let physical = skill(
        "S_PHYS",
        Timing::AfterAttack,
        TargetSelector::Enemy,
        0.5,
        vec![Effect::PhysicalDamage {
            rate: 1.0,
            target: None,
        }],
    );
    let a = Roster::new(vec![innate_only("U1", 100, physical)]);
    let b = Roster::new(vec![innate_only("U2", 100, idle_skill("S_B"))]);
    let mut rng = ScriptedSource::constant(0.5);

    let err = resolve(&a, &b, &no_normal_attacks(), &mut rng).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, SimError::Configuration(ConfigError::MissingTuningKey(_))));

    let err = resolve(&a, &b, &TuningTable::new(), &mut rng).unwrap_err();
    assert_eq!(
        err,
        SimError::Configuration(ConfigError::MissingTuningKey(keys::NORMAL_ATTACK_RATE.to_string()))
    );
    assert_eq!(rng.consumed(), 0);
}

#[test]
fn matchup_entries_resolve_skills_from_the_catalog() {
    let catalog = load_catalog(data_dir()).expect("sample catalog");
    let roster = Roster::from_catalog(
        Side::A,
        &catalog,
        &[RosterEntry::new("U_NOBU").with_learned("S_002").with_troops(50_000)],
    )
    .expect("valid roster");
    let nobu = &roster.units()[0];
    assert_eq!(nobu.troops, nobu.unit.max_troops);
    let slots: Vec<SkillSlot> = nobu.skills.iter().map(|s| s.slot).collect();
    assert_eq!(slots, vec![SkillSlot::Innate, SkillSlot::Learned]);

    let err = Roster::from_catalog(Side::B, &catalog, &[RosterEntry::new("U_NOBODY")]).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownUnit(_)));
}

#[test]
fn csv_export_has_one_row_per_applied_effect() {
    let (a, b) = scenario_one();
    let outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.5)).expect("battle should resolve");
    let csv = log_to_csv_string(&outcome).expect("csv export");

    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(CSV_COLUMNS.join(",").as_str()));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("1,attack,A,0,U1,S_A,B,0,U2,fixed_damage,"));
    assert!(rows[2].ends_with(",0"));
}

#[test]
fn outcome_serializes_for_the_battle_command() {
    let (a, b) = scenario_one();
    let outcome: Outcome = resolve(&a, &b, &no_normal_attacks(), &mut ScriptedSource::constant(0.5)).expect("battle should resolve");
    let json = serde_json::to_value(&outcome).expect("outcome json");
    assert_eq!(json["winner"], "A");
    assert_eq!(json["decision"], "elimination");
    assert_eq!(json["log"][0]["action"]["kind"], "skill");
    assert_eq!(json["log"][0]["action"]["skill_id"], "S_A");
}

fn arb_unit(id: &'static str) -> impl Strategy<Value = Combatant> {
    (
        0.0..120.0f64,
        0.0..120.0f64,
        0.0..120.0f64,
        0.0..120.0f64,
        1u32..20_000,
        0.0..=1.0f64,
        0.1..3.0f64,
        0usize..3,
    )
        .prop_map(move |(str_, int_, lea, spd, troops, p, rate, kind)| {
            let effect = match kind {
                0 => Effect::PhysicalDamage { rate, target: None },
                1 => Effect::StrategyDamage { rate, target: None },
                _ => Effect::Heal {
                    rate,
                    count: 1,
                    target: None,
                },
            };
            let target = if kind == 2 {
                TargetSelector::Ally
            } else {
                TargetSelector::AllEnemies
            };
            let skill = skill(&format!("S_{id}"), Timing::AfterAttack, target, p, vec![effect]);
            unit(id, BaseStats::new(str_, int_, lea, spd), troops, vec![(SkillSlot::Innate, skill)])
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn troop_and_turn_bounds_hold(
        a in prop::collection::vec(arb_unit("A"), 1..=1),
        b1 in arb_unit("B1"),
        b2 in arb_unit("B2"),
        seed in any::<u64>(),
    ) {
        let roster_a = Roster::new(a);
        let roster_b = Roster::new(vec![b1, b2]);
        let outcome = resolve(&roster_a, &roster_b, &TuningTable::standard(), &mut Rng::new(seed))
            .expect("generated battles should resolve");

        prop_assert!(outcome.turns >= 1 && outcome.turns <= MAX_TURNS);
        prop_assert_eq!(outcome.snapshots.len(), outcome.turns as usize);
        for unit in &outcome.units {
            prop_assert!(unit.remaining_troops <= unit.starting_troops);
        }
        for ratio in [outcome.loss_ratio_a, outcome.loss_ratio_b] {
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
        match outcome.decision {
            Decision::Elimination => {
                let loser = outcome.winner.side().expect("elimination has a winner").opponent();
                prop_assert_eq!(outcome.remaining_troops(loser), 0);
            }
            Decision::MutualElimination => prop_assert_eq!(outcome.winner, Winner::Draw),
            Decision::TurnLimit => prop_assert_eq!(outcome.turns, MAX_TURNS),
        }
    }
}
