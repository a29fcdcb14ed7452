//! Random battle simulation.
//!
//! Plays complete battles between randomly generated armies, choosing
//! random legal command cards, orders, activations, damage, and rallies,
//! and checks the state-machine invariants after every round. Used by the
//! `simulate` binary to soak-test the engine and by the test suite.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::battle::{Army, Battle, Side, TokenKind, Unit, UnitPatch, ALL_SIDES};
use crate::catalog::Catalog;
use crate::config::{RulesConfig, ShieldSource};
use crate::error::EngineError;
use crate::resolve::{
    activate_unit, advance_phase, end_battle, order_limit, pass_turn, rally_step,
    remove_unspent_tokens, resolve_priority, select_command_card, toggle_unit_order, update_unit,
    PriorityReason,
};
use crate::rules::{BattlePhase, Faction, UnitType, ALL_FACTIONS, SYSTEM_CARDS};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of battles to play.
    pub num_battles: usize,
    /// Rounds per battle before a winner is declared.
    pub rounds: u32,
    /// Units fielded by each side.
    pub units_per_side: usize,
    /// Number of parallel threads.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-battle progress output.
    pub quiet: bool,
    pub rules: RulesConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_battles: 100,
            rounds: 6,
            units_per_side: 5,
            threads: 4,
            seed: 0,
            quiet: false,
            rules: RulesConfig::default(),
        }
    }
}

/// A pair of per-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideCounts {
    pub blue: u32,
    pub red: u32,
}

impl SideCounts {
    fn bump(&mut self, side: Side) {
        match side {
            Side::Blue => self.blue += 1,
            Side::Red => self.red += 1,
        }
    }
}

/// The record of one simulated battle, written as a JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct BattleRecord {
    pub battle_id: usize,
    pub blue_faction: Faction,
    pub red_faction: Faction,
    pub rounds_played: u32,
    pub winner: Option<Side>,
    pub priority_wins: SideCounts,
    pub priority_ties: u32,
    pub orders_issued: u32,
    pub activations: u32,
    pub defeated: SideCounts,
    /// Invariant violations observed during play. Empty for a sound engine.
    pub violations: Vec<String>,
    /// The engine error that aborted the battle, if any.
    pub error: Option<String>,
}

impl BattleRecord {
    fn new(battle_id: usize, blue_faction: Faction, red_faction: Faction) -> Self {
        BattleRecord {
            battle_id,
            blue_faction,
            red_faction,
            rounds_played: 0,
            winner: None,
            priority_wins: SideCounts::default(),
            priority_ties: 0,
            orders_issued: 0,
            activations: 0,
            defeated: SideCounts::default(),
            violations: Vec::new(),
            error: None,
        }
    }

    /// True if the battle finished without errors or violations.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.error.is_none()
    }
}

const UNIT_ROSTER: [(&str, UnitType, u32); 6] = [
    ("Troopers", UnitType::Corps, 4),
    ("Scouts", UnitType::SpecialForces, 3),
    ("Speeder", UnitType::Support, 3),
    ("Walker", UnitType::Heavy, 8),
    ("Droid", UnitType::Auxiliary, 5),
    ("Sniper Team", UnitType::Corps, 2),
];

/// Generates a random army for `faction`: one commander (named after a
/// commander the faction's cards require, when there is one) plus random
/// rank-and-file units.
pub fn random_army(id: &str, faction: Faction, units: usize, rng: &mut impl Rng) -> Army {
    let commanders: Vec<&str> = SYSTEM_CARDS
        .iter()
        .filter(|c| c.faction == Some(faction))
        .filter_map(|c| c.commander)
        .collect();
    let commander = commanders.choose(rng).copied().unwrap_or("Field Commander");

    let mut army = Army::new(id, format!("{} strike force", faction.name()), id, faction)
        .with_unit(Unit::new(format!("{id}-cmd"), commander, UnitType::Command, 6));
    for i in 1..units {
        let (name, unit_type, wounds) = UNIT_ROSTER[rng.gen_range(0..UNIT_ROSTER.len())].clone();
        let shielded = if unit_type == UnitType::Heavy { rng.gen_range(0..=2) } else { 0 };
        army = army.with_unit(Unit::new(format!("{id}-u{i}"), name, unit_type, wounds).with_shielded(shielded));
    }
    army
}

/// Plays one complete battle.
pub fn play_battle(config: &SimulationConfig, battle_id: usize, rng: &mut SmallRng) -> BattleRecord {
    let blue_faction = *ALL_FACTIONS.choose(rng).unwrap_or(&Faction::Rebels);
    let red_faction = *ALL_FACTIONS.choose(rng).unwrap_or(&Faction::Empire);
    let blue = random_army("blue", blue_faction, config.units_per_side, rng);
    let red = random_army("red", red_faction, config.units_per_side, rng);
    let mut battle = Battle::from_armies(format!("sim-{battle_id}"), "Simulated battle", &blue, &red);
    let catalog = Catalog::default();

    let mut record = BattleRecord::new(battle_id, blue_faction, red_faction);
    if let Err(e) = run_battle(config, &catalog, &mut battle, &mut record, rng) {
        tracing::error!(battle = battle_id, error = %e, "simulated battle aborted");
        record.error = Some(e.to_string());
    }
    record.defeated = SideCounts {
        blue: battle.blue.units.iter().filter(|u| u.is_defeated()).count() as u32,
        red: battle.red.units.iter().filter(|u| u.is_defeated()).count() as u32,
    };
    record.winner = battle.winner;
    record
}

fn run_battle(
    config: &SimulationConfig,
    catalog: &Catalog,
    battle: &mut Battle,
    record: &mut BattleRecord,
    rng: &mut SmallRng,
) -> Result<(), EngineError> {
    for _ in 0..config.rounds {
        let round = battle.current_round;

        command_phase(catalog, battle, record, rng)?;
        advance_phase(battle, &config.rules)?;
        activation_phase(battle, record, rng)?;
        advance_phase(battle, &config.rules)?;
        end_phase(battle, rng)?;
        let ending_active = battle.active_player;
        advance_phase(battle, &config.rules)?;

        record.rounds_played += 1;
        check_round_reset(battle, round, ending_active, &config.rules, &mut record.violations);
    }

    let winner = pick_winner(battle, rng);
    end_battle(battle, winner)?;
    Ok(())
}

fn command_phase(
    catalog: &Catalog,
    battle: &mut Battle,
    record: &mut BattleRecord,
    rng: &mut SmallRng,
) -> Result<(), EngineError> {
    for side in ALL_SIDES {
        let usable: Vec<String> = catalog
            .card_options(battle.side(side))
            .into_iter()
            .filter(|o| o.usable)
            .map(|o| o.card.id)
            .collect();
        let Some(card) = usable.choose(rng) else {
            record.violations.push(format!("{side} has no usable command card"));
            continue;
        };
        select_command_card(battle, side, card, catalog)?;
    }

    let outcome = resolve_priority(battle, rng)?;
    match outcome.reason {
        PriorityReason::LowerPips { .. } => record.priority_wins.bump(outcome.winner),
        PriorityReason::TieBreak { .. } => record.priority_ties += 1,
    }

    for side in ALL_SIDES {
        let limit = order_limit(battle, side)? as usize;
        let mut ids: Vec<String> = battle.side(side).units.iter().map(|u| u.id.clone()).collect();
        ids.shuffle(rng);
        for id in ids.iter().take(rng.gen_range(0..=limit)) {
            toggle_unit_order(battle, side, id)?;
            record.orders_issued += 1;
        }
        if battle.side(side).orders_issued() > limit {
            record.violations.push(format!("{side} holds more orders than its card grants"));
        }
    }
    Ok(())
}

/// Alternates activations until every unit on both sides has activated.
fn activation_phase(battle: &mut Battle, record: &mut BattleRecord, rng: &mut SmallRng) -> Result<(), EngineError> {
    loop {
        let active = battle.active_player;
        let pending: Vec<String> = battle
            .side(active)
            .units
            .iter()
            .filter(|u| !u.has_activated)
            .map(|u| u.id.clone())
            .collect();

        if let Some(id) = pending.choose(rng) {
            activate_unit(battle, active, id)?;
            record.activations += 1;
            attack(battle, active, id, &mut record.violations, rng)?;
        }

        if battle.side(active.opponent()).unactivated_count() > 0 {
            pass_turn(battle)?;
        } else if battle.side(active).unactivated_count() == 0 {
            return Ok(());
        }
    }
}

/// Applies a random attack from `attacker` to a random enemy unit, with the
/// occasional out-of-range patch to exercise clamping.
fn attack(
    battle: &mut Battle,
    side: Side,
    attacker: &str,
    violations: &mut Vec<String>,
    rng: &mut SmallRng,
) -> Result<(), EngineError> {
    let enemy = side.opponent();
    let targets: Vec<(String, u32, u32)> = battle
        .side(enemy)
        .units
        .iter()
        .filter(|u| !u.is_defeated())
        .map(|u| (u.id.clone(), u.current_wounds, u.suppression))
        .collect();
    let Some((target, wounds, suppression)) = targets.choose(rng) else {
        return Ok(());
    };

    let patch = if rng.gen_bool(0.1) {
        UnitPatch::new().current_wounds(-3).suppression(-1)
    } else {
        UnitPatch::new()
            .current_wounds(i64::from(*wounds) - rng.gen_range(0..=2))
            .suppression(i64::from(*suppression) + rng.gen_range(0..=2))
    };
    let hit = update_unit(battle, enemy, target, &patch)?;
    if hit.current_wounds > hit.wounds {
        violations.push(format!("{enemy} unit {target} exceeded its maximum wounds"));
    }

    let spent = UnitPatch::new()
        .token(TokenKind::Aim, rng.gen_range(0..=1))
        .token(TokenKind::Dodge, rng.gen_range(0..=1))
        .surge_attack_used(rng.gen_bool(0.5));
    update_unit(battle, side, attacker, &spent)?;
    Ok(())
}

fn end_phase(battle: &mut Battle, rng: &mut SmallRng) -> Result<(), EngineError> {
    for side in ALL_SIDES {
        let ids: Vec<(String, u32)> = battle
            .side(side)
            .units
            .iter()
            .map(|u| (u.id.clone(), u.suppression))
            .collect();
        for (id, suppression) in ids {
            if suppression > 0 && rng.gen_bool(0.5) {
                rally_step(battle, side, &id)?;
            }
            remove_unspent_tokens(battle, side, &id)?;
        }
    }
    Ok(())
}

/// Records any round-boundary property that failed to hold.
fn check_round_reset(
    battle: &Battle,
    previous_round: u32,
    ending_active: Side,
    rules: &RulesConfig,
    violations: &mut Vec<String>,
) {
    let round = battle.current_round;
    if round != previous_round + 1 {
        violations.push(format!("round {previous_round} was followed by round {round}"));
    }
    if battle.current_phase != BattlePhase::Command {
        violations.push(format!("round {round} began in the {} phase", battle.current_phase));
    }
    if battle.active_player == ending_active {
        violations.push(format!("active player did not flip entering round {round}"));
    }
    if battle.last_priority.is_some() {
        violations.push(format!("priority carried into round {round}"));
    }
    for side in ALL_SIDES {
        if battle.side(side).command_card.is_some() {
            violations.push(format!("{side} kept its command card into round {round}"));
        }
    }
    for (side, unit) in battle.units() {
        if unit.has_order || unit.has_activated || unit.surge_attack_used || unit.surge_defense_used {
            violations.push(format!("{side} unit {} kept round flags into round {round}", unit.id));
        }
        let spendable = unit.tokens.total() - unit.tokens.shield;
        if spendable > 0 {
            violations.push(format!("{side} unit {} kept tokens into round {round}", unit.id));
        }
        if rules.shield_source == ShieldSource::Keyword && unit.tokens.shield != unit.shielded {
            violations.push(format!("{side} unit {} shield not restored", unit.id));
        }
        if unit.current_wounds > unit.wounds {
            violations.push(format!("{side} unit {} has more wounds than its maximum", unit.id));
        }
    }
}

/// The side with more remaining wounds wins; ties are a coin flip.
fn pick_winner(battle: &Battle, rng: &mut SmallRng) -> Side {
    let remaining = |side: Side| -> u32 { battle.side(side).units.iter().map(|u| u.current_wounds).sum() };
    let (blue, red) = (remaining(Side::Blue), remaining(Side::Red));
    if blue > red {
        Side::Blue
    } else if red > blue {
        Side::Red
    } else if rng.gen_bool(0.5) {
        Side::Blue
    } else {
        Side::Red
    }
}

fn battle_rng(config: &SimulationConfig, battle_id: usize) -> SmallRng {
    if config.seed != 0 {
        SmallRng::seed_from_u64(config.seed.wrapping_add(battle_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

fn report_progress(config: &SimulationConfig, n: usize, record: &BattleRecord, started: Instant) {
    if config.quiet {
        return;
    }
    let outcome = match record.winner {
        Some(w) => format!("{w} wins"),
        None => "no winner".to_string(),
    };
    eprintln!(
        "Battle {}/{}: {} after {} rounds ({:.1}ms)",
        n,
        config.num_battles,
        outcome,
        record.rounds_played,
        started.elapsed().as_secs_f64() * 1000.0,
    );
}

/// Runs the configured number of battles, in parallel when
/// `config.threads > 1`. Records are returned in battle-id order.
pub fn run_simulation(config: &SimulationConfig) -> Vec<BattleRecord> {
    if config.threads > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(config.threads).build() {
            Ok(pool) => return run_parallel(config, &pool),
            Err(e) => tracing::warn!(error = %e, "thread pool unavailable, running sequentially"),
        }
    }
    run_sequential(config)
}

fn run_sequential(config: &SimulationConfig) -> Vec<BattleRecord> {
    let mut records = Vec::with_capacity(config.num_battles);
    for i in 0..config.num_battles {
        let started = Instant::now();
        let mut rng = battle_rng(config, i);
        let record = play_battle(config, i, &mut rng);
        report_progress(config, i + 1, &record, started);
        records.push(record);
    }
    records
}

fn run_parallel(config: &SimulationConfig, pool: &rayon::ThreadPool) -> Vec<BattleRecord> {
    use rayon::prelude::*;

    let completed = AtomicUsize::new(0);
    pool.install(|| {
        (0..config.num_battles)
            .into_par_iter()
            .map(|i| {
                let started = Instant::now();
                let mut rng = battle_rng(config, i);
                let record = play_battle(config, i, &mut rng);
                let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                report_progress(config, n, &record, started);
                record
            })
            .collect()
    })
}

/// Writes one JSON object per line.
pub fn write_jsonl<W: Write>(records: &[BattleRecord], out: &mut W) -> std::io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Prints aggregate statistics to stderr.
pub fn print_summary(records: &[BattleRecord]) {
    let total = records.len();
    let mut wins = SideCounts::default();
    let mut priority = SideCounts::default();
    let mut ties = 0u32;
    let mut rounds = 0u32;
    let mut dirty = 0usize;

    for record in records {
        if let Some(w) = record.winner {
            wins.bump(w);
        }
        priority.blue += record.priority_wins.blue;
        priority.red += record.priority_wins.red;
        ties += record.priority_ties;
        rounds += record.rounds_played;
        if !record.is_clean() {
            dirty += 1;
        }
    }

    let pct = |n: u32| 100.0 * f64::from(n) / total.max(1) as f64;
    eprintln!("=== Simulation Summary ===");
    eprintln!("Battles: {}", total);
    eprintln!("Avg rounds/battle: {:.1}", f64::from(rounds) / total.max(1) as f64);
    eprintln!("Blue wins: {} ({:.1}%)", wins.blue, pct(wins.blue));
    eprintln!("Red wins: {} ({:.1}%)", wins.red, pct(wins.red));
    eprintln!("Priority by pips: blue {} / red {}, ties {}", priority.blue, priority.red, ties);
    eprintln!("Battles with errors or violations: {}", dirty);
}
