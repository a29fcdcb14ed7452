//! End-to-end battle scenarios against the library API.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use battle_tracker::battle::{apply_unit_update, Army, Battle, Side, TokenKind, Unit, UnitPatch};
use battle_tracker::catalog::Catalog;
use battle_tracker::config::RulesConfig;
use battle_tracker::error::{EngineError, Precondition};
use battle_tracker::resolve::{
    activate_unit, advance_phase, compare_pips, end_battle, order_count, pass_turn, recover,
    resolve_priority, select_command_card, toggle_unit_order, update_unit, PriorityReason,
};
use battle_tracker::rules::{BattlePhase, Faction, UnitType};

fn battle() -> Battle {
    let blue = Army::new("echo", "Echo Base", "Ana", Faction::Rebels)
        .with_unit(Unit::new("luke", "Luke Skywalker", UnitType::Command, 6))
        .with_unit(Unit::new("rt1", "Rebel Troopers", UnitType::Corps, 5))
        .with_unit(Unit::new("rt2", "Rebel Troopers", UnitType::Corps, 4))
        .with_unit(Unit::new("ft", "Fleet Troopers", UnitType::Corps, 4));
    let red = Army::new("blizzard", "Blizzard Force", "Ben", Faction::Empire)
        .with_unit(Unit::new("vader", "Darth Vader", UnitType::Command, 8))
        .with_unit(Unit::new("st", "Stormtroopers", UnitType::Corps, 4).with_shielded(1));
    Battle::from_armies("hoth", "Battle of Hoth", &blue, &red)
}

fn is_precondition(err: &EngineError) -> bool {
    matches!(err, EngineError::Precondition(_))
}

/// Activates every unit on both sides, alternating turns.
fn activate_all(b: &mut Battle) {
    loop {
        let active = b.active_player;
        let next = b.side(active).units.iter().find(|u| !u.has_activated).map(|u| u.id.clone());
        if let Some(id) = next {
            activate_unit(b, active, &id).unwrap();
        }
        if b.side(active.opponent()).unactivated_count() > 0 {
            pass_turn(b).unwrap();
        } else if b.side(active).unactivated_count() == 0 {
            return;
        }
    }
}

#[test]
fn battle_starts_in_round_one_command_blue() {
    let b = battle();
    assert_eq!(b.current_round, 1);
    assert_eq!(b.current_phase, BattlePhase::Command);
    assert_eq!(b.active_player, Side::Blue);
}

#[test]
fn three_advances_complete_one_round() {
    let config = RulesConfig::default();
    let mut b = battle();
    let mut flips = 0;

    let mut prev = b.active_player;
    advance_phase(&mut b, &config).unwrap();
    flips += usize::from(b.active_player != prev);
    activate_all(&mut b);
    prev = b.active_player;
    advance_phase(&mut b, &config).unwrap();
    flips += usize::from(b.active_player != prev);
    prev = b.active_player;
    let change = advance_phase(&mut b, &config).unwrap();
    flips += usize::from(b.active_player != prev);

    assert!(change.new_round);
    assert_eq!(b.current_phase, BattlePhase::Command);
    assert_eq!(b.current_round, 2);
    assert_eq!(flips, 1);
    assert_eq!(b.active_player, prev.opponent());
}

#[test]
fn round_boundary_resets_units_and_keeps_shields() {
    let config = RulesConfig::default();
    let mut b = battle();
    let catalog = Catalog::default();
    select_command_card(&mut b, Side::Blue, "push", &catalog).unwrap();
    select_command_card(&mut b, Side::Red, "assault", &catalog).unwrap();
    toggle_unit_order(&mut b, Side::Blue, "rt1").unwrap();
    advance_phase(&mut b, &config).unwrap();
    activate_all(&mut b);

    let busy = UnitPatch::new()
        .token(TokenKind::Aim, 2)
        .token(TokenKind::Dodge, 1)
        .token(TokenKind::Surge, 1)
        .token(TokenKind::Ion, 1)
        .token(TokenKind::Smoke, 1)
        .token(TokenKind::Standby, 1)
        .token(TokenKind::Shield, 3)
        .surge_attack_used(true)
        .surge_defense_used(true);
    update_unit(&mut b, Side::Red, "st", &busy).unwrap();
    update_unit(&mut b, Side::Blue, "rt1", &busy).unwrap();

    advance_phase(&mut b, &config).unwrap();
    let shields_before: Vec<u32> = b.units().map(|(_, u)| u.tokens.shield).collect();
    advance_phase(&mut b, &config).unwrap();

    for (_, unit) in b.units() {
        assert!(!unit.has_order && !unit.has_activated, "{} kept round flags", unit.id);
        assert!(!unit.surge_attack_used && !unit.surge_defense_used);
        assert_eq!(unit.tokens.total(), unit.tokens.shield, "{} kept spendable tokens", unit.id);
    }
    let shields_after: Vec<u32> = b.units().map(|(_, u)| u.tokens.shield).collect();
    assert_eq!(shields_after, shields_before);
    assert!(b.blue.command_card.is_none() && b.red.command_card_details.is_none());
}

#[test]
fn activation_guard_counts_unactivated_units() {
    let config = RulesConfig::default();
    let mut b = battle();
    advance_phase(&mut b, &config).unwrap();
    activate_unit(&mut b, Side::Blue, "luke").unwrap();
    let err = advance_phase(&mut b, &config).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Precondition(Precondition::UnactivatedUnits { side: Side::Blue, count: 3 })
    ));
    assert_eq!(b.current_phase, BattlePhase::Activation);
}

#[test]
fn activation_rejects_inactive_player_and_repeats() {
    let config = RulesConfig::default();
    let mut b = battle();
    advance_phase(&mut b, &config).unwrap();
    assert!(is_precondition(&activate_unit(&mut b, Side::Red, "st").unwrap_err()));
    activate_unit(&mut b, Side::Blue, "rt1").unwrap();
    assert!(is_precondition(&activate_unit(&mut b, Side::Blue, "rt1").unwrap_err()));
    assert!(matches!(
        activate_unit(&mut b, Side::Blue, "ghost").unwrap_err(),
        EngineError::NotFound { .. }
    ));
}

#[test]
fn lower_pips_always_win_priority() {
    for seed in 0..50 {
        let mut rng = SmallRng::seed_from_u64(seed);
        assert_eq!(compare_pips(1, 2, &mut rng).winner, Side::Blue);
        assert_eq!(compare_pips(2, 1, &mut rng).winner, Side::Red);
    }
}

#[test]
fn tied_priority_is_even_and_recorded() {
    let mut rng = SmallRng::seed_from_u64(2024);
    let trials = 20_000;
    let mut blue = 0;
    for _ in 0..trials {
        let outcome = compare_pips(2, 2, &mut rng);
        assert_eq!(outcome.reason, PriorityReason::TieBreak { pips: 2 });
        if outcome.winner == Side::Blue {
            blue += 1;
        }
    }
    let share = f64::from(blue) / f64::from(trials);
    assert!((0.47..0.53).contains(&share), "blue share {share}");
}

#[test]
fn order_count_table() {
    assert_eq!(order_count(1), 1);
    assert_eq!(order_count(2), 2);
    assert_eq!(order_count(3), 3);
    assert_eq!(order_count(4), 1);
}

#[test]
fn two_pips_against_standing_orders() {
    let mut b = battle();
    let catalog = Catalog::default();
    select_command_card(&mut b, Side::Blue, "push", &catalog).unwrap();
    select_command_card(&mut b, Side::Red, "standing-orders", &catalog).unwrap();

    let outcome = resolve_priority(&mut b, &mut SmallRng::seed_from_u64(0)).unwrap();
    assert_eq!(outcome.winner, Side::Blue);
    assert_eq!(outcome.reason, PriorityReason::LowerPips { winner_pips: 2, loser_pips: 4 });
    assert_eq!(b.active_player, Side::Blue);

    assert!(toggle_unit_order(&mut b, Side::Blue, "rt1").unwrap());
    assert!(toggle_unit_order(&mut b, Side::Blue, "rt2").unwrap());
    let err = toggle_unit_order(&mut b, Side::Blue, "ft").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Precondition(Precondition::OrderLimit { side: Side::Blue, limit: 2 })
    ));

    // Removal is always allowed and frees the slot.
    assert!(!toggle_unit_order(&mut b, Side::Blue, "rt2").unwrap());
    assert!(toggle_unit_order(&mut b, Side::Blue, "ft").unwrap());

    assert!(toggle_unit_order(&mut b, Side::Red, "st").unwrap());
    assert!(is_precondition(&toggle_unit_order(&mut b, Side::Red, "vader").unwrap_err()));
}

#[test]
fn priority_needs_both_cards() {
    let mut b = battle();
    select_command_card(&mut b, Side::Blue, "ambush", &Catalog::default()).unwrap();
    let err = resolve_priority(&mut b, &mut SmallRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, EngineError::IncompleteSelection { ref missing } if *missing == [Side::Red]));
}

#[test]
fn recover_does_not_heal() {
    let config = RulesConfig::default();
    let mut b = battle();
    let unit = update_unit(&mut b, Side::Blue, "rt1", &UnitPatch::new().current_wounds(2).suppression(4)).unwrap();
    assert_eq!((unit.wounds, unit.current_wounds), (5, 2));

    advance_phase(&mut b, &config).unwrap();
    activate_all(&mut b);
    advance_phase(&mut b, &config).unwrap();
    recover(&mut b, Side::Blue, "rt1").unwrap();

    let unit = b.unit(Side::Blue, "rt1").unwrap();
    assert_eq!(unit.suppression, 0);
    assert_eq!(unit.current_wounds, 2);
}

#[test]
fn ended_battle_is_frozen() {
    let config = RulesConfig::default();
    let mut b = battle();
    advance_phase(&mut b, &config).unwrap();
    end_battle(&mut b, Side::Blue).unwrap();
    assert!(b.is_complete);
    assert_eq!(b.winner, Some(Side::Blue));

    let frozen = b.clone();
    assert!(matches!(
        advance_phase(&mut b, &config).unwrap_err(),
        EngineError::Precondition(Precondition::BattleComplete)
    ));
    assert!(is_precondition(&activate_unit(&mut b, Side::Blue, "luke").unwrap_err()));
    assert!(is_precondition(&update_unit(&mut b, Side::Blue, "luke", &UnitPatch::new().suppression(1)).unwrap_err()));
    assert!(is_precondition(&end_battle(&mut b, Side::Red).unwrap_err()));
    assert_eq!(b, frozen);
}

fn patch_strategy() -> impl Strategy<Value = UnitPatch> {
    (
        proptest::option::of(0u32..20),
        proptest::option::of(-50i64..50),
        proptest::option::of(-50i64..50),
        proptest::collection::vec((0usize..7, -10i64..10), 0..4),
    )
        .prop_map(|(wounds, current, suppression, tokens)| {
            let kinds = [
                TokenKind::Aim,
                TokenKind::Dodge,
                TokenKind::Surge,
                TokenKind::Shield,
                TokenKind::Ion,
                TokenKind::Smoke,
                TokenKind::Standby,
            ];
            UnitPatch {
                wounds,
                current_wounds: current,
                suppression,
                tokens: tokens.into_iter().map(|(k, v)| (kinds[k], v)).collect(),
                ..UnitPatch::default()
            }
        })
}

proptest! {
    #[test]
    fn updates_keep_unit_in_range(patches in proptest::collection::vec(patch_strategy(), 1..8)) {
        let mut unit = Unit::new("u", "Troopers", UnitType::Corps, 5);
        for patch in &patches {
            let before = unit.clone();
            unit = apply_unit_update(&unit, patch);
            prop_assert!(unit.current_wounds <= unit.wounds);
            prop_assert_eq!(unit.has_order, before.has_order);
            prop_assert_eq!(unit.has_activated, before.has_activated);
            if let Some(s) = patch.suppression {
                prop_assert_eq!(i64::from(unit.suppression), s.max(0));
            }
        }
    }

    #[test]
    fn phase_cycle_returns_to_command(rounds in 1u32..6) {
        let config = RulesConfig::default();
        let mut b = battle();
        for _ in 0..rounds {
            advance_phase(&mut b, &config).unwrap();
            activate_all(&mut b);
            advance_phase(&mut b, &config).unwrap();
            advance_phase(&mut b, &config).unwrap();
            prop_assert_eq!(b.current_phase, BattlePhase::Command);
        }
        prop_assert_eq!(b.current_round, 1 + rounds);
        // Every unit starts each round ready to act.
        prop_assert!(b.units().all(|(_, u)| !u.has_activated));
    }
}
