//! Phase sequencing logic.
//!
//! Advances a battle through Command -> Activation -> End and wraps into
//! the next round, applying the round-boundary reset.

use crate::battle::{Battle, Side};
use crate::config::RulesConfig;
use crate::error::{Precondition, Result};
use crate::rules::BattlePhase;

/// A completed phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: BattlePhase,
    pub to: BattlePhase,
    /// True when the transition started a new round.
    pub new_round: bool,
}

/// Computes the phase that follows `phase`.
pub fn next_phase(phase: BattlePhase) -> BattlePhase {
    phase.next()
}

/// Checks whether the battle may leave its current phase.
///
/// Leaving the Activation phase requires every unit of the active player
/// to have activated.
pub fn check_can_advance(battle: &Battle) -> Result<()> {
    battle.ensure_open()?;
    if battle.current_phase == BattlePhase::Activation {
        let side = battle.active_player;
        let count = battle.side(side).unactivated_count();
        if count > 0 {
            return Err(Precondition::UnactivatedUnits { side, count }.into());
        }
    }
    Ok(())
}

/// Advances the battle to the next phase.
///
/// Ending the End phase starts a new round:
/// - the round counter increments
/// - every unit's order, activation, and surge flags clear and its
///   spendable tokens are removed (shields follow `config.shield_source`)
/// - both command-card selections and the priority record clear
/// - the active player flips
///
/// Other transitions change only the phase.
pub fn advance_phase(battle: &mut Battle, config: &RulesConfig) -> Result<PhaseChange> {
    check_can_advance(battle)?;

    let from = battle.current_phase;
    let to = next_phase(from);
    let new_round = from == BattlePhase::End && to == BattlePhase::Command;

    if new_round {
        start_new_round(battle, config);
    }
    battle.current_phase = to;

    tracing::debug!(
        battle = %battle.id,
        round = battle.current_round,
        from = %from,
        to = %to,
        active = %battle.active_player,
        "phase advanced"
    );
    Ok(PhaseChange { from, to, new_round })
}

fn start_new_round(battle: &mut Battle, config: &RulesConfig) {
    battle.current_round += 1;
    for unit in battle.units_mut() {
        unit.reset_for_round(config.shield_source);
    }
    battle.blue.clear_command_card();
    battle.red.clear_command_card();
    battle.last_priority = None;
    battle.active_player = battle.active_player.opponent();
}

/// Ends the battle with `winner`. The battle accepts no further changes.
pub fn end_battle(battle: &mut Battle, winner: Side) -> Result<()> {
    battle.ensure_open()?;
    battle.is_complete = true;
    battle.winner = Some(winner);
    tracing::info!(battle = %battle.id, winner = %winner, round = battle.current_round, "battle ended");
    Ok(())
}
