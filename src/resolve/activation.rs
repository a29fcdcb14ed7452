//! Unit activation and order issuance.
//!
//! Orders are issued during the Command phase, up to the order count of
//! the side's command card. Activations happen during the Activation phase,
//! one per unit per round, and only for the active player's units. The two
//! flags are independent: a unit may activate without an order and keeps
//! its order until the round ends.

use crate::battle::{Battle, Side};
use crate::error::{Precondition, Result};
use crate::rules::BattlePhase;

use super::priority::order_limit;

/// Marks a unit of the active player as activated.
pub fn activate_unit(battle: &mut Battle, side: Side, unit_id: &str) -> Result<()> {
    battle.ensure_phase(BattlePhase::Activation)?;
    if side != battle.active_player {
        return Err(Precondition::NotActivePlayer { side }.into());
    }
    let unit = battle.unit_mut(side, unit_id)?;
    if unit.has_activated {
        return Err(Precondition::AlreadyActivated(unit_id.to_string()).into());
    }
    unit.has_activated = true;
    tracing::debug!(battle = %battle.id, side = %side, unit = unit_id, "unit activated");
    Ok(())
}

/// Hands the turn to the other player during the Activation phase.
/// Returns the new active player.
pub fn pass_turn(battle: &mut Battle) -> Result<Side> {
    battle.ensure_phase(BattlePhase::Activation)?;
    battle.active_player = battle.active_player.opponent();
    tracing::debug!(battle = %battle.id, active = %battle.active_player, "turn passed");
    Ok(battle.active_player)
}

/// Toggles a unit's order. Returns the unit's new order state.
///
/// Removing an order always succeeds. Issuing one requires a selected
/// command card and fails once the side holds as many orders as the card
/// grants.
pub fn toggle_unit_order(battle: &mut Battle, side: Side, unit_id: &str) -> Result<bool> {
    battle.ensure_phase(BattlePhase::Command)?;

    if battle.unit(side, unit_id)?.has_order {
        battle.unit_mut(side, unit_id)?.has_order = false;
        tracing::debug!(battle = %battle.id, side = %side, unit = unit_id, "order removed");
        return Ok(false);
    }

    let limit = order_limit(battle, side)?;
    if battle.side(side).orders_issued() as u32 >= limit {
        return Err(Precondition::OrderLimit { side, limit }.into());
    }
    battle.unit_mut(side, unit_id)?.has_order = true;
    tracing::debug!(battle = %battle.id, side = %side, unit = unit_id, "order issued");
    Ok(true)
}
