//! Unit edits and End-phase maintenance.
//!
//! `update_unit` applies a clamped patch at any point of an open battle.
//! The rally, recover, and token-removal actions are manual End-phase steps
//! a player takes before the round boundary; they are separate from the
//! automatic reset run when the next round starts.

use crate::battle::{Battle, Side, Unit, UnitPatch};
use crate::error::Result;
use crate::rules::BattlePhase;

/// Merges `patch` into a unit of an open battle.
pub fn update_unit<'a>(battle: &'a mut Battle, side: Side, unit_id: &str, patch: &UnitPatch) -> Result<&'a Unit> {
    battle.ensure_open()?;
    let unit = battle.unit_mut(side, unit_id)?;
    unit.apply(patch);
    Ok(unit)
}

/// Removes one suppression from a unit. Returns the remaining suppression.
pub fn rally_step(battle: &mut Battle, side: Side, unit_id: &str) -> Result<u32> {
    battle.ensure_phase(BattlePhase::End)?;
    let unit = battle.unit_mut(side, unit_id)?;
    unit.rally_step();
    Ok(unit.suppression)
}

/// Removes all suppression from a unit.
pub fn recover(battle: &mut Battle, side: Side, unit_id: &str) -> Result<()> {
    battle.ensure_phase(BattlePhase::End)?;
    battle.unit_mut(side, unit_id)?.recover();
    Ok(())
}

/// Discards a unit's unspent tokens, keeping shields.
pub fn remove_unspent_tokens(battle: &mut Battle, side: Side, unit_id: &str) -> Result<()> {
    battle.ensure_phase(BattlePhase::End)?;
    battle.unit_mut(side, unit_id)?.remove_unspent_tokens();
    Ok(())
}
