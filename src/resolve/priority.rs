//! Command-card selection and priority.
//!
//! Each side picks a command card during the Command phase. The card with
//! fewer pips takes priority; equal pips are settled by a fair coin flip
//! drawn from the caller's random source. The card also fixes how many
//! orders the side may issue this round.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::{Battle, CommandCardSnapshot, Side, ALL_SIDES};
use crate::catalog::Catalog;
use crate::error::{EngineError, EntityKind, Precondition, Result};
use crate::rules::BattlePhase;

/// Pip value of the lowest-priority cards, which grant a single order.
pub const STANDING_ORDERS_PIPS: u8 = 4;

/// Why a side won priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorityReason {
    /// The winner's card had fewer pips.
    LowerPips { winner_pips: u8, loser_pips: u8 },
    /// Both cards had `pips` pips and the coin flip chose the winner.
    TieBreak { pips: u8 },
}

/// The result of comparing the two command cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityOutcome {
    pub winner: Side,
    pub reason: PriorityReason,
}

/// Number of orders a card with `pips` pips grants.
pub fn order_count(pips: u8) -> u32 {
    if pips == STANDING_ORDERS_PIPS {
        1
    } else {
        u32::from(pips)
    }
}

/// Orders `side` may hold this round, from its selected card.
pub fn order_limit(battle: &Battle, side: Side) -> Result<u32> {
    battle
        .side(side)
        .command_card_details
        .as_ref()
        .map(|card| order_count(card.pips))
        .ok_or_else(|| Precondition::NoCommandCard(side).into())
}

/// Compares two pip values. Lower pips win; a tie is a 50/50 draw.
pub fn compare_pips(blue: u8, red: u8, rng: &mut impl Rng) -> PriorityOutcome {
    if blue < red {
        PriorityOutcome {
            winner: Side::Blue,
            reason: PriorityReason::LowerPips { winner_pips: blue, loser_pips: red },
        }
    } else if red < blue {
        PriorityOutcome {
            winner: Side::Red,
            reason: PriorityReason::LowerPips { winner_pips: red, loser_pips: blue },
        }
    } else {
        let winner = if rng.gen_bool(0.5) { Side::Blue } else { Side::Red };
        PriorityOutcome {
            winner,
            reason: PriorityReason::TieBreak { pips: blue },
        }
    }
}

/// Resolves priority from both sides' selected cards, makes the winner the
/// active player, and records the outcome on the battle.
///
/// Priority resolves once per card selection. A recorded outcome stands
/// until a side changes its card or the round ends.
pub fn resolve_priority(battle: &mut Battle, rng: &mut impl Rng) -> Result<PriorityOutcome> {
    battle.ensure_phase(BattlePhase::Command)?;
    if let Some(outcome) = battle.last_priority {
        return Err(Precondition::PriorityResolved(outcome.winner).into());
    }

    let missing: Vec<Side> = ALL_SIDES
        .iter()
        .copied()
        .filter(|s| battle.side(*s).command_card_details.is_none())
        .collect();
    let (Some(blue), Some(red)) = (
        battle.blue.command_card_details.as_ref(),
        battle.red.command_card_details.as_ref(),
    ) else {
        return Err(EngineError::IncompleteSelection { missing });
    };

    let outcome = compare_pips(blue.pips, red.pips, rng);
    battle.active_player = outcome.winner;
    battle.last_priority = Some(outcome);
    tracing::debug!(battle = %battle.id, winner = %outcome.winner, reason = ?outcome.reason, "priority resolved");
    Ok(outcome)
}

/// Selects a command card for `side`, storing its id and a snapshot of its
/// display fields on the battle.
///
/// The card must be in the side's available hand and, if it names a
/// commander, a commander unit with that exact name must be fielded.
/// Changing cards clears any previously resolved priority, and is refused
/// if the side already holds more orders than the new card grants.
pub fn select_command_card(
    battle: &mut Battle,
    side: Side,
    card_id: &str,
    catalog: &Catalog,
) -> Result<CommandCardSnapshot> {
    battle.ensure_phase(BattlePhase::Command)?;

    let card = catalog
        .command_card(card_id)
        .ok_or_else(|| EngineError::not_found(EntityKind::CommandCard, card_id))?;

    let state = battle.side(side);
    let available = catalog.available_cards(state.faction, &state.command_hand);
    if !available.iter().any(|c| c.id == card.id) {
        return Err(Precondition::CardUnavailable { card: card.id, side }.into());
    }
    if !card.commander_present(&state.commander_names()) {
        return Err(Precondition::CommanderMissing {
            card: card.id,
            commander: card.commander.unwrap_or_default(),
        }
        .into());
    }
    let limit = order_count(card.pips);
    if state.orders_issued() as u32 > limit {
        return Err(Precondition::OrderLimit { side, limit }.into());
    }

    let snapshot = card.snapshot();
    let state = battle.side_mut(side);
    state.command_card = Some(card.id.clone());
    state.command_card_details = Some(snapshot.clone());
    battle.last_priority = None;
    tracing::debug!(battle = %battle.id, side = %side, card = %card.id, pips = card.pips, "command card selected");
    Ok(snapshot)
}
