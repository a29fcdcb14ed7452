//! Battle state representation.
//!
//! Holds the complete record of one tracked battle: both sides' units and
//! command-card selections, the round and phase counters, the active
//! player, and completion.

use serde::{Deserialize, Serialize};

use super::army::Army;
use super::side::Side;
use super::unit::Unit;
use crate::error::{EngineError, EntityKind, Precondition, Result};
use crate::resolve::priority::PriorityOutcome;
use crate::rules::{BattlePhase, Faction};

/// The display fields of a command card captured when it was selected.
///
/// Custom cards are separately editable documents, so the battle keeps its
/// own copy instead of re-reading the card later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCardSnapshot {
    pub name: String,
    pub pips: u8,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub effect_text: Option<String>,
    #[serde(default)]
    pub commander: Option<String>,
    /// True if the card was user-authored rather than built in.
    #[serde(default)]
    pub custom: bool,
}

/// Everything a battle tracks for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    pub player: String,
    pub army: String,
    pub faction: Faction,
    pub units: Vec<Unit>,
    /// Command-card ids saved with the army; empty means the faction
    /// default hand.
    #[serde(default)]
    pub command_hand: Vec<String>,
    #[serde(default)]
    pub command_card: Option<String>,
    #[serde(default)]
    pub command_card_details: Option<CommandCardSnapshot>,
}

impl SideState {
    /// Creates a side from an army, deep-copying its units with battle
    /// fields initialised.
    pub fn from_army(army: &Army) -> Self {
        SideState {
            player: army.player.clone(),
            army: army.name.clone(),
            faction: army.faction,
            units: army.units.iter().map(Unit::prepared_for_battle).collect(),
            command_hand: army.command_cards.clone(),
            command_card: None,
            command_card_details: None,
        }
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Number of units that have not activated this round.
    pub fn unactivated_count(&self) -> usize {
        self.units.iter().filter(|u| !u.has_activated).count()
    }

    /// Number of units currently holding an order.
    pub fn orders_issued(&self) -> usize {
        self.units.iter().filter(|u| u.has_order).count()
    }

    /// Names of units able to satisfy a commander requirement.
    pub fn commander_names(&self) -> Vec<&str> {
        self.units
            .iter()
            .filter(|u| u.unit_type.is_commander())
            .map(|u| u.name.as_str())
            .collect()
    }

    pub fn clear_command_card(&mut self) {
        self.command_card = None;
        self.command_card_details = None;
    }
}

/// Complete record of a tracked battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub id: String,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch, stamped on first save.
    #[serde(default)]
    pub created_at: u64,
    /// Last save time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub winner: Option<Side>,
    pub blue: SideState,
    pub red: SideState,
    pub current_round: u32,
    pub current_phase: BattlePhase,
    pub active_player: Side,
    /// How priority was decided in the current round's Command phase.
    #[serde(default)]
    pub last_priority: Option<PriorityOutcome>,
}

impl Battle {
    /// Creates a battle at round 1, Command phase, Blue active.
    pub fn new(id: impl Into<String>, name: impl Into<String>, blue: SideState, red: SideState) -> Self {
        Battle {
            id: id.into(),
            name: name.into(),
            created_at: 0,
            last_updated: 0,
            is_complete: false,
            winner: None,
            blue,
            red,
            current_round: 1,
            current_phase: BattlePhase::Command,
            active_player: Side::Blue,
            last_priority: None,
        }
    }

    /// Creates a battle from the two armies.
    pub fn from_armies(id: impl Into<String>, name: impl Into<String>, blue: &Army, red: &Army) -> Self {
        let battle = Battle::new(id, name, SideState::from_army(blue), SideState::from_army(red));
        tracing::info!(
            battle = %battle.id,
            blue = %blue.name,
            red = %red.name,
            "battle created"
        );
        battle
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Blue => &mut self.blue,
            Side::Red => &mut self.red,
        }
    }

    /// Iterates over every unit on both sides, Blue first.
    pub fn units(&self) -> impl Iterator<Item = (Side, &Unit)> {
        self.blue
            .units
            .iter()
            .map(|u| (Side::Blue, u))
            .chain(self.red.units.iter().map(|u| (Side::Red, u)))
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.blue.units.iter_mut().chain(self.red.units.iter_mut())
    }

    pub fn unit(&self, side: Side, id: &str) -> Result<&Unit> {
        self.side(side)
            .unit(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Unit, id))
    }

    pub fn unit_mut(&mut self, side: Side, id: &str) -> Result<&mut Unit> {
        self.side_mut(side)
            .unit_mut(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Unit, id))
    }

    /// Fails if the battle has ended.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_complete {
            return Err(Precondition::BattleComplete.into());
        }
        Ok(())
    }

    /// Fails if the battle has ended or is not in `expected`.
    pub fn ensure_phase(&self, expected: BattlePhase) -> Result<()> {
        self.ensure_open()?;
        if self.current_phase != expected {
            return Err(Precondition::WrongPhase {
                expected,
                actual: self.current_phase,
            }
            .into());
        }
        Ok(())
    }
}
