//! Army lists.
//!
//! An army is the list-building record a battle is created from. Its units
//! are deep-copied into the battle, so later edits to the army never reach
//! a battle in progress.

use serde::{Deserialize, Serialize};

use super::unit::Unit;
use crate::rules::Faction;

/// A saved army list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub id: String,
    pub name: String,
    /// Name of the player fielding the army.
    pub player: String,
    pub faction: Faction,
    pub units: Vec<Unit>,
    /// Saved command-card hand. Empty means the faction default hand.
    #[serde(default)]
    pub command_cards: Vec<String>,
}

impl Army {
    pub fn new(id: impl Into<String>, name: impl Into<String>, player: impl Into<String>, faction: Faction) -> Self {
        Army {
            id: id.into(),
            name: name.into(),
            player: player.into(),
            faction,
            units: Vec::new(),
            command_cards: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn with_command_cards(mut self, ids: &[&str]) -> Self {
        self.command_cards = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Parses an army from a JSON document.
    pub fn from_json(json: &str) -> Result<Army, serde_json::Error> {
        serde_json::from_str(json)
    }
}
