//! Ability, upgrade, and command-card catalogs.
//!
//! Catalogs are read-only reference data owned outside the battle: the
//! ability and upgrade definitions with their attached rules reminders,
//! and user-authored command cards. They load from a single JSON document.
//! Custom command cards shadow built-in cards with the same id.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::{CommandCardSnapshot, SideState};
use crate::rules::{default_hand, system_card, Faction, ReminderType, SystemCard, PIP_RANGE};

/// Errors from loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command card '{id}' has {pips} pips, expected 1 to 4")]
    InvalidPips { id: String, pips: u8 },
}

/// A rules reminder as attached to an ability or upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTemplate {
    pub text: String,
    pub reminder_type: ReminderType,
    #[serde(default)]
    pub condition: Option<String>,
}

/// A unit ability (keyword) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reminders: Vec<ReminderTemplate>,
}

/// An upgrade card definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub upgrade_type: String,
    #[serde(default)]
    pub reminders: Vec<ReminderTemplate>,
}

/// A command card, either built in or user-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCard {
    pub id: String,
    pub name: String,
    pub pips: u8,
    #[serde(default)]
    pub faction: Option<Faction>,
    #[serde(default)]
    pub commander: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub effect_text: Option<String>,
    #[serde(default)]
    pub custom: bool,
}

impl CommandCard {
    pub fn from_system(card: &SystemCard) -> Self {
        CommandCard {
            id: card.id.to_string(),
            name: card.name.to_string(),
            pips: card.pips,
            faction: card.faction,
            commander: card.commander.map(str::to_string),
            description: Some(card.description.to_string()),
            effect_text: None,
            custom: false,
        }
    }

    /// Captures the display fields stored on the battle at selection time.
    pub fn snapshot(&self) -> CommandCardSnapshot {
        CommandCardSnapshot {
            name: self.name.clone(),
            pips: self.pips,
            description: self.description.clone(),
            effect_text: self.effect_text.clone(),
            commander: self.commander.clone(),
            custom: self.custom,
        }
    }

    /// Returns true if the card is playable by `faction`.
    pub fn allowed_for(&self, faction: Faction) -> bool {
        self.faction.is_none() || self.faction == Some(faction)
    }

    /// Returns true if the commander requirement, if any, is met by one of
    /// `commanders` (exact name match).
    pub fn commander_present(&self, commanders: &[&str]) -> bool {
        match &self.commander {
            None => true,
            Some(required) => commanders.iter().any(|c| c == required),
        }
    }
}

/// A command card as offered to a side, with its commander gate evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardOption {
    pub card: CommandCard,
    /// False when the card's commander is not among the side's units. Such
    /// cards are shown disabled, never swapped for another card.
    pub usable: bool,
}

/// Reference data consulted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub abilities: Vec<Ability>,
    pub upgrades: Vec<UpgradeCard>,
    /// User-authored command cards.
    pub command_cards: Vec<CommandCard>,
}

impl Catalog {
    /// Loads a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Catalog::from_json(&data)
    }

    /// Parses a catalog from a JSON string. Every command card in the
    /// document is treated as custom and must carry 1 to 4 pips.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let mut catalog: Catalog = serde_json::from_str(json)?;
        for card in &mut catalog.command_cards {
            if !PIP_RANGE.contains(&card.pips) {
                return Err(CatalogError::InvalidPips {
                    id: card.id.clone(),
                    pips: card.pips,
                });
            }
            card.custom = true;
        }
        Ok(catalog)
    }

    pub fn ability(&self, id: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeCard> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    /// Looks up a command card by id, preferring a custom card over a
    /// built-in card with the same id.
    pub fn command_card(&self, id: &str) -> Option<CommandCard> {
        self.command_cards
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .or_else(|| system_card(id).map(CommandCard::from_system))
    }

    /// The command cards available to an army: its saved hand if it has
    /// one, otherwise the faction's custom cards and its default hand.
    pub fn available_cards(&self, faction: Faction, hand: &[String]) -> Vec<CommandCard> {
        if hand.is_empty() {
            let mut cards: Vec<CommandCard> = self
                .command_cards
                .iter()
                .filter(|c| c.allowed_for(faction))
                .cloned()
                .collect();
            cards.extend(
                default_hand(faction)
                    .into_iter()
                    .filter(|s| !self.command_cards.iter().any(|c| c.id == s.id))
                    .map(CommandCard::from_system),
            );
            return cards;
        }

        let mut cards = Vec::with_capacity(hand.len());
        for id in hand {
            match self.command_card(id) {
                Some(card) if card.allowed_for(faction) => cards.push(card),
                Some(_) => {
                    tracing::warn!(card = %id, faction = faction.id(), "saved card belongs to another faction");
                }
                None => tracing::warn!(card = %id, "saved card not found in catalog"),
            }
        }
        cards
    }

    /// The cards offered to a side, each marked usable or not by its
    /// commander requirement.
    pub fn card_options(&self, side: &SideState) -> Vec<CardOption> {
        let commanders = side.commander_names();
        self.available_cards(side.faction, &side.command_hand)
            .into_iter()
            .map(|card| {
                let usable = card.commander_present(&commanders);
                CardOption { card, usable }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{Army, Unit};
    use crate::rules::UnitType;

    const CATALOG_JSON: &str = r#"{
        "abilities": [
            {"id": "nimble", "name": "Nimble", "reminders": [
                {"text": "After defending, gain 1 dodge token if you spent one.", "reminder_type": "defense"}
            ]}
        ],
        "upgrades": [
            {"id": "targeting-scopes", "name": "Targeting Scopes", "upgrade_type": "gear", "reminders": [
                {"text": "Aim rerolls: may reroll 1 additional die.", "reminder_type": "attack", "condition": "when spending aim"}
            ]}
        ],
        "command_cards": [
            {"id": "push", "name": "Big Push", "pips": 2, "description": "House push."},
            {"id": "hold-the-line", "name": "Hold the Line", "pips": 3, "faction": "rebels", "effect_text": "Each unit gains a dodge."}
        ]
    }"#;

    #[test]
    fn parse_marks_cards_custom() {
        let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
        assert!(catalog.command_cards.iter().all(|c| c.custom));
        assert_eq!(catalog.ability("nimble").unwrap().reminders.len(), 1);
        assert_eq!(catalog.upgrade("targeting-scopes").unwrap().upgrade_type, "gear");
        assert!(catalog.ability("missing").is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn custom_card_pips_must_be_in_range() {
        for pips in [0u8, 5, 9] {
            let json = format!(r#"{{"command_cards": [{{"id": "odd", "name": "Odd", "pips": {pips}}}]}}"#);
            let err = Catalog::from_json(&json).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidPips { ref id, pips: p } if id == "odd" && p == pips));
        }
        for pips in 1..=4 {
            let json = format!(r#"{{"command_cards": [{{"id": "ok", "name": "Ok", "pips": {pips}}}]}}"#);
            assert!(Catalog::from_json(&json).is_ok());
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn custom_card_shadows_builtin() {
        let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
        let push = catalog.command_card("push").unwrap();
        assert_eq!(push.name, "Big Push");
        assert!(push.custom);

        assert_eq!(catalog.command_card("hold-the-line").unwrap().pips, 3);
    }

    #[test]
    fn builtin_lookup_without_customs() {
        let catalog = Catalog::default();
        let card = catalog.command_card("standing-orders").unwrap();
        assert_eq!(card.pips, 4);
        assert!(!card.custom);
        assert!(catalog.command_card("nope").is_none());
    }

    #[test]
    fn default_hand_filters_faction() {
        let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
        let empire = catalog.available_cards(Faction::Empire, &[]);
        assert!(empire.iter().all(|c| c.allowed_for(Faction::Empire)));
        assert!(!empire.iter().any(|c| c.id == "hold-the-line"));
        let rebels = catalog.available_cards(Faction::Rebels, &[]);
        assert!(rebels.iter().any(|c| c.id == "hold-the-line"));

        let ids: Vec<&str> = rebels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(&ids[..2], ["push", "hold-the-line"]);
        assert_eq!(ids.iter().filter(|id| **id == "push").count(), 1);
        assert_eq!(rebels.len(), default_hand(Faction::Rebels).len() + 1);
    }

    #[test]
    fn saved_hand_restricts_cards() {
        let catalog = Catalog::default();
        let hand = vec!["ambush".to_string(), "implacable".to_string(), "ghost".to_string()];
        let cards = catalog.available_cards(Faction::Rebels, &hand);
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ambush"]);
    }

    #[test]
    fn commander_gate_marks_cards_unusable() {
        let catalog = Catalog::default();
        let army = Army::new("a", "Echo", "Ana", Faction::Rebels)
            .with_unit(Unit::new("leia", "Leia Organa", UnitType::Command, 6));
        let side = SideState::from_army(&army);
        let options = catalog.card_options(&side);

        let usable = |id: &str| options.iter().find(|o| o.card.id == id).unwrap().usable;
        assert!(usable("ambush"));
        assert!(usable("covering-fire"));
        assert!(!usable("son-of-skywalker"));
    }

    #[test]
    fn commander_match_is_exact() {
        let card = CommandCard::from_system(system_card("implacable").unwrap());
        assert!(card.commander_present(&["Darth Vader"]));
        assert!(!card.commander_present(&["darth vader"]));
        assert!(!card.commander_present(&[]));
    }
}
