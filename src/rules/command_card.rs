//! Built-in command cards.
//!
//! Every faction shares the four generic cards; commander cards are tied to
//! a faction and require a unit with the commander's exact name. Pips run
//! from 1 (highest priority) to 4 (lowest).

use std::ops::RangeInclusive;

use super::faction::Faction;

/// Valid pip values for any command card, built in or custom.
pub const PIP_RANGE: RangeInclusive<u8> = 1..=4;

/// The number of built-in command cards.
pub const SYSTEM_CARD_COUNT: usize = 22;

/// Static metadata for a built-in command card.
#[derive(Debug)]
pub struct SystemCard {
    pub id: &'static str,
    pub name: &'static str,
    pub pips: u8,
    /// `None` for generic cards usable by every faction.
    pub faction: Option<Faction>,
    pub commander: Option<&'static str>,
    pub description: &'static str,
}

/// Ids of the cards every army carries.
pub const GENERIC_CARD_IDS: [&str; 4] = ["ambush", "push", "assault", "standing-orders"];

pub static SYSTEM_CARDS: [SystemCard; SYSTEM_CARD_COUNT] = [
    // Generic
    SystemCard { id: "ambush", name: "Ambush", pips: 1, faction: None, commander: None, description: "Issue an order to 1 unit." },
    SystemCard { id: "push", name: "Push", pips: 2, faction: None, commander: None, description: "Issue orders to 2 units." },
    SystemCard { id: "assault", name: "Assault", pips: 3, faction: None, commander: None, description: "Issue orders to 3 units." },
    SystemCard { id: "standing-orders", name: "Standing Orders", pips: 4, faction: None, commander: None, description: "Issue an order to 1 unit." },
    // Rebels
    SystemCard { id: "my-ally-is-the-force", name: "My Ally Is the Force", pips: 1, faction: Some(Faction::Rebels), commander: Some("Luke Skywalker"), description: "Issue an order to Luke Skywalker. When he activates, he gains a dodge token." },
    SystemCard { id: "son-of-skywalker", name: "Son of Skywalker", pips: 2, faction: Some(Faction::Rebels), commander: Some("Luke Skywalker"), description: "Issue an order to Luke Skywalker. He gains Charge and Deflect until the end of the round." },
    SystemCard { id: "return-of-the-jedi", name: "Return of the Jedi", pips: 3, faction: Some(Faction::Rebels), commander: Some("Luke Skywalker"), description: "Issue orders to Luke Skywalker and 2 other units. Luke gains Immune: Pierce until the end of the round." },
    SystemCard { id: "somebody-has-to-save-our-skins", name: "Somebody Has to Save Our Skins", pips: 1, faction: Some(Faction::Rebels), commander: Some("Leia Organa"), description: "Issue an order to a unit. That unit may perform a free move action." },
    SystemCard { id: "covering-fire", name: "Covering Fire", pips: 2, faction: Some(Faction::Rebels), commander: Some("Leia Organa"), description: "Issue orders to 2 trooper units. Each gains an aim token." },
    SystemCard { id: "take-cover", name: "Take Cover", pips: 3, faction: Some(Faction::Rebels), commander: Some("Leia Organa"), description: "Issue orders to 3 trooper units. Each gains a dodge token." },
    // Empire
    SystemCard { id: "implacable", name: "Implacable", pips: 1, faction: Some(Faction::Empire), commander: Some("Darth Vader"), description: "Issue an order to Darth Vader. When he activates, he may perform an additional action and then suffers 1 wound." },
    SystemCard { id: "new-ways-to-motivate-them", name: "New Ways to Motivate Them", pips: 2, faction: Some(Faction::Empire), commander: Some("Darth Vader"), description: "Issue orders to 2 units. During the End phase, units that were not activated suffer 1 wound." },
    SystemCard { id: "master-of-evil", name: "Master of Evil", pips: 3, faction: Some(Faction::Empire), commander: Some("Darth Vader"), description: "Issue an order to Darth Vader. Enemy units at range 1-2 gain 2 suppression tokens when they activate." },
    SystemCard { id: "coordinated-bombardment", name: "Coordinated Bombardment", pips: 1, faction: Some(Faction::Empire), commander: Some("General Veers"), description: "Issue orders to 1 trooper and 1 vehicle unit. Each gains Impact 1 until the end of the round." },
    SystemCard { id: "maximum-firepower", name: "Maximum Firepower", pips: 2, faction: Some(Faction::Empire), commander: Some("General Veers"), description: "Issue orders to 2 units. During attacks they may reroll 1 die." },
    // Republic
    SystemCard { id: "knowledge-and-defense", name: "Knowledge and Defense", pips: 1, faction: Some(Faction::Republic), commander: Some("Obi-Wan Kenobi"), description: "Issue an order to Obi-Wan Kenobi. Friendly units at range 1 gain a dodge token." },
    SystemCard { id: "hello-there", name: "Hello There!", pips: 2, faction: Some(Faction::Republic), commander: Some("Obi-Wan Kenobi"), description: "Issue orders to Obi-Wan Kenobi and 1 other unit. Obi-Wan may deploy from reserve." },
    SystemCard { id: "our-only-hope", name: "Our Only Hope", pips: 3, faction: Some(Faction::Republic), commander: Some("Obi-Wan Kenobi"), description: "Issue orders to 3 units. Each removes 1 suppression token." },
    // Separatists
    SystemCard { id: "roger-roger", name: "Roger Roger", pips: 1, faction: Some(Faction::Separatists), commander: Some("Super Tactical Droid"), description: "Issue an order to 1 droid trooper unit. It gains a surge token." },
    SystemCard { id: "seize-the-initiative", name: "Seize the Initiative", pips: 2, faction: Some(Faction::Separatists), commander: Some("General Grievous"), description: "Issue orders to 2 units. General Grievous gains a dodge token." },
    // Mercenary
    SystemCard { id: "no-disintegrations", name: "No Disintegrations", pips: 1, faction: Some(Faction::Mercenary), commander: Some("Boba Fett"), description: "Issue an order to Boba Fett. His attacks gain Pierce 1 until the end of the round." },
    SystemCard { id: "whatever-the-cost", name: "Whatever the Cost", pips: 3, faction: Some(Faction::Mercenary), commander: Some("Boba Fett"), description: "Issue orders to Boba Fett and 2 other units. Each gains an aim token." },
];

/// Looks up a built-in card by id.
pub fn system_card(id: &str) -> Option<&'static SystemCard> {
    SYSTEM_CARDS.iter().find(|c| c.id == id)
}

/// Returns the default hand for a faction: the generic cards plus every
/// built-in card of that faction.
pub fn default_hand(faction: Faction) -> Vec<&'static SystemCard> {
    SYSTEM_CARDS
        .iter()
        .filter(|c| c.faction.is_none() || c.faction == Some(faction))
        .collect()
}
