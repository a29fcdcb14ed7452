//! Static rule tables.
//!
//! Factions, unit types, battle phases, command cards, and reminder
//! categories. Each is a closed enum with its metadata held in a
//! compile-time table indexed by the enum discriminant.

pub mod command_card;
pub mod faction;
pub mod phase;
pub mod reminder;
pub mod unit_type;

pub use command_card::{
    default_hand, system_card, SystemCard, GENERIC_CARD_IDS, PIP_RANGE, SYSTEM_CARDS,
    SYSTEM_CARD_COUNT,
};
pub use faction::{Faction, FactionInfo, ALL_FACTIONS, FACTION_COUNT, FACTION_INFO};
pub use phase::{BattlePhase, ALL_PHASES};
pub use reminder::{ReminderType, ALL_REMINDER_TYPES};
pub use unit_type::UnitType;
