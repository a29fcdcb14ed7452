//! Faction definitions and display metadata.
//!
//! Faction metadata (display name, colour) is stored in a compile-time
//! lookup table indexed by the `Faction` enum discriminant.

use serde::{Deserialize, Serialize};

/// The number of playable factions.
pub const FACTION_COUNT: usize = 5;

/// A playable faction. Command cards and armies are faction-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Faction {
    Rebels = 0,
    Empire = 1,
    Republic = 2,
    Separatists = 3,
    Mercenary = 4,
}

/// All factions in index order.
pub const ALL_FACTIONS: [Faction; FACTION_COUNT] = [
    Faction::Rebels,
    Faction::Empire,
    Faction::Republic,
    Faction::Separatists,
    Faction::Mercenary,
];

/// Static metadata for a faction.
#[derive(Debug)]
pub struct FactionInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Display colour as a `#rrggbb` hex string.
    pub color: &'static str,
}

/// Compile-time lookup table: index by `Faction as usize`.
pub static FACTION_INFO: [FactionInfo; FACTION_COUNT] = [
    FactionInfo { id: "rebels", name: "Rebel Alliance", color: "#b71c1c" },
    FactionInfo { id: "empire", name: "Galactic Empire", color: "#424242" },
    FactionInfo { id: "republic", name: "Galactic Republic", color: "#1565c0" },
    FactionInfo { id: "separatists", name: "Separatist Alliance", color: "#4e342e" },
    FactionInfo { id: "mercenary", name: "Shadow Collective", color: "#2e7d32" },
];

impl Faction {
    /// Returns the lowercase identifier used in documents and the protocol.
    pub const fn id(self) -> &'static str {
        FACTION_INFO[self as usize].id
    }

    /// Returns the display name.
    pub const fn name(self) -> &'static str {
        FACTION_INFO[self as usize].name
    }

    /// Returns the display colour.
    pub const fn color(self) -> &'static str {
        FACTION_INFO[self as usize].color
    }

    /// Parses a faction from its lowercase identifier.
    pub fn from_id(id: &str) -> Option<Faction> {
        ALL_FACTIONS.iter().copied().find(|f| f.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_discriminants() {
        for (i, f) in ALL_FACTIONS.iter().enumerate() {
            assert_eq!(*f as usize, i);
            assert_eq!(Faction::from_id(f.id()), Some(*f));
        }
    }

    #[test]
    fn unknown_faction_id() {
        assert_eq!(Faction::from_id("jawas"), None);
    }

    #[test]
    fn colors_are_hex() {
        for f in ALL_FACTIONS {
            let c = f.color();
            assert_eq!(c.len(), 7);
            assert!(c.starts_with('#'));
        }
    }
}
