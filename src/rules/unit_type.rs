//! Unit roles.
//!
//! The built-in battlefield roles plus a user-defined `Custom` role for
//! home-made units.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The battlefield role of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Command,
    Corps,
    SpecialForces,
    Support,
    Heavy,
    Operative,
    Auxiliary,
    Custom(String),
}

impl UnitType {
    /// Returns the display name of this role.
    pub fn name(&self) -> &str {
        match self {
            UnitType::Command => "Command",
            UnitType::Corps => "Corps",
            UnitType::SpecialForces => "Special Forces",
            UnitType::Support => "Support",
            UnitType::Heavy => "Heavy",
            UnitType::Operative => "Operative",
            UnitType::Auxiliary => "Auxiliary",
            UnitType::Custom(name) => name,
        }
    }

    /// Returns true if a unit of this role can satisfy a command card's
    /// commander requirement.
    pub fn is_commander(&self) -> bool {
        matches!(self, UnitType::Command | UnitType::Operative)
    }

    /// Parses a role from its protocol keyword. Anything unrecognised
    /// becomes a custom role.
    pub fn from_keyword(s: &str) -> UnitType {
        match s {
            "command" => UnitType::Command,
            "corps" => UnitType::Corps,
            "special_forces" => UnitType::SpecialForces,
            "support" => UnitType::Support,
            "heavy" => UnitType::Heavy,
            "operative" => UnitType::Operative,
            "auxiliary" => UnitType::Auxiliary,
            other => UnitType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
