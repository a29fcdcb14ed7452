//! Battle phases.
//!
//! A round runs Command -> Activation -> End and then wraps to the next
//! round's Command phase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The phase within a battle round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    Command,
    Activation,
    End,
}

/// All phases in round order.
pub const ALL_PHASES: [BattlePhase; 3] =
    [BattlePhase::Command, BattlePhase::Activation, BattlePhase::End];

impl BattlePhase {
    /// Returns the cyclic successor of this phase.
    pub const fn next(self) -> BattlePhase {
        match self {
            BattlePhase::Command => BattlePhase::Activation,
            BattlePhase::Activation => BattlePhase::End,
            BattlePhase::End => BattlePhase::Command,
        }
    }

    /// Returns the lowercase keyword used in documents and the protocol.
    pub const fn keyword(self) -> &'static str {
        match self {
            BattlePhase::Command => "command",
            BattlePhase::Activation => "activation",
            BattlePhase::End => "end",
        }
    }

    /// Returns the display name.
    pub const fn name(self) -> &'static str {
        match self {
            BattlePhase::Command => "Command Phase",
            BattlePhase::Activation => "Activation Phase",
            BattlePhase::End => "End Phase",
        }
    }

    /// Returns a short rules summary of the phase.
    pub const fn description(self) -> &'static str {
        match self {
            BattlePhase::Command => {
                "Select command cards, determine priority, and issue orders."
            }
            BattlePhase::Activation => {
                "Players alternate activating units; each unit activates once per round."
            }
            BattlePhase::End => {
                "Remove unspent tokens, rally suppressed units, and advance the round counter."
            }
        }
    }

    /// Parses a phase from its keyword.
    pub fn from_keyword(s: &str) -> Option<BattlePhase> {
        ALL_PHASES.iter().copied().find(|p| p.keyword() == s)
    }
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
