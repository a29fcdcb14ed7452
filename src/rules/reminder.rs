//! Reminder categories.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::phase::BattlePhase;

/// When a rules reminder is relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    /// Always shown.
    General,
    Command,
    Activation,
    Movement,
    Attack,
    Defense,
    End,
}

pub const ALL_REMINDER_TYPES: [ReminderType; 7] = [
    ReminderType::General,
    ReminderType::Command,
    ReminderType::Activation,
    ReminderType::Movement,
    ReminderType::Attack,
    ReminderType::Defense,
    ReminderType::End,
];

impl ReminderType {
    /// Returns the phase this reminder belongs to, or `None` for general
    /// reminders. Movement and combat steps happen during activations.
    pub const fn phase(self) -> Option<BattlePhase> {
        match self {
            ReminderType::General => None,
            ReminderType::Command => Some(BattlePhase::Command),
            ReminderType::Activation
            | ReminderType::Movement
            | ReminderType::Attack
            | ReminderType::Defense => Some(BattlePhase::Activation),
            ReminderType::End => Some(BattlePhase::End),
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            ReminderType::General => "general",
            ReminderType::Command => "command",
            ReminderType::Activation => "activation",
            ReminderType::Movement => "movement",
            ReminderType::Attack => "attack",
            ReminderType::Defense => "defense",
            ReminderType::End => "end",
        }
    }

    /// Returns true if this reminder matches the given phase.
    pub fn matches_phase(self, phase: BattlePhase) -> bool {
        self.phase() == Some(phase)
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
