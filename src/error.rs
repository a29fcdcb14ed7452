//! Engine error taxonomy.
//!
//! Rule violations (`NotFound`, `Precondition`, `IncompleteSelection`) are
//! usage errors and are never retried. `Persistence` wraps store failures,
//! some of which are transient.

use std::fmt;

use crate::battle::Side;
use crate::rules::BattlePhase;
use crate::store::StoreError;

/// The kind of entity a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Battle,
    Unit,
    CommandCard,
    Ability,
    Upgrade,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Battle => "battle",
            EntityKind::Unit => "unit",
            EntityKind::CommandCard => "command card",
            EntityKind::Ability => "ability",
            EntityKind::Upgrade => "upgrade",
        })
    }
}

/// A state-machine rule that forbade the attempted action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("battle is complete")]
    BattleComplete,

    #[error("{side} has {count} unactivated unit(s)")]
    UnactivatedUnits { side: Side, count: usize },

    #[error("action requires the {expected} phase, battle is in the {actual} phase")]
    WrongPhase { expected: BattlePhase, actual: BattlePhase },

    #[error("{side} is not the active player")]
    NotActivePlayer { side: Side },

    #[error("unit '{0}' has already activated this round")]
    AlreadyActivated(String),

    #[error("{side} may only issue {limit} order(s) this round")]
    OrderLimit { side: Side, limit: u32 },

    #[error("{0} has not selected a command card")]
    NoCommandCard(Side),

    #[error("command card '{card}' requires commander '{commander}'")]
    CommanderMissing { card: String, commander: String },

    #[error("command card '{card}' is not available to {side}")]
    CardUnavailable { card: String, side: Side },

    #[error("priority already resolved this round, {0} won")]
    PriorityResolved(Side),
}

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} not found: '{id}'")]
    NotFound { kind: EntityKind, id: String },

    #[error("precondition failed: {0}")]
    Precondition(#[from] Precondition),

    #[error("command card selection incomplete: missing {}", side_list(.missing))]
    IncompleteSelection { missing: Vec<Side> },

    #[error("persistence failure: {0}")]
    Persistence(StoreError),
}

fn side_list(sides: &[Side]) -> String {
    sides
        .iter()
        .map(|s| s.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::NotFound { kind, id: id.into() }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Persistence(e) if e.is_transient())
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::NotFound { kind: EntityKind::Battle, id },
            other => EngineError::Persistence(other),
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
