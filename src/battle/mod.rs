//! Battle data model.
//!
//! Sides, units, army lists, and the aggregate battle record that the
//! resolver mutates.

pub mod army;
pub mod side;
pub mod state;
pub mod unit;

pub use army::Army;
pub use side::{Side, ALL_SIDES};
pub use state::{Battle, CommandCardSnapshot, SideState};
pub use unit::{
    apply_unit_update, SuppressionState, TokenKind, Tokens, Unit, UnitPatch, UpgradeSlot,
    ALL_TOKEN_KINDS,
};
