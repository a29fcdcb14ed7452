//! Battle tracker engine library.
//!
//! Exposes the rule tables, battle model, state-transition logic, reminder
//! derivation, persistence, and protocol modules for use by integration
//! tests and the binary entry points.

pub mod battle;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod reminders;
pub mod resolve;
pub mod rules;
pub mod simulate;
pub mod store;
