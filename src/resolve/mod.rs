//! Battle state transitions.
//!
//! Every rule guard lives here rather than in a caller: each operation
//! checks the battle's phase, completion, and ownership rules before it
//! mutates anything, so a rejected call leaves the battle untouched.

pub mod activation;
pub mod maintenance;
pub mod phase;
pub mod priority;

pub use activation::{activate_unit, pass_turn, toggle_unit_order};
pub use maintenance::{rally_step, recover, remove_unspent_tokens, update_unit};
pub use phase::{advance_phase, check_can_advance, end_battle, next_phase, PhaseChange};
pub use priority::{
    compare_pips, order_count, order_limit, resolve_priority, select_command_card,
    PriorityOutcome, PriorityReason,
};
