//! Tracker command parser.
//!
//! Parses incoming protocol lines into structured `Command` variants that
//! the engine main loop can dispatch on.

use crate::battle::{Side, TokenKind, UnitPatch};

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol handshake; the engine identifies itself and lists options.
    Hello,

    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Load a reference catalog from a JSON file.
    Catalog { path: String },

    /// Create a battle from two army JSON files.
    NewBattle { id: String, blue: String, red: String, name: Option<String> },

    /// Load a saved battle.
    Load { id: String },

    /// Report round, phase, active player, and completion.
    Status,

    /// List a side's units.
    Units { side: Side },

    /// List the command cards offered to a side.
    Cards { side: Side },

    /// Select a command card for a side.
    Select { side: Side, card: String },

    /// Resolve priority between the selected cards.
    Priority,

    /// Toggle a unit's order.
    Order { side: Side, unit: String },

    /// Activate one of the active player's units.
    Activate { side: Side, unit: String },

    /// Hand the turn to the other player.
    Pass,

    /// Advance to the next phase.
    Advance,

    /// Apply a partial update to a unit.
    Update { side: Side, unit: String, patch: UnitPatch },

    /// Remove one suppression from a unit.
    Rally { side: Side, unit: String },

    /// Remove all suppression from a unit.
    Recover { side: Side, unit: String },

    /// Discard a unit's unspent tokens.
    ClearTokens { side: Side, unit: String },

    /// List reminders for the current phase, optionally for a selected unit.
    Reminders { unit: Option<String> },

    /// End the battle with a winner.
    End { winner: Side },

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    match tokens[0] {
        "hello" => Some(Command::Hello),
        "isready" => Some(Command::IsReady),
        "status" => Some(Command::Status),
        "priority" => Some(Command::Priority),
        "pass" => Some(Command::Pass),
        "advance" => Some(Command::Advance),
        "quit" => Some(Command::Quit),

        "setoption" => parse_setoption(&tokens),
        "catalog" => parse_path(&tokens).map(|path| Command::Catalog { path }),
        "newbattle" => parse_newbattle(&tokens),
        "load" => match tokens.get(1) {
            Some(id) => Some(Command::Load { id: id.to_string() }),
            None => malformed("load <id>"),
        },
        "units" => parse_side(&tokens, 1).map(|side| Command::Units { side }),
        "cards" => parse_side(&tokens, 1).map(|side| Command::Cards { side }),
        "select" => parse_side_arg(&tokens).map(|(side, card)| Command::Select { side, card }),
        "order" => parse_side_arg(&tokens).map(|(side, unit)| Command::Order { side, unit }),
        "activate" => parse_side_arg(&tokens).map(|(side, unit)| Command::Activate { side, unit }),
        "rally" => parse_side_arg(&tokens).map(|(side, unit)| Command::Rally { side, unit }),
        "recover" => parse_side_arg(&tokens).map(|(side, unit)| Command::Recover { side, unit }),
        "cleartokens" => {
            parse_side_arg(&tokens).map(|(side, unit)| Command::ClearTokens { side, unit })
        }
        "update" => parse_update(&tokens),
        "reminders" => Some(Command::Reminders {
            unit: tokens.get(1).map(|u| u.to_string()),
        }),
        "end" => parse_side(&tokens, 1).map(|winner| Command::End { winner }),

        other => {
            tracing::warn!(command = other, "unknown command");
            None
        }
    }
}

fn malformed(usage: &str) -> Option<Command> {
    tracing::warn!(usage, "malformed command");
    None
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        return malformed("setoption name <id> [value <x>]");
    }

    let value_idx = tokens.iter().position(|&t| t == "value");
    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                return malformed("setoption name <id> [value <x>]");
            }
            let value = if value_parts.is_empty() {
                None
            } else {
                Some(value_parts.join(" "))
            };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

fn parse_path(tokens: &[&str]) -> Option<String> {
    match tokens.get(1) {
        Some(path) => Some(path.to_string()),
        None => {
            malformed("catalog <path>");
            None
        }
    }
}

/// Parses `newbattle <id> <blue-army.json> <red-army.json> [name...]`.
fn parse_newbattle(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 4 {
        return malformed("newbattle <id> <blue-army> <red-army> [name]");
    }
    let name = if tokens.len() > 4 {
        Some(tokens[4..].join(" "))
    } else {
        None
    };
    Some(Command::NewBattle {
        id: tokens[1].to_string(),
        blue: tokens[2].to_string(),
        red: tokens[3].to_string(),
        name,
    })
}

fn parse_side(tokens: &[&str], idx: usize) -> Option<Side> {
    let Some(raw) = tokens.get(idx) else {
        malformed("<command> <blue|red> ...");
        return None;
    };
    let side = Side::from_keyword(raw);
    if side.is_none() {
        tracing::warn!(side = raw, "unknown side");
    }
    side
}

/// Parses `<command> <side> <arg>`.
fn parse_side_arg(tokens: &[&str]) -> Option<(Side, String)> {
    let side = parse_side(tokens, 1)?;
    match tokens.get(2) {
        Some(arg) => Some((side, arg.to_string())),
        None => {
            malformed("<command> <blue|red> <id>");
            None
        }
    }
}

/// Parses `update <side> <unit> <field>=<value>...`.
///
/// Fields: `wounds`, `current_wounds`, `suppression`, `surge_attack`,
/// `surge_defense`, and any token name.
fn parse_update(tokens: &[&str]) -> Option<Command> {
    let (side, unit) = parse_side_arg(tokens)?;
    let mut patch = UnitPatch::new();

    for assignment in &tokens[3..] {
        let Some((field, value)) = assignment.split_once('=') else {
            tracing::warn!(assignment, "expected <field>=<value>");
            return None;
        };
        let applied = match field {
            "wounds" => value.parse().ok().map(|v| patch.wounds = Some(v)),
            "current_wounds" => value.parse().ok().map(|v| patch.current_wounds = Some(v)),
            "suppression" => value.parse().ok().map(|v| patch.suppression = Some(v)),
            "surge_attack" => value.parse().ok().map(|v| patch.surge_attack_used = Some(v)),
            "surge_defense" => value.parse().ok().map(|v| patch.surge_defense_used = Some(v)),
            other => match (TokenKind::from_keyword(other), value.parse::<i64>()) {
                (Some(kind), Ok(v)) => {
                    patch.tokens.push((kind, v));
                    Some(())
                }
                _ => None,
            },
        };
        if applied.is_none() {
            tracing::warn!(field, value, "invalid update field");
            return None;
        }
    }

    if patch.is_empty() {
        return malformed("update <blue|red> <unit> <field>=<value>...");
    }
    Some(Command::Update { side, unit, patch })
}
