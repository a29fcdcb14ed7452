//! Tracker session state.
//!
//! Holds the loaded battle, the reference catalog, the rules options, the
//! backing store, and the random source used for priority tie-breaks. Each
//! protocol command is handled against this state and answered on the
//! output stream. Every accepted mutation is saved before the next command;
//! a failed save is reported but the in-memory battle keeps the change.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::battle::{Army, Battle, Side, Unit, UnitPatch, ALL_TOKEN_KINDS};
use crate::catalog::{Catalog, CatalogError};
use crate::config::{OptionError, RulesConfig};
use crate::error::EngineError;
use crate::protocol::Command;
use crate::reminders::reminders_for_view;
use crate::resolve::{
    activate_unit, advance_phase, end_battle, order_limit, pass_turn, rally_step, recover,
    remove_unspent_tokens, resolve_priority, select_command_card, toggle_unit_order, update_unit,
    PriorityReason,
};
use crate::store::{is_valid_battle_id, save_with_retry, BattleStore, JsonDirStore, MemoryStore};

/// Errors surfaced to the protocol client as `error <message>` lines.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no battle loaded")]
    NoBattle,

    #[error("battle '{0}' already exists")]
    BattleExists(String),

    #[error("invalid battle id: '{0}'")]
    InvalidBattleId(String),

    #[error("failed to load army {path}: {reason}")]
    Army { path: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Holds the mutable state of the tracker between commands.
pub struct Engine {
    pub battle: Option<Battle>,
    pub catalog: Catalog,
    pub config: RulesConfig,
    pub options: HashMap<String, String>,
    store: Box<dyn BattleStore>,
    rng: SmallRng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates a session backed by an in-memory store.
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryStore::new()))
    }

    pub fn with_store(store: Box<dyn BattleStore>) -> Self {
        Engine {
            battle: None,
            catalog: Catalog::default(),
            config: RulesConfig::default(),
            options: HashMap::new(),
            store,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Sets a session option. Rules options go to the `RulesConfig`;
    /// `Seed` reseeds the tie-break source and `StoreDir` switches to a
    /// directory store. Unknown names are kept in the options map only.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), SessionError> {
        match name {
            "Seed" => {
                let v = value.ok_or_else(|| OptionError::MissingValue(name.to_string()))?;
                let seed = v.parse::<u64>().map_err(|_| OptionError::InvalidValue {
                    name: name.to_string(),
                    value: v.to_string(),
                })?;
                self.rng = SmallRng::seed_from_u64(seed);
            }
            "StoreDir" => {
                let v = value.ok_or_else(|| OptionError::MissingValue(name.to_string()))?;
                let store = JsonDirStore::open(v).map_err(EngineError::from)?;
                self.store = Box::new(store);
            }
            _ => {
                if !self.config.apply_option(name, value)? {
                    tracing::debug!(option = name, "unrecognised option stored");
                }
            }
        }
        self.options
            .insert(name.to_string(), value.unwrap_or_default().to_string());
        tracing::info!(option = name, value = value.unwrap_or(""), "option set");
        Ok(())
    }

    /// Dispatches a parsed command, writing its response to `out`.
    ///
    /// Only output failures are returned; every other failure is answered
    /// with an `error` line.
    pub fn handle<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<()> {
        let result = match cmd {
            Command::Hello => self.handle_hello(out),
            Command::IsReady => writeln!(out, "readyok").map_err(SessionError::from),
            Command::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            Command::Catalog { path } => self.handle_catalog(&path, out),
            Command::NewBattle { id, blue, red, name } => {
                self.handle_newbattle(&id, &blue, &red, name, out)
            }
            Command::Load { id } => self.handle_load(&id, out),
            Command::Status => self.handle_status(out),
            Command::Units { side } => self.handle_units(side, out),
            Command::Cards { side } => self.handle_cards(side, out),
            Command::Select { side, card } => self.handle_select(side, &card, out),
            Command::Priority => self.handle_priority(out),
            Command::Order { side, unit } => self.handle_order(side, &unit, out),
            Command::Activate { side, unit } => self.handle_activate(side, &unit, out),
            Command::Pass => self.handle_pass(out),
            Command::Advance => self.handle_advance(out),
            Command::Update { side, unit, patch } => self.handle_update(side, &unit, &patch, out),
            Command::Rally { side, unit } => self.handle_rally(side, &unit, out),
            Command::Recover { side, unit } => self.handle_recover(side, &unit, out),
            Command::ClearTokens { side, unit } => self.handle_cleartokens(side, &unit, out),
            Command::Reminders { unit } => self.handle_reminders(unit.as_deref(), out),
            Command::End { winner } => self.handle_end(winner, out),
            Command::Quit => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(SessionError::Io(e)) => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "command rejected");
                writeln!(out, "error {e}")?;
            }
        }
        out.flush()
    }

    fn battle(&self) -> Result<&Battle, SessionError> {
        self.battle.as_ref().ok_or(SessionError::NoBattle)
    }

    fn battle_mut(&mut self) -> Result<&mut Battle, SessionError> {
        self.battle.as_mut().ok_or(SessionError::NoBattle)
    }

    /// Saves the loaded battle through the store, retrying transient
    /// failures up to the configured attempt count.
    fn commit(&mut self) -> Result<(), SessionError> {
        let Some(battle) = self.battle.as_mut() else {
            return Ok(());
        };
        save_with_retry(self.store.as_mut(), battle, self.config.save_retries)
            .map_err(EngineError::from)?;
        Ok(())
    }

    fn write_unit<W: Write>(&self, side: Side, unit_id: &str, out: &mut W) -> Result<(), SessionError> {
        let unit = self.battle()?.unit(side, unit_id)?;
        writeln!(out, "{}", self.format_unit(side, unit))?;
        Ok(())
    }

    /// Handles the handshake: writes id, options, protocol_version, and hellook.
    fn handle_hello<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        writeln!(out, "id name battle-tracker")?;
        writeln!(out, "id version {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "option name ShieldSource type combo default tracked var tracked var keyword")?;
        writeln!(
            out,
            "option name SuppressedThreshold type spin default {} min 0 max 99",
            crate::config::DEFAULT_SUPPRESSED_THRESHOLD
        )?;
        writeln!(
            out,
            "option name PanickedThreshold type spin default {} min 0 max 99",
            crate::config::DEFAULT_PANICKED_THRESHOLD
        )?;
        writeln!(
            out,
            "option name SaveRetries type spin default {} min 1 max 10",
            crate::config::DEFAULT_SAVE_RETRIES
        )?;
        writeln!(out, "option name Seed type string default <random>")?;
        writeln!(out, "option name StoreDir type string default <memory>")?;
        writeln!(out, "protocol_version 1")?;
        writeln!(out, "hellook")?;
        Ok(())
    }

    fn handle_catalog<W: Write>(&mut self, path: &str, out: &mut W) -> Result<(), SessionError> {
        let catalog = Catalog::load(Path::new(path))?;
        writeln!(
            out,
            "catalog abilities {} upgrades {} cards {}",
            catalog.abilities.len(),
            catalog.upgrades.len(),
            catalog.command_cards.len()
        )?;
        tracing::info!(path, "catalog loaded");
        self.catalog = catalog;
        Ok(())
    }

    fn handle_newbattle<W: Write>(
        &mut self,
        id: &str,
        blue_path: &str,
        red_path: &str,
        name: Option<String>,
        out: &mut W,
    ) -> Result<(), SessionError> {
        if !is_valid_battle_id(id) {
            return Err(SessionError::InvalidBattleId(id.to_string()));
        }
        if self.store.load(id).is_ok() {
            return Err(SessionError::BattleExists(id.to_string()));
        }
        let blue = load_army(blue_path)?;
        let red = load_army(red_path)?;
        let name = name.unwrap_or_else(|| format!("{} vs {}", blue.name, red.name));
        self.battle = Some(Battle::from_armies(id, name, &blue, &red));
        self.handle_status(out)?;
        self.commit()
    }

    fn handle_load<W: Write>(&mut self, id: &str, out: &mut W) -> Result<(), SessionError> {
        let battle = self.store.load(id).map_err(EngineError::from)?;
        tracing::info!(battle = %battle.id, round = battle.current_round, "battle loaded");
        self.battle = Some(battle);
        self.handle_status(out)
    }

    fn handle_status<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        let b = self.battle()?;
        let winner = b.winner.map_or("-", Side::keyword);
        writeln!(
            out,
            "status battle {} round {} phase {} active {} complete {} winner {}",
            b.id, b.current_round, b.current_phase, b.active_player, b.is_complete, winner
        )?;
        for side in [Side::Blue, Side::Red] {
            let state = b.side(side);
            let card = state.command_card.as_deref().unwrap_or("-");
            writeln!(
                out,
                "side {} card {} orders {} unactivated {} player {}",
                side,
                card,
                state.orders_issued(),
                state.unactivated_count(),
                state.player
            )?;
        }
        Ok(())
    }

    fn handle_units<W: Write>(&self, side: Side, out: &mut W) -> Result<(), SessionError> {
        let b = self.battle()?;
        for unit in &b.side(side).units {
            writeln!(out, "{}", self.format_unit(side, unit))?;
        }
        Ok(())
    }

    /// Formats one `unit` response line. The free-text name comes last.
    fn format_unit(&self, side: Side, unit: &Unit) -> String {
        let tokens: Vec<String> = ALL_TOKEN_KINDS
            .iter()
            .filter(|k| unit.tokens.get(**k) > 0)
            .map(|k| format!("{}={}", k.keyword(), unit.tokens.get(*k)))
            .collect();
        let tokens = if tokens.is_empty() {
            "-".to_string()
        } else {
            tokens.join(",")
        };
        format!(
            "unit {} {} wounds {}/{} suppression {} {} order {} activated {} defeated {} tokens {} name {}",
            side,
            unit.id,
            unit.current_wounds,
            unit.wounds,
            unit.suppression,
            unit.suppression_state(&self.config).keyword(),
            unit.has_order,
            unit.has_activated,
            unit.is_defeated(),
            tokens,
            unit.name
        )
    }

    fn handle_cards<W: Write>(&self, side: Side, out: &mut W) -> Result<(), SessionError> {
        let b = self.battle()?;
        for option in self.catalog.card_options(b.side(side)) {
            writeln!(
                out,
                "card {} pips {} {} name {}",
                option.card.id,
                option.card.pips,
                if option.usable { "usable" } else { "disabled" },
                option.card.name
            )?;
        }
        Ok(())
    }

    fn handle_select<W: Write>(&mut self, side: Side, card: &str, out: &mut W) -> Result<(), SessionError> {
        let battle = self.battle.as_mut().ok_or(SessionError::NoBattle)?;
        let snapshot = select_command_card(battle, side, card, &self.catalog)?;
        let limit = order_limit(battle, side)?;
        writeln!(out, "selected {} {} pips {} orders {}", side, card, snapshot.pips, limit)?;
        self.commit()
    }

    fn handle_priority<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        let battle = self.battle.as_mut().ok_or(SessionError::NoBattle)?;
        let outcome = resolve_priority(battle, &mut self.rng)?;
        match outcome.reason {
            PriorityReason::LowerPips { winner_pips, loser_pips } => {
                writeln!(out, "priority {} lower {} {}", outcome.winner, winner_pips, loser_pips)?
            }
            PriorityReason::TieBreak { pips } => {
                writeln!(out, "priority {} tie {}", outcome.winner, pips)?
            }
        }
        self.commit()
    }

    fn handle_order<W: Write>(&mut self, side: Side, unit: &str, out: &mut W) -> Result<(), SessionError> {
        let has_order = toggle_unit_order(self.battle_mut()?, side, unit)?;
        writeln!(out, "order {} {} {}", side, unit, if has_order { "on" } else { "off" })?;
        self.commit()
    }

    fn handle_activate<W: Write>(&mut self, side: Side, unit: &str, out: &mut W) -> Result<(), SessionError> {
        activate_unit(self.battle_mut()?, side, unit)?;
        writeln!(out, "activated {} {}", side, unit)?;
        self.commit()
    }

    fn handle_pass<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        let active = pass_turn(self.battle_mut()?)?;
        writeln!(out, "active {}", active)?;
        self.commit()
    }

    fn handle_advance<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        let battle = self.battle.as_mut().ok_or(SessionError::NoBattle)?;
        let change = advance_phase(battle, &self.config)?;
        writeln!(
            out,
            "phase {} round {} active {}",
            change.to, battle.current_round, battle.active_player
        )?;
        self.commit()
    }

    fn handle_update<W: Write>(
        &mut self,
        side: Side,
        unit: &str,
        patch: &UnitPatch,
        out: &mut W,
    ) -> Result<(), SessionError> {
        update_unit(self.battle_mut()?, side, unit, patch)?;
        self.write_unit(side, unit, out)?;
        self.commit()
    }

    fn handle_recover<W: Write>(&mut self, side: Side, unit: &str, out: &mut W) -> Result<(), SessionError> {
        recover(self.battle_mut()?, side, unit)?;
        self.write_unit(side, unit, out)?;
        self.commit()
    }

    fn handle_cleartokens<W: Write>(&mut self, side: Side, unit: &str, out: &mut W) -> Result<(), SessionError> {
        remove_unspent_tokens(self.battle_mut()?, side, unit)?;
        self.write_unit(side, unit, out)?;
        self.commit()
    }

    fn handle_rally<W: Write>(&mut self, side: Side, unit: &str, out: &mut W) -> Result<(), SessionError> {
        let remaining = rally_step(self.battle_mut()?, side, unit)?;
        writeln!(out, "suppression {} {} {}", side, unit, remaining)?;
        self.commit()
    }

    fn handle_reminders<W: Write>(&self, unit: Option<&str>, out: &mut W) -> Result<(), SessionError> {
        let b = self.battle()?;
        for r in reminders_for_view(b, &self.catalog, unit) {
            writeln!(
                out,
                "reminder {} {} {}: {}",
                r.reminder_type,
                r.unit_id.as_deref().unwrap_or("-"),
                r.source,
                r.text
            )?;
        }
        Ok(())
    }

    fn handle_end<W: Write>(&mut self, winner: Side, out: &mut W) -> Result<(), SessionError> {
        end_battle(self.battle_mut()?, winner)?;
        writeln!(out, "ended winner {}", winner)?;
        self.commit()
    }
}

fn load_army(path: &str) -> Result<Army, SessionError> {
    let army_err = |reason: String| SessionError::Army {
        path: path.to_string(),
        reason,
    };
    let data = fs::read_to_string(path).map_err(|e| army_err(e.to_string()))?;
    Army::from_json(&data).map_err(|e| army_err(e.to_string()))
}
