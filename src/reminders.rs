//! Contextual rules reminders.
//!
//! Derives a flat reminder list from a battle: the selected command cards'
//! effect text, then every unit's ability reminders, then every unit's
//! equipped-upgrade reminders. Derivation never mutates the battle.

use std::fmt;

use serde::Serialize;

use crate::battle::{Battle, Side, Unit, ALL_SIDES};
use crate::catalog::{Catalog, ReminderTemplate};
use crate::rules::{system_card, BattlePhase, ReminderType};

/// Where a reminder came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReminderSource {
    CommandCard { side: Side, card: String },
    Ability { id: String, name: String },
    Upgrade { id: String, name: String },
}

impl fmt::Display for ReminderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderSource::CommandCard { side, card } => write!(f, "{side} command card {card}"),
            ReminderSource::Ability { name, .. } => write!(f, "ability {name}"),
            ReminderSource::Upgrade { name, .. } => write!(f, "upgrade {name}"),
        }
    }
}

/// A single rules reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub text: String,
    pub reminder_type: ReminderType,
    pub source: ReminderSource,
    /// The unit the reminder applies to, if it is unit-specific.
    pub unit_id: Option<String>,
    pub condition: Option<String>,
}

impl Reminder {
    fn from_template(template: &ReminderTemplate, source: ReminderSource, unit: &Unit) -> Self {
        Reminder {
            text: template.text.clone(),
            reminder_type: template.reminder_type,
            source,
            unit_id: Some(unit.id.clone()),
            condition: template.condition.clone(),
        }
    }
}

/// Which unit-scoped reminders to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitScope<'a> {
    /// Keep every reminder.
    All,
    /// Keep unscoped reminders plus those of the given selected unit, if any.
    Selected(Option<&'a str>),
}

/// Collects every reminder for the battle in source order.
pub fn aggregate_reminders(battle: &Battle, catalog: &Catalog) -> Vec<Reminder> {
    let mut reminders = Vec::new();

    for side in ALL_SIDES {
        if let Some(reminder) = command_card_reminder(battle, side) {
            reminders.push(reminder);
        }
    }

    for (_, unit) in battle.units() {
        for id in &unit.abilities {
            let Some(ability) = catalog.ability(id) else {
                tracing::warn!(ability = %id, unit = %unit.id, "ability not in catalog");
                continue;
            };
            for template in &ability.reminders {
                let source = ReminderSource::Ability {
                    id: ability.id.clone(),
                    name: ability.name.clone(),
                };
                reminders.push(Reminder::from_template(template, source, unit));
            }
        }
    }

    for (_, unit) in battle.units() {
        for id in unit.equipped_upgrades() {
            let Some(upgrade) = catalog.upgrade(id) else {
                tracing::warn!(upgrade = %id, unit = %unit.id, "upgrade not in catalog");
                continue;
            };
            for template in &upgrade.reminders {
                let source = ReminderSource::Upgrade {
                    id: upgrade.id.clone(),
                    name: upgrade.name.clone(),
                };
                reminders.push(Reminder::from_template(template, source, unit));
            }
        }
    }

    reminders
}

/// Effect text of a side's selected card. Built-in cards read the rules
/// table; custom cards read the battle's snapshot, description first.
fn command_card_reminder(battle: &Battle, side: Side) -> Option<Reminder> {
    let state = battle.side(side);
    let id = state.command_card.as_deref()?;
    let snapshot = state.command_card_details.as_ref();

    let builtin = match snapshot {
        Some(s) if s.custom => None,
        _ => system_card(id).map(|c| c.description.to_string()),
    };
    let text = builtin.or_else(|| {
        snapshot.and_then(|s| s.description.clone().or_else(|| s.effect_text.clone()))
    })?;
    let card = snapshot.map_or_else(|| id.to_string(), |s| s.name.clone());

    Some(Reminder {
        text,
        reminder_type: ReminderType::General,
        source: ReminderSource::CommandCard { side, card },
        unit_id: None,
        condition: None,
    })
}

/// Keeps reminders for `phase` (plus general ones) within `scope`. A
/// `None` phase keeps every type.
pub fn filter_reminders(reminders: Vec<Reminder>, phase: Option<BattlePhase>, scope: UnitScope<'_>) -> Vec<Reminder> {
    reminders
        .into_iter()
        .filter(|r| match phase {
            None => true,
            Some(p) => r.reminder_type == ReminderType::General || r.reminder_type.matches_phase(p),
        })
        .filter(|r| match scope {
            UnitScope::All => true,
            UnitScope::Selected(selected) => match &r.unit_id {
                None => true,
                Some(id) => Some(id.as_str()) == selected,
            },
        })
        .collect()
}

/// Moves reminders of `phase` ahead of the rest, otherwise keeping order.
pub fn sort_by_phase(reminders: &mut [Reminder], phase: BattlePhase) {
    reminders.sort_by_key(|r| !r.reminder_type.matches_phase(phase));
}

/// The reminders a tracker view shows: current phase plus general, limited
/// to unscoped reminders and the selected unit's, current phase first.
pub fn reminders_for_view(battle: &Battle, catalog: &Catalog, selected_unit: Option<&str>) -> Vec<Reminder> {
    let phase = battle.current_phase;
    let mut reminders = filter_reminders(
        aggregate_reminders(battle, catalog),
        Some(phase),
        UnitScope::Selected(selected_unit),
    );
    sort_by_phase(&mut reminders, phase);
    reminders
}
