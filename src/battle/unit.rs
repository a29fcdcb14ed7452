//! Units and their per-battle attributes.
//!
//! A `Unit` carries both its army-list identity (name, role, wounds,
//! abilities, upgrades) and the mutable battle bookkeeping (damage,
//! suppression, tokens, order and activation flags). All numeric battle
//! fields are unsigned; patches are clamped into range before they land.

use serde::{Deserialize, Serialize};

use crate::config::{RulesConfig, ShieldSource};
use crate::rules::UnitType;

/// A kind of per-unit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Aim,
    Dodge,
    Surge,
    Shield,
    Ion,
    Smoke,
    Standby,
}

/// All token kinds in display order.
pub const ALL_TOKEN_KINDS: [TokenKind; 7] = [
    TokenKind::Aim,
    TokenKind::Dodge,
    TokenKind::Surge,
    TokenKind::Shield,
    TokenKind::Ion,
    TokenKind::Smoke,
    TokenKind::Standby,
];

impl TokenKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            TokenKind::Aim => "aim",
            TokenKind::Dodge => "dodge",
            TokenKind::Surge => "surge",
            TokenKind::Shield => "shield",
            TokenKind::Ion => "ion",
            TokenKind::Smoke => "smoke",
            TokenKind::Standby => "standby",
        }
    }

    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        ALL_TOKEN_KINDS.iter().copied().find(|k| k.keyword() == s)
    }

    /// Returns true for tokens that are discarded when unspent. Shield
    /// tokens are persistent.
    pub const fn is_spendable(self) -> bool {
        !matches!(self, TokenKind::Shield)
    }
}

/// Token counters for a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tokens {
    pub aim: u32,
    pub dodge: u32,
    pub surge: u32,
    pub shield: u32,
    pub ion: u32,
    pub smoke: u32,
    pub standby: u32,
}

impl Tokens {
    pub fn get(&self, kind: TokenKind) -> u32 {
        match kind {
            TokenKind::Aim => self.aim,
            TokenKind::Dodge => self.dodge,
            TokenKind::Surge => self.surge,
            TokenKind::Shield => self.shield,
            TokenKind::Ion => self.ion,
            TokenKind::Smoke => self.smoke,
            TokenKind::Standby => self.standby,
        }
    }

    fn slot(&mut self, kind: TokenKind) -> &mut u32 {
        match kind {
            TokenKind::Aim => &mut self.aim,
            TokenKind::Dodge => &mut self.dodge,
            TokenKind::Surge => &mut self.surge,
            TokenKind::Shield => &mut self.shield,
            TokenKind::Ion => &mut self.ion,
            TokenKind::Smoke => &mut self.smoke,
            TokenKind::Standby => &mut self.standby,
        }
    }

    pub fn set(&mut self, kind: TokenKind, count: u32) {
        *self.slot(kind) = count;
    }

    pub fn add(&mut self, kind: TokenKind, count: u32) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(count);
    }

    /// Removes up to `count` tokens, stopping at zero.
    pub fn remove(&mut self, kind: TokenKind, count: u32) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(count);
    }

    /// Zeroes every spendable token, leaving shields alone.
    pub fn clear_spendable(&mut self) {
        for kind in ALL_TOKEN_KINDS {
            if kind.is_spendable() {
                self.set(kind, 0);
            }
        }
    }

    pub fn total(&self) -> u32 {
        ALL_TOKEN_KINDS.iter().map(|k| self.get(*k)).sum()
    }
}

/// An upgrade slot and the upgrade cards equipped in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSlot {
    pub slot_type: String,
    pub max_count: u32,
    #[serde(default)]
    pub equipped: Vec<String>,
}

/// Suppression status derived from the unit's suppression count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressionState {
    Steady,
    Suppressed,
    Panicked,
}

impl SuppressionState {
    pub const fn keyword(self) -> &'static str {
        match self {
            SuppressionState::Steady => "steady",
            SuppressionState::Suppressed => "suppressed",
            SuppressionState::Panicked => "panicked",
        }
    }
}

/// A unit fielded by one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub unit_type: UnitType,
    /// Maximum wounds.
    pub wounds: u32,
    #[serde(default)]
    pub current_wounds: u32,
    #[serde(default)]
    pub suppression: u32,
    /// Persistent shield value granted by the unit's keywords.
    #[serde(default)]
    pub shielded: u32,
    #[serde(default)]
    pub has_order: bool,
    #[serde(default)]
    pub has_activated: bool,
    #[serde(default)]
    pub tokens: Tokens,
    #[serde(default)]
    pub surge_attack_used: bool,
    #[serde(default)]
    pub surge_defense_used: bool,
    /// Ability ids.
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub upgrade_slots: Vec<UpgradeSlot>,
}

impl Unit {
    /// Creates an undamaged unit with no abilities or upgrades.
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_type: UnitType, wounds: u32) -> Self {
        Unit {
            id: id.into(),
            name: name.into(),
            unit_type,
            wounds,
            current_wounds: wounds,
            suppression: 0,
            shielded: 0,
            has_order: false,
            has_activated: false,
            tokens: Tokens::default(),
            surge_attack_used: false,
            surge_defense_used: false,
            abilities: Vec::new(),
            upgrade_slots: Vec::new(),
        }
    }

    pub fn with_abilities(mut self, abilities: &[&str]) -> Self {
        self.abilities = abilities.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_upgrade_slot(mut self, slot: UpgradeSlot) -> Self {
        self.upgrade_slots.push(slot);
        self
    }

    pub fn with_shielded(mut self, shielded: u32) -> Self {
        self.shielded = shielded;
        self
    }

    /// Returns a copy of this unit with every battle field initialised:
    /// full wounds, no suppression, no tokens except keyword shields, and
    /// all round flags cleared.
    pub fn prepared_for_battle(&self) -> Unit {
        let mut unit = self.clone();
        unit.current_wounds = unit.wounds;
        unit.suppression = 0;
        unit.has_order = false;
        unit.has_activated = false;
        unit.tokens = Tokens {
            shield: unit.shielded,
            ..Tokens::default()
        };
        unit.surge_attack_used = false;
        unit.surge_defense_used = false;
        unit
    }

    pub fn is_defeated(&self) -> bool {
        self.current_wounds == 0
    }

    pub fn suppression_state(&self, config: &RulesConfig) -> SuppressionState {
        if self.suppression >= config.panicked_threshold {
            SuppressionState::Panicked
        } else if self.suppression >= config.suppressed_threshold {
            SuppressionState::Suppressed
        } else {
            SuppressionState::Steady
        }
    }

    /// Ids of every upgrade equipped in any slot.
    pub fn equipped_upgrades(&self) -> impl Iterator<Item = &str> {
        self.upgrade_slots
            .iter()
            .flat_map(|s| s.equipped.iter().map(String::as_str))
    }

    /// Merges a patch into this unit, clamping every numeric field into its
    /// legal range.
    pub fn apply(&mut self, patch: &UnitPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(wounds) = patch.wounds {
            self.wounds = wounds;
        }
        if let Some(current) = patch.current_wounds {
            self.current_wounds = clamp_count(current);
        }
        self.current_wounds = self.current_wounds.min(self.wounds);
        if let Some(suppression) = patch.suppression {
            self.suppression = clamp_count(suppression);
        }
        for (kind, count) in &patch.tokens {
            self.tokens.set(*kind, clamp_count(*count));
        }
        if let Some(used) = patch.surge_attack_used {
            self.surge_attack_used = used;
        }
        if let Some(used) = patch.surge_defense_used {
            self.surge_defense_used = used;
        }
        if let Some(abilities) = &patch.abilities {
            self.abilities = abilities.clone();
        }
        if let Some(slots) = &patch.upgrade_slots {
            self.upgrade_slots = slots.clone();
        }
    }

    /// Removes one suppression. Returns false if there was none to remove.
    pub fn rally_step(&mut self) -> bool {
        if self.suppression == 0 {
            return false;
        }
        self.suppression -= 1;
        true
    }

    /// Removes all suppression. Wounds are not healed.
    pub fn recover(&mut self) {
        self.suppression = 0;
    }

    /// Zeroes every token except shields.
    pub fn remove_unspent_tokens(&mut self) {
        self.tokens.clear_spendable();
    }

    /// The automatic reset applied to every unit when a new round starts.
    pub fn reset_for_round(&mut self, shield_source: ShieldSource) {
        self.has_order = false;
        self.has_activated = false;
        self.tokens.clear_spendable();
        if shield_source == ShieldSource::Keyword {
            self.tokens.shield = self.shielded;
        }
        self.surge_attack_used = false;
        self.surge_defense_used = false;
    }
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// A partial update to a unit.
///
/// Numeric fields are signed so out-of-range requests (for example a
/// negative wound count after damage) can be expressed and clamped. Order
/// and activation flags are deliberately absent: they only change through
/// the order and activation operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPatch {
    pub name: Option<String>,
    pub wounds: Option<u32>,
    pub current_wounds: Option<i64>,
    pub suppression: Option<i64>,
    pub tokens: Vec<(TokenKind, i64)>,
    pub surge_attack_used: Option<bool>,
    pub surge_defense_used: Option<bool>,
    pub abilities: Option<Vec<String>>,
    pub upgrade_slots: Option<Vec<UpgradeSlot>>,
}

impl UnitPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_wounds(mut self, value: i64) -> Self {
        self.current_wounds = Some(value);
        self
    }

    pub fn suppression(mut self, value: i64) -> Self {
        self.suppression = Some(value);
        self
    }

    pub fn token(mut self, kind: TokenKind, value: i64) -> Self {
        self.tokens.push((kind, value));
        self
    }

    pub fn surge_attack_used(mut self, used: bool) -> Self {
        self.surge_attack_used = Some(used);
        self
    }

    pub fn surge_defense_used(mut self, used: bool) -> Self {
        self.surge_defense_used = Some(used);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == UnitPatch::default()
    }
}

/// Returns a copy of `unit` with `patch` merged in.
pub fn apply_unit_update(unit: &Unit, patch: &UnitPatch) -> Unit {
    let mut updated = unit.clone();
    updated.apply(patch);
    updated
}
