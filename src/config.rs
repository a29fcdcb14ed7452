//! Rule and engine configuration.
//!
//! `RulesConfig` carries the house-rule switches the engine consults. It is
//! built from defaults and adjusted one option at a time through the
//! protocol's `setoption` command, or deserialised from JSON.

use serde::{Deserialize, Serialize};

/// Where a unit's shield tokens come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShieldSource {
    /// Shield tokens are an ordinary tracked counter; the round reset leaves
    /// them untouched.
    #[default]
    Tracked,
    /// Shield tokens come from the unit's persistent `shielded` keyword and
    /// are restored to that value at every round reset.
    Keyword,
}

impl ShieldSource {
    pub fn from_keyword(s: &str) -> Option<ShieldSource> {
        match s {
            "tracked" => Some(ShieldSource::Tracked),
            "keyword" => Some(ShieldSource::Keyword),
            _ => None,
        }
    }
}

/// Default suppression at which a unit counts as suppressed.
pub const DEFAULT_SUPPRESSED_THRESHOLD: u32 = 3;

/// Default suppression at which a unit panics.
pub const DEFAULT_PANICKED_THRESHOLD: u32 = 6;

/// Default number of attempts for a save that fails transiently.
pub const DEFAULT_SAVE_RETRIES: u32 = 3;

/// Configurable rules consulted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub shield_source: ShieldSource,
    pub suppressed_threshold: u32,
    pub panicked_threshold: u32,
    pub save_retries: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            shield_source: ShieldSource::Tracked,
            suppressed_threshold: DEFAULT_SUPPRESSED_THRESHOLD,
            panicked_threshold: DEFAULT_PANICKED_THRESHOLD,
            save_retries: DEFAULT_SAVE_RETRIES,
        }
    }
}

/// Error from applying a named option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("invalid value '{value}' for option {name}")]
    InvalidValue { name: String, value: String },

    #[error("option {0} requires a value")]
    MissingValue(String),

    #[error("panicked threshold {panicked} is below suppressed threshold {suppressed}")]
    ThresholdOrder { suppressed: u32, panicked: u32 },
}

impl RulesConfig {
    /// Applies a single named option. Returns `Ok(false)` if the name is
    /// not a rules option, leaving the config unchanged. The suppressed
    /// threshold may never exceed the panicked threshold.
    pub fn apply_option(&mut self, name: &str, value: Option<&str>) -> Result<bool, OptionError> {
        match name {
            "ShieldSource" => {
                let v = required(name, value)?;
                self.shield_source =
                    ShieldSource::from_keyword(v).ok_or_else(|| invalid(name, v))?;
            }
            "SuppressedThreshold" => {
                let v = required(name, value)?;
                let suppressed = v.parse().map_err(|_| invalid(name, v))?;
                check_thresholds(suppressed, self.panicked_threshold)?;
                self.suppressed_threshold = suppressed;
            }
            "PanickedThreshold" => {
                let v = required(name, value)?;
                let panicked = v.parse().map_err(|_| invalid(name, v))?;
                check_thresholds(self.suppressed_threshold, panicked)?;
                self.panicked_threshold = panicked;
            }
            "SaveRetries" => {
                let v = required(name, value)?;
                match v.parse::<u32>() {
                    Ok(n) if n > 0 => self.save_retries = n,
                    _ => return Err(invalid(name, v)),
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, OptionError> {
    value.ok_or_else(|| OptionError::MissingValue(name.to_string()))
}

fn check_thresholds(suppressed: u32, panicked: u32) -> Result<(), OptionError> {
    if panicked < suppressed {
        return Err(OptionError::ThresholdOrder { suppressed, panicked });
    }
    Ok(())
}

fn invalid(name: &str, value: &str) -> OptionError {
    OptionError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}
