//! Battle persistence.
//!
//! The engine only needs two calls from a backing store: load a battle by
//! id and save a whole battle. Saves stamp `created_at`/`last_updated` and
//! are refused once the stored record is complete, so the terminal
//! end-battle write is the last one a battle ever receives.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::battle::Battle;

/// Errors from a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("battle not found: '{0}'")]
    NotFound(String),

    #[error("battle '{0}' is complete and can no longer be saved")]
    Completed(String),

    #[error("invalid battle id: '{0}'")]
    InvalidId(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed battle document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for failures a retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Unavailable(_))
    }
}

/// A load/save backend for battle records.
pub trait BattleStore {
    fn load(&self, id: &str) -> Result<Battle, StoreError>;

    /// Persists `battle`, updating its timestamps in place.
    fn save(&mut self, battle: &mut Battle) -> Result<(), StoreError>;
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns true if `id` is usable as a battle id: non-empty ASCII
/// letters, digits, `-` and `_`.
pub fn is_valid_battle_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Refuses a write over a completed record and stamps the timestamps.
fn prepare_write(existing: Option<&Battle>, battle: &mut Battle) -> Result<(), StoreError> {
    if existing.is_some_and(|b| b.is_complete) {
        return Err(StoreError::Completed(battle.id.clone()));
    }
    let now = now_millis();
    if battle.created_at == 0 {
        battle.created_at = existing.map_or(now, |b| b.created_at);
    }
    battle.last_updated = now;
    Ok(())
}

/// Saves with up to `attempts` tries, retrying only transient failures.
/// The caller's battle is left as-is on failure.
pub fn save_with_retry(store: &mut dyn BattleStore, battle: &mut Battle, attempts: u32) -> Result<(), StoreError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.save(battle) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::warn!(battle = %battle.id, attempt, error = %e, "save failed, retrying");
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(battle = %battle.id, attempt, error = %e, "save failed");
                return Err(e);
            }
        }
    }
}

/// A store holding battles in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    battles: HashMap<String, Battle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }
}

impl BattleStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Battle, StoreError> {
        self.battles
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save(&mut self, battle: &mut Battle) -> Result<(), StoreError> {
        prepare_write(self.battles.get(&battle.id), battle)?;
        self.battles.insert(battle.id.clone(), battle.clone());
        Ok(())
    }
}

/// A store writing one pretty-printed JSON document per battle into a
/// directory, named `<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonDirStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_battle_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl BattleStore for JsonDirStore {
    fn load(&self, id: &str) -> Result<Battle, StoreError> {
        let path = self.path_for(id)?;
        let data = match fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&mut self, battle: &mut Battle) -> Result<(), StoreError> {
        let path = self.path_for(&battle.id)?;
        let existing = match self.load(&battle.id) {
            Ok(b) => Some(b),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        prepare_write(existing.as_ref(), battle)?;

        let json = serde_json::to_string_pretty(battle)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(battle = %battle.id, path = %path.display(), "battle saved");
        Ok(())
    }
}
