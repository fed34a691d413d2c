//! Last-used tab settings, kept as sections of a single JSON document.
//!
//! Document shape: `{ "graphql": {...}, "http": {...}, "websocket": {...} }`.
//! Loading never fails; a missing or broken file just yields the defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{APP_DIR_NAME, CONFIG_DIR_ENV, STATE_FILE_NAME};
use crate::error::PersistenceError;
use crate::models::GraphQlTabSpec;

/// Reads and writes the state document
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store at the default location (see [`default_config_dir`]).
    pub fn new() -> Self {
        StateStore::in_dir(default_config_dir())
    }

    /// Store holding `state.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        StateStore {
            path: dir.as_ref().join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge the saved section over `default`, field by field.
    ///
    /// Unknown keys, values whose JSON type differs from the default's and
    /// values the field itself rejects are ignored; the other fields still load.
    pub fn load<T>(&self, default: T, section: &str) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(document) = self.read_document() else {
            return default;
        };
        let saved = select_section(&document, section);

        let mut merged = match serde_json::to_value(&default) {
            Ok(Value::Object(map)) => map,
            _ => return default,
        };
        for (key, value) in saved {
            let Some(current) = merged.get(&key) else {
                continue;
            };
            if !same_kind(current, &value) {
                continue;
            }
            let previous = current.clone();
            merged.insert(key.clone(), value);
            if let Err(e) = serde_json::from_value::<T>(Value::Object(merged.clone())) {
                tracing::debug!(section, key = %key, error = %e, "Saved field rejected, keeping default");
                merged.insert(key, previous);
            }
        }

        match serde_json::from_value(Value::Object(merged)) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::debug!(section, error = %e, "Saved state did not fit, using defaults");
                default
            }
        }
    }

    /// Write `spec` under `section`, keeping the other sections.
    pub fn save<T: Serialize>(&self, spec: &T, section: &str) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        let mut document = match self.read_document() {
            Some(Value::Object(map)) if !is_legacy_document(&map) => map,
            Some(Value::Object(map)) => migrate_legacy(map),
            _ => Map::new(),
        };
        document.insert(section.to_string(), serde_json::to_value(spec)?);
        let content = serde_json::to_string_pretty(&Value::Object(document))?;
        fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), section, "State saved");
        Ok(())
    }

    fn read_document(&self) -> Option<Value> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Ignoring unreadable state file");
                None
            }
        }
    }

    /// Ensure config directory exists
    fn ensure_dir(&self) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `$HTTP_VOYAGER_CONFIG_DIR`, else `$XDG_CONFIG_HOME/http_voyager`, else
/// `~/.config/http_voyager`.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(base) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(base).join(APP_DIR_NAME);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(APP_DIR_NAME)
}

fn select_section(document: &Value, section: &str) -> Map<String, Value> {
    let Value::Object(map) = document else {
        return Map::new();
    };
    match map.get(section) {
        Some(Value::Object(saved)) => saved.clone(),
        // Files written before sections existed held the GraphQL spec at the top level.
        _ if section == GraphQlTabSpec::SECTION && is_legacy_document(map) => map.clone(),
        _ => Map::new(),
    }
}

fn is_legacy_document(map: &Map<String, Value>) -> bool {
    map.get("endpoint").map_or(false, Value::is_string)
}

fn migrate_legacy(map: Map<String, Value>) -> Map<String, Value> {
    let mut document = Map::new();
    document.insert(GraphQlTabSpec::SECTION.to_string(), Value::Object(map));
    document
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}
