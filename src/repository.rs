//! Key-path configuration store.
//!
//! Settings are addressed by dotted paths such as `nisab.gold` or
//! `agricultural.wasq_weights.wheat`. `ConfigStore` keeps them as a JSON tree
//! and can be filled from JSON, TOML, the bundled defaults file and
//! `ZAKAT_*` environment variables.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::types::ZakatError;

const BUNDLED_CONFIG: &str = include_str!("../config/zakat.toml");
const ENV_PREFIX: &str = "ZAKAT_";

/// Read access to configuration values by dotted key path.
pub trait ConfigRepository {
    /// Returns the value stored at `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    root: Value,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    pub fn from_value(root: Value) -> Result<Self, ZakatError> {
        if !root.is_object() {
            return Err(ZakatError::config("<root>", "configuration must be a table/object"));
        }
        Ok(Self { root })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ZakatError> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| ZakatError::config("<json>", format!("failed to parse config JSON: {}", e)))?;
        Self::from_value(root)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ZakatError> {
        let table: toml::Value = toml::from_str(content)
            .map_err(|e| ZakatError::config("<toml>", format!("failed to parse config TOML: {}", e)))?;
        let root = serde_json::to_value(table)
            .map_err(|e| ZakatError::config("<toml>", format!("unsupported TOML value: {}", e)))?;
        Self::from_value(root)
    }

    /// Loads a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ZakatError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file {:?}: {}", path, e);
            ZakatError::config(path.display().to_string(), format!("failed to read config file: {}", e))
        })?;

        let store = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            other => {
                return Err(ZakatError::config(
                    path.display().to_string(),
                    format!("unsupported config format: {:?}", other),
                ))
            }
        };
        debug!("Loaded configuration from {:?}", path);
        Ok(store)
    }

    /// The defaults shipped in `config/zakat.toml`.
    pub fn bundled() -> Result<Self, ZakatError> {
        Self::from_toml_str(BUNDLED_CONFIG)
    }

    /// Stores `value` at `key`, creating intermediate tables as needed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut self.root, &segments, value.into());
        self
    }

    /// Applies `ZAKAT_*` variables from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        let applied = self.apply_overrides(std::env::vars());
        debug!(applied, "Applied environment overrides to configuration");
        self
    }

    /// Applies `ZAKAT_<SECTION>__<KEY>=<value>` pairs; `__` separates path
    /// segments, so `ZAKAT_DEFAULT_PRICES__GOLD=72.5` sets `default_prices.gold`.
    /// Values that parse as JSON (numbers, booleans, arrays) keep that type,
    /// anything else is stored as a string. Returns the number of keys set.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = 0;
        for (name, raw) in vars {
            let Some(rest) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let key = rest.to_ascii_lowercase().replace("__", ".");
            let raw = raw.as_ref();
            let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            self.set(&key, value);
            applied += 1;
        }
        applied
    }
}

// Non-table nodes on the way down are replaced with tables.
fn insert_path(node: &mut Value, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        insert_path(child, rest, value);
    }
}

impl ConfigRepository for ConfigStore {
    fn get(&self, key: &str) -> Option<Value> {
        let mut node = &self.root;
        for segment in key.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node.clone())
    }
}
