use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// On/off flag and repeat interval (milliseconds) for one poller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollerConfig {
    pub active: bool,
    pub interval: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            active: true,
            interval: 10_000,
        }
    }
}

/// Operator settings, loaded once at startup and mutated only through the
/// toggle/set operations below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub beacon: PollerConfig,
    pub update: PollerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            beacon: PollerConfig {
                active: true,
                interval: 10_000,
            },
            update: PollerConfig {
                active: true,
                interval: 30_000,
            },
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))
    }

    /// Write the full settings document as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create settings file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Fire-and-forget persistence boundary for single setting values.
///
/// Implementations must not surface errors to the caller; a failed write is
/// logged and the in-memory value stays authoritative for the session.
pub trait SettingsStore: Send + Sync {
    fn save_setting(&self, category: &str, key: &str, value: Value);
}

/// Settings store that patches a JSON document on disk in place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, category: &str, key: &str, value: Value) -> Result<()> {
        let mut doc: Value = match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|_| json!({})),
            Err(_) => json!({}),
        };

        let obj = doc
            .as_object_mut()
            .context("settings document is not a JSON object")?;
        let cat = obj
            .entry(category.to_string())
            .or_insert_with(|| json!({}));
        let cat = cat
            .as_object_mut()
            .with_context(|| format!("settings category is not a JSON object: {category}"))?;
        cat.insert(key.to_string(), value);

        let file = fs::File::create(&self.path)
            .with_context(|| format!("failed to create settings file: {}", self.path.display()))?;
        serde_json::to_writer_pretty(file, &doc)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn save_setting(&self, category: &str, key: &str, value: Value) {
        if let Err(e) = self.write(category, key, value) {
            warn!(category, key, error = %e, "failed to persist setting");
        }
    }
}

/// Flip the beacon poller on/off and persist the new flag.
/// Returns the new state.
pub fn beacon_toggle(settings: &mut Settings, store: &dyn SettingsStore) -> bool {
    settings.beacon.active = !settings.beacon.active;
    store.save_setting("beacon", "active", Value::Bool(settings.beacon.active));
    settings.beacon.active
}

/// Flip the result poller on/off and persist the new flag.
/// Returns the new state.
pub fn update_toggle(settings: &mut Settings, store: &dyn SettingsStore) -> bool {
    settings.update.active = !settings.update.active;
    store.save_setting("update", "active", Value::Bool(settings.update.active));
    settings.update.active
}

/// Set the result poll interval from an operator-supplied token.
///
/// Only a plain integer (milliseconds) is accepted. Anything else is
/// rejected with a log entry and no mutation; the rejection is never
/// surfaced as an alert or an error.
pub fn set_update_interval(settings: &mut Settings, store: &dyn SettingsStore, raw: &str) -> bool {
    match raw.trim().parse::<u64>() {
        Ok(ms) => {
            settings.update.interval = ms;
            store.save_setting("update", "interval", Value::from(ms));
            true
        }
        Err(_) => {
            warn!(value = raw, "invalid update interval: not an integer");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records `save_setting` calls for assertions.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl SettingsStore for RecordingStore {
        fn save_setting(&self, category: &str, key: &str, value: Value) {
            self.calls
                .lock()
                .unwrap()
                .push((category.to_string(), key.to_string(), value));
        }
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<(String, String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[test]
    fn defaults_are_active() {
        let s = Settings::default();
        assert!(s.beacon.active);
        assert!(s.update.active);
        assert_eq!(s.beacon.interval, 10_000);
        assert_eq!(s.update.interval, 30_000);
    }

    #[test]
    fn toggles_flip_and_persist() {
        let mut s = Settings::default();
        let store = RecordingStore::default();

        assert!(!beacon_toggle(&mut s, &store));
        assert!(beacon_toggle(&mut s, &store));
        assert!(!update_toggle(&mut s, &store));

        assert_eq!(
            store.calls(),
            vec![
                ("beacon".into(), "active".into(), Value::Bool(false)),
                ("beacon".into(), "active".into(), Value::Bool(true)),
                ("update".into(), "active".into(), Value::Bool(false)),
            ]
        );
    }

    #[test]
    fn interval_setter_accepts_only_integers() {
        let mut s = Settings::default();
        let store = RecordingStore::default();
        let before = s.update.interval;

        assert!(!set_update_interval(&mut s, &store, "3.5"));
        assert!(!set_update_interval(&mut s, &store, "abc"));
        assert!(!set_update_interval(&mut s, &store, "5s"));
        assert_eq!(s.update.interval, before);
        assert!(store.calls().is_empty());

        assert!(set_update_interval(&mut s, &store, "5000"));
        assert_eq!(s.update.interval, 5000);
        assert_eq!(
            store.calls(),
            vec![("update".into(), "interval".into(), json!(5000))]
        );
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings::load(&path).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut s = Settings::default();
        s.update.interval = 12_345;
        s.beacon.active = false;
        s.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn file_store_patches_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        Settings::default().save(&path).unwrap();
        let store = JsonFileStore::new(path.clone());
        store.save_setting("update", "interval", json!(5000));
        store.save_setting("beacon", "active", Value::Bool(false));

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.update.interval, 5000);
        assert!(!loaded.beacon.active);
        // Untouched keys keep their previous values.
        assert!(loaded.update.active);
        assert_eq!(loaded.beacon.interval, 10_000);
    }
}
