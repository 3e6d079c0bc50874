use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Error;

/// Flat key/value mapping exchanged with the settings store.
pub type StoreMap = Map<String, Value>;

/// The shared, eventually-synced settings store.
///
/// Writes are last-write-wins across every tab and context on the same
/// profile; there is no transactional guarantee.
pub trait SettingsStore: Send + Sync {
    /// Reads every key of `defaults`, falling back to the given default for
    /// keys that were never written.
    fn get(&self, defaults: &StoreMap) -> Result<StoreMap, Error>;

    /// Writes every entry of `items`.
    fn set(&self, items: StoreMap) -> Result<(), Error>;
}

/// An in-process store, used by tests and the demo host.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<StoreMap>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: StoreMap) -> Self {
        Self {
            items: Mutex::new(items),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reads one raw value.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.items.lock().get(key).cloned()
    }

    fn check(&self) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::Store("storage quota exceeded".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, defaults: &StoreMap) -> Result<StoreMap, Error> {
        self.check()?;
        let items = self.items.lock();
        Ok(defaults
            .iter()
            .map(|(key, default)| {
                let value = items.get(key).unwrap_or(default).clone();
                (key.clone(), value)
            })
            .collect())
    }

    fn set(&self, items: StoreMap) -> Result<(), Error> {
        self.check()?;
        self.items.lock().extend(items);
        Ok(())
    }
}
