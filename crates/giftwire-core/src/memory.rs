//! In-memory register implementation
//!
//! A process-local [`RegisterStore`] suitable for tests and simulation.
//! Multiple clients sharing one instance behave like multiple sessions
//! talking to the same remote store, including the conditional-write races
//! the mailbox layer must survive.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::RegisterError;
use crate::register::RegisterStore;

/// Capacity of each per-key watch channel
const WATCH_CHANNEL_CAPACITY: usize = 1024;

/// In-memory implementation of [`RegisterStore`]
///
/// Values live in a `DashMap`; the compare and the write of [`set_if`]
/// happen under the map's entry guard, so conditional writes are atomic
/// with respect to each other and watchers observe values in commit order.
///
/// [`set_if`]: RegisterStore::set_if
#[derive(Debug)]
pub struct InMemoryRegisterStore {
    /// Current value per key
    values: DashMap<String, Value>,
    /// Watch channel per key, created on first subscription
    watchers: DashMap<String, broadcast::Sender<Value>>,
}

impl Default for InMemoryRegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegisterStore {
    /// Create an empty register store
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            watchers: DashMap::new(),
        }
    }

    /// Number of keys that have been written
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key has ever been written
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn notify(&self, key: &str, value: &Value) {
        if let Some(tx) = self.watchers.get(key) {
            // No receivers (or lagged ones) is fine; the write already committed
            let _ = tx.send(value.clone());
        }
    }
}

#[async_trait]
impl RegisterStore for InMemoryRegisterStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, RegisterError> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set_if(
        &self,
        key: &str,
        new: Value,
        expected_prior: Option<&Value>,
    ) -> Result<bool, RegisterError> {
        // The entry guard is held across compare, write, and notify, which
        // makes the CAS atomic and keeps notification in commit order.
        let committed = match self.values.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if expected_prior == Some(occupied.get()) {
                    occupied.insert(new.clone());
                    self.notify(key, &new);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                if expected_prior.is_none() {
                    vacant.insert(new.clone());
                    self.notify(key, &new);
                    true
                } else {
                    false
                }
            }
        };

        trace!(key = %key, committed, "Conditional write");
        Ok(committed)
    }

    async fn watch(&self, key: &str) -> Result<broadcast::Receiver<Value>, RegisterError> {
        let tx = self
            .watchers
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(WATCH_CHANNEL_CAPACITY).0);
        Ok(tx.subscribe())
    }
}
