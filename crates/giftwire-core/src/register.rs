//! Remote register abstraction
//!
//! The session exposes a shared key-value register with per-key read,
//! conditional write, and change notification. That is the entire surface
//! the gifting stack needs; everything above it (mailboxes, retry loops,
//! arrival notification) is built from these three operations.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::RegisterError;

/// Trait for the session's shared data register
///
/// Implementations are expected to be cheap to share (`&self` methods,
/// internal synchronization). There is no atomic append or update: callers
/// needing read-modify-write semantics must build them from [`get`] and
/// [`set_if`], retrying when a concurrent writer wins the race.
///
/// [`get`]: RegisterStore::get
/// [`set_if`]: RegisterStore::set_if
#[async_trait]
pub trait RegisterStore: Send + Sync {
    /// Read the current value of a key
    ///
    /// Returns `None` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Value>, RegisterError>;

    /// Conditionally write a key
    ///
    /// Commits `new` and returns `true` iff the key's current value equals
    /// `expected_prior` (`None` meaning the key must be absent). Returns
    /// `false` without writing when the comparison fails, which signals a
    /// concurrent writer got there first.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport or serialization failures; a
    /// failed comparison is the `Ok(false)` outcome, not an error.
    async fn set_if(
        &self,
        key: &str,
        new: Value,
        expected_prior: Option<&Value>,
    ) -> Result<bool, RegisterError>;

    /// Subscribe to committed writes on a key
    ///
    /// The receiver yields each value after its write commits. Delivery may
    /// lag under load and the same value may be observed more than once;
    /// subscribers must treat the stream as snapshots of current state, not
    /// a complete ordered history.
    async fn watch(&self, key: &str) -> Result<broadcast::Receiver<Value>, RegisterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the RegisterStore trait is object-safe
    fn _assert_object_safe(_: &dyn RegisterStore) {}
}
