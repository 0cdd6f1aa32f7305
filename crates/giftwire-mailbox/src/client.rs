//! Mailbox client
//!
//! All mutations of a gift box go through one optimistic
//! read-modify-write loop: read the register, apply the change to the
//! decoded state, and write back conditioned on the register still holding
//! the value that was read. A lost race retries with a fresh read, up to a
//! bounded number of attempts with jittered exponential backoff between
//! them.

use std::sync::Arc;
use std::time::Duration;

use giftwire_core::{GiftTrait, PlayerRef, ReceivedGift, RegisterStore};
use tracing::{debug, info, trace};

use crate::error::{MailboxError, MailboxResult};
use crate::schema::{GiftBoxState, PROTOCOL_VERSION, gift_box_key};

/// Retry behavior for conflicted writes
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    /// Attempts before a conflicted write gives up
    pub max_write_attempts: u32,
    /// Base delay between conflicted attempts
    pub retry_base_delay: Duration,
    /// Cap on backoff doublings
    pub max_backoff_exponent: u32,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 8,
            retry_base_delay: Duration::from_millis(10),
            max_backoff_exponent: 6,
        }
    }
}

impl MailboxConfig {
    /// Set the number of attempts before a conflicted write gives up
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts;
        self
    }

    /// Set the base delay between conflicted attempts
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the cap on backoff doublings
    pub fn with_max_backoff_exponent(mut self, exponent: u32) -> Self {
        self.max_backoff_exponent = exponent;
        self
    }

    /// Delay before the next attempt: base * 2^attempt, capped, with
    /// jitter in [0.5, 1.0) so contending writers fall out of lockstep
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(self.max_backoff_exponent);
        let scaled = self
            .retry_base_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        scaled.mul_f32(0.5 + rand::random::<f32>() / 2.0)
    }
}

/// Client for one player's gift box
///
/// Bound to a single box key; a sender constructs one for each recipient.
/// Cheap to clone, and all methods take `&self`: correctness under
/// concurrent callers comes from the register's conditional write, not
/// from local locking.
pub struct MailboxClient<S> {
    store: Arc<S>,
    owner: PlayerRef,
    key: String,
    config: MailboxConfig,
}

impl<S> Clone for MailboxClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            owner: self.owner,
            key: self.key.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: RegisterStore> MailboxClient<S> {
    /// Create a client for `owner`'s box with default retry behavior
    pub fn new(store: Arc<S>, owner: PlayerRef) -> Self {
        Self::with_config(store, owner, MailboxConfig::default())
    }

    /// Create a client with custom retry behavior
    pub fn with_config(store: Arc<S>, owner: PlayerRef, config: MailboxConfig) -> Self {
        Self {
            store,
            owner,
            key: gift_box_key(owner),
            config,
        }
    }

    /// The player whose box this client addresses
    pub fn owner(&self) -> PlayerRef {
        self.owner
    }

    /// The register key of the box
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Box state, or `None` when the box has never been written
    pub async fn state_if_present(&self) -> MailboxResult<Option<GiftBoxState>> {
        match self.store.get(&self.key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Box state, reading a never-written box as closed and empty
    pub async fn state(&self) -> MailboxResult<GiftBoxState> {
        Ok(self.state_if_present().await?.unwrap_or_default())
    }

    /// Current contents
    pub async fn contents(&self) -> MailboxResult<Vec<ReceivedGift>> {
        Ok(self.state().await?.contents)
    }

    /// Open the box for sends
    ///
    /// Sets the acceptance configuration and stamps the version window;
    /// gifts already pending in the box are preserved.
    pub async fn open(&self, accepts_any: bool, accepted_traits: Vec<GiftTrait>) -> MailboxResult<()> {
        self.update(|state| {
            state.is_open = true;
            state.accepts_any_gift = accepts_any;
            state.accepted_traits = accepted_traits.clone();
            state.min_protocol_version = PROTOCOL_VERSION;
            state.max_protocol_version = PROTOCOL_VERSION;
            Ok(true)
        })
        .await?;

        info!(owner = %self.owner, "Gift box opened");
        Ok(())
    }

    /// Close the box to further sends
    ///
    /// Acceptance configuration and pending contents are preserved;
    /// appends already committed stay in the box.
    pub async fn close(&self) -> MailboxResult<()> {
        self.update(|state| {
            state.is_open = false;
            Ok(true)
        })
        .await?;

        info!(owner = %self.owner, "Gift box closed");
        Ok(())
    }

    /// Append a gift, retrying on conflict
    ///
    /// A closed box refuses regular gifts. Refund entries go through
    /// regardless, so a returned gift can always reach its original
    /// sender. The open check runs inside the retry loop against freshly
    /// read state, so a box closed mid-send refuses rather than queues.
    pub async fn append(&self, gift: &ReceivedGift) -> MailboxResult<()> {
        self.update(|state| {
            if !state.is_open && !gift.is_refund {
                return Err(MailboxError::BoxClosed);
            }
            state.contents.push(gift.clone());
            Ok(true)
        })
        .await?;

        debug!(owner = %self.owner, sender = %gift.sender(), "Gift appended");
        Ok(())
    }

    /// Remove the first entry structurally equal to `gift`
    ///
    /// Returns `false` without writing when no equal entry is present;
    /// another path removing it first is a normal outcome, not an error.
    pub async fn remove(&self, gift: &ReceivedGift) -> MailboxResult<bool> {
        let removed = self
            .update(|state| {
                match state.contents.iter().position(|entry| entry == gift) {
                    Some(i) => {
                        state.contents.remove(i);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
            .await?;

        if removed {
            debug!(owner = %self.owner, "Gift removed");
        }
        Ok(removed)
    }

    /// Optimistic read-modify-write with bounded retries
    ///
    /// The closure sees freshly read state on every attempt and returns
    /// whether a write is needed; the final result is whether a write
    /// committed. Mutations are safe to retry because each attempt starts
    /// from the register's current value, never a stale assumption.
    async fn update<F>(&self, mut mutate: F) -> MailboxResult<bool>
    where
        F: FnMut(&mut GiftBoxState) -> Result<bool, MailboxError>,
    {
        for attempt in 1..=self.config.max_write_attempts {
            let prior = self.store.get(&self.key).await?;
            let mut state: GiftBoxState = match &prior {
                Some(value) => serde_json::from_value(value.clone())?,
                None => GiftBoxState::default(),
            };

            if !mutate(&mut state)? {
                return Ok(false);
            }

            let new_value = serde_json::to_value(&state)?;
            if self.store.set_if(&self.key, new_value, prior.as_ref()).await? {
                trace!(key = %self.key, attempt, "Box update committed");
                return Ok(true);
            }

            // No backoff after the final attempt
            if attempt < self.config.max_write_attempts {
                debug!(key = %self.key, attempt, "Conditional write lost, retrying");
                tokio::time::sleep(self.config.backoff_delay(attempt)).await;
            }
        }

        Err(MailboxError::WriteConflict {
            attempts: self.config.max_write_attempts,
        })
    }
}
