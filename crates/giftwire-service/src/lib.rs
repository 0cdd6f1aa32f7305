//! # Giftwire Service
//!
//! Player-facing gift exchange service for Giftwire.
//!
//! This crate provides [`GiftService`], which ties together:
//! - Box management (open, close, inspect, remove)
//! - Sending with an acceptance preflight against the recipient's box
//! - Refunds back to the original sender
//! - Arrival notification through listeners and a broadcast channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use giftwire_core::{GiftItem, GiftTrait, InMemoryRegisterStore, PlayerRef};
//! use giftwire_service::GiftService;
//!
//! let store = Arc::new(InMemoryRegisterStore::new());
//! let service = GiftService::new(store, PlayerRef::new(1, 1));
//!
//! // Accept healing gifts and deliver arrivals to a callback
//! service.open_gift_box(false, vec![GiftTrait::named("Heal")]).await?;
//! service.register_gift_listener(|gift| println!("got {}", gift.item.name)).await;
//! service.start_listening().await?;
//!
//! // Send a potion to another player
//! let potion = GiftItem::new("Potion", vec![GiftTrait::named("Heal")], 50);
//! service.send_gift(potion, 1, PlayerRef::new(2, 1)).await?;
//! ```

mod acceptance;
mod error;

pub use acceptance::{GiftAcceptance, GiftRefusal, evaluate};
pub use error::{ServiceError, ServiceResult};
pub use giftwire_mailbox::MailboxConfig;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use giftwire_core::{GiftItem, GiftTrait, PlayerRef, ReceivedGift, RegisterStore};
use giftwire_mailbox::{MailboxClient, MailboxEvents};

/// Capacity of the received-gift broadcast channel
const GIFT_CHANNEL_CAPACITY: usize = 256;

/// Callback invoked once per newly received gift
pub type GiftListener = Box<dyn Fn(&ReceivedGift) + Send + Sync>;

/// Player-facing gift exchange service
///
/// GiftService provides a unified API over one player's gift box: it manages
/// the box state in the register, checks recipients before sending, and turns
/// box changes into per-gift arrival notifications. One instance serves one
/// player slot; sending to another player goes through that player's register
/// key directly, so no instance is needed on the recipient's side.
pub struct GiftService<S> {
    /// Our slot in the session
    identity: PlayerRef,
    /// Shared register the session synchronizes through
    store: Arc<S>,
    /// Client bound to our own box
    mailbox: MailboxClient<S>,
    /// Write retry configuration, shared with per-recipient clients
    config: MailboxConfig,
    /// Registered arrival callbacks
    listeners: Arc<RwLock<Vec<GiftListener>>>,
    /// Broadcast channel for received gifts
    gift_tx: broadcast::Sender<ReceivedGift>,
    shutdown_tx: broadcast::Sender<()>,
    /// Box watcher (None until listening)
    events: RwLock<Option<MailboxEvents>>,
    /// Handles for spawned background tasks
    background_tasks: RwLock<Vec<JoinHandle<()>>>,
    /// Whether arrival delivery is running
    listening: AtomicBool,
}

impl<S: RegisterStore + 'static> GiftService<S> {
    /// Create a service for one player slot with default write retry settings
    pub fn new(store: Arc<S>, identity: PlayerRef) -> Self {
        Self::with_config(store, identity, MailboxConfig::default())
    }

    /// Create a service with explicit write retry settings
    pub fn with_config(store: Arc<S>, identity: PlayerRef, config: MailboxConfig) -> Self {
        let (gift_tx, _) = broadcast::channel(GIFT_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(1);
        let mailbox = MailboxClient::with_config(store.clone(), identity, config.clone());

        Self {
            identity,
            store,
            mailbox,
            config,
            listeners: Arc::new(RwLock::new(Vec::new())),
            gift_tx,
            shutdown_tx,
            events: RwLock::new(None),
            background_tasks: RwLock::new(Vec::new()),
            listening: AtomicBool::new(false),
        }
    }

    /// Get our identity
    pub fn identity(&self) -> PlayerRef {
        self.identity
    }

    /// Check if arrival delivery is running
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Open our gift box
    ///
    /// Publishes the acceptance configuration: `accepts_any` takes everything,
    /// otherwise only gifts sharing a trait name with `accepted_traits` pass
    /// the send-time check. An empty filter also takes everything. Gifts
    /// already waiting in the box are kept.
    pub async fn open_gift_box(
        &self,
        accepts_any: bool,
        accepted_traits: Vec<GiftTrait>,
    ) -> ServiceResult<()> {
        self.mailbox.open(accepts_any, accepted_traits).await?;
        Ok(())
    }

    /// Close our gift box
    ///
    /// New sends are refused until the box is opened again; refunds still
    /// come through, and pending contents are kept.
    pub async fn close_gift_box(&self) -> ServiceResult<()> {
        self.mailbox.close().await?;
        Ok(())
    }

    /// Get the gifts currently waiting in our box
    pub async fn gift_box_contents(&self) -> ServiceResult<Vec<ReceivedGift>> {
        Ok(self.mailbox.contents().await?)
    }

    /// Remove one gift from our box after processing it
    ///
    /// Returns whether a matching gift was found. With duplicate entries a
    /// single occurrence is removed per call.
    pub async fn remove_gift(&self, gift: &ReceivedGift) -> ServiceResult<bool> {
        Ok(self.mailbox.remove(gift).await?)
    }

    /// Check whether a recipient would accept a gift carrying these trait names
    ///
    /// Refusals come back as [`ServiceError::Refused`] with the reason, so a
    /// caller can distinguish "recipient said no" from register failures.
    pub async fn can_gift_to(
        &self,
        recipient: PlayerRef,
        trait_names: &[String],
    ) -> ServiceResult<GiftAcceptance> {
        let mailbox = MailboxClient::with_config(self.store.clone(), recipient, self.config.clone());
        let state = mailbox
            .state_if_present()
            .await?
            .ok_or(GiftRefusal::NoGiftBox)?;

        Ok(evaluate(&state, trait_names)?)
    }

    /// Send a gift to another player
    ///
    /// Runs the acceptance check against the recipient's current box state,
    /// then appends the gift to their register with ourselves recorded as
    /// sender. The recipient may reconfigure between check and append; the
    /// append itself only re-verifies that the box is still open.
    pub async fn send_gift(
        &self,
        item: GiftItem,
        amount: u32,
        recipient: PlayerRef,
    ) -> ServiceResult<()> {
        let names = item.trait_names();
        let acceptance = self.can_gift_to(recipient, &names).await?;
        debug!(recipient = %recipient, ?acceptance, item = %item.name, "Sending gift");

        let gift = ReceivedGift::new(item, amount, self.identity);
        let mailbox = MailboxClient::with_config(self.store.clone(), recipient, self.config.clone());
        mailbox.append(&gift).await?;

        info!(recipient = %recipient, "Gift sent");
        Ok(())
    }

    /// Return a received gift to its original sender
    ///
    /// Skips the acceptance check: the returned entry is flagged as a refund
    /// and lands even when the sender's box is closed or absent. On success
    /// the entry is removed from our own box.
    pub async fn refund_gift(&self, gift: &ReceivedGift) -> ServiceResult<()> {
        let refund = ReceivedGift {
            item: gift.item.clone(),
            amount: gift.amount,
            sender_slot: self.identity.slot,
            sender_team: self.identity.team,
            is_refund: true,
        };

        let original_sender = gift.sender();
        let mailbox =
            MailboxClient::with_config(self.store.clone(), original_sender, self.config.clone());
        mailbox.append(&refund).await?;

        self.mailbox.remove(gift).await?;

        info!(recipient = %original_sender, "Gift refunded");
        Ok(())
    }

    /// Register a callback invoked once per newly received gift
    ///
    /// Callbacks run on the listener task; keep them short. Nothing fires
    /// until [`start_listening`](Self::start_listening) is called.
    pub async fn register_gift_listener(
        &self,
        listener: impl Fn(&ReceivedGift) + Send + Sync + 'static,
    ) {
        self.listeners.write().await.push(Box::new(listener));
    }

    /// Subscribe to received gifts as a channel
    ///
    /// Each newly arrived gift is sent once. Subscribing is independent of
    /// callbacks; both see the same gifts.
    pub fn received_gifts(&self) -> broadcast::Receiver<ReceivedGift> {
        self.gift_tx.subscribe()
    }

    /// Start delivering incoming gifts to listeners and subscribers
    ///
    /// Gifts already waiting in the box are delivered first as a backlog,
    /// then each register change is diffed so every arrival is reported
    /// exactly once. Calling again while listening is a no-op.
    #[instrument(skip(self))]
    pub async fn start_listening(&self) -> ServiceResult<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            debug!(owner = %self.identity, "Already listening");
            return Ok(());
        }

        // The receiver from start is subscribed before the watcher emits,
        // so the backlog event is already buffered for the pump
        let (events, mut event_rx) =
            match MailboxEvents::start(self.store.clone(), self.identity).await {
                Ok(started) => started,
                Err(e) => {
                    self.listening.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
            };
        *self.events.write().await = Some(events);

        let identity = self.identity;
        let listeners = self.listeners.clone();
        let gift_tx = self.gift_tx.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let pump_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    event = event_rx.recv() => {
                        match event {
                            Ok(event) => {
                                for gift in event.added {
                                    debug!(
                                        owner = %identity,
                                        sender = %gift.sender(),
                                        "Gift received"
                                    );
                                    for listener in listeners.read().await.iter() {
                                        listener(&gift);
                                    }
                                    let _ = gift_tx.send(gift);
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(owner = %identity, skipped, "Gift event stream lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });

        self.background_tasks.write().await.push(pump_task);

        info!(owner = %self.identity, "Listening for gifts");
        Ok(())
    }

    /// Stop delivering gifts
    ///
    /// Stops the box watcher and the delivery task. The box itself is left
    /// untouched in the register, open or closed as it was, with its pending
    /// contents intact for the next session.
    #[instrument(skip(self))]
    pub async fn close(&self) -> ServiceResult<()> {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        // Signal shutdown
        let _ = self.shutdown_tx.send(());

        // Stop the box watcher
        if let Some(events) = self.events.write().await.take() {
            events.stop().await;
        }

        // Wait for background tasks
        let mut tasks = self.background_tasks.write().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }

        info!(owner = %self.identity, "Gift service closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwire_core::InMemoryRegisterStore;

    fn service(slot: i32) -> GiftService<InMemoryRegisterStore> {
        GiftService::new(Arc::new(InMemoryRegisterStore::new()), PlayerRef::new(slot, 1))
    }

    #[tokio::test]
    async fn test_new_service_is_not_listening() {
        let service = service(1);

        assert!(!service.is_listening());
        assert_eq!(service.identity(), PlayerRef::new(1, 1));
    }

    #[tokio::test]
    async fn test_open_then_close_round_trip() {
        let service = service(1);

        service
            .open_gift_box(false, vec![GiftTrait::named("Heal")])
            .await
            .unwrap();
        service.close_gift_box().await.unwrap();

        let contents = service.gift_box_contents().await.unwrap();
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn test_can_gift_to_player_without_box_refuses() {
        let service = service(1);

        let verdict = service
            .can_gift_to(PlayerRef::new(9, 1), &["Heal".to_string()])
            .await;

        assert!(matches!(
            verdict,
            Err(ServiceError::Refused(GiftRefusal::NoGiftBox))
        ));
    }

    #[tokio::test]
    async fn test_send_to_own_open_box_lands() {
        let service = service(1);
        service.open_gift_box(true, vec![]).await.unwrap();

        let potion = GiftItem::new("Potion", vec![GiftTrait::named("Heal")], 50);
        service
            .send_gift(potion.clone(), 2, service.identity())
            .await
            .unwrap();

        let contents = service.gift_box_contents().await.unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].item, potion);
        assert_eq!(contents[0].amount, 2);
        assert_eq!(contents[0].sender(), service.identity());
        assert!(!contents[0].is_refund);
    }

    #[tokio::test]
    async fn test_start_listening_twice_is_noop() {
        let service = service(1);
        service.open_gift_box(true, vec![]).await.unwrap();

        service.start_listening().await.unwrap();
        service.start_listening().await.unwrap();

        assert!(service.is_listening());
        assert_eq!(service.background_tasks.read().await.len(), 1);

        service.close().await.unwrap();
        assert!(!service.is_listening());
    }

    #[tokio::test]
    async fn test_close_without_start_is_noop() {
        let service = service(1);

        service.close().await.unwrap();

        assert!(!service.is_listening());
    }
}
