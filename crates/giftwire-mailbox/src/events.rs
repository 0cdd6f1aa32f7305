//! Mailbox change notification
//!
//! Turns the register's raw watch stream into exactly-once gift arrival
//! events. A queued watch notification may predate the watcher's latest
//! read, so notifications serve only as wake-ups; contents are always
//! taken from a fresh read and the observed state never moves backwards.
//! Each read is diffed against the previous one: an unchanged read is
//! dropped, and the first read counts every present entry as newly added,
//! which delivers gifts already waiting before subscription. A lagged
//! stream only means missed wake-ups; the next read catches up.

use std::sync::Arc;

use giftwire_core::{PlayerRef, ReceivedGift, RegisterStore};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::MailboxResult;
use crate::schema::{GiftBoxState, gift_box_key};

/// Capacity of the event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One observed change of a gift box's contents
#[derive(Debug, Clone)]
pub struct MailboxEvent {
    /// Entries present now but not in the previous snapshot
    pub added: Vec<ReceivedGift>,
    /// Entries present in the previous snapshot but gone now
    pub removed: Vec<ReceivedGift>,
    /// Full contents after the change
    pub contents: Vec<ReceivedGift>,
}

/// Watcher translating register snapshots into [`MailboxEvent`]s
///
/// Spawns a background task on [`start`], which also hands back the first
/// event receiver; add more with [`events`] and shut the task down with
/// [`stop`]. Open/close transitions that leave contents untouched produce
/// no event.
///
/// [`start`]: MailboxEvents::start
/// [`events`]: MailboxEvents::events
/// [`stop`]: MailboxEvents::stop
pub struct MailboxEvents {
    event_tx: broadcast::Sender<MailboxEvent>,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl MailboxEvents {
    /// Start watching `owner`'s gift box
    ///
    /// The watch subscription is established before the initial read, and
    /// the returned receiver is subscribed before the watcher task is
    /// spawned, so even the backlog event has a listener by the time it
    /// is sent.
    pub async fn start<S: RegisterStore + 'static>(
        store: Arc<S>,
        owner: PlayerRef,
    ) -> MailboxResult<(Self, broadcast::Receiver<MailboxEvent>)> {
        let key = gift_box_key(owner);
        let watch_rx = store.watch(&key).await?;
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(watch_loop(
            store,
            key,
            watch_rx,
            event_tx.clone(),
            shutdown_rx,
        ));

        let events = Self {
            event_tx,
            shutdown_tx,
            task,
        };
        Ok((events, event_rx))
    }

    /// Subscribe to mailbox events
    ///
    /// A receiver obtained here only sees changes committed after the
    /// subscription; the receiver returned by `start` covers the backlog.
    pub fn events(&self) -> broadcast::Receiver<MailboxEvent> {
        self.event_tx.subscribe()
    }

    /// Stop the watcher task and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

async fn watch_loop<S: RegisterStore>(
    store: Arc<S>,
    key: String,
    mut watch_rx: broadcast::Receiver<Value>,
    event_tx: broadcast::Sender<MailboxEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut last: Option<Vec<ReceivedGift>> = None;

    // Backlog delivery: whatever is already in the box arrives as added
    refresh(store.as_ref(), &key, &event_tx, &mut last).await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!(key = %key, "Mailbox watcher shutting down");
                break;
            }
            received = watch_rx.recv() => match received {
                // A queued payload can predate the last read; notifications
                // only wake the loop and contents come from a fresh read
                Ok(_) => refresh(store.as_ref(), &key, &event_tx, &mut last).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(key = %key, skipped, "Watch stream lagged, resynchronizing");
                    refresh(store.as_ref(), &key, &event_tx, &mut last).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(key = %key, "Watch stream closed");
                    break;
                }
            }
        }
    }
}

/// Read current contents and emit the change since the last delivered state
async fn refresh<S: RegisterStore + ?Sized>(
    store: &S,
    key: &str,
    event_tx: &broadcast::Sender<MailboxEvent>,
    last: &mut Option<Vec<ReceivedGift>>,
) {
    match fetch_contents(store, key).await {
        Ok(contents) => emit(event_tx, last, contents),
        Err(e) => warn!(key = %key, error = %e, "Mailbox read failed"),
    }
}

async fn fetch_contents<S: RegisterStore + ?Sized>(
    store: &S,
    key: &str,
) -> MailboxResult<Vec<ReceivedGift>> {
    match store.get(key).await? {
        Some(value) => parse_contents(value),
        None => Ok(Vec::new()),
    }
}

fn parse_contents(value: Value) -> MailboxResult<Vec<ReceivedGift>> {
    let state: GiftBoxState = serde_json::from_value(value)?;
    Ok(state.contents)
}

/// Emit one event when `contents` differs from the last delivered snapshot
fn emit(
    event_tx: &broadcast::Sender<MailboxEvent>,
    last: &mut Option<Vec<ReceivedGift>>,
    contents: Vec<ReceivedGift>,
) {
    if last.as_ref() == Some(&contents) {
        trace!("Unchanged snapshot dropped");
        return;
    }

    let previous = last.replace(contents.clone());
    let previous = previous.as_deref().unwrap_or(&[]);
    let added = multiset_diff(&contents, previous);
    let removed = multiset_diff(previous, &contents);

    // A pure reordering changes the snapshot but moves no entries
    if added.is_empty() && removed.is_empty() {
        return;
    }

    let _ = event_tx.send(MailboxEvent {
        added,
        removed,
        contents,
    });
}

/// Entries of `a` not matched one-for-one by an equal entry of `b`
fn multiset_diff(a: &[ReceivedGift], b: &[ReceivedGift]) -> Vec<ReceivedGift> {
    let mut unmatched: Vec<&ReceivedGift> = b.iter().collect();
    let mut result = Vec::new();
    for entry in a {
        match unmatched.iter().position(|candidate| *candidate == entry) {
            Some(i) => {
                unmatched.swap_remove(i);
            }
            None => result.push(entry.clone()),
        }
    }
    result
}
