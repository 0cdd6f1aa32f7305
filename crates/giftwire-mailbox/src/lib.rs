//! # Giftwire Mailbox
//!
//! Gift box synchronization over a shared remote register.
//!
//! A recipient's gift box lives in a single register value with no native
//! locking, and any player may write to it. [`MailboxClient`] therefore
//! performs every mutation as an optimistic read-modify-write with bounded
//! retries, and [`MailboxEvents`] turns the register's raw change
//! notifications into exactly-once gift arrival events.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use giftwire_core::{GiftItem, GiftTrait, InMemoryRegisterStore, PlayerRef, ReceivedGift};
//! use giftwire_mailbox::MailboxClient;
//!
//! let store = Arc::new(InMemoryRegisterStore::new());
//! let recipient = PlayerRef::new(1, 0);
//!
//! // Open the box and let another player drop a gift in
//! let mailbox = MailboxClient::new(store, recipient);
//! mailbox.open(false, vec![GiftTrait::named("Heal")]).await?;
//!
//! let item = GiftItem::new("Potion", vec![GiftTrait::named("Heal")], 50);
//! let gift = ReceivedGift::new(item, 1, PlayerRef::new(2, 0));
//! mailbox.append(&gift).await?;
//!
//! assert_eq!(mailbox.contents().await?, vec![gift]);
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod schema;

// Re-exports
pub use client::{MailboxClient, MailboxConfig};
pub use error::{MailboxError, MailboxResult};
pub use events::{MailboxEvent, MailboxEvents};
pub use schema::{GiftBoxState, PROTOCOL_VERSION, gift_box_key};
