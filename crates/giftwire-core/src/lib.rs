//! # Giftwire Core
//!
//! Core types, traits, and errors for the Giftwire stack.
//!
//! This crate provides the foundational abstractions that let the mailbox
//! and gifting layers work against any conforming remote data register,
//! with an in-memory register for tests and simulation.
//!
//! ## Key Traits
//!
//! - [`RegisterStore`]: Abstraction over the session's shared key-value
//!   register (read, conditional write, change notification)
//!
//! ## Key Types
//!
//! - [`PlayerRef`]: Slot/team address of a player in the session
//! - [`GiftTrait`]: Named (quality, duration) attribute describing an item
//! - [`GiftItem`]: A gift payload described by its traits
//! - [`ReceivedGift`]: An entry in a player's gift box

pub mod error;
pub mod gift;
pub mod memory;
pub mod player;
pub mod register;

// Re-export main types
pub use error::*;
pub use gift::*;
pub use memory::*;
pub use player::*;
pub use register::*;
