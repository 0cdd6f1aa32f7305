//! # Giftwire Match
//!
//! Trait matching engine for Giftwire.
//!
//! Incoming gifts are described by abstract traits; this crate finds which
//! locally-registered items approximate them best. [`TraitProfile`] scores
//! pairs of trait sets, and [`TraitIndex`] holds (key, traits) registrations
//! in a metric tree for nearest-neighbor lookup without scanning every
//! entry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use giftwire_core::GiftTrait;
//! use giftwire_match::TraitIndex;
//!
//! let mut index = TraitIndex::new();
//! index.register("red_potion", &[GiftTrait::named("Heal")]);
//! index.register("boots", &[GiftTrait::named("Speed")]);
//!
//! let matches = index.find_closest(&[GiftTrait::new("Heal", 2.0, 1.0)]);
//! assert_eq!(matches, vec!["red_potion"]);
//! ```

pub mod distance;
pub mod index;

// Re-exports
pub use distance::{MISSING_TRAIT_COST, TraitProfile};
pub use index::TraitIndex;
