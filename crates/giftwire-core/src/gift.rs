//! Gift data model
//!
//! Items travel between games as vectors of semantic traits rather than
//! game-specific identifiers. All types here are plain values with
//! structural equality; the authoritative copy of a [`ReceivedGift`] lives
//! in the recipient's remote register, and anything held locally is a
//! read-only mirror.

use serde::{Deserialize, Serialize};

use crate::player::PlayerRef;

/// Attribute value assumed when a trait is known by name only
pub const DEFAULT_TRAIT_ATTRIBUTE: f32 = 1.0;

/// A named attribute describing one semantic aspect of an item
///
/// Two traits are equal only when name, quality, and duration all match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftTrait {
    /// Semantic name shared across games (e.g. "Heal", "Speed")
    pub name: String,
    /// How strong the aspect is, relative to a baseline of 1.0
    pub quality: f32,
    /// How long the aspect lasts, relative to a baseline of 1.0
    pub duration: f32,
}

impl GiftTrait {
    /// Create a trait with explicit quality and duration
    pub fn new(name: impl Into<String>, quality: f32, duration: f32) -> Self {
        Self {
            name: name.into(),
            quality,
            duration,
        }
    }

    /// Create a trait known by name only, with baseline attributes
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_TRAIT_ATTRIBUTE, DEFAULT_TRAIT_ATTRIBUTE)
    }
}

/// A gift payload described by its traits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftItem {
    /// Display name in the sender's game
    pub name: String,
    /// Traits describing the item for cross-game matching
    pub traits: Vec<GiftTrait>,
    /// Per-unit value in the sender's game currency
    pub value: i64,
}

impl GiftItem {
    /// Create an item from its name, traits, and per-unit value
    pub fn new(name: impl Into<String>, traits: Vec<GiftTrait>, value: i64) -> Self {
        Self {
            name: name.into(),
            traits,
            value,
        }
    }

    /// The names of this item's traits, in declaration order
    pub fn trait_names(&self) -> Vec<String> {
        self.traits.iter().map(|t| t.name.clone()).collect()
    }
}

/// An entry in a player's gift box
///
/// Identity is structural: two entries with the same item, amount, sender,
/// and refund flag are the same gift for removal and deduplication purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedGift {
    /// The gifted item
    pub item: GiftItem,
    /// Number of units gifted
    pub amount: u32,
    /// Slot of the player who sent the gift
    pub sender_slot: i32,
    /// Team of the player who sent the gift
    pub sender_team: i32,
    /// Whether this entry is a gift coming back to its original sender
    pub is_refund: bool,
}

impl ReceivedGift {
    /// Create a regular (non-refund) gift entry
    pub fn new(item: GiftItem, amount: u32, sender: PlayerRef) -> Self {
        Self {
            item,
            amount,
            sender_slot: sender.slot,
            sender_team: sender.team,
            is_refund: false,
        }
    }

    /// The player who sent this gift
    pub fn sender(&self) -> PlayerRef {
        PlayerRef::new(self.sender_slot, self.sender_team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_trait_uses_baseline_attributes() {
        let t = GiftTrait::named("Heal");
        assert_eq!(t.quality, DEFAULT_TRAIT_ATTRIBUTE);
        assert_eq!(t.duration, DEFAULT_TRAIT_ATTRIBUTE);
    }

    #[test]
    fn test_gift_equality_is_structural() {
        let item = GiftItem::new("Potion", vec![GiftTrait::named("Heal")], 50);
        let a = ReceivedGift::new(item.clone(), 1, PlayerRef::new(1, 0));
        let b = ReceivedGift::new(item.clone(), 1, PlayerRef::new(1, 0));
        assert_eq!(a, b);

        let more = ReceivedGift::new(item, 2, PlayerRef::new(1, 0));
        assert_ne!(a, more);
    }

    #[test]
    fn test_wire_field_names() {
        let gift = ReceivedGift::new(
            GiftItem::new("Potion", vec![GiftTrait::new("Heal", 2.0, 1.0)], 50),
            1,
            PlayerRef::new(3, 1),
        );
        let json = serde_json::to_value(&gift).unwrap();
        assert_eq!(json["sender_slot"], 3);
        assert_eq!(json["sender_team"], 1);
        assert_eq!(json["is_refund"], false);
        assert_eq!(json["item"]["traits"][0]["name"], "Heal");
    }
}
