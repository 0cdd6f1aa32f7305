//! Gift box register schema
//!
//! One register per player slot holds the complete gift box: open state,
//! acceptance configuration, and pending contents. Values travel as JSON;
//! missing fields deserialize to defaults so boxes written by older
//! library versions stay readable.

use giftwire_core::{GiftTrait, PlayerRef, ReceivedGift};
use serde::{Deserialize, Serialize};

/// Version of the gift data layout this library reads and writes
///
/// Opening a box stamps its version window with this value; senders refuse
/// boxes whose minimum exceeds it.
pub const PROTOCOL_VERSION: u32 = 3;

/// Register key of a player's gift box
pub fn gift_box_key(player: PlayerRef) -> String {
    format!("GiftBox;{};{}", player.team, player.slot)
}

/// Complete state of one player's gift box
///
/// `contents` is append/remove only; entries are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftBoxState {
    /// Whether the box currently accepts sends
    #[serde(default)]
    pub is_open: bool,
    /// Accept any gift regardless of its traits
    #[serde(default)]
    pub accepts_any_gift: bool,
    /// Traits the owner asks for; an empty filter accepts everything
    #[serde(default)]
    pub accepted_traits: Vec<GiftTrait>,
    /// Lowest data version the owner can read
    #[serde(default = "default_protocol_version")]
    pub min_protocol_version: u32,
    /// Highest data version the owner can read
    #[serde(default = "default_protocol_version")]
    pub max_protocol_version: u32,
    /// Pending gifts awaiting the owner
    #[serde(default)]
    pub contents: Vec<ReceivedGift>,
}

fn default_protocol_version() -> u32 {
    PROTOCOL_VERSION
}

impl Default for GiftBoxState {
    fn default() -> Self {
        Self {
            is_open: false,
            accepts_any_gift: false,
            accepted_traits: Vec::new(),
            min_protocol_version: PROTOCOL_VERSION,
            max_protocol_version: PROTOCOL_VERSION,
            contents: Vec::new(),
        }
    }
}

impl GiftBoxState {
    /// Names in the accepted-traits filter, in declaration order
    pub fn accepted_trait_names(&self) -> Vec<String> {
        self.accepted_traits.iter().map(|t| t.name.clone()).collect()
    }
}
