//! Player addressing
//!
//! Players in a session are addressed by their slot number within a team.
//! The pair is stable for the lifetime of the session and is how mailboxes
//! and gift attribution refer to players across games.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Slot/team address of a player in the session
///
/// Slot numbers are unique within a team; the same slot number on another
/// team is a different player.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("{slot}@{team}")]
pub struct PlayerRef {
    /// Slot number within the team
    pub slot: i32,
    /// Team number
    pub team: i32,
}

impl PlayerRef {
    /// Create a player reference from a slot and team
    pub fn new(slot: i32, team: i32) -> Self {
        Self { slot, team }
    }
}
