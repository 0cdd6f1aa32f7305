//! # Giftwire Simulation
//!
//! Narrated gift exchange scenarios over a shared in-memory register.
//!
//! ## Overview
//!
//! This library drives the Giftwire stack end to end the way a game session
//! would: several players share one register store, open gift boxes, send
//! and refund gifts, and match items against registered trait wishes.
//!
//! - **Exchange** (`scenarios::run_exchange_scenario`): A two-player story
//!   covering the acceptance check, delivery, and a refund
//! - **Concurrent** (`scenarios::run_concurrent_scenario`): Many senders
//!   hammering one box so conditional-write retries actually fire
//! - **Matching** (`scenarios::run_matching_scenario`): Sample gifts looked
//!   up against a registry of trait wishes
//!
//! Each scenario returns a summary struct so it doubles as a coarse
//! integration check.
//!
//! ## Example
//!
//! ```rust,ignore
//! use giftwire_simulation::scenarios;
//!
//! let summary = scenarios::run_exchange_scenario().await?;
//! assert_eq!(summary.delivered, 1);
//! ```

pub mod scenarios;

// Re-export scenario summaries
pub use scenarios::{ConcurrentSummary, ExchangeSummary, MatchingSummary};
