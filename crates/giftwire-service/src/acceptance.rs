//! Send-time acceptance rules
//!
//! Before a gift goes out, the recipient's box state decides whether it may.
//! The box must be open, it must be able to read the data version we write,
//! and unless it takes everything the gift must share at least one trait
//! name with the filter.

use giftwire_mailbox::{GiftBoxState, PROTOCOL_VERSION};
use thiserror::Error;

/// Why a recipient's box accepts a gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiftAcceptance {
    /// The box takes any gift, either via its flag or an empty filter.
    AcceptsAny,
    /// The offered traits intersect the filter; carries the matching names.
    MatchingTraits(Vec<String>),
}

/// Why a recipient's box refuses a gift.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GiftRefusal {
    /// The recipient has never set up a gift box.
    #[error("recipient has no gift box")]
    NoGiftBox,

    /// The box exists but is currently closed.
    #[error("recipient's gift box is closed")]
    BoxClosed,

    /// The box demands a newer data version than this library writes.
    #[error("recipient requires data version {minimum} or newer")]
    VersionTooLow { minimum: u32 },

    /// No offered trait name is in the filter; carries the accepted names.
    #[error("recipient accepts none of the offered traits")]
    TraitsNotAccepted { accepted: Vec<String> },
}

/// Decide whether a box accepts a gift carrying traits with these names.
///
/// The checks run in a fixed order so the caller always learns the most
/// fundamental obstacle first: closed box, then version, then the filter.
pub fn evaluate(
    state: &GiftBoxState,
    trait_names: &[String],
) -> Result<GiftAcceptance, GiftRefusal> {
    if !state.is_open {
        return Err(GiftRefusal::BoxClosed);
    }
    if state.min_protocol_version > PROTOCOL_VERSION {
        return Err(GiftRefusal::VersionTooLow {
            minimum: state.min_protocol_version,
        });
    }
    if state.accepts_any_gift || state.accepted_traits.is_empty() {
        return Ok(GiftAcceptance::AcceptsAny);
    }

    let accepted = state.accepted_trait_names();
    let mut matching = Vec::new();
    for name in trait_names {
        if accepted.contains(name) && !matching.contains(name) {
            matching.push(name.clone());
        }
    }

    if matching.is_empty() {
        Err(GiftRefusal::TraitsNotAccepted { accepted })
    } else {
        Ok(GiftAcceptance::MatchingTraits(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwire_core::GiftTrait;

    fn open_box(accepts_any: bool, names: &[&str]) -> GiftBoxState {
        GiftBoxState {
            is_open: true,
            accepts_any_gift: accepts_any,
            accepted_traits: names.iter().map(|n| GiftTrait::named(*n)).collect(),
            ..GiftBoxState::default()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_closed_box_refuses_everything() {
        let state = GiftBoxState::default();

        let verdict = evaluate(&state, &names(&["Heal"]));

        assert_eq!(verdict, Err(GiftRefusal::BoxClosed));
    }

    #[test]
    fn test_closed_check_precedes_version_check() {
        let mut state = GiftBoxState::default();
        state.min_protocol_version = PROTOCOL_VERSION + 5;

        let verdict = evaluate(&state, &names(&["Heal"]));

        assert_eq!(verdict, Err(GiftRefusal::BoxClosed));
    }

    #[test]
    fn test_newer_minimum_version_refuses() {
        let mut state = open_box(true, &[]);
        state.min_protocol_version = PROTOCOL_VERSION + 1;

        let verdict = evaluate(&state, &names(&["Heal"]));

        assert_eq!(
            verdict,
            Err(GiftRefusal::VersionTooLow {
                minimum: PROTOCOL_VERSION + 1
            })
        );
    }

    #[test]
    fn test_accepts_any_flag_short_circuits_filter() {
        let state = open_box(true, &["Speed"]);

        let verdict = evaluate(&state, &names(&["Heal"]));

        assert_eq!(verdict, Ok(GiftAcceptance::AcceptsAny));
    }

    #[test]
    fn test_empty_filter_accepts_all() {
        let state = open_box(false, &[]);

        let verdict = evaluate(&state, &names(&["Heal"]));

        assert_eq!(verdict, Ok(GiftAcceptance::AcceptsAny));
    }

    #[test]
    fn test_matching_traits_reported() {
        let state = open_box(false, &["Heal", "Speed"]);

        let verdict = evaluate(&state, &names(&["Speed", "Armor"]));

        assert_eq!(
            verdict,
            Ok(GiftAcceptance::MatchingTraits(names(&["Speed"])))
        );
    }

    #[test]
    fn test_duplicate_offered_names_reported_once() {
        let state = open_box(false, &["Heal"]);

        let verdict = evaluate(&state, &names(&["Heal", "Heal"]));

        assert_eq!(verdict, Ok(GiftAcceptance::MatchingTraits(names(&["Heal"]))));
    }

    #[test]
    fn test_disjoint_traits_refused_with_accepted_names() {
        let state = open_box(false, &["Heal", "Speed"]);

        let verdict = evaluate(&state, &names(&["Armor"]));

        assert_eq!(
            verdict,
            Err(GiftRefusal::TraitsNotAccepted {
                accepted: names(&["Heal", "Speed"])
            })
        );
    }

    #[test]
    fn test_traitless_gift_refused_by_filtering_box() {
        let state = open_box(false, &["Heal"]);

        let verdict = evaluate(&state, &[]);

        assert_eq!(
            verdict,
            Err(GiftRefusal::TraitsNotAccepted {
                accepted: names(&["Heal"])
            })
        );
    }
}
