//! Trait distance
//!
//! Two trait sets are compared by aggregating each into a profile (summing
//! the attributes of duplicate names) and then scoring name presence and
//! attribute deltas. Pairs sharing no name are unmatched rather than merely
//! far apart; they are never eligible as matches for each other.

use std::collections::BTreeMap;

use giftwire_core::GiftTrait;

/// Cost of a trait name present on only one side of a comparison
///
/// Attribute deltas on shared names are clamped to this value, so a shared
/// name never contributes more than `2 * MISSING_TRAIT_COST` and realistic
/// attribute deltas (single digits to low tens) stay below the cost of a
/// single missing name.
pub const MISSING_TRAIT_COST: f32 = 25.0;

/// Aggregated view of a trait set: per name, the summed attributes
///
/// Duplicate names collapse by summing quality and duration, so an item
/// carrying "Heal" twice at quality 1.0 compares equal to one carrying a
/// single "Heal" at quality 2.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitProfile {
    attributes: BTreeMap<String, (f32, f32)>,
}

impl TraitProfile {
    /// Aggregate a trait list into a profile
    pub fn from_traits(traits: &[GiftTrait]) -> Self {
        let mut attributes: BTreeMap<String, (f32, f32)> = BTreeMap::new();
        for t in traits {
            let slot = attributes.entry(t.name.clone()).or_insert((0.0, 0.0));
            slot.0 += t.quality;
            slot.1 += t.duration;
        }
        Self { attributes }
    }

    /// Whether the profile has no traits at all
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether any trait name appears in both profiles
    pub fn shares_name_with(&self, other: &Self) -> bool {
        self.attributes
            .keys()
            .any(|name| other.attributes.contains_key(name))
    }

    /// Distance to another profile, or `None` when the profiles share no
    /// trait name (unmatched)
    ///
    /// Ties between candidates are exact: callers compare returned values
    /// with `f32` equality and no tolerance.
    pub fn distance_to(&self, other: &Self) -> Option<f32> {
        if self.shares_name_with(other) {
            Some(self.cost_to(other))
        } else {
            None
        }
    }

    /// Finite cost to another profile, defined even for unmatched pairs
    ///
    /// The index uses this for tree edges: every pair needs a finite,
    /// symmetric cost satisfying the triangle inequality, including pairs
    /// that [`distance_to`] reports as unmatched.
    ///
    /// [`distance_to`]: TraitProfile::distance_to
    pub(crate) fn cost_to(&self, other: &Self) -> f32 {
        let mut total = 0.0;
        for (name, (quality, duration)) in &self.attributes {
            match other.attributes.get(name) {
                Some((other_quality, other_duration)) => {
                    total += (quality - other_quality).abs().min(MISSING_TRAIT_COST);
                    total += (duration - other_duration).abs().min(MISSING_TRAIT_COST);
                }
                None => total += MISSING_TRAIT_COST,
            }
        }
        for name in other.attributes.keys() {
            if !self.attributes.contains_key(name) {
                total += MISSING_TRAIT_COST;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(traits: &[(&str, f32, f32)]) -> TraitProfile {
        let traits: Vec<GiftTrait> = traits
            .iter()
            .map(|(name, quality, duration)| GiftTrait::new(*name, *quality, *duration))
            .collect();
        TraitProfile::from_traits(&traits)
    }

    #[test]
    fn test_disjoint_names_are_unmatched() {
        let a = profile(&[("Heal", 1.0, 1.0)]);
        let b = profile(&[("Speed", 1.0, 1.0)]);
        assert_eq!(a.distance_to(&b), None);
        assert_eq!(b.distance_to(&a), None);
    }

    #[test]
    fn test_identical_profiles_are_at_zero() {
        let a = profile(&[("Heal", 2.0, 3.0), ("Speed", 1.0, 1.0)]);
        assert_eq!(a.distance_to(&a.clone()), Some(0.0));
    }

    #[test]
    fn test_attribute_deltas_add_up() {
        let a = profile(&[("Heal", 3.0, 1.0)]);
        let b = profile(&[("Heal", 1.0, 2.0)]);
        assert_eq!(a.distance_to(&b), Some(3.0));
    }

    #[test]
    fn test_one_sided_name_costs_presence_penalty() {
        let a = profile(&[("Heal", 1.0, 1.0), ("Speed", 1.0, 1.0)]);
        let b = profile(&[("Heal", 1.0, 1.0)]);
        assert_eq!(a.distance_to(&b), Some(MISSING_TRAIT_COST));
        assert_eq!(b.distance_to(&a), Some(MISSING_TRAIT_COST));
    }

    #[test]
    fn test_duplicate_names_aggregate_by_summing() {
        let twice = profile(&[("Heal", 1.0, 1.0), ("Heal", 1.0, 1.0)]);
        let once = profile(&[("Heal", 2.0, 2.0)]);
        assert_eq!(twice.distance_to(&once), Some(0.0));
    }

    #[test]
    fn test_attribute_delta_clamped_at_presence_cost() {
        let a = profile(&[("Heal", 100.0, 1.0)]);
        let b = profile(&[("Heal", 1.0, 1.0)]);
        assert_eq!(a.distance_to(&b), Some(MISSING_TRAIT_COST));
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = profile(&[("Heal", 4.0, 2.0), ("Food", 1.0, 1.0)]);
        let b = profile(&[("Heal", 1.0, 1.0), ("Speed", 3.0, 1.0)]);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_cost_respects_triangle_inequality() {
        let profiles = [
            profile(&[("Heal", 1.0, 1.0)]),
            profile(&[("Heal", 30.0, 1.0)]),
            profile(&[("Speed", 1.0, 1.0)]),
            profile(&[("Heal", 1.0, 1.0), ("Speed", 5.0, 2.0)]),
            profile(&[]),
        ];

        for a in &profiles {
            for b in &profiles {
                for c in &profiles {
                    let direct = a.cost_to(c);
                    let via = a.cost_to(b) + b.cost_to(c);
                    assert!(
                        direct <= via + 1e-4,
                        "cost({a:?}, {c:?}) = {direct} exceeds detour {via}",
                    );
                }
            }
        }
    }
}
