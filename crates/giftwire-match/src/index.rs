//! Metric index over registered trait sets
//!
//! A BK-tree keyed by the finite trait cost. Every entry in the subtree
//! under a child edge `e` lies at exactly cost `e` from that node's
//! profile, so a lookup can skip a whole subtree once the triangle bound
//! `|cost(query, pivot) - e|` exceeds the best distance found so far.

use std::collections::HashMap;
use std::hash::Hash;

use giftwire_core::GiftTrait;
use tracing::debug;

use crate::distance::TraitProfile;

/// Metric index from registered keys to their trait profiles
///
/// Registration is idempotent per key: re-registering a key replaces its
/// traits. Lookups return every key tied for the minimum distance, with
/// ties compared by exact `f32` equality.
#[derive(Debug)]
pub struct TraitIndex<K> {
    /// Authoritative key -> profile map
    entries: HashMap<K, TraitProfile>,
    /// Search tree over the entries
    root: Option<BkNode<K>>,
    /// Set when a replaced registration leaves the tree out of date
    stale: bool,
}

impl<K> Default for TraitIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TraitIndex<K> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            root: None,
            stale: false,
        }
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone> TraitIndex<K> {
    /// Register a key's traits, replacing any previous registration
    pub fn register(&mut self, key: K, traits: &[GiftTrait]) {
        let profile = TraitProfile::from_traits(traits);
        match self.entries.insert(key.clone(), profile.clone()) {
            Some(previous) => {
                // The tree still holds the key under its previous profile
                if previous != profile {
                    self.stale = true;
                }
            }
            None if !self.stale => match &mut self.root {
                Some(root) => root.insert(profile, key),
                None => self.root = Some(BkNode::new(profile, key)),
            },
            None => {}
        }
    }

    /// Every key tied for the minimum distance to `query`
    ///
    /// Keys whose profile shares no trait name with the query are never
    /// returned; when nothing qualifies the result is empty. Result order
    /// is unspecified. Takes `&mut self` because the first lookup after a
    /// replaced registration rebuilds the search tree.
    pub fn find_closest(&mut self, query: &[GiftTrait]) -> Vec<K> {
        if self.stale {
            self.rebuild();
        }
        let query = TraitProfile::from_traits(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut best = None;
        let mut hits = Vec::new();
        if let Some(root) = &self.root {
            root.search(&query, &mut best, &mut hits);
        }
        hits
    }

    /// Reference lookup scanning every entry
    ///
    /// Produces the same key set as [`find_closest`]; kept as the fallback
    /// for small registries and as the oracle the tree is tested against.
    ///
    /// [`find_closest`]: TraitIndex::find_closest
    pub fn find_closest_linear(&self, query: &[GiftTrait]) -> Vec<K> {
        let query = TraitProfile::from_traits(query);
        let mut best: Option<f32> = None;
        let mut hits = Vec::new();
        for (key, profile) in &self.entries {
            let Some(distance) = profile.distance_to(&query) else {
                continue;
            };
            match best {
                Some(b) if distance > b => {}
                Some(b) if distance == b => hits.push(key.clone()),
                _ => {
                    best = Some(distance);
                    hits.clear();
                    hits.push(key.clone());
                }
            }
        }
        hits
    }

    fn rebuild(&mut self) {
        debug!(entries = self.entries.len(), "Rebuilding trait index");
        self.root = None;
        for (key, profile) in &self.entries {
            match &mut self.root {
                Some(root) => root.insert(profile.clone(), key.clone()),
                None => self.root = Some(BkNode::new(profile.clone(), key.clone())),
            }
        }
        self.stale = false;
    }
}

/// One tree node: a pivot profile, the keys registered at exactly that
/// profile, and children bucketed by exact cost from the pivot
#[derive(Debug)]
struct BkNode<K> {
    profile: TraitProfile,
    keys: Vec<K>,
    children: Vec<(f32, BkNode<K>)>,
}

impl<K: Clone> BkNode<K> {
    fn new(profile: TraitProfile, key: K) -> Self {
        Self {
            profile,
            keys: vec![key],
            children: Vec::new(),
        }
    }

    fn insert(&mut self, profile: TraitProfile, key: K) {
        let edge = self.profile.cost_to(&profile);
        if edge == 0.0 {
            self.keys.push(key);
            return;
        }
        if let Some(i) = self.children.iter().position(|(e, _)| *e == edge) {
            self.children[i].1.insert(profile, key);
        } else {
            self.children.push((edge, BkNode::new(profile, key)));
        }
    }

    /// Collect every key tied for the minimum distance to `query`
    ///
    /// Nodes whose profile shares no name with the query still route the
    /// search through their children but are never collected themselves.
    fn search(&self, query: &TraitProfile, best: &mut Option<f32>, hits: &mut Vec<K>) {
        let cost = query.cost_to(&self.profile);
        if self.profile.shares_name_with(query) {
            match *best {
                Some(b) if cost > b => {}
                Some(b) if cost == b => hits.extend(self.keys.iter().cloned()),
                _ => {
                    *best = Some(cost);
                    hits.clear();
                    hits.extend(self.keys.iter().cloned());
                }
            }
        }

        for (edge, child) in &self.children {
            let reachable = match *best {
                Some(b) => (cost - edge).abs() <= b,
                None => true,
            };
            if reachable {
                child.search(query, best, hits);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn heal(quality: f32) -> GiftTrait {
        GiftTrait::new("Heal", quality, 1.0)
    }

    fn speed(quality: f32) -> GiftTrait {
        GiftTrait::new("Speed", quality, 1.0)
    }

    fn sorted(mut keys: Vec<u32>) -> Vec<u32> {
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_exact_match_wins() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);
        index.register(2, &[speed(1.0)]);
        index.register(3, &[heal(1.0), speed(1.0)]);

        assert_eq!(index.find_closest(&[heal(1.0)]), vec![1]);
    }

    #[test]
    fn test_attribute_delta_beats_extra_trait_penalty() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);
        index.register(2, &[speed(1.0)]);
        index.register(3, &[heal(1.0), speed(1.0)]);

        // Entry 1 pays the quality delta of 1.0; entry 3 would pay the
        // missing-trait cost for its extra Speed
        assert_eq!(index.find_closest(&[heal(2.0)]), vec![1]);
    }

    #[test]
    fn test_all_tied_keys_returned() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0), speed(2.0)]);
        index.register(2, &[heal(1.0), speed(2.0)]);
        index.register(3, &[speed(9.0)]);

        let hits = sorted(index.find_closest(&[heal(1.0), speed(2.0)]));
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn test_disjoint_query_finds_nothing() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);

        assert!(index.find_closest(&[speed(1.0)]).is_empty());
    }

    #[test]
    fn test_empty_query_finds_nothing() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);

        assert!(index.find_closest(&[]).is_empty());
    }

    #[test]
    fn test_large_attribute_gap_still_beats_missing_trait() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);
        index.register(2, &[heal(1.0), speed(20.0)]);

        // Entry 2 pays |20 - 1| = 19 on Speed; entry 1 pays the full
        // missing-trait cost of 25 for lacking Speed entirely
        assert_eq!(index.find_closest(&[heal(1.0), speed(1.0)]), vec![2]);
    }

    #[test]
    fn test_reregistration_replaces_traits() {
        let mut index = TraitIndex::new();
        index.register(7, &[heal(1.0)]);
        index.register(7, &[speed(3.0)]);

        assert!(index.find_closest(&[heal(1.0)]).is_empty());
        assert_eq!(index.find_closest(&[speed(1.0)]), vec![7]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_registration_after_replacement_is_searchable() {
        let mut index = TraitIndex::new();
        index.register(1, &[heal(1.0)]);
        index.register(1, &[speed(1.0)]);
        index.register(2, &[heal(1.0)]);

        assert_eq!(index.find_closest(&[heal(1.0)]), vec![2]);
        assert_eq!(index.find_closest(&[speed(1.0)]), vec![1]);
    }

    #[test]
    fn test_matches_linear_scan_on_random_registries() {
        let names = ["Heal", "Speed", "Armor", "Food", "Fire", "Luck"];
        let mut rng = rand::rng();

        for _ in 0..20 {
            let mut index = TraitIndex::new();
            for key in 0u32..150 {
                index.register(key, &random_traits(&mut rng, &names));
            }
            for _ in 0..25 {
                let query = random_traits(&mut rng, &names);
                let tree = sorted(index.find_closest(&query));
                let linear = sorted(index.find_closest_linear(&query));
                assert_eq!(tree, linear, "tree and linear scan disagree on {query:?}");
            }
        }
    }

    /// Up to three traits drawn from a small name pool, with attributes in
    /// 0.5 steps so that distances are exact in f32
    fn random_traits(rng: &mut impl Rng, names: &[&str]) -> Vec<GiftTrait> {
        let count = rng.random_range(0..4);
        (0..count)
            .map(|_| {
                GiftTrait::new(
                    names[rng.random_range(0..names.len())],
                    rng.random_range(0..40) as f32 * 0.5,
                    rng.random_range(0..40) as f32 * 0.5,
                )
            })
            .collect()
    }
}
