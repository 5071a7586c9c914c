use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Interval index over one axis.
///
/// Merged regions are few and mostly short, so a `BTreeMap` keyed by the low
/// endpoint is enough: a stabbing query walks every node with `low <= q_high`
/// and keeps the ones whose `high` reaches `q_low`.
#[derive(Debug, Clone)]
struct IntervalNode<T: Clone + Eq + Hash> {
    high: u32,
    values: FxHashSet<T>,
}

#[derive(Debug, Clone)]
pub struct IntervalTree<T: Clone + Eq + Hash> {
    /// Low endpoint → intervals starting there.
    map: BTreeMap<u32, Vec<IntervalNode<T>>>,
    size: usize,
}

impl<T: Clone + Eq + Hash> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> IntervalTree<T> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            size: 0,
        }
    }

    /// Number of stored (interval, value) pairs.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }

    /// Insert `value` for the closed interval `[low, high]`.
    pub fn insert(&mut self, low: u32, high: u32, value: T) -> bool {
        debug_assert!(low <= high);
        let entries = self.map.entry(low).or_default();
        let inserted = match entries.iter_mut().find(|n| n.high == high) {
            Some(node) => node.values.insert(value),
            None => {
                let mut values = FxHashSet::default();
                values.insert(value);
                entries.push(IntervalNode { high, values });
                true
            }
        };
        if inserted {
            self.size += 1;
        }
        inserted
    }

    pub fn remove(&mut self, low: u32, high: u32, value: &T) -> bool {
        let Some(nodes) = self.map.get_mut(&low) else {
            return false;
        };
        let Some(node) = nodes.iter_mut().find(|n| n.high == high) else {
            return false;
        };
        let removed = node.values.remove(value);
        if node.values.is_empty() {
            nodes.retain(|n| n.high != high);
        }
        if nodes.is_empty() {
            self.map.remove(&low);
        }
        if removed {
            self.size -= 1;
        }
        removed
    }

    /// Values whose interval overlaps `[q_low, q_high]`.
    pub fn query(&self, q_low: u32, q_high: u32) -> impl Iterator<Item = &T> + '_ {
        self.map
            .range(..=q_high)
            .flat_map(|(_, nodes)| nodes.iter())
            .filter(move |node| node.high >= q_low)
            .flat_map(|node| node.values.iter())
    }

    /// Values whose interval contains `point`.
    pub fn stab(&self, point: u32) -> impl Iterator<Item = &T> + '_ {
        self.query(point, point)
    }

    /// Build from a batch of `(low, high, value)` triples, replacing the contents.
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (u32, u32, T)>,
    {
        self.clear();
        for (low, high, value) in items {
            self.insert(low, high, value);
        }
    }
}
