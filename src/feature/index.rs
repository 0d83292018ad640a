//! Signature index over a set of features.

use crate::feature::Feature;
use std::collections::BTreeMap;

/// Stable handle to a feature: its position in the owning [`FeatureSet`].
///
/// [`FeatureSet`]: crate::feature::FeatureSet
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(usize);

impl FeatureId {
    /// Returns the position of the feature in its set.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered multimap from signature to the features indexed under it.
///
/// Features sharing a signature are kept in insertion order, which is the
/// order the scanner tries them in.
#[derive(Clone, Debug, Default)]
pub struct FeatureIndex {
    entries: BTreeMap<u32, Vec<FeatureId>>,
    len: usize,
}

impl FeatureIndex {
    /// Indexes every feature under its bottom-left signature.
    pub fn build(features: &[Feature]) -> Self {
        let mut entries: BTreeMap<u32, Vec<FeatureId>> = BTreeMap::new();
        for (idx, feature) in features.iter().enumerate() {
            entries
                .entry(feature.signature())
                .or_default()
                .push(FeatureId(idx));
        }
        Self {
            entries,
            len: features.len(),
        }
    }

    /// Returns the features keyed exactly at `signature`.
    pub fn lookup(&self, signature: u32) -> &[FeatureId] {
        self.entries.get(&signature).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of indexed features.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no feature is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of distinct signatures.
    pub fn num_signatures(&self) -> usize {
        self.entries.len()
    }
}
