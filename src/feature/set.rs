//! Owning collection of features plus their index.

use crate::feature::{Feature, FeatureId, FeatureIndex};
use crate::trace::{trace_event, trace_span};
use crate::util::{PbmGrepError, PbmGrepResult};
use std::ops::Index;
use std::path::Path;

/// All features of a run, the signature index over them and the ring height
/// they require.
#[derive(Clone, Debug)]
pub struct FeatureSet {
    features: Vec<Feature>,
    index: FeatureIndex,
    cycle_rows: usize,
}

impl FeatureSet {
    /// Builds the index over `features`; at least one feature is required.
    pub fn new(features: Vec<Feature>) -> PbmGrepResult<Self> {
        if features.is_empty() {
            return Err(PbmGrepError::NoFeatures);
        }
        let _span = trace_span!("build_index", features = features.len()).entered();
        let index = FeatureIndex::build(&features);
        let cycle_rows = features.iter().map(Feature::rows).max().unwrap_or(0);
        trace_event!(
            "index_built",
            features = features.len(),
            signatures = index.num_signatures(),
            cycle_rows = cycle_rows
        );
        Ok(Self {
            features,
            index,
            cycle_rows,
        })
    }

    /// Loads every path as a feature, in order, and builds the set.
    ///
    /// The first load failure aborts.
    pub fn load<I, P>(paths: I) -> PbmGrepResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let features = paths
            .into_iter()
            .map(Feature::load)
            .collect::<PbmGrepResult<Vec<_>>>()?;
        Self::new(features)
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true when the set holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns the height of the tallest feature.
    pub fn cycle_rows(&self) -> usize {
        self.cycle_rows
    }

    /// Returns the signature index.
    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    /// Returns the feature behind `id`.
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.index())
    }

    /// Iterates features in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl Index<FeatureId> for FeatureSet {
    type Output = Feature;

    fn index(&self, id: FeatureId) -> &Feature {
        &self.features[id.index()]
    }
}
