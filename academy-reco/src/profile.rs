//! Interaction-derived profile vectors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::content::ContentPoint;
use crate::index::{VectorIndex, retrieve_or_empty};
use crate::space::VectorSpace;

/// One mean embedding per vector space. Built per request, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileVector {
    means: BTreeMap<VectorSpace, Vec<f32>>,
}

impl ProfileVector {
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn get(&self, space: VectorSpace) -> Option<&[f32]> {
        self.means.get(&space).map(Vec::as_slice)
    }

    /// Spaces and their means, in fan-out order.
    pub fn iter(&self) -> impl Iterator<Item = (VectorSpace, &[f32])> {
        self.means.iter().map(|(space, mean)| (*space, mean.as_slice()))
    }
}

/// Average the per-space embeddings of `points`.
///
/// Only spaces listed in `spaces` contribute; other vector names are ignored.
/// Within a space, vectors whose length differs from the first one seen are
/// skipped.
pub fn mean_profile(points: &[ContentPoint], spaces: &[VectorSpace]) -> ProfileVector {
    let mut sums: BTreeMap<VectorSpace, (Vec<f64>, usize)> = BTreeMap::new();

    for point in points {
        for (name, vector) in &point.vectors {
            let Some(space) = VectorSpace::parse(name).filter(|space| spaces.contains(space)) else {
                continue;
            };
            if vector.is_empty() {
                continue;
            }
            let (sum, count) = sums.entry(space).or_insert_with(|| (vec![0.0; vector.len()], 0));
            if sum.len() != vector.len() {
                warn!(
                    point_id = %point.id,
                    space = %space,
                    expected = sum.len(),
                    actual = vector.len(),
                    "skipping vector with mismatched dimensions"
                );
                continue;
            }
            for (acc, value) in sum.iter_mut().zip(vector) {
                *acc += f64::from(*value);
            }
            *count += 1;
        }
    }

    let means = sums
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(space, (sum, count))| {
            let mean = sum.into_iter().map(|acc| (acc / count as f64) as f32).collect();
            (space, mean)
        })
        .collect();
    ProfileVector { means }
}

/// Turns a user's interaction history into a [`ProfileVector`].
#[derive(Clone)]
pub struct ProfileAggregator {
    index: Arc<dyn VectorIndex>,
    spaces: Vec<VectorSpace>,
}

impl ProfileAggregator {
    pub fn new(index: Arc<dyn VectorIndex>, spaces: Vec<VectorSpace>) -> Self {
        Self { index, spaces }
    }

    /// Fetch the interacted points and average their embeddings per space.
    ///
    /// Returns an empty profile if `point_ids` is empty, retrieval fails, or
    /// none of the points carry a recognised space.
    pub async fn build(&self, point_ids: &BTreeSet<String>) -> ProfileVector {
        if point_ids.is_empty() {
            return ProfileVector::default();
        }
        let ids: Vec<String> = point_ids.iter().cloned().collect();
        let points = retrieve_or_empty(self.index.as_ref(), &ids).await;
        let profile = mean_profile(&points, &self.spaces);
        for (space, _) in profile.iter() {
            info!(space = %space, "generated profile vector");
        }
        profile
    }
}
