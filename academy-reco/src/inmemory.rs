//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], a zero-dependency index
//! backed by a `BTreeMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small catalogues.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::content::{ContentPoint, SearchHit};
use crate::error::{RecoError, Result};
use crate::index::{PointFilter, VectorIndex};
use crate::space::VectorSpace;

const BACKEND: &str = "InMemory";

/// An in-memory vector index using cosine similarity for search.
///
/// Points are keyed by id in an ordered map, so scans and score ties come
/// back in id order.
///
/// # Example
///
/// ```rust,ignore
/// use academy_reco::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.insert(point, true).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    points: RwLock<BTreeMap<String, ContentPoint>>,
}

impl InMemoryVectorIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index pre-populated with `points`.
    pub fn with_points(points: impl IntoIterator<Item = ContentPoint>) -> Self {
        let points = points.into_iter().map(|point| (point.id.clone(), point)).collect();
        Self { points: RwLock::new(points) }
    }

    /// Whether a point with `id` is currently stored.
    pub async fn contains(&self, id: &str) -> bool {
        self.points.read().await.contains_key(id)
    }

    /// Number of stored points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn retrieve(&self, ids: &[String]) -> Result<Vec<ContentPoint>> {
        let points = self.points.read().await;
        Ok(ids.iter().filter_map(|id| points.get(id).cloned()).collect())
    }

    async fn search(
        &self,
        space: VectorSpace,
        vector: &[f32],
        limit: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<SearchHit>> {
        if vector.is_empty() {
            return Err(RecoError::index(BACKEND, format!("empty query vector for space '{space}'")));
        }
        let points = self.points.read().await;

        let mut scored: Vec<SearchHit> = points
            .values()
            .filter(|point| !exclude.contains(&point.id))
            .filter_map(|point| {
                let stored = point.vector(space)?;
                if stored.len() != vector.len() {
                    return None;
                }
                Some(SearchHit {
                    id: point.id.clone(),
                    score: cosine_similarity(stored, vector),
                    payload: point.payload.clone(),
                })
            })
            .collect();

        // Stable sort keeps id order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn scan(&self, filter: &PointFilter, limit: usize) -> Result<Vec<ContentPoint>> {
        let points = self.points.read().await;
        Ok(points.values().filter(|point| filter.matches(&point.payload)).take(limit).cloned().collect())
    }

    async fn insert(&self, point: ContentPoint, _wait: bool) -> Result<()> {
        if point.vectors.values().all(Vec::is_empty) {
            return Err(RecoError::index(
                BACKEND,
                format!("point '{}' has no populated vector space", point.id),
            ));
        }
        let mut points = self.points.write().await;
        points.insert(point.id.clone(), point);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut points = self.points.write().await;
        points.remove(id);
        Ok(())
    }
}
