//! Vector index trait consumed by the engine.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::content::{ContentPayload, ContentPoint, ContentType, SearchHit};
use crate::error::Result;
use crate::space::VectorSpace;

/// A payload condition used by filtered scans.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    /// `category` equals any of the given values.
    Category(Vec<String>),
    /// `content_type` equals any of the given tags.
    ContentType(Vec<ContentType>),
}

impl FieldCondition {
    /// The payload key this condition inspects.
    pub fn key(&self) -> &'static str {
        match self {
            FieldCondition::Category(_) => "category",
            FieldCondition::ContentType(_) => "content_type",
        }
    }

    pub fn matches(&self, payload: &ContentPayload) -> bool {
        match self {
            FieldCondition::Category(any) => {
                payload.category.as_ref().is_some_and(|category| any.contains(category))
            }
            FieldCondition::ContentType(any) => {
                payload.kind().is_some_and(|kind| any.contains(&kind))
            }
        }
    }
}

/// A disjunction of payload conditions. An empty filter matches every point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointFilter {
    pub should: Vec<FieldCondition>,
}

impl PointFilter {
    pub fn should(conditions: Vec<FieldCondition>) -> Self {
        Self { should: conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.should.is_empty()
    }

    pub fn matches(&self, payload: &ContentPayload) -> bool {
        self.is_empty() || self.should.iter().any(|condition| condition.matches(payload))
    }
}

/// A multi-space nearest-neighbour store holding the content collection.
///
/// Each point has an id, one embedding per named [`VectorSpace`] it covers,
/// and a [`ContentPayload`]. Similarity is cosine-based: higher scores mean
/// closer matches.
///
/// # Example
///
/// ```rust,ignore
/// use academy_reco::{InMemoryVectorIndex, VectorIndex, VectorSpace};
///
/// let index = InMemoryVectorIndex::new();
/// index.insert(point, true).await?;
/// let hits = index.search(VectorSpace::Text, &query, 10, &HashSet::new()).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Fetch full records, vectors included, for the given ids.
    ///
    /// Ids that do not exist are silently absent from the result.
    async fn retrieve(&self, ids: &[String]) -> Result<Vec<ContentPoint>>;

    /// Return up to `limit` points nearest to `vector` in `space`, ordered by
    /// descending score, never returning any id in `exclude`.
    async fn search(
        &self,
        space: VectorSpace,
        vector: &[f32],
        limit: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<SearchHit>>;

    /// Return up to `limit` points matching `filter`, in no particular order.
    async fn scan(&self, filter: &PointFilter, limit: usize) -> Result<Vec<ContentPoint>>;

    /// Insert or replace a point. With `wait`, the point is searchable when
    /// this returns.
    async fn insert(&self, point: ContentPoint, wait: bool) -> Result<()>;

    /// Delete a point by id. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Check that the backend is reachable.
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// Search that degrades to an empty hit list on any failure.
///
/// Hits whose id is in `exclude` are dropped even if the backend returned them.
pub(crate) async fn search_or_empty(
    index: &dyn VectorIndex,
    space: VectorSpace,
    vector: &[f32],
    limit: usize,
    exclude: &HashSet<String>,
) -> Vec<SearchHit> {
    match index.search(space, vector, limit, exclude).await {
        Ok(mut hits) => {
            hits.retain(|hit| !exclude.contains(&hit.id));
            debug!(space = %space, limit, hit_count = hits.len(), "similarity search completed");
            hits
        }
        Err(e) => {
            error!(space = %space, error = %e, "similarity search failed, continuing without it");
            Vec::new()
        }
    }
}

/// Retrieval that degrades to an empty list on any failure.
pub(crate) async fn retrieve_or_empty(index: &dyn VectorIndex, ids: &[String]) -> Vec<ContentPoint> {
    if ids.is_empty() {
        return Vec::new();
    }
    match index.retrieve(ids).await {
        Ok(points) => points,
        Err(e) => {
            error!(count = ids.len(), error = %e, "failed to retrieve points by id");
            Vec::new()
        }
    }
}

/// Filtered scan that degrades to an empty list on any failure.
pub(crate) async fn scan_or_empty(
    index: &dyn VectorIndex,
    filter: &PointFilter,
    limit: usize,
) -> Vec<ContentPoint> {
    match index.scan(filter, limit).await {
        Ok(points) => points,
        Err(e) => {
            error!(conditions = filter.should.len(), error = %e, "filtered scan failed");
            Vec::new()
        }
    }
}
