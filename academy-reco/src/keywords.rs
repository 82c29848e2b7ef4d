//! Keyword recommendations anchored on ephemeral index points.
//!
//! Each keyword is embedded, written to the index as a temporary point, and
//! used as the anchor of a similarity search. Every temporary point inserted
//! during a call is owned by an [`EphemeralPoints`] guard which deletes them
//! when the call finishes, fails, times out, or is dropped mid-flight.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RecommenderConfig;
use crate::content::{ContentPayload, ContentPoint, SearchHit};
use crate::encoder::Encoder;
use crate::fusion::{Candidate, CandidateSet, PreferenceBooster, fuse};
use crate::index::{VectorIndex, search_or_empty};
use crate::space::VectorSpace;

/// Temporary query points inserted during one request.
///
/// Call [`release`](EphemeralPoints::release) to delete them. If the guard is
/// dropped without being released (the request future was cancelled), the
/// deletes are spawned onto the current tokio runtime instead.
pub struct EphemeralPoints {
    index: Arc<dyn VectorIndex>,
    ids: Vec<String>,
    exclude: HashSet<String>,
}

impl EphemeralPoints {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index, ids: Vec::new(), exclude: HashSet::new() }
    }

    /// Insert a point and take ownership of its id.
    ///
    /// The id is tracked before the write is awaited and stays tracked if it
    /// fails, so a write applied but never acknowledged is still released.
    pub async fn insert(&mut self, point: ContentPoint) -> crate::Result<()> {
        let id = point.id.clone();
        self.exclude.insert(id.clone());
        self.ids.push(id.clone());
        self.index.insert(point, true).await?;
        debug!(point_id = %id, "inserted ephemeral point");
        Ok(())
    }

    /// Ids of every point inserted (or attempted) so far in this request.
    pub fn exclude_set(&self) -> &HashSet<String> {
        &self.exclude
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Delete every tracked point. Failures are logged, never returned.
    pub async fn release(mut self) {
        let ids = std::mem::take(&mut self.ids);
        delete_all(self.index.as_ref(), ids).await;
    }
}

impl Drop for EphemeralPoints {
    fn drop(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let ids = std::mem::take(&mut self.ids);
        let index = Arc::clone(&self.index);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(count = ids.len(), "request dropped before cleanup, deleting ephemeral points in background");
                handle.spawn(async move { delete_all(index.as_ref(), ids).await });
            }
            Err(_) => {
                error!(count = ids.len(), ?ids, "no runtime to delete ephemeral points, they are orphaned");
            }
        }
    }
}

async fn delete_all(index: &dyn VectorIndex, ids: Vec<String>) {
    for id in ids {
        match index.delete(&id).await {
            Ok(()) => debug!(point_id = %id, "cleaned up ephemeral point"),
            Err(e) => warn!(point_id = %id, error = %e, "failed to clean up ephemeral point"),
        }
    }
}

/// Turns ad hoc keywords into ranked recommendations.
pub struct KeywordWorkflow {
    index: Arc<dyn VectorIndex>,
    encoder: Arc<dyn Encoder>,
    spaces: Vec<VectorSpace>,
}

impl KeywordWorkflow {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        encoder: Arc<dyn Encoder>,
        config: &RecommenderConfig,
    ) -> Self {
        Self { index, encoder, spaces: config.keyword_spaces.clone() }
    }

    /// Run the keyword loop, recording inserted points in `points`.
    ///
    /// Returns each keyword's top candidates in keyword order. The caller
    /// owns `points` and is responsible for releasing it.
    pub async fn collect(
        &self,
        keywords: &[String],
        per_keyword_limit: usize,
        points: &mut EphemeralPoints,
    ) -> Vec<Candidate> {
        let mut collected = Vec::new();
        for keyword in keywords {
            info!(keyword = %keyword, "searching for content similar to keyword");
            collected.extend(self.for_keyword(keyword, per_keyword_limit, points).await);
        }
        collected
    }

    async fn for_keyword(
        &self,
        keyword: &str,
        per_keyword_limit: usize,
        points: &mut EphemeralPoints,
    ) -> Vec<Candidate> {
        let vector = match self.encoder.encode_text(keyword).await {
            Ok(vector) if !vector.is_empty() => vector,
            Ok(_) => {
                warn!(keyword, encoder = self.encoder.name(), "empty encoding for keyword, skipping");
                return Vec::new();
            }
            Err(e) => {
                warn!(keyword, error = %e, "could not encode keyword, skipping");
                return Vec::new();
            }
        };

        let anchor = ContentPoint::new(Uuid::new_v4().to_string(), ContentPayload::temporary_keyword(keyword))
            .with_vector(VectorSpace::Text, vector);
        if let Err(e) = points.insert(anchor.clone()).await {
            error!(keyword, point_id = %anchor.id, error = %e, "failed to insert temporary point, skipping");
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = Vec::new();
        for &space in &self.spaces {
            let Some(vector) = anchor.vector(space) else {
                debug!(keyword, space = %space, "anchor has no vector in space, skipping search");
                continue;
            };
            hits.extend(
                search_or_empty(self.index.as_ref(), space, vector, per_keyword_limit, points.exclude_set())
                    .await,
            );
        }

        let mut ranked = fuse(hits, &PreferenceBooster::none()).into_ranked(per_keyword_limit);
        for candidate in &mut ranked {
            candidate.keyword = Some(keyword.to_string());
        }
        debug!(keyword, count = ranked.len(), "keyword candidates ranked");
        ranked
    }
}

/// Merge per-keyword candidates, one entry per document, best score first.
pub fn merge_keyword_candidates(candidates: Vec<Candidate>, final_limit: usize) -> Vec<Candidate> {
    candidates.into_iter().collect::<CandidateSet>().into_ranked(final_limit)
}
