//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use academy_reco::{
    ContentPayload, ContentPoint, ContentType, Encoder, FieldCondition, InMemoryUserStore,
    InMemoryVectorIndex, PointFilter, RecoError, Recommender, RecommenderConfig, SearchHit,
    VectorIndex, VectorSpace,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Encoder with a fixed keyword → embedding table. Unknown keywords encode to
/// an empty vector; keywords in `failing` return an error.
#[derive(Default)]
pub struct TableEncoder {
    pub table: HashMap<String, Vec<f32>>,
    pub failing: HashSet<String>,
}

impl TableEncoder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            table: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }
}

#[async_trait]
impl Encoder for TableEncoder {
    async fn encode_text(&self, text: &str) -> academy_reco::Result<Vec<f32>> {
        if self.failing.contains(text) {
            return Err(RecoError::encoder("table", format!("model unavailable for '{text}'")));
        }
        Ok(self.table.get(text).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// What a [`FaultyIndex`] does when a search's query vector matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    Error,
    Hang,
}

/// Wraps an [`InMemoryVectorIndex`] and injects failures.
pub struct FaultyIndex {
    pub inner: Arc<InMemoryVectorIndex>,
    search_faults: Mutex<Vec<(Vec<f32>, Fault)>>,
    fail_deletes: bool,
    fail_inserts: bool,
    insert_ack_delay: Option<Duration>,
    pub deletes: AtomicUsize,
}

impl FaultyIndex {
    pub fn new(inner: Arc<InMemoryVectorIndex>) -> Self {
        Self {
            inner,
            search_faults: Mutex::new(Vec::new()),
            fail_deletes: false,
            fail_inserts: false,
            insert_ack_delay: None,
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn fault_on_query(mut self, vector: Vec<f32>, fault: Fault) -> Self {
        self.search_faults.get_mut().push((vector, fault));
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Apply inserts immediately but only acknowledge them after `delay`.
    pub fn slow_insert_ack(mut self, delay: Duration) -> Self {
        self.insert_ack_delay = Some(delay);
        self
    }
}

#[async_trait]
impl VectorIndex for FaultyIndex {
    async fn retrieve(&self, ids: &[String]) -> academy_reco::Result<Vec<ContentPoint>> {
        self.inner.retrieve(ids).await
    }

    async fn search(
        &self,
        space: VectorSpace,
        vector: &[f32],
        limit: usize,
        exclude: &HashSet<String>,
    ) -> academy_reco::Result<Vec<SearchHit>> {
        let fault = self
            .search_faults
            .lock()
            .await
            .iter()
            .find(|(query, _)| query.as_slice() == vector)
            .map(|(_, fault)| *fault);
        match fault {
            Some(Fault::Error) => Err(RecoError::index("faulty", "injected search fault")),
            Some(Fault::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(RecoError::index("faulty", "hung search woke up"))
            }
            None => self.inner.search(space, vector, limit, exclude).await,
        }
    }

    async fn scan(&self, filter: &PointFilter, limit: usize) -> academy_reco::Result<Vec<ContentPoint>> {
        self.inner.scan(filter, limit).await
    }

    async fn insert(&self, point: ContentPoint, wait: bool) -> academy_reco::Result<()> {
        if self.fail_inserts {
            return Err(RecoError::index("faulty", "injected insert fault"));
        }
        self.inner.insert(point, wait).await?;
        if let Some(delay) = self.insert_ack_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> academy_reco::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(RecoError::index("faulty", "injected delete fault"));
        }
        self.inner.delete(id).await
    }

    async fn health(&self) -> academy_reco::Result<()> {
        Err(RecoError::index("faulty", "connection refused"))
    }
}

/// An index whose searches return canned hits per space. Spaces without a
/// script fail like an unsupported vector name would.
pub struct ScriptedIndex {
    pub points: InMemoryVectorIndex,
    pub hits: HashMap<VectorSpace, Vec<SearchHit>>,
    pub searched: Mutex<Vec<(VectorSpace, usize, HashSet<String>)>>,
}

impl ScriptedIndex {
    pub fn new(points: Vec<ContentPoint>, hits: HashMap<VectorSpace, Vec<SearchHit>>) -> Self {
        Self { points: InMemoryVectorIndex::with_points(points), hits, searched: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn retrieve(&self, ids: &[String]) -> academy_reco::Result<Vec<ContentPoint>> {
        self.points.retrieve(ids).await
    }

    async fn search(
        &self,
        space: VectorSpace,
        _vector: &[f32],
        limit: usize,
        exclude: &HashSet<String>,
    ) -> academy_reco::Result<Vec<SearchHit>> {
        self.searched.lock().await.push((space, limit, exclude.clone()));
        let hits = self
            .hits
            .get(&space)
            .ok_or_else(|| RecoError::index("scripted", format!("vector '{space}' not configured")))?;
        Ok(hits.iter().take(limit).cloned().collect())
    }

    async fn scan(&self, filter: &PointFilter, limit: usize) -> academy_reco::Result<Vec<ContentPoint>> {
        self.points.scan(filter, limit).await
    }

    async fn insert(&self, point: ContentPoint, wait: bool) -> academy_reco::Result<()> {
        self.points.insert(point, wait).await
    }

    async fn delete(&self, id: &str) -> academy_reco::Result<()> {
        self.points.delete(id).await
    }
}

pub fn payload(doc_id: &str, content_type: ContentType, category: &str) -> ContentPayload {
    ContentPayload {
        doc_id: Some(doc_id.to_string()),
        content_type: Some(content_type),
        category: Some(category.to_string()),
        original_filename: Some(format!("{doc_id}.bin")),
        ..ContentPayload::default()
    }
}

pub fn hit(id: &str, score: f32, payload: ContentPayload) -> SearchHit {
    SearchHit { id: id.to_string(), score, payload }
}

/// Ids of ephemeral keyword points still present in `index`.
pub async fn remaining_ephemeral_points(index: &InMemoryVectorIndex) -> Vec<String> {
    let filter = PointFilter::should(vec![FieldCondition::ContentType(vec![ContentType::TemporaryKeyword])]);
    index.scan(&filter, usize::MAX).await.unwrap().into_iter().map(|point| point.id).collect()
}

pub fn recommender(
    index: Arc<dyn VectorIndex>,
    encoder: Arc<dyn Encoder>,
    config: RecommenderConfig,
) -> (Recommender, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::new());
    let recommender = Recommender::builder()
        .config(config)
        .index(index)
        .encoder(encoder)
        .user_store(users.clone())
        .build()
        .unwrap();
    (recommender, users)
}
