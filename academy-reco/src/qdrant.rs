//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorIndex`] which implements [`VectorIndex`] over a
//! single Qdrant collection with one named vector per [`VectorSpace`], using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use academy_reco::qdrant::QdrantVectorIndex;
//! use academy_reco::IndexSettings;
//!
//! let index = QdrantVectorIndex::connect(&IndexSettings::from_env())?;
//! index.ensure_collection().await?;
//! ```

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, GetPointsBuilder,
    PointId, PointStruct, PointsIdsList, RetrievedPoint, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder, VectorsConfigBuilder,
    VectorsOutput,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::config::IndexSettings;
use crate::content::{ContentPayload, ContentPoint, NamedVectors, SearchHit};
use crate::error::{RecoError, Result};
use crate::index::{FieldCondition, PointFilter, VectorIndex};
use crate::space::VectorSpace;

const BACKEND: &str = "qdrant";

/// A [`VectorIndex`] backed by a [Qdrant](https://qdrant.tech/) collection.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantVectorIndex {
    /// Connect to the URL and collection named in `settings`.
    pub fn connect(settings: &IndexSettings) -> Result<Self> {
        let client = Qdrant::from_url(&settings.url).build().map_err(Self::map_err)?;
        Ok(Self { client, collection: settings.collection.clone() })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self { client, collection: collection.into() }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn map_err(e: qdrant_client::QdrantError) -> RecoError {
        RecoError::index(BACKEND, e.to_string())
    }

    /// Create the collection with a cosine named vector for every space.
    /// No-op if it already exists.
    pub async fn ensure_collection(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        if collections.collections.iter().any(|c| c.name == self.collection) {
            debug!(collection = %self.collection, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        let mut vectors_config = VectorsConfigBuilder::default();
        for space in VectorSpace::ALL {
            vectors_config.add_named_vector_params(
                space.as_str(),
                VectorParamsBuilder::new(space.dimensions() as u64, Distance::Cosine),
            );
        }
        self.client
            .create_collection(CreateCollectionBuilder::new(&self.collection).vectors_config(vectors_config))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, "created qdrant collection");
        Ok(())
    }

    fn exclude_filter(exclude: &HashSet<String>) -> Option<Filter> {
        if exclude.is_empty() {
            return None;
        }
        let ids: Vec<PointId> = exclude.iter().map(|id| to_point_id(id)).collect();
        Some(Filter::must_not([Condition::has_id(ids)]))
    }

    fn scan_filter(filter: &PointFilter) -> Option<Filter> {
        if filter.is_empty() {
            return None;
        }
        let conditions = filter.should.iter().map(|condition| {
            let any: Vec<String> = match condition {
                FieldCondition::Category(any) => any.clone(),
                FieldCondition::ContentType(any) => any.iter().map(|tag| tag.to_string()).collect(),
            };
            Condition::matches(condition.key(), any)
        });
        Some(Filter::should(conditions))
    }

    fn into_content_point(point: RetrievedPoint) -> Option<ContentPoint> {
        let id = point.id.as_ref().and_then(point_id_to_string)?;
        let payload = match ContentPayload::from_json(payload_to_json(point.payload)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(point_id = %id, error = %e, "dropping point with invalid payload");
                return None;
            }
        };
        Some(ContentPoint { id, vectors: named_vectors(point.vectors), payload })
    }
}

/// Qdrant ids are either unsigned integers or UUIDs; digit-only strings map
/// back to the numeric form.
fn to_point_id(id: &str) -> PointId {
    match id.parse::<u64>() {
        Ok(num) => PointId::from(num),
        Err(_) => PointId::from(id.to_string()),
    }
}

fn point_id_to_string(id: &PointId) -> Option<String> {
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
        None => None,
    }
}

#[allow(deprecated)]
fn named_vectors(vectors: Option<VectorsOutput>) -> NamedVectors {
    match vectors.and_then(|v| v.vectors_options) {
        Some(VectorsOptions::Vectors(named)) => {
            named.vectors.into_iter().map(|(name, vector)| (name, vector.data)).collect()
        }
        _ => NamedVectors::new(),
    }
}

fn value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(list.values.into_iter().map(value_to_json).collect()),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields.into_iter().map(|(k, v)| (k, value_to_json(v))).collect::<Map<String, Value>>(),
        ),
    }
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Value {
    Value::Object(payload.into_iter().map(|(k, v)| (k, value_to_json(v))).collect())
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn retrieve(&self, ids: &[String]) -> Result<Vec<ContentPoint>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let point_ids: Vec<PointId> = ids.iter().map(|id| to_point_id(id)).collect();
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, point_ids).with_vectors(true).with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        Ok(response.result.into_iter().filter_map(Self::into_content_point).collect())
    }

    async fn search(
        &self,
        space: VectorSpace,
        vector: &[f32],
        limit: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<SearchHit>> {
        let mut request = SearchPointsBuilder::new(&self.collection, vector.to_vec(), limit as u64)
            .vector_name(space.as_str())
            .with_payload(true);
        if let Some(filter) = Self::exclude_filter(exclude) {
            request = request.filter(filter);
        }
        let response = self.client.search_points(request).await.map_err(Self::map_err)?;

        let hits = response
            .result
            .into_iter()
            .filter_map(|scored| {
                let id = scored.id.as_ref().and_then(point_id_to_string)?;
                match ContentPayload::from_json(payload_to_json(scored.payload)) {
                    Ok(payload) => Some(SearchHit { id, score: scored.score, payload }),
                    Err(e) => {
                        warn!(point_id = %id, error = %e, "dropping hit with invalid payload");
                        None
                    }
                }
            })
            .collect();
        Ok(hits)
    }

    async fn scan(&self, filter: &PointFilter, limit: usize) -> Result<Vec<ContentPoint>> {
        let mut request = ScrollPointsBuilder::new(&self.collection)
            .limit(limit as u32)
            .with_payload(true)
            .with_vectors(false);
        if let Some(filter) = Self::scan_filter(filter) {
            request = request.filter(filter);
        }
        let response = self.client.scroll(request).await.map_err(Self::map_err)?;
        Ok(response.result.into_iter().filter_map(Self::into_content_point).collect())
    }

    async fn insert(&self, point: ContentPoint, wait: bool) -> Result<()> {
        let payload = Payload::try_from(point.payload.to_json()).map_err(Self::map_err)?;
        let vectors: HashMap<String, Vec<f32>> = point.vectors;
        self.client
            .upsert_points(
                UpsertPointsBuilder::new(
                    &self.collection,
                    vec![PointStruct::new(to_point_id(&point.id), vectors, payload)],
                )
                .wait(wait),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, point_id = %point.id, "upserted point to qdrant");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList { ids: vec![to_point_id(id)] })
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, point_id = id, "deleted point from qdrant");
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        self.client.health_check().await.map_err(Self::map_err)?;
        Ok(())
    }
}
