//! Hybrid content recommendation for the Epitome Academy learning platform.
//!
//! This crate recommends documents, images, video and audio to learners by
//! combining three signals against a multi-space vector index:
//!
//! - **Interaction history**: the mean embedding of what a user engaged
//!   with, searched per vector space (warm start)
//! - **Declared preferences**: areas of interest and preferred modalities,
//!   used as a filter when there is no history (cold start) and as score
//!   boosts otherwise
//! - **Ad hoc keywords**: embedded, anchored as temporary index points, and
//!   searched around
//!
//! Hits from every space are fused into one ranked list with at most one
//! entry per source document.
//!
//! # Features
//!
//! - `qdrant`: [`qdrant::QdrantVectorIndex`]
//! - `openai`: [`openai::OpenAiTextEncoder`]

pub mod config;
pub mod content;
pub mod encoder;
pub mod error;
pub mod fusion;
pub mod index;
pub mod inmemory;
pub mod keywords;
pub mod profile;
pub mod recommender;
pub mod retriever;
pub mod space;
pub mod user;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use config::{BoostWeights, ColdStartWeights, IndexSettings, RecommenderConfig, RecommenderConfigBuilder};
pub use content::{ContentPayload, ContentPoint, ContentType, Modality, NamedVectors, SearchHit};
pub use encoder::Encoder;
pub use error::{RecoError, Result};
pub use fusion::{Candidate, CandidateSet, PreferenceBooster, fuse};
pub use index::{FieldCondition, PointFilter, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
pub use keywords::{EphemeralPoints, KeywordWorkflow};
pub use profile::{ProfileAggregator, ProfileVector, mean_profile};
pub use recommender::{HealthReport, Recommender, RecommenderBuilder};
pub use retriever::{HybridRetriever, Strategy};
pub use space::{
    AUDIO_EMBEDDING_DIM, IMAGE_EMBEDDING_DIM, TEXT_EMBEDDING_DIM, VIDEO_EMBEDDING_DIM, VectorSpace,
};
pub use user::{InMemoryUserStore, UserPreferences, UserProfile, UserStore};
