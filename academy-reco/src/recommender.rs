//! Recommendation engine facade.
//!
//! The [`Recommender`] wires a [`VectorIndex`], an [`Encoder`] and a
//! [`UserStore`] together and exposes the operations the API layer calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use academy_reco::{InMemoryUserStore, InMemoryVectorIndex, Recommender, RecommenderConfig};
//!
//! let recommender = Recommender::builder()
//!     .config(RecommenderConfig::default())
//!     .index(Arc::new(InMemoryVectorIndex::new()))
//!     .encoder(Arc::new(my_encoder))
//!     .user_store(Arc::new(InMemoryUserStore::new()))
//!     .build()?;
//!
//! recommender.record_interaction("u1", "point-42").await?;
//! let for_user = recommender.recommend_for_user("u1", 10).await?;
//! let for_keywords = recommender
//!     .get_recommendations_for_keywords(&["Python".into()], 5, 10)
//!     .await?;
//! ```

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RecommenderConfig;
use crate::encoder::Encoder;
use crate::error::{RecoError, Result};
use crate::fusion::Candidate;
use crate::index::VectorIndex;
use crate::keywords::{EphemeralPoints, KeywordWorkflow, merge_keyword_candidates};
use crate::retriever::HybridRetriever;
use crate::user::{UserPreferences, UserProfile, UserStore};

/// Reachability of the engine and its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub api_status: String,
    pub index_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// The recommendation engine.
///
/// Requests are independent: the only shared state is the user store and
/// the index. Construct one via [`Recommender::builder()`].
pub struct Recommender {
    config: Arc<RecommenderConfig>,
    index: Arc<dyn VectorIndex>,
    users: Arc<dyn UserStore>,
    retriever: HybridRetriever,
    keywords: KeywordWorkflow,
}

impl Recommender {
    /// Create a new [`RecommenderBuilder`].
    pub fn builder() -> RecommenderBuilder {
        RecommenderBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Recommend documents for a user given an explicit interaction history.
    ///
    /// An empty history selects the cold-start strategy driven by the user's
    /// stored preferences.
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::InvalidRequest`] if `limit` exceeds the configured
    /// maximum, [`RecoError::Timeout`] if the request timeout fires, and
    /// propagates user store failures. Index failures never surface here.
    pub async fn get_recommendations_for_user(
        &self,
        user_id: &str,
        interaction_history: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        self.check_limit("limit", limit)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let history: BTreeSet<String> = interaction_history.iter().cloned().collect();

        self.with_timeout("user recommendations", async {
            let preferences = self.users.preferences(user_id).await?;
            Ok::<_, RecoError>(self.retriever.retrieve(user_id, &history, &preferences, limit).await)
        })
        .await?
    }

    /// Recommend documents for a user using the history held in the user store.
    pub async fn recommend_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<Candidate>> {
        let history: Vec<String> = self.users.interactions(user_id).await?.into_iter().collect();
        self.get_recommendations_for_user(user_id, &history, limit).await
    }

    /// Recommend documents similar to each keyword, merged into one ranking.
    ///
    /// Every temporary point inserted for the keywords is deleted before this
    /// returns, including when the request times out.
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::InvalidRequest`] for out-of-range limits and
    /// [`RecoError::Timeout`] if the request timeout fires.
    pub async fn get_recommendations_for_keywords(
        &self,
        keywords: &[String],
        per_keyword_limit: usize,
        final_limit: usize,
    ) -> Result<Vec<Candidate>> {
        self.check_limit("per_keyword_limit", per_keyword_limit)?;
        self.check_limit("final_limit", final_limit)?;
        if keywords.is_empty() {
            warn!("no keywords provided for recommendation search");
            return Ok(Vec::new());
        }
        if per_keyword_limit == 0 || final_limit == 0 {
            return Ok(Vec::new());
        }

        let mut points = EphemeralPoints::new(Arc::clone(&self.index));
        let outcome = self
            .with_timeout(
                "keyword recommendations",
                self.keywords.collect(keywords, per_keyword_limit, &mut points),
            )
            .await;
        points.release().await;

        let merged = merge_keyword_candidates(outcome?, final_limit);
        info!(keywords = keywords.len(), count = merged.len(), "generated keyword recommendations");
        Ok(merged)
    }

    /// Record that a user interacted with a content point.
    pub async fn record_interaction(&self, user_id: &str, point_id: &str) -> Result<bool> {
        self.users.record_interaction(user_id, point_id).await
    }

    pub async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences> {
        self.users.preferences(user_id).await
    }

    pub async fn save_preferences(&self, user_id: &str, preferences: UserPreferences) -> Result<bool> {
        self.users.save_preferences(user_id, preferences).await
    }

    pub async fn user_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.users.profile(user_id).await
    }

    /// Probe the index. Never fails; problems are reported in the result.
    pub async fn health_check(&self) -> HealthReport {
        match self.index.health().await {
            Ok(()) => HealthReport {
                api_status: "ok".to_string(),
                index_status: "ok".to_string(),
                error: None,
            },
            Err(e) => {
                error!(error = %e, "health check failed");
                HealthReport {
                    api_status: "ok".to_string(),
                    index_status: "error".to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn check_limit(&self, name: &str, value: usize) -> Result<()> {
        if value > self.config.max_limit {
            return Err(RecoError::InvalidRequest(format!(
                "{name} must be at most {}, got {value}",
                self.config.max_limit
            )));
        }
        Ok(())
    }

    async fn with_timeout<F, T>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let Some(timeout) = self.config.request_timeout() else {
            return Ok(future.await);
        };
        tokio::time::timeout(timeout, future).await.map_err(|_| {
            warn!(operation, timeout_ms = timeout.as_millis() as u64, "request timed out");
            RecoError::Timeout { operation: operation.to_string(), timeout_ms: timeout.as_millis() as u64 }
        })
    }
}

/// Builder for constructing a [`Recommender`].
///
/// The index, encoder and user store are required; the config defaults to
/// [`RecommenderConfig::default()`]. Call [`build()`](RecommenderBuilder::build)
/// to validate and produce the engine.
#[derive(Default)]
pub struct RecommenderBuilder {
    config: Option<RecommenderConfig>,
    index: Option<Arc<dyn VectorIndex>>,
    encoder: Option<Arc<dyn Encoder>>,
    users: Option<Arc<dyn UserStore>>,
}

impl RecommenderBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RecommenderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the text encoder.
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Set the user state backend.
    pub fn user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    /// Build the [`Recommender`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::ConfigError`] if a required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<Recommender> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RecoError::ConfigError("index is required".to_string()))?;
        let encoder =
            self.encoder.ok_or_else(|| RecoError::ConfigError("encoder is required".to_string()))?;
        let users = self
            .users
            .ok_or_else(|| RecoError::ConfigError("user_store is required".to_string()))?;

        let config = Arc::new(config);
        let retriever = HybridRetriever::new(Arc::clone(&index), Arc::clone(&config));
        let keywords = KeywordWorkflow::new(Arc::clone(&index), encoder, &config);

        Ok(Recommender { config, index, users, retriever, keywords })
    }
}
