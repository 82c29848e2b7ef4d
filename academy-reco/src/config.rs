//! Configuration for the recommendation engine and its index connection.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RecoError, Result};
use crate::space::VectorSpace;

/// Default Qdrant gRPC endpoint.
pub const DEFAULT_INDEX_URL: &str = "http://localhost:6334";

/// Default name of the content collection.
pub const DEFAULT_COLLECTION: &str = "epitome_academy_content";

/// Score boosts added to similarity when a hit matches a user preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoostWeights {
    /// Added when the hit's modality is one the user prefers.
    pub modality: f32,
    /// Added when the hit's category is one of the user's areas of interest.
    pub category: f32,
}

impl Default for BoostWeights {
    fn default() -> Self {
        Self { modality: 0.15, category: 0.10 }
    }
}

/// Scores assigned to filter matches when the user has no history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColdStartWeights {
    /// Score of any point that passed the preference filter.
    pub base: f32,
    /// Added for each preference dimension the point matches.
    pub per_dimension: f32,
}

impl Default for ColdStartWeights {
    fn default() -> Self {
        Self { base: 1.0, per_dimension: 0.5 }
    }
}

/// Configuration parameters for the recommender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommenderConfig {
    pub boosts: BoostWeights,
    pub cold_start: ColdStartWeights,
    /// Maximum number of points pulled by the cold-start filtered scan.
    pub cold_start_scan_limit: usize,
    /// Warm-start searches fetch `warm_fetch_multiplier × limit` hits per space.
    pub warm_fetch_multiplier: usize,
    /// Spaces the profile aggregator averages; other vector names are ignored.
    pub profile_spaces: Vec<VectorSpace>,
    /// Spaces searched around each keyword's ephemeral point.
    pub keyword_spaces: Vec<VectorSpace>,
    /// Largest `limit` a caller may request.
    pub max_limit: usize,
    /// Request-level timeout in milliseconds. `None` disables it.
    pub request_timeout_ms: Option<u64>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            boosts: BoostWeights::default(),
            cold_start: ColdStartWeights::default(),
            cold_start_scan_limit: 200,
            warm_fetch_multiplier: 2,
            profile_spaces: vec![VectorSpace::Text, VectorSpace::Video, VectorSpace::Audio],
            keyword_spaces: vec![VectorSpace::Text, VectorSpace::Video, VectorSpace::Audio],
            max_limit: 100,
            request_timeout_ms: None,
        }
    }
}

impl RecommenderConfig {
    /// Create a new builder for constructing a [`RecommenderConfig`].
    pub fn builder() -> RecommenderConfigBuilder {
        RecommenderConfigBuilder::default()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::ConfigError`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.cold_start_scan_limit == 0 {
            return Err(RecoError::ConfigError(
                "cold_start_scan_limit must be greater than zero".to_string(),
            ));
        }
        if self.warm_fetch_multiplier == 0 {
            return Err(RecoError::ConfigError(
                "warm_fetch_multiplier must be greater than zero".to_string(),
            ));
        }
        if self.max_limit == 0 {
            return Err(RecoError::ConfigError("max_limit must be greater than zero".to_string()));
        }
        if self.profile_spaces.is_empty() {
            return Err(RecoError::ConfigError("profile_spaces must not be empty".to_string()));
        }
        if self.keyword_spaces.is_empty() {
            return Err(RecoError::ConfigError("keyword_spaces must not be empty".to_string()));
        }
        let weights = [
            ("boosts.modality", self.boosts.modality),
            ("boosts.category", self.boosts.category),
            ("cold_start.base", self.cold_start.base),
            ("cold_start.per_dimension", self.cold_start.per_dimension),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(RecoError::ConfigError(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.request_timeout_ms == Some(0) {
            return Err(RecoError::ConfigError(
                "request_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RecommenderConfig`].
#[derive(Debug, Clone, Default)]
pub struct RecommenderConfigBuilder {
    config: RecommenderConfig,
}

impl RecommenderConfigBuilder {
    /// Set the modality and category preference boosts.
    pub fn boosts(mut self, modality: f32, category: f32) -> Self {
        self.config.boosts = BoostWeights { modality, category };
        self
    }

    /// Set the cold-start base score and per-dimension bonus.
    pub fn cold_start_weights(mut self, base: f32, per_dimension: f32) -> Self {
        self.config.cold_start = ColdStartWeights { base, per_dimension };
        self
    }

    pub fn cold_start_scan_limit(mut self, limit: usize) -> Self {
        self.config.cold_start_scan_limit = limit;
        self
    }

    pub fn warm_fetch_multiplier(mut self, multiplier: usize) -> Self {
        self.config.warm_fetch_multiplier = multiplier;
        self
    }

    pub fn profile_spaces(mut self, spaces: impl Into<Vec<VectorSpace>>) -> Self {
        self.config.profile_spaces = spaces.into();
        self
    }

    pub fn keyword_spaces(mut self, spaces: impl Into<Vec<VectorSpace>>) -> Self {
        self.config.keyword_spaces = spaces.into();
        self
    }

    pub fn max_limit(mut self, max_limit: usize) -> Self {
        self.config.max_limit = max_limit;
        self
    }

    /// Abort requests that run longer than `timeout`.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Build the [`RecommenderConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::ConfigError`] if:
    /// - a limit or the fetch multiplier is zero
    /// - a space list is empty
    /// - a weight is negative or not finite
    pub fn build(self) -> Result<RecommenderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Connection settings for a remote vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSettings {
    pub url: String,
    pub collection: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { url: DEFAULT_INDEX_URL.to_string(), collection: DEFAULT_COLLECTION.to_string() }
    }
}

impl IndexSettings {
    /// Read `QDRANT_URL` and `QDRANT_COLLECTION`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("QDRANT_URL").unwrap_or(defaults.url),
            collection: std::env::var("QDRANT_COLLECTION").unwrap_or(defaults.collection),
        }
    }
}
