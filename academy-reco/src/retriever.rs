//! Hybrid retrieval: filter-based cold start, profile-vector warm start.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::RecommenderConfig;
use crate::content::{ContentPayload, ContentType, Modality, SearchHit};
use crate::fusion::{Candidate, CandidateSet, PreferenceBooster, fuse};
use crate::index::{FieldCondition, PointFilter, VectorIndex, scan_or_empty, search_or_empty};
use crate::profile::ProfileAggregator;
use crate::user::UserPreferences;

/// Which strategy serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// No interaction history: filter the catalogue by declared preferences.
    ColdStart,
    /// Search around the mean of the user's interacted content.
    WarmStart,
}

impl Strategy {
    pub fn select(interaction_history: &BTreeSet<String>) -> Self {
        if interaction_history.is_empty() { Strategy::ColdStart } else { Strategy::WarmStart }
    }
}

/// Chooses and runs the retrieval strategy for a user request.
pub struct HybridRetriever {
    index: Arc<dyn VectorIndex>,
    aggregator: ProfileAggregator,
    config: Arc<RecommenderConfig>,
}

impl HybridRetriever {
    pub fn new(index: Arc<dyn VectorIndex>, config: Arc<RecommenderConfig>) -> Self {
        let aggregator = ProfileAggregator::new(Arc::clone(&index), config.profile_spaces.clone());
        Self { index, aggregator, config }
    }

    /// Recommend up to `limit` documents for a user.
    ///
    /// Returns an empty list when the user has neither history nor usable
    /// preferences, or when no profile vector could be built.
    pub async fn retrieve(
        &self,
        user_id: &str,
        interaction_history: &BTreeSet<String>,
        preferences: &UserPreferences,
        limit: usize,
    ) -> Vec<Candidate> {
        let strategy = Strategy::select(interaction_history);
        info!(user_id, ?strategy, limit, "selected retrieval strategy");

        let candidates = match strategy {
            Strategy::ColdStart => self.cold_start(user_id, preferences).await,
            Strategy::WarmStart => self.warm_start(interaction_history, preferences, limit).await,
        };
        let ranked = candidates.into_ranked(limit);
        info!(user_id, count = ranked.len(), "generated unique recommendations");
        ranked
    }

    async fn cold_start(&self, user_id: &str, preferences: &UserPreferences) -> CandidateSet {
        let Some(filter) = cold_start_filter(preferences) else {
            warn!(user_id, "user has no preferences to filter by, cannot recommend");
            return CandidateSet::new();
        };

        let points = scan_or_empty(self.index.as_ref(), &filter, self.config.cold_start_scan_limit).await;
        let weights = self.config.cold_start;
        points
            .into_iter()
            .filter_map(|point| {
                let matched = matched_dimensions(&filter, &point.payload);
                let score = weights.base + weights.per_dimension * matched as f32;
                Candidate::from_hit(SearchHit { id: point.id, score, payload: point.payload }, score)
            })
            .collect()
    }

    async fn warm_start(
        &self,
        interaction_history: &BTreeSet<String>,
        preferences: &UserPreferences,
        limit: usize,
    ) -> CandidateSet {
        let profile = self.aggregator.build(interaction_history).await;
        if profile.is_empty() {
            warn!(history = interaction_history.len(), "no profile vector could be built");
            return CandidateSet::new();
        }

        let exclude: HashSet<String> = interaction_history.iter().cloned().collect();
        let fetch_limit = limit.saturating_mul(self.config.warm_fetch_multiplier);
        let searches = profile.iter().map(|(space, vector)| {
            search_or_empty(self.index.as_ref(), space, vector, fetch_limit, &exclude)
        });
        let hits = join_all(searches).await.into_iter().flatten();

        fuse(hits, &PreferenceBooster::new(self.config.boosts, preferences))
    }
}

/// Build the OR-filter for a user with no history, or `None` if neither
/// preference dimension yields a condition.
pub fn cold_start_filter(preferences: &UserPreferences) -> Option<PointFilter> {
    let mut conditions = Vec::new();
    if !preferences.areas_of_interest.is_empty() {
        conditions.push(FieldCondition::Category(
            preferences.areas_of_interest.iter().cloned().collect(),
        ));
    }
    let tags: Vec<ContentType> = preferences
        .preferred_content_types
        .iter()
        .flat_map(|modality: &Modality| modality.content_tags().iter().cloned())
        .collect();
    if !tags.is_empty() {
        conditions.push(FieldCondition::ContentType(tags));
    }
    if conditions.is_empty() { None } else { Some(PointFilter::should(conditions)) }
}

fn matched_dimensions(filter: &PointFilter, payload: &ContentPayload) -> usize {
    filter.should.iter().filter(|condition| condition.matches(payload)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_depends_only_on_history() {
        assert_eq!(Strategy::select(&BTreeSet::new()), Strategy::ColdStart);
        assert_eq!(Strategy::select(&BTreeSet::from(["p".to_string()])), Strategy::WarmStart);
    }

    #[test]
    fn filter_maps_modalities_to_content_tags() {
        let preferences = UserPreferences {
            preferred_content_types: BTreeSet::from([Modality::Video, Modality::Document]),
            ..UserPreferences::default()
        };
        let filter = cold_start_filter(&preferences).unwrap();
        assert_eq!(
            filter.should,
            vec![FieldCondition::ContentType(vec![
                ContentType::VideoSummary,
                ContentType::VideoChunk,
                ContentType::Document,
                ContentType::Metadata,
            ])]
        );
    }

    #[test]
    fn no_preferences_means_no_filter() {
        let preferences = UserPreferences {
            learning_objectives: BTreeSet::from(["pass the exam".to_string()]),
            ..UserPreferences::default()
        };
        assert_eq!(cold_start_filter(&preferences), None);
    }
}
