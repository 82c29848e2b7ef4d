//! Cross-space score fusion and per-document deduplication.
//!
//! Hits from any number of vector spaces (or a filtered scan) are folded into
//! a [`CandidateSet`] keyed by source document. A stored candidate is only
//! replaced by a strictly better score, so the first-seen hit wins ties, and
//! ranking is a stable sort over first-seen order.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::BoostWeights;
use crate::content::{ContentPayload, Modality, SearchHit};
use crate::user::UserPreferences;

/// Title shown when a payload carries none.
pub const DEFAULT_TITLE: &str = "Title not available";

/// A recommended source document with the best hit that led to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// `doc_id`, or a filename when the payload has no document id.
    pub source_key: String,
    pub doc_id: Option<String>,
    pub title: String,
    pub filename: Option<String>,
    #[serde(rename = "type")]
    pub modality: Modality,
    /// Similarity (or cold-start filter score) plus preference boosts.
    pub similarity_score: f32,
    /// The keyword that surfaced this candidate, for keyword recommendations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Id of the best matching point.
    pub point_id: String,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub best_matching_chunk_payload: ContentPayload,
}

impl Candidate {
    /// Build a candidate from a hit. Returns `None` for unidentifiable hits.
    pub fn from_hit(hit: SearchHit, final_score: f32) -> Option<Self> {
        let source_key = hit.payload.source_key()?.to_string();
        let payload = hit.payload;
        Some(Self {
            source_key,
            doc_id: payload.doc_id.clone(),
            title: payload.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            filename: payload.display_filename().map(str::to_string),
            modality: payload.modality(),
            similarity_score: final_score,
            keyword: None,
            point_id: hit.id,
            start_time: payload.start_time,
            end_time: payload.end_time,
            best_matching_chunk_payload: payload,
        })
    }
}

/// Computes the preference boost for a hit.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceBooster<'a> {
    weights: BoostWeights,
    preferences: Option<&'a UserPreferences>,
}

impl<'a> PreferenceBooster<'a> {
    pub fn new(weights: BoostWeights, preferences: &'a UserPreferences) -> Self {
        Self { weights, preferences: Some(preferences) }
    }

    /// A booster that never adds anything.
    pub fn none() -> Self {
        Self { weights: BoostWeights { modality: 0.0, category: 0.0 }, preferences: None }
    }

    pub fn boost(&self, payload: &ContentPayload) -> f32 {
        let Some(preferences) = self.preferences else {
            return 0.0;
        };
        let mut boost = 0.0;
        if preferences.prefers(payload.modality()) {
            boost += self.weights.modality;
        }
        if preferences.is_interested_in(payload.category.as_deref()) {
            boost += self.weights.category;
        }
        boost
    }
}

/// Candidates keyed by source document, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    slots: HashMap<String, usize>,
    entries: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep `candidate` if its document is new or it beats the stored score.
    ///
    /// Returns whether the set changed.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        match self.slots.get(&candidate.source_key) {
            Some(&slot) => {
                if candidate.similarity_score > self.entries[slot].similarity_score {
                    self.entries[slot] = candidate;
                    true
                } else {
                    false
                }
            }
            None => {
                self.slots.insert(candidate.source_key.clone(), self.entries.len());
                self.entries.push(candidate);
                true
            }
        }
    }

    /// Candidates by descending score, ties in first-seen order, truncated.
    pub fn into_ranked(self, limit: usize) -> Vec<Candidate> {
        let mut ranked = self.entries;
        ranked.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        ranked.truncate(limit);
        ranked
    }
}

impl Extend<Candidate> for CandidateSet {
    fn extend<I: IntoIterator<Item = Candidate>>(&mut self, candidates: I) {
        for candidate in candidates {
            self.offer(candidate);
        }
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(candidates: I) -> Self {
        let mut set = Self::new();
        set.extend(candidates);
        set
    }
}

/// Fold hits into a [`CandidateSet`], adding the preference boost to each raw score.
///
/// Hits without a `doc_id` or filename are dropped.
pub fn fuse<I>(hits: I, booster: &PreferenceBooster<'_>) -> CandidateSet
where
    I: IntoIterator<Item = SearchHit>,
{
    hits.into_iter()
        .filter_map(|hit| {
            let final_score = hit.score + booster.boost(&hit.payload);
            Candidate::from_hit(hit, final_score)
        })
        .collect()
}
