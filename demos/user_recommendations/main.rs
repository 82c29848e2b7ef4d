//! # User Recommendations Example
//!
//! Walks one learner from cold start to warm start:
//!
//! 1. With no history, declared preferences filter the catalogue.
//! 2. After a few interactions, the mean of the interacted content is
//!    searched in every vector space, boosted by the same preferences.
//!
//! Run: `cargo run --example user_recommendations`

use std::collections::BTreeSet;
use std::sync::Arc;

use academy_reco::{
    Candidate, ContentPayload, ContentPoint, ContentType, Encoder, InMemoryUserStore,
    InMemoryVectorIndex, Modality, Recommender, UserPreferences, VectorSpace,
};
use tracing_subscriber::EnvFilter;

/// Unused by user recommendations, but the engine needs one.
struct NoopEncoder;

#[async_trait::async_trait]
impl Encoder for NoopEncoder {
    async fn encode_text(&self, _text: &str) -> academy_reco::Result<Vec<f32>> {
        Ok(Vec::new())
    }
}

fn point(id: &str, doc: &str, kind: ContentType, category: &str, text: [f32; 3]) -> ContentPoint {
    let payload = ContentPayload {
        doc_id: Some(doc.into()),
        title: Some(doc.replace('-', " ")),
        content_type: Some(kind.clone()),
        category: Some(category.into()),
        ..ContentPayload::default()
    };
    let point = ContentPoint::new(id, payload).with_vector(VectorSpace::Text, text.to_vec());
    if kind.modality() == Modality::Video {
        // Video chunks also live in the video space.
        point.with_vector(VectorSpace::Video, text.iter().rev().copied().collect())
    } else {
        point
    }
}

fn print(heading: &str, results: &[Candidate]) {
    println!("\n{heading}");
    if results.is_empty() {
        println!("  (no results)");
    }
    for (i, candidate) in results.iter().enumerate() {
        println!(
            "  {}. [score={:.4}] {} ({:?}, point {})",
            i + 1,
            candidate.similarity_score,
            candidate.title,
            candidate.modality,
            candidate.point_id,
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("academy_reco=info")),
        )
        .init();

    let index = Arc::new(InMemoryVectorIndex::with_points([
        point("p1", "neural-networks", ContentType::Document, "AI", [0.9, 0.1, 0.0]),
        point("p2", "neural-networks", ContentType::Table, "AI", [0.8, 0.2, 0.1]),
        point("p3", "transformers-explained", ContentType::VideoChunk, "AI", [0.7, 0.3, 0.1]),
        point("p4", "linear-algebra", ContentType::Document, "Math", [0.5, 0.5, 0.2]),
        point("p5", "probability-lecture", ContentType::VideoSummary, "Math", [0.3, 0.8, 0.1]),
        point("p6", "french-cuisine", ContentType::Document, "Cooking", [0.0, 0.1, 0.9]),
    ]));

    let recommender = Recommender::builder()
        .index(index)
        .encoder(Arc::new(NoopEncoder))
        .user_store(Arc::new(InMemoryUserStore::new()))
        .build()?;

    let user = "learner-42";
    recommender
        .save_preferences(
            user,
            UserPreferences {
                areas_of_interest: BTreeSet::from(["AI".to_string()]),
                preferred_content_types: BTreeSet::from([Modality::Video]),
                learning_objectives: BTreeSet::from(["understand attention".to_string()]),
            },
        )
        .await?;

    print("Cold start (preferences only):", &recommender.recommend_for_user(user, 5).await?);

    for point_id in ["p1", "p4"] {
        recommender.record_interaction(user, point_id).await?;
    }
    let profile = recommender.user_profile(user).await?;
    println!("\nHistory: {:?}", profile.interaction_history);

    print("Warm start (history + boosts):", &recommender.recommend_for_user(user, 5).await?);

    let health = recommender.health_check().await;
    println!("\nHealth: api={} index={}", health.api_status, health.index_status);
    Ok(())
}
