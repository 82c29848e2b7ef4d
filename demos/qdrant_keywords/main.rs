//! # Qdrant Keyword Search Example
//!
//! Keyword recommendations against a live Qdrant collection with an
//! OpenAI-compatible embeddings endpoint.
//!
//! Requires:
//! - a Qdrant server (`QDRANT_URL`, default `http://localhost:6334`)
//! - `OPENAI_API_KEY`, and optionally `EMBEDDINGS_BASE_URL` for a
//!   self-hosted server
//!
//! Run: `cargo run --example qdrant_keywords --features qdrant -- Python SQL`

use std::sync::Arc;
use std::time::Duration;

use academy_reco::openai::OpenAiTextEncoder;
use academy_reco::qdrant::QdrantVectorIndex;
use academy_reco::{InMemoryUserStore, IndexSettings, Recommender, RecommenderConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("academy_reco=info")),
        )
        .init();

    let keywords: Vec<String> = std::env::args().skip(1).collect();
    if keywords.is_empty() {
        anyhow::bail!("usage: qdrant_keywords <keyword>...");
    }

    let settings = IndexSettings::from_env();
    info!(url = %settings.url, collection = %settings.collection, "connecting to qdrant");
    let index = QdrantVectorIndex::connect(&settings)?;
    index.ensure_collection().await?;

    let mut encoder = OpenAiTextEncoder::from_env()?;
    if let Ok(base_url) = std::env::var("EMBEDDINGS_BASE_URL") {
        encoder = encoder.with_base_url(base_url);
    }

    let config = RecommenderConfig::builder().request_timeout(Duration::from_secs(30)).build()?;
    let recommender = Recommender::builder()
        .config(config)
        .index(Arc::new(index))
        .encoder(Arc::new(encoder))
        .user_store(Arc::new(InMemoryUserStore::new()))
        .build()?;

    let health = recommender.health_check().await;
    if !health.is_healthy() {
        anyhow::bail!("index unavailable: {}", health.error.unwrap_or_default());
    }

    let results = recommender.get_recommendations_for_keywords(&keywords, 5, 10).await?;
    for (i, candidate) in results.iter().enumerate() {
        println!(
            "{}. [score={:.4}] {} | {} via '{}'",
            i + 1,
            candidate.similarity_score,
            candidate.title,
            candidate.filename.as_deref().unwrap_or("-"),
            candidate.keyword.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
