//! # Keyword Search Example
//!
//! Recommends catalogue content for a list of keywords. Each keyword is
//! anchored as a temporary point in the index, searched around, and removed
//! again before the call returns.
//!
//! Uses `InMemoryVectorIndex` and a deterministic `HashEncoder` so it runs
//! with **zero API keys**.
//!
//! Run: `cargo run --example keyword_search -- Python "machine learning"`

use std::sync::Arc;

use academy_reco::{
    ContentPayload, ContentPoint, ContentType, Encoder, InMemoryUserStore, InMemoryVectorIndex,
    Recommender, RecommenderConfig, TEXT_EMBEDDING_DIM, VectorSpace,
};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// HashEncoder: deterministic hash-based embeddings for demos
// ---------------------------------------------------------------------------

struct HashEncoder {
    dimensions: usize,
}

#[async_trait::async_trait]
impl Encoder for HashEncoder {
    async fn encode_text(&self, text: &str) -> academy_reco::Result<Vec<f32>> {
        // Case-insensitive so "python" and "Python" land on the same point.
        let hash = text
            .to_lowercase()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Blend two embeddings so a chunk sits between two topics.
fn blend(a: &[f32], b: &[f32], weight: f32) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| weight * x + (1.0 - weight) * y).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("academy_reco=info")),
        )
        .init();

    let mut keywords: Vec<String> = std::env::args().skip(1).collect();
    if keywords.is_empty() {
        keywords = vec!["Python".into(), "machine learning".into()];
    }

    // -- 1. Build a small catalogue ---------------------------------------
    let encoder = Arc::new(HashEncoder { dimensions: TEXT_EMBEDDING_DIM });
    let python = encoder.encode_text("python").await?;
    let ml = encoder.encode_text("machine learning").await?;
    let rust = encoder.encode_text("rust").await?;

    let chunk = |id: &str, doc: &str, title: &str, kind: ContentType, vector: Vec<f32>| {
        ContentPoint::new(
            id,
            ContentPayload {
                doc_id: Some(doc.into()),
                title: Some(title.into()),
                content_type: Some(kind),
                original_filename: Some(format!("{doc}.pdf")),
                ..ContentPayload::default()
            },
        )
        .with_vector(VectorSpace::Text, vector)
    };
    let index = Arc::new(InMemoryVectorIndex::with_points([
        chunk("c1", "py-101", "Python for Beginners", ContentType::Text, python.clone()),
        chunk("c2", "py-101", "Python for Beginners", ContentType::Table, blend(&python, &rust, 0.6)),
        chunk("c3", "ml-pandas", "Data Science with pandas", ContentType::Text, blend(&ml, &python, 0.7)),
        chunk("c4", "ml-intro", "Introduction to Machine Learning", ContentType::VideoChunk, ml.clone()),
        chunk("c5", "rust-book", "The Rust Language", ContentType::Document, rust.clone()),
    ]));
    let catalogue_size = index.len().await;

    // -- 2. Wire the engine -----------------------------------------------
    let recommender = Recommender::builder()
        .config(RecommenderConfig::default())
        .index(index.clone())
        .encoder(encoder)
        .user_store(Arc::new(InMemoryUserStore::new()))
        .build()?;

    // -- 3. Search --------------------------------------------------------
    println!("Keywords: {keywords:?}");
    let results = recommender.get_recommendations_for_keywords(&keywords, 3, 10).await?;
    if results.is_empty() {
        println!("  (no results)");
    }
    for (i, candidate) in results.iter().enumerate() {
        println!(
            "  {}. [score={:.4}] {} ({:?}) via '{}'",
            i + 1,
            candidate.similarity_score,
            candidate.title,
            candidate.modality,
            candidate.keyword.as_deref().unwrap_or("-"),
        );
    }

    // The temporary anchors are gone again.
    anyhow::ensure!(index.len().await == catalogue_size, "temporary anchors were left behind");
    println!("\nIndex still holds {catalogue_size} points.");
    Ok(())
}
