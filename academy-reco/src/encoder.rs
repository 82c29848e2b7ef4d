//! Encoder trait for turning keywords and queries into embeddings.

use async_trait::async_trait;

use crate::error::Result;

/// A model that embeds text into the text vector space.
///
/// Implementations wrap a specific backend behind a unified async interface.
/// The engine treats an error and an empty vector alike: the affected
/// keyword or query is skipped and the rest of the request carries on.
///
/// # Example
///
/// ```rust,ignore
/// use academy_reco::Encoder;
///
/// let embedding = encoder.encode_text("Python").await?;
/// assert_eq!(embedding.len(), academy_reco::TEXT_EMBEDDING_DIM);
/// ```
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Generate a text-space embedding for `text`.
    async fn encode_text(&self, text: &str) -> Result<Vec<f32>>;

    /// A short backend name used in logs.
    fn name(&self) -> &str {
        "encoder"
    }
}
