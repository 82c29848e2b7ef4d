//! Named embedding channels stored side by side in the content collection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimensionality of sentence-transformer text embeddings.
pub const TEXT_EMBEDDING_DIM: usize = 384;
/// Dimensionality of CLIP image embeddings.
pub const IMAGE_EMBEDDING_DIM: usize = 512;
/// Dimensionality of CLIP frame-sequence (video) embeddings.
pub const VIDEO_EMBEDDING_DIM: usize = 512;
/// Dimensionality of wav2vec2 audio embeddings.
pub const AUDIO_EMBEDDING_DIM: usize = 768;

/// A named vector space of the content collection.
///
/// Every point carries at least one of these. The ordering (text, image,
/// video, audio) is the order in which multi-space fan-outs are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorSpace {
    Text,
    Image,
    Video,
    Audio,
}

impl VectorSpace {
    /// All spaces, in fan-out order.
    pub const ALL: [VectorSpace; 4] =
        [VectorSpace::Text, VectorSpace::Image, VectorSpace::Video, VectorSpace::Audio];

    /// The vector name used in the index.
    pub fn as_str(self) -> &'static str {
        match self {
            VectorSpace::Text => "text",
            VectorSpace::Image => "image",
            VectorSpace::Video => "video",
            VectorSpace::Audio => "audio",
        }
    }

    /// Resolve an index vector name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|space| space.as_str() == name)
    }

    /// Embedding dimensionality of this space.
    pub fn dimensions(self) -> usize {
        match self {
            VectorSpace::Text => TEXT_EMBEDDING_DIM,
            VectorSpace::Image => IMAGE_EMBEDDING_DIM,
            VectorSpace::Video => VIDEO_EMBEDDING_DIM,
            VectorSpace::Audio => AUDIO_EMBEDDING_DIM,
        }
    }
}

impl fmt::Display for VectorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_names_and_rejects_others() {
        for space in VectorSpace::ALL {
            assert_eq!(VectorSpace::parse(space.as_str()), Some(space));
        }
        assert_eq!(VectorSpace::parse("sparse"), None);
        assert_eq!(VectorSpace::parse("Text"), None);
    }
}
