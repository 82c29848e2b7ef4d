//! Data types for indexed content points, their payloads, and search hits.
//!
//! Payloads arrive from the vector index as free-form JSON. They are parsed
//! into [`ContentPayload`] at the index boundary so the engine only ever sees
//! typed fields; anything the schema does not name is kept in
//! [`ContentPayload::extra`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RecoError, Result};
use crate::space::VectorSpace;

/// The concrete content tag stored in a point's payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Document,
    Metadata,
    Text,
    Table,
    Image,
    VideoSummary,
    VideoChunk,
    Audio,
    /// Marker for ephemeral keyword query points.
    TemporaryKeyword,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Document => "document",
            ContentType::Metadata => "metadata",
            ContentType::Text => "text",
            ContentType::Table => "table",
            ContentType::Image => "image",
            ContentType::VideoSummary => "video_summary",
            ContentType::VideoChunk => "video_chunk",
            ContentType::Audio => "audio",
            ContentType::TemporaryKeyword => "temporary_keyword",
            ContentType::Other(tag) => tag,
        }
    }

    /// The modality class this tag belongs to.
    pub fn modality(&self) -> Modality {
        if self.as_str().contains("video") { Modality::Video } else { Modality::Document }
    }
}

impl From<&str> for ContentType {
    fn from(tag: &str) -> Self {
        match tag {
            "document" => ContentType::Document,
            "metadata" => ContentType::Metadata,
            "text" => ContentType::Text,
            "table" => ContentType::Table,
            "image" => ContentType::Image,
            "video_summary" => ContentType::VideoSummary,
            "video_chunk" => ContentType::VideoChunk,
            "audio" => ContentType::Audio,
            "temporary_keyword" => ContentType::TemporaryKeyword,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentType {
    fn from(tag: String) -> Self {
        ContentType::from(tag.as_str())
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.as_str().to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The coarse modality class used for preferences and response typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[serde(alias = "Video")]
    Video,
    #[serde(alias = "Document")]
    Document,
}

impl Modality {
    /// Content tags that belong to this modality when filtering the index.
    pub fn content_tags(self) -> &'static [ContentType] {
        match self {
            Modality::Video => &[ContentType::VideoSummary, ContentType::VideoChunk],
            Modality::Document => &[ContentType::Document, ContentType::Metadata],
        }
    }
}

/// Typed view of a point payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// Legacy element tag (`text`, `table`, `image`) written by the document
    /// processor. Consulted when `content_type` is absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Fields outside the schema, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPayload {
    /// Parse and validate a raw index payload.
    ///
    /// # Errors
    ///
    /// Returns [`RecoError::InvalidPayload`] if the value is not an object or
    /// a typed field has the wrong JSON type.
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(RecoError::InvalidPayload(format!("expected an object, got {value}")));
        }
        serde_json::from_value(value).map_err(|e| RecoError::InvalidPayload(e.to_string()))
    }

    /// Serialize back into the raw index representation.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Marker payload for an ephemeral keyword query point.
    pub fn temporary_keyword(keyword: &str) -> Self {
        Self {
            content_type: Some(ContentType::TemporaryKeyword),
            keyword: Some(keyword.to_string()),
            text: Some(keyword.to_string()),
            ..Self::default()
        }
    }

    /// The resolved content tag, if the payload carries one.
    pub fn kind(&self) -> Option<ContentType> {
        self.content_type.clone().or_else(|| self.element_type.as_deref().map(ContentType::from))
    }

    /// The modality class; untagged content counts as a document.
    pub fn modality(&self) -> Modality {
        self.kind().map(|kind| kind.modality()).unwrap_or(Modality::Document)
    }

    /// The key identifying the source document this point was cut from.
    pub fn source_key(&self) -> Option<&str> {
        non_empty(&self.doc_id)
            .or_else(|| non_empty(&self.filename))
            .or_else(|| non_empty(&self.original_filename))
    }

    /// The filename shown to users.
    pub fn display_filename(&self) -> Option<&str> {
        self.original_filename.as_deref().or(self.filename.as_deref())
    }

    pub fn is_ephemeral(&self) -> bool {
        self.content_type == Some(ContentType::TemporaryKeyword)
    }
}

/// An empty string counts as absent.
fn non_empty(key: &Option<String>) -> Option<&str> {
    key.as_deref().filter(|key| !key.is_empty())
}

/// Per-space embeddings of a point, keyed by the index's vector name.
pub type NamedVectors = HashMap<String, Vec<f32>>;

/// A record of the content collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPoint {
    pub id: String,
    pub vectors: NamedVectors,
    pub payload: ContentPayload,
}

impl ContentPoint {
    pub fn new(id: impl Into<String>, payload: ContentPayload) -> Self {
        Self { id: id.into(), vectors: NamedVectors::new(), payload }
    }

    /// Attach an embedding for `space`.
    pub fn with_vector(mut self, space: VectorSpace, vector: Vec<f32>) -> Self {
        self.vectors.insert(space.as_str().to_string(), vector);
        self
    }

    /// The embedding stored for `space`, if any.
    pub fn vector(&self, space: VectorSpace) -> Option<&[f32]> {
        self.vectors.get(space.as_str()).map(Vec::as_slice).filter(|v| !v.is_empty())
    }
}

/// A point returned by similarity search together with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    /// Cosine similarity; higher is more similar.
    pub score: f32,
    pub payload: ContentPayload,
}
