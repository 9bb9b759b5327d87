//! Domain types shared by the gateway, the sessions, and the renderer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retrieval model a query is run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchModelId {
    /// BM25 keyword ranking
    #[serde(rename = "bm25")]
    Lexical,
    /// MiniLM sentence embeddings
    #[default]
    #[serde(rename = "minilm")]
    DenseEmbedding,
    /// CodeBERT cross-encoder reranking
    #[serde(rename = "codebert")]
    CrossEncoderRerank,
}

impl SearchModelId {
    /// Every selectable model, in menu order
    pub const ALL: [SearchModelId; 3] = [
        SearchModelId::Lexical,
        SearchModelId::DenseEmbedding,
        SearchModelId::CrossEncoderRerank,
    ];

    /// Identifier used on the wire
    pub fn as_wire(&self) -> &'static str {
        match self {
            SearchModelId::Lexical => "bm25",
            SearchModelId::DenseEmbedding => "minilm",
            SearchModelId::CrossEncoderRerank => "codebert",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            SearchModelId::Lexical => "BM25 (lexical)",
            SearchModelId::DenseEmbedding => "MiniLM (dense embedding)",
            SearchModelId::CrossEncoderRerank => "CodeBERT (cross-encoder rerank)",
        }
    }
}

impl fmt::Display for SearchModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error returned when a model identifier is not one of the known models
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown search model '{0}'. Expected one of: bm25, minilm, codebert")]
pub struct UnknownModel(pub String);

impl FromStr for SearchModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bm25" => Ok(SearchModelId::Lexical),
            "minilm" => Ok(SearchModelId::DenseEmbedding),
            "codebert" => Ok(SearchModelId::CrossEncoderRerank),
            _ => Err(UnknownModel(s.to_string())),
        }
    }
}

/// Repository details reported by the gateway once indexing succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub star_count: u64,
    pub fork_count: u64,
    pub avatar_url: String,
    pub default_branch: Option<String>,
}

impl RepositoryMetadata {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One ranked snippet returned by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Unique within one result set
    pub id: String,
    pub filename: String,
    /// Relevance in [0, 1]
    pub score: f64,
    pub code: String,
    pub source_model: SearchModelId,
}

impl SearchResult {
    /// Score as a rounded percentage
    pub fn score_percent(&self) -> u8 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
