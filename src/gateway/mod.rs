//! Index gateway contract
//!
//! The indexing pipeline and the retrieval models live behind this boundary. The session core
//! only relies on the shape of the two operations and on results arriving sorted by descending
//! score.

mod http;
mod wire;

pub use http::HttpGateway;
pub use wire::{ProcessResponse, QueryRequest, WireNode, WireResult};

use crate::error::SmartgrepError;
use crate::tree::TreeNode;
use crate::types::{RepositoryMetadata, SearchModelId, SearchResult};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Repository rejected: {0}")]
    Validation(String),
}

impl From<GatewayError> for SmartgrepError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(message) => SmartgrepError::Network(message),
            GatewayError::Validation(message) => SmartgrepError::Validation(message),
        }
    }
}

/// Everything the gateway reports for an indexed repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySnapshot {
    pub metadata: RepositoryMetadata,
    pub tree: Vec<TreeNode>,
}

/// Operations offered by the indexing backend.
///
/// Calls are driven from a single event-loop thread, so implementations are not required to
/// return `Send` futures.
#[allow(async_fn_in_trait)]
pub trait IndexGateway {
    /// Index the repository at `url` and report its metadata and file tree
    async fn submit_repository(&self, url: &str) -> Result<RepositorySnapshot, GatewayError>;

    /// Run `query` against `model`; results come back sorted by descending score
    async fn run_query(
        &self,
        query: &str,
        model: SearchModelId,
    ) -> Result<Vec<SearchResult>, GatewayError>;
}
