//! JSON shapes exchanged with the indexing backend

use super::{GatewayError, RepositorySnapshot};
use crate::tree::TreeNode;
use crate::types::{RepositoryMetadata, SearchModelId, SearchResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Body of `POST /process`
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest<'a> {
    pub repo_url: &'a str,
}

/// Body of `POST /search`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub model: SearchModelId,
}

/// Response of `POST /process`.
///
/// The backend answers a malformed URL with `200 {"error": ...}` instead of an HTTP error.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<WireDetails>,
    #[serde(default, rename = "fileTree")]
    pub file_tree: Vec<WireNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireDetails {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireNodeType {
    File,
    Folder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: WireNodeType,
    #[serde(default)]
    pub children: Option<Vec<WireNode>>,
}

/// Result ids arrive as numbers from some backends and strings from others
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireResult {
    pub id: WireId,
    pub filename: String,
    pub score: f64,
    pub code: String,
    #[serde(default, alias = "sourceModel")]
    pub source_model: Option<SearchModelId>,
}

/// Response of `POST /search`: a bare list, or the list wrapped in `results`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    List(Vec<WireResult>),
    Wrapped { results: Vec<WireResult> },
}

impl QueryResponse {
    pub fn into_inner(self) -> Vec<WireResult> {
        match self {
            QueryResponse::List(results) | QueryResponse::Wrapped { results } => results,
        }
    }
}

/// Body of a FastAPI error response
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ProcessResponse {
    /// Convert into the domain snapshot, enforcing the node shape rules
    pub fn into_snapshot(self) -> Result<RepositorySnapshot, GatewayError> {
        if let Some(error) = self.error {
            return Err(GatewayError::Validation(error));
        }

        let details = self.details.ok_or_else(|| {
            GatewayError::Network("Malformed response: missing repository details".to_string())
        })?;

        let tree = build_tree(self.file_tree)?;

        Ok(RepositorySnapshot {
            metadata: RepositoryMetadata {
                owner: details.owner,
                name: details.name,
                description: details.description.unwrap_or_default(),
                star_count: details.stars,
                fork_count: details.forks,
                avatar_url: details.avatar,
                default_branch: details.default_branch,
            },
            tree,
        })
    }
}

/// A folder whose children are still being converted
struct Frame {
    name: String,
    pending: std::vec::IntoIter<WireNode>,
    built: Vec<TreeNode>,
}

impl Frame {
    fn new(name: String, children: Vec<WireNode>) -> Self {
        Self {
            name,
            built: Vec::with_capacity(children.len()),
            pending: children.into_iter(),
        }
    }
}

/// Convert the wire tree with an explicit stack, keeping children in order.
///
/// A `folder` without `children` is empty; a `file` with children is malformed.
fn build_tree(roots: Vec<WireNode>) -> Result<Vec<TreeNode>, GatewayError> {
    // The bottom frame stands for the root list and is never turned into a folder
    let mut stack = vec![Frame::new(String::new(), roots)];

    while let Some(mut frame) = stack.pop() {
        match frame.pending.next() {
            Some(child) => match child.node_type {
                WireNodeType::File => {
                    if child.children.as_ref().is_some_and(|c| !c.is_empty()) {
                        return Err(GatewayError::Network(format!(
                            "Malformed response: file '{}' has children",
                            child.name
                        )));
                    }
                    frame.built.push(TreeNode::File { name: child.name });
                    stack.push(frame);
                }
                WireNodeType::Folder => {
                    let nested = Frame::new(child.name, child.children.unwrap_or_default());
                    stack.push(frame);
                    stack.push(nested);
                }
            },
            None => match stack.last_mut() {
                Some(parent) => parent.built.push(TreeNode::Folder {
                    name: frame.name,
                    children: frame.built,
                }),
                None => return Ok(frame.built),
            },
        }
    }

    Ok(Vec::new())
}

/// Decode a response body without a nesting limit.
///
/// Repository trees can nest far deeper than serde_json's default limit allows; the stack
/// grows on demand instead.
pub fn decode<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Convert query results, checking scores and id uniqueness.
///
/// Results missing `source_model` are attributed to the model that was asked.
pub fn into_results(
    wire: Vec<WireResult>,
    requested: SearchModelId,
) -> Result<Vec<SearchResult>, GatewayError> {
    let mut seen = HashSet::with_capacity(wire.len());
    let mut results = Vec::with_capacity(wire.len());

    for item in wire {
        let id = match item.id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        };

        if !item.score.is_finite() || !(0.0..=1.0).contains(&item.score) {
            return Err(GatewayError::Network(format!(
                "Malformed response: score {} of result '{}' outside [0, 1]",
                item.score, id
            )));
        }

        if !seen.insert(id.clone()) {
            return Err(GatewayError::Network(format!(
                "Malformed response: duplicate result id '{}'",
                id
            )));
        }

        results.push(SearchResult {
            id,
            filename: item.filename,
            score: item.score,
            code: item.code,
            source_model: item.source_model.unwrap_or(requested),
        });
    }

    Ok(results)
}
