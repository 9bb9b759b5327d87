//! Repository file tree
//!
//! `TreeNode` is the tree exactly as the gateway reported it. `FileTreeView` copies it into an
//! arena and owns the per-folder expand/collapse flags.

mod view;

pub use view::{FileTreeView, TreeRow};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A node of the repository tree as supplied by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeNode {
    File { name: String },
    Folder { name: String, children: Vec<TreeNode> },
}

impl TreeNode {
    pub fn file(name: impl Into<String>) -> Self {
        TreeNode::File { name: name.into() }
    }

    pub fn folder(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Folder {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::File { name } | TreeNode::Folder { name, .. } => name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::File { .. } => NodeKind::File,
            TreeNode::Folder { .. } => NodeKind::Folder,
        }
    }
}

/// Whether a node is a leaf file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

/// Structural address of a node: child indices starting from the root list.
///
/// Stored zero-based; displayed and parsed one-based (`1.3.2`) for operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of levels below the root list
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| (i + 1).to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// Error returned for malformed node paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid node path '{0}': expected dot-separated positions starting at 1, e.g. 2.1")]
pub struct InvalidNodePath(pub String);

impl FromStr for NodePath {
    type Err = InvalidNodePath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidNodePath(s.to_string()));
        }

        let indices = trimmed
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(position) if position > 0 => Ok(position - 1),
                _ => Err(InvalidNodePath(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(indices))
    }
}
