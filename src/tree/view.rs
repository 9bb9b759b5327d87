//! Arena-backed explorer state
//!
//! Nodes live in one flat vector and are reached by `NodePath`. Building and walking the tree
//! use explicit stacks, so nesting depth is bounded only by memory.

use super::{NodeKind, NodePath, TreeNode};

/// Index of a node inside the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone)]
enum Slot {
    File,
    Folder { children: Vec<NodeId>, expanded: bool },
}

#[derive(Debug, Clone)]
struct ArenaNode {
    name: String,
    slot: Slot,
}

/// One line of the explorer as it should currently be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub path: NodePath,
    pub depth: usize,
    pub name: &'a str,
    pub kind: NodeKind,
    /// Always false for files
    pub expanded: bool,
}

/// Expand/collapse state over a repository tree.
///
/// Every folder carries its own flag, collapsed on load. Toggling a folder never touches its
/// ancestors, descendants, or siblings, so a collapsed parent remembers what was open below it.
#[derive(Debug, Clone, Default)]
pub struct FileTreeView {
    nodes: Vec<ArenaNode>,
    roots: Vec<NodeId>,
}

impl FileTreeView {
    /// Build the view from the gateway's root list, keeping children in supplied order
    pub fn new(roots: &[TreeNode]) -> Self {
        let mut view = Self::default();
        let mut pending: Vec<(NodeId, &TreeNode)> = Vec::new();

        for node in roots {
            let id = view.alloc(node);
            view.roots.push(id);
            pending.push((id, node));
        }

        while let Some((id, node)) = pending.pop() {
            if let TreeNode::Folder { children, .. } = node {
                let mut child_ids = Vec::with_capacity(children.len());
                for child in children {
                    let child_id = view.alloc(child);
                    child_ids.push(child_id);
                    pending.push((child_id, child));
                }
                if let Slot::Folder { children, .. } = &mut view.nodes[id.0].slot {
                    *children = child_ids;
                }
            }
        }

        view
    }

    fn alloc(&mut self, node: &TreeNode) -> NodeId {
        let slot = match node {
            TreeNode::File { .. } => Slot::File,
            TreeNode::Folder { .. } => Slot::Folder {
                children: Vec::new(),
                expanded: false,
            },
        };
        self.nodes.push(ArenaNode {
            name: node.name().to_string(),
            slot,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn resolve(&self, path: &NodePath) -> Option<NodeId> {
        let (first, rest) = path.indices().split_first()?;
        let mut current = *self.roots.get(*first)?;
        for index in rest {
            current = match &self.nodes[current.0].slot {
                Slot::Folder { children, .. } => *children.get(*index)?,
                Slot::File => return None,
            };
        }
        Some(current)
    }

    /// Flip the flag of the folder at `path`.
    ///
    /// Returns the new flag, or `None` when the path is unknown or names a file.
    pub fn toggle(&mut self, path: &NodePath) -> Option<bool> {
        let id = self.resolve(path)?;
        match &mut self.nodes[id.0].slot {
            Slot::Folder { expanded, .. } => {
                *expanded = !*expanded;
                tracing::debug!(
                    "Folder {} is now {}",
                    path,
                    if *expanded { "open" } else { "closed" }
                );
                Some(*expanded)
            }
            Slot::File => None,
        }
    }

    /// Flag of the folder at `path`, `None` for files and unknown paths
    pub fn is_expanded(&self, path: &NodePath) -> Option<bool> {
        match &self.nodes[self.resolve(path)?.0].slot {
            Slot::Folder { expanded, .. } => Some(*expanded),
            Slot::File => None,
        }
    }

    /// Kind and name of the node at `path`
    pub fn node(&self, path: &NodePath) -> Option<(NodeKind, &str)> {
        let node = &self.nodes[self.resolve(path)?.0];
        let kind = match node.slot {
            Slot::File => NodeKind::File,
            Slot::Folder { .. } => NodeKind::Folder,
        };
        Some((kind, node.name.as_str()))
    }

    /// Close every folder
    pub fn collapse_all(&mut self) {
        for node in &mut self.nodes {
            if let Slot::Folder { expanded, .. } = &mut node.slot {
                *expanded = false;
            }
        }
    }

    /// Depth-first preorder over everything currently visible.
    ///
    /// A folder's subtree is only entered while that folder is expanded.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        let mut stack: Vec<(NodeId, NodePath)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(index, id)| (*id, NodePath::new(vec![index])))
            .collect();

        while let Some((id, path)) = stack.pop() {
            let node = &self.nodes[id.0];
            let (kind, expanded) = match &node.slot {
                Slot::File => (NodeKind::File, false),
                Slot::Folder { children, expanded } => {
                    if *expanded {
                        for (index, child) in children.iter().enumerate().rev() {
                            stack.push((*child, path.child(index)));
                        }
                    }
                    (NodeKind::Folder, *expanded)
                }
            };

            rows.push(TreeRow {
                depth: path.depth(),
                path,
                name: &node.name,
                kind,
                expanded,
            });
        }

        rows
    }

    /// Total number of nodes, visible or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
