//! Session management
//!
//! `RepoSession` is the top-level mode switch: no repository, indexing one, or browsing one.
//! It owns the file tree view and the search session of the loaded repository and decides
//! which gateway answers are still wanted.

mod search;
mod sequence;

pub use search::{HighlightedResult, PendingQuery, SearchSession, SearchState};
pub use sequence::{RequestSequence, Ticket};

use crate::gateway::{GatewayError, RepositorySnapshot};
use crate::tree::{FileTreeView, NodePath};
use crate::types::{RepositoryMetadata, SearchModelId, SearchResult};
use std::sync::Arc;

/// What happened to a gateway answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The answer belonged to the latest request and was applied
    Applied,
    /// A newer request (or a reset) superseded it; nothing changed
    Stale,
}

/// A loaded repository
#[derive(Debug, Clone)]
pub struct LoadedRepository {
    pub metadata: Arc<RepositoryMetadata>,
    pub tree: FileTreeView,
}

/// Repository session mode
#[derive(Debug, Clone, Default)]
pub enum RepoState {
    /// Waiting for the operator to pick a repository
    #[default]
    Empty,
    /// The gateway is indexing `url`
    Loading { url: String },
    Loaded(LoadedRepository),
}

impl RepoState {
    pub fn name(&self) -> &'static str {
        match self {
            RepoState::Empty => "empty",
            RepoState::Loading { .. } => "loading",
            RepoState::Loaded(_) => "loaded",
        }
    }
}

/// A repository submission the caller must hand to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRepository {
    pub ticket: Ticket,
    /// Trimmed URL
    pub url: String,
}

/// Top-level session over one repository at a time
#[derive(Debug, Clone)]
pub struct RepoSession {
    state: RepoState,
    sequence: RequestSequence,
    search: SearchSession,
}

impl RepoSession {
    pub fn new(default_model: SearchModelId) -> Self {
        Self {
            state: RepoState::Empty,
            sequence: RequestSequence::default(),
            search: SearchSession::new(default_model),
        }
    }

    pub fn state(&self) -> &RepoState {
        &self.state
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, RepoState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RepoState::Loading { .. })
    }

    pub fn metadata(&self) -> Option<&RepositoryMetadata> {
        match &self.state {
            RepoState::Loaded(repo) => Some(&repo.metadata),
            _ => None,
        }
    }

    pub fn tree(&self) -> Option<&FileTreeView> {
        match &self.state {
            RepoState::Loaded(repo) => Some(&repo.tree),
            _ => None,
        }
    }

    /// Ask for `url` to be indexed.
    ///
    /// Ignored when the URL is blank or a repository is already loaded. Resubmitting while a
    /// load is in flight starts a new request and retires the old one.
    pub fn submit(&mut self, url: &str) -> Option<PendingRepository> {
        let url = url.trim();
        if url.is_empty() {
            tracing::debug!("Ignoring blank repository URL");
            return None;
        }

        if self.is_loaded() {
            tracing::debug!("Repository already loaded; change repository before submitting {}", url);
            return None;
        }

        let ticket = self.sequence.issue();
        self.state = RepoState::Loading {
            url: url.to_string(),
        };
        tracing::info!("Indexing repository {} (request #{})", url, ticket.seq());

        Some(PendingRepository {
            ticket,
            url: url.to_string(),
        })
    }

    /// Apply the gateway's answer to a repository submission
    pub fn settle_repository(
        &mut self,
        ticket: Ticket,
        outcome: Result<RepositorySnapshot, GatewayError>,
    ) -> Settle {
        if !self.sequence.is_current(ticket) {
            tracing::debug!("Discarding stale response for repository request #{}", ticket.seq());
            return Settle::Stale;
        }

        self.state = match outcome {
            Ok(snapshot) => {
                let tree = FileTreeView::new(&snapshot.tree);
                tracing::info!(
                    "Loaded {} ({} tree nodes)",
                    snapshot.metadata.full_name(),
                    tree.len()
                );
                RepoState::Loaded(LoadedRepository {
                    metadata: Arc::new(snapshot.metadata),
                    tree,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to load repository (request #{}): {}", ticket.seq(), e);
                RepoState::Empty
            }
        };

        Settle::Applied
    }

    /// Drop the current repository, whatever state the session is in.
    ///
    /// Any repository or query request still in flight is discarded when it settles.
    pub fn change_repo(&mut self) {
        if !matches!(self.state, RepoState::Empty) {
            tracing::info!("Leaving {} repository session", self.state.name());
        }
        self.sequence.invalidate();
        self.search.reset();
        self.state = RepoState::Empty;
    }

    /// Flip a folder of the loaded repository's tree
    pub fn toggle(&mut self, path: &NodePath) -> Option<bool> {
        match &mut self.state {
            RepoState::Loaded(repo) => repo.tree.toggle(path),
            _ => None,
        }
    }

    /// Collapse every folder of the loaded repository's tree
    pub fn collapse_all(&mut self) {
        if let RepoState::Loaded(repo) = &mut self.state {
            repo.tree.collapse_all();
        }
    }

    /// Start a query against the loaded repository; ignored in any other state
    pub fn submit_query(&mut self, query: &str, model: SearchModelId) -> Option<PendingQuery> {
        if !self.is_loaded() {
            tracing::debug!("Ignoring query while no repository is loaded");
            return None;
        }
        self.search.submit_query(query, model)
    }

    pub fn settle_query(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<SearchResult>, GatewayError>,
    ) -> Settle {
        self.search.settle(ticket, outcome)
    }

    pub fn select_model(&mut self, model: SearchModelId) {
        self.search.select_model(model);
    }
}
