//! Search panel state
//!
//! Each transition installs a fresh `SearchState`; answers to superseded queries are dropped.

use super::sequence::{RequestSequence, Ticket};
use super::Settle;
use crate::gateway::GatewayError;
use crate::highlight::highlight_lines;
use crate::types::{SearchModelId, SearchResult};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A result paired with the lines the highlight heuristic picked for it
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedResult {
    pub result: SearchResult,
    pub lines: BTreeSet<usize>,
}

/// Snapshot of the search panel. Never mutated in place; each transition installs a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Query text as typed
    pub query: String,
    pub model: SearchModelId,
    pub busy: bool,
    /// In the gateway's order (descending score)
    pub results: Arc<[HighlightedResult]>,
}

impl SearchState {
    fn idle(model: SearchModelId) -> Self {
        Self {
            query: String::new(),
            model,
            busy: false,
            results: Arc::from(Vec::new()),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.query.is_empty() && !self.busy && self.results.is_empty()
    }
}

/// A query the caller must hand to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub ticket: Ticket,
    /// Trimmed query text
    pub query: String,
    pub model: SearchModelId,
}

/// Query text, model selection, busy flag and results for the loaded repository
#[derive(Debug, Clone)]
pub struct SearchSession {
    state: Arc<SearchState>,
    sequence: RequestSequence,
    default_model: SearchModelId,
}

impl SearchSession {
    pub fn new(default_model: SearchModelId) -> Self {
        Self {
            state: Arc::new(SearchState::idle(default_model)),
            sequence: RequestSequence::default(),
            default_model,
        }
    }

    /// Current state
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Shared handle to the current state; stays consistent after later transitions
    pub fn snapshot(&self) -> Arc<SearchState> {
        Arc::clone(&self.state)
    }

    /// Start a query. Blank queries are ignored and leave the state untouched.
    pub fn submit_query(&mut self, query: &str, model: SearchModelId) -> Option<PendingQuery> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            tracing::debug!("Ignoring blank query");
            return None;
        }

        let ticket = self.sequence.issue();
        self.state = Arc::new(SearchState {
            query: query.to_string(),
            model,
            busy: true,
            results: Arc::clone(&self.state.results),
        });

        tracing::info!(
            "Query #{} '{}' against {}",
            ticket.seq(),
            trimmed,
            model.label()
        );

        Some(PendingQuery {
            ticket,
            query: trimmed.to_string(),
            model,
        })
    }

    /// Apply the gateway's answer to `ticket`, unless a newer query has been issued since.
    ///
    /// A failure empties the results, exactly like a search that found nothing.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<SearchResult>, GatewayError>,
    ) -> Settle {
        if !self.sequence.is_current(ticket) {
            tracing::debug!("Discarding stale response for query #{}", ticket.seq());
            return Settle::Stale;
        }

        let results: Vec<HighlightedResult> = match outcome {
            Ok(results) => {
                tracing::info!("Query #{} returned {} results", ticket.seq(), results.len());
                results
                    .into_iter()
                    .map(|result| HighlightedResult {
                        lines: highlight_lines(&result.code, &self.state.query),
                        result,
                    })
                    .collect()
            }
            Err(e) => {
                tracing::warn!("Query #{} failed: {}", ticket.seq(), e);
                Vec::new()
            }
        };

        self.state = Arc::new(SearchState {
            query: self.state.query.clone(),
            model: self.state.model,
            busy: false,
            results: Arc::from(results),
        });

        Settle::Applied
    }

    /// Change the selected model for the next query
    pub fn select_model(&mut self, model: SearchModelId) {
        if self.state.model == model {
            return;
        }
        self.state = Arc::new(SearchState {
            model,
            ..(*self.state).clone()
        });
    }

    /// Back to the idle state; responses still in flight will be discarded
    pub fn reset(&mut self) {
        self.sequence.invalidate();
        self.state = Arc::new(SearchState::idle(self.default_model));
    }
}
