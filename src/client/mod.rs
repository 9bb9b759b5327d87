//! Cooperative driver between the session core and the gateway
//!
//! Gateway calls run as local tasks on the current thread's `LocalSet`. Their answers come
//! back over a channel and are applied one at a time, in arrival order, by `pump` or
//! `next_update`. Nothing here runs in parallel with the session.

use crate::gateway::{GatewayError, IndexGateway, RepositorySnapshot};
use crate::session::{RepoSession, Settle, Ticket};
use crate::tree::NodePath;
use crate::types::{SearchModelId, SearchResult};
use std::rc::Rc;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinError;

/// A gateway call that finished
#[derive(Debug)]
pub enum Settlement {
    Repository {
        ticket: Ticket,
        outcome: Result<RepositorySnapshot, GatewayError>,
    },
    Query {
        ticket: Ticket,
        outcome: Result<Vec<SearchResult>, GatewayError>,
    },
}

/// What a settlement changed, for the front end to redraw
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    RepositoryLoaded,
    RepositoryFailed(GatewayError),
    ResultsReady { count: usize },
    QueryFailed(GatewayError),
    /// Superseded answer; nothing changed
    Discarded,
}

/// Owns the session and issues its gateway calls.
///
/// `submit_repository` and `submit_query` spawn with `tokio::task::spawn_local`, so they must
/// be called from inside a `LocalSet`.
pub struct Client<G> {
    gateway: Rc<G>,
    session: RepoSession,
    settled_tx: UnboundedSender<Settlement>,
    settled_rx: UnboundedReceiver<Settlement>,
    in_flight: usize,
}

impl<G: IndexGateway + 'static> Client<G> {
    pub fn new(gateway: Rc<G>, default_model: SearchModelId) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            session: RepoSession::new(default_model),
            settled_tx,
            settled_rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &RepoSession {
        &self.session
    }

    /// Number of gateway calls that have not settled yet, stale ones included
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight > 0
    }

    /// Submit a repository URL. Returns false when the session ignored it.
    pub fn submit_repository(&mut self, url: &str) -> bool {
        let Some(pending) = self.session.submit(url) else {
            return false;
        };

        let gateway = Rc::clone(&self.gateway);
        let tx = self.settled_tx.clone();
        self.in_flight += 1;

        let ticket = pending.ticket;
        let call = tokio::task::spawn_local(async move {
            gateway.submit_repository(&pending.url).await
        });
        tokio::task::spawn_local(async move {
            let outcome = call.await.unwrap_or_else(|e| Err(task_failure(e)));
            // The receiver lives as long as the client; a closed channel means nobody cares anymore
            let _ = tx.send(Settlement::Repository { ticket, outcome });
        });

        true
    }

    /// Submit a query with the given model. Returns false when the session ignored it.
    pub fn submit_query(&mut self, query: &str, model: SearchModelId) -> bool {
        let Some(pending) = self.session.submit_query(query, model) else {
            return false;
        };

        let gateway = Rc::clone(&self.gateway);
        let tx = self.settled_tx.clone();
        self.in_flight += 1;

        let ticket = pending.ticket;
        let call = tokio::task::spawn_local(async move {
            gateway.run_query(&pending.query, pending.model).await
        });
        tokio::task::spawn_local(async move {
            let outcome = call.await.unwrap_or_else(|e| Err(task_failure(e)));
            let _ = tx.send(Settlement::Query { ticket, outcome });
        });

        true
    }

    /// Submit a query with the currently selected model
    pub fn search(&mut self, query: &str) -> bool {
        let model = self.session.search().state().model;
        self.submit_query(query, model)
    }

    pub fn select_model(&mut self, model: SearchModelId) {
        self.session.select_model(model);
    }

    pub fn toggle(&mut self, path: &NodePath) -> Option<bool> {
        self.session.toggle(path)
    }

    pub fn collapse_all(&mut self) {
        self.session.collapse_all();
    }

    pub fn change_repo(&mut self) {
        self.session.change_repo();
    }

    /// Apply every settlement that has already arrived, without waiting
    pub fn pump(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        loop {
            match self.settled_rx.try_recv() {
                Ok(settlement) => updates.push(self.apply(settlement)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        updates
    }

    /// Wait for the next settlement and apply it.
    ///
    /// Returns `None` straight away when nothing is in flight.
    pub async fn next_update(&mut self) -> Option<Update> {
        if self.in_flight == 0 {
            return None;
        }
        let settlement = self.settled_rx.recv().await?;
        Some(self.apply(settlement))
    }

    fn apply(&mut self, settlement: Settlement) -> Update {
        self.in_flight = self.in_flight.saturating_sub(1);

        match settlement {
            Settlement::Repository { ticket, outcome } => {
                let failure = outcome.as_ref().err().cloned();
                match (self.session.settle_repository(ticket, outcome), failure) {
                    (Settle::Stale, _) => Update::Discarded,
                    (Settle::Applied, None) => Update::RepositoryLoaded,
                    (Settle::Applied, Some(e)) => Update::RepositoryFailed(e),
                }
            }
            Settlement::Query { ticket, outcome } => {
                let failure = outcome.as_ref().err().cloned();
                match (self.session.settle_query(ticket, outcome), failure) {
                    (Settle::Stale, _) => Update::Discarded,
                    (Settle::Applied, None) => Update::ResultsReady {
                        count: self.session.search().state().results.len(),
                    },
                    (Settle::Applied, Some(e)) => Update::QueryFailed(e),
                }
            }
        }
    }
}

/// A gateway call that panicked still settles, as a network failure
fn task_failure(err: JoinError) -> GatewayError {
    tracing::error!("Gateway task failed: {}", err);
    GatewayError::Network(format!("Gateway task failed: {}", err))
}
