//! Request registry: one live ReplacementRequest per source id.
//!
//! Design:
//! - Tokens come from one monotonic counter per rail.
//! - Starting a request for an id that already has one cancels the old one
//!   (its watch channel flips to `true`) before the new one is stored.
//! - A result is only applied while its token is still the current one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::app::status::WorkflowCounts;
use crate::domain::{EntityId, ReplacementRequest, RequestToken, WorkflowState};

/// The workflow's side of a registered request.
///
/// Dropping the registry entry (or cancelling it) wakes `cancelled()`.
#[derive(Debug)]
pub struct Ticket {
    pub source: EntityId,
    pub token: RequestToken,
    cancel_rx: watch::Receiver<bool>,
}

impl Ticket {
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&mut self) {
        // a closed channel means the entry is gone, same thing for us
        let _ = self.cancel_rx.wait_for(|cancelled| *cancelled).await;
    }
}

struct InFlight {
    request: ReplacementRequest,
    cancel_tx: watch::Sender<bool>,
}

impl InFlight {
    fn cancel(&mut self) {
        self.request.cancel();
        // ignore send error: the workflow may already have dropped its ticket
        let _ = self.cancel_tx.send(true);
    }
}

pub struct RequestRegistry {
    requests: HashMap<EntityId, InFlight>,
    last_token: RequestToken,
}

/// Result of `RequestRegistry::begin`.
pub struct Begun {
    pub ticket: Ticket,
    /// Token of the request this one cancelled, if any.
    pub superseded: Option<RequestToken>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            last_token: RequestToken::new(0),
        }
    }

    /// Register a new request for `source`, cancelling any live one.
    pub fn begin(&mut self, source: EntityId, started_at: DateTime<Utc>) -> Begun {
        let token = self.last_token.next();
        self.last_token = token;

        let superseded = self.requests.remove(&source).map(|mut old| {
            old.cancel();
            old.request.token
        });

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let request = ReplacementRequest::new(source.clone(), token, started_at);
        self.requests.insert(
            source.clone(),
            InFlight {
                request,
                cancel_tx,
            },
        );

        Begun {
            ticket: Ticket {
                source,
                token,
                cancel_rx,
            },
            superseded,
        }
    }

    /// Is `token` still the live request for `source`?
    pub fn is_current(&self, source: &EntityId, token: RequestToken) -> bool {
        self.requests
            .get(source)
            .is_some_and(|f| f.request.token == token && f.request.is_live())
    }

    /// Move the request to `next`. False when it is no longer current or the
    /// transition is illegal.
    pub fn advance(&mut self, source: &EntityId, token: RequestToken, next: WorkflowState) -> bool {
        match self.requests.get_mut(source) {
            Some(f) if f.request.token == token && f.request.is_live() => f.request.advance(next),
            _ => false,
        }
    }

    /// Drop the entry if it still belongs to `token`.
    pub fn release(&mut self, source: &EntityId, token: RequestToken) {
        if self
            .requests
            .get(source)
            .is_some_and(|f| f.request.token == token)
        {
            self.requests.remove(source);
        }
    }

    /// Cancel every live request. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for (_, mut f) in self.requests.drain() {
            if f.request.is_live() {
                cancelled += 1;
            }
            f.cancel();
        }
        cancelled
    }

    pub fn state_of(&self, source: &EntityId) -> Option<WorkflowState> {
        self.requests.get(source).map(|f| f.request.state())
    }

    pub fn get(&self, source: &EntityId) -> Option<&ReplacementRequest> {
        self.requests.get(source).map(|f| &f.request)
    }

    pub fn counts(&self) -> WorkflowCounts {
        let mut counts = WorkflowCounts::default();
        for f in self.requests.values() {
            match f.request.state() {
                WorkflowState::Requesting => counts.requesting += 1,
                WorkflowState::AnimatingOut => counts.animating_out += 1,
                WorkflowState::Committing => counts.committing += 1,
                WorkflowState::AnimatingIn => counts.animating_in += 1,
                WorkflowState::Done | WorkflowState::Failed | WorkflowState::Cancelled => {}
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}
