//! Rail: RailState + request registry behind one lock.
//!
//! Every write (list mutation, token check, cancellation) happens inside one
//! critical section, so a commit can never interleave with another commit or
//! with a detach. The renderer is notified while the lock is held; it sees
//! commits in order and never a half-updated list.

mod registry;
mod state;

pub use registry::{Begun, RequestRegistry, Ticket};
pub use state::{RailState, Replaced};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::status::WorkflowCounts;
use crate::domain::{
    AnimationPhase, AnimationState, Channel, Entity, EntityId, RailError, RailId, RequestToken,
    WorkflowState,
};
use crate::ports::Renderer;

/// Result of `Rail::commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Substituted { substitute: EntityId, revision: u64 },
    Removed { revision: u64 },
    /// The source was already gone; nothing written.
    NotFound,
    /// The request was superseded or the rail detached; nothing written.
    Cancelled,
}

struct RailInner {
    state: RailState,
    requests: RequestRegistry,
    detached: bool,
}

pub struct Rail {
    id: RailId,
    inner: Mutex<RailInner>,
    renderer: Arc<dyn Renderer>,
}

impl Rail {
    pub fn new(id: RailId, y_delta: f64, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            id,
            inner: Mutex::new(RailInner {
                state: RailState::new(y_delta),
                requests: RequestRegistry::new(),
                detached: false,
            }),
            renderer,
        }
    }

    pub fn id(&self) -> RailId {
        self.id
    }

    pub async fn initialize(&self, entities: Vec<Entity>) -> Result<u64, RailError> {
        let mut inner = self.inner.lock().await;
        let revision = inner.state.initialize(entities)?;
        self.renderer.on_state_changed(inner.state.entities());
        Ok(revision)
    }

    /// Direct replace, without a request token.
    pub async fn replace(&self, old_id: &EntityId, new: Option<Entity>) -> Result<Replaced, RailError> {
        let mut inner = self.inner.lock().await;
        let replaced = inner.state.replace(old_id, new)?;
        self.renderer.on_state_changed(inner.state.entities());
        Ok(replaced)
    }

    /// Register a replacement request. `None` once the rail is detached.
    pub async fn begin_request(&self, source: EntityId, started_at: DateTime<Utc>) -> Option<Begun> {
        let mut inner = self.inner.lock().await;
        if inner.detached {
            return None;
        }
        Some(inner.requests.begin(source, started_at))
    }

    pub async fn is_current(&self, ticket: &Ticket) -> bool {
        let inner = self.inner.lock().await;
        !inner.detached && inner.requests.is_current(&ticket.source, ticket.token)
    }

    pub async fn advance(&self, ticket: &Ticket, next: WorkflowState) -> bool {
        let mut inner = self.inner.lock().await;
        !inner.detached && inner.requests.advance(&ticket.source, ticket.token, next)
    }

    /// Apply the workflow's result, if its token is still current.
    ///
    /// A substitute that is already shown at another index falls back to
    /// plain removal.
    pub async fn commit(&self, ticket: &Ticket, substitute: Option<Entity>) -> Commit {
        let mut inner = self.inner.lock().await;
        if inner.detached || !inner.requests.is_current(&ticket.source, ticket.token) {
            return Commit::Cancelled;
        }

        let substitute_id = substitute.as_ref().map(|e| e.id.clone());
        let result = match inner.state.replace(&ticket.source, substitute) {
            Err(RailError::DuplicateEntity(dup)) => {
                debug!(rail = %self.id, source = %ticket.source, duplicate = %dup, "substitute already shown, removing instead");
                inner.state.replace(&ticket.source, None)
            }
            other => other,
        };

        match result {
            Ok(Replaced::Substituted { revision, .. }) => {
                self.renderer.on_state_changed(inner.state.entities());
                match substitute_id {
                    Some(substitute) => Commit::Substituted {
                        substitute,
                        revision,
                    },
                    None => Commit::Removed { revision },
                }
            }
            Ok(Replaced::Removed { revision, .. }) => {
                self.renderer.on_state_changed(inner.state.entities());
                Commit::Removed { revision }
            }
            Err(_) => Commit::NotFound,
        }
    }

    pub async fn release(&self, source: &EntityId, token: RequestToken) {
        let mut inner = self.inner.lock().await;
        inner.requests.release(source, token);
    }

    /// Clean up after a workflow that went away without finishing.
    ///
    /// No-op unless `token` still owns `source`. A card left mid-exit is put
    /// back at rest, since nothing was committed for it.
    pub async fn abandon(&self, source: &EntityId, token: RequestToken) {
        let mut inner = self.inner.lock().await;
        self.abandon_locked(&mut inner, source, token);
    }

    /// `abandon` without waiting. False when the lock is busy.
    pub fn try_abandon(&self, source: &EntityId, token: RequestToken) -> bool {
        match self.inner.try_lock() {
            Ok(mut inner) => {
                self.abandon_locked(&mut inner, source, token);
                true
            }
            Err(_) => false,
        }
    }

    fn abandon_locked(&self, inner: &mut RailInner, source: &EntityId, token: RequestToken) {
        if !inner
            .requests
            .get(source)
            .is_some_and(|r| r.token == token)
        {
            return;
        }
        let state = inner.requests.state_of(source);
        inner.requests.release(source, token);
        debug!(rail = %self.id, %source, %token, ?state, "abandoned request released");
        if inner.detached || state != Some(WorkflowState::AnimatingOut) {
            return;
        }
        let rest = AnimationState::idle();
        if inner.state.set_animation_phase(source, rest.phase) {
            for channel in [Channel::Opacity, Channel::Offset] {
                let value = rest.value(channel);
                inner.state.set_animation_progress(source, channel, value);
                self.renderer.on_animation_progress(source, channel, value);
            }
        }
    }

    /// Write animation values and forward them to the renderer.
    ///
    /// Values for an id that is no longer in the list are still forwarded;
    /// the renderer tolerates those. Nothing is written once detached.
    pub async fn apply_progress(&self, id: &EntityId, values: &[(Channel, f64)]) {
        let mut inner = self.inner.lock().await;
        if inner.detached {
            return;
        }
        for &(channel, value) in values {
            inner.state.set_animation_progress(id, channel, value);
            self.renderer.on_animation_progress(id, channel, value);
        }
    }

    pub async fn set_animation_progress(&self, id: &EntityId, channel: Channel, value: f64) -> bool {
        let mut inner = self.inner.lock().await;
        !inner.detached && inner.state.set_animation_progress(id, channel, value)
    }

    pub async fn set_animation_phase(&self, id: &EntityId, phase: AnimationPhase) -> bool {
        let mut inner = self.inner.lock().await;
        !inner.detached && inner.state.set_animation_phase(id, phase)
    }

    /// Cancel every in-flight request and refuse new ones.
    ///
    /// Once this returns no workflow can write to the list.
    pub async fn detach(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.detached = true;
        inner.requests.cancel_all()
    }

    pub async fn is_detached(&self) -> bool {
        self.inner.lock().await.detached
    }

    pub async fn snapshot(&self) -> Vec<Entity> {
        self.inner.lock().await.state.entities().to_vec()
    }

    pub async fn contains(&self, id: &EntityId) -> bool {
        self.inner.lock().await.state.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.state.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.state.is_empty()
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.lock().await.state.is_initialized()
    }

    pub async fn revision(&self) -> u64 {
        self.inner.lock().await.state.revision()
    }

    pub async fn workflow_state(&self, source: &EntityId) -> Option<WorkflowState> {
        self.inner.lock().await.requests.state_of(source)
    }

    pub async fn workflow_counts(&self) -> WorkflowCounts {
        self.inner.lock().await.requests.counts()
    }
}
