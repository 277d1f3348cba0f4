//! In-flight replacement requests.

use chrono::{DateTime, Utc};

use super::ids::{EntityId, RequestToken};
use super::state::WorkflowState;

/// One in-flight "find a substitute for entity X" operation.
///
/// Design:
/// - The rail keeps at most one live request per `source_id`.
/// - State transitions go through methods so illegal jumps are caught.
#[derive(Debug, Clone)]
pub struct ReplacementRequest {
    pub source_id: EntityId,
    pub token: RequestToken,
    pub started_at: DateTime<Utc>,
    pub cancelled: bool,
    state: WorkflowState,
}

impl ReplacementRequest {
    pub fn new(source_id: EntityId, token: RequestToken, started_at: DateTime<Utc>) -> Self {
        Self {
            source_id,
            token,
            started_at,
            cancelled: false,
            state: WorkflowState::Requesting,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Advance to `next`. Returns false (and keeps the state) for an illegal
    /// transition.
    pub fn advance(&mut self, next: WorkflowState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.advance(WorkflowState::Cancelled);
    }

    pub fn is_live(&self) -> bool {
        !self.cancelled && !self.state.is_terminal()
    }
}
