//! State - 置き換えワークフローの状態

use serde::{Deserialize, Serialize};

/// WorkflowState は 1 つの置き換えワークフローの状態
///
/// # 状態遷移
/// - Requesting -> AnimatingOut -> Committing -> AnimatingIn -> Done
/// - Requesting / Committing -> Failed（代替なしで取り除く）
/// - どの状態からでも -> Cancelled（新しいリクエスト、または detach）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Requesting,
    AnimatingOut,
    Committing,
    AnimatingIn,
    Done,
    Failed,
    Cancelled,
}

impl WorkflowState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::Done | WorkflowState::Failed | WorkflowState::Cancelled
        )
    }

    /// May `next` follow `self`?
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, Cancelled) => true,
            (Requesting, AnimatingOut | Failed) => true,
            (AnimatingOut, Committing) => true,
            (Committing, AnimatingIn | Done | Failed) => true,
            (AnimatingIn, Done | Failed) => true,
            _ => false,
        }
    }
}

/// Final result of `ReplacementWorkflow::run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowOutcome {
    /// The source entity was replaced by a substitute.
    Replaced { substitute: super::EntityId },

    /// No substitute (empty result or fetch failure); the source was removed.
    Removed { fetch_failed: bool },

    /// Commit skipped because the source was already gone.
    Skipped,

    /// Superseded or detached. Nothing is written after the cancel point.
    Cancelled,
}

impl WorkflowOutcome {
    /// The terminal `WorkflowState` this outcome corresponds to.
    pub fn terminal_state(&self) -> WorkflowState {
        match self {
            WorkflowOutcome::Replaced { .. } => WorkflowState::Done,
            WorkflowOutcome::Removed { fetch_failed: false } => WorkflowState::Done,
            WorkflowOutcome::Removed { fetch_failed: true } => WorkflowState::Failed,
            WorkflowOutcome::Skipped => WorkflowState::Failed,
            WorkflowOutcome::Cancelled => WorkflowState::Cancelled,
        }
    }
}

/// Status of the follow control on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    NotFollowing,
    Following,
}
