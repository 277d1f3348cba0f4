//! Status - rail の状態を外から覗くためのビュー

use serde::{Deserialize, Serialize};

use crate::domain::{Entity, RailId, RailKind};

/// In-flight workflows by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCounts {
    pub requesting: usize,
    pub animating_out: usize,
    pub committing: usize,
    pub animating_in: usize,
}

impl WorkflowCounts {
    pub fn total(&self) -> usize {
        self.requesting + self.animating_out + self.committing + self.animating_in
    }
}

/// Snapshot of one rail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailStatus {
    pub rail_id: RailId,
    pub kind: Option<RailKind>,
    pub revision: u64,
    pub entities: Vec<Entity>,
    pub load_failed: bool,
    pub detached: bool,
    pub in_flight: WorkflowCounts,
}

impl RailStatus {
    /// The rail draws nothing when loading failed or there is nothing to show.
    pub fn is_visible(&self) -> bool {
        !self.load_failed && !self.detached && !self.entities.is_empty()
    }
}
