//! Events - ドメインイベント
//!
//! EventSink に流すテレメトリ用のイベント。ログ（tracing）とは別に、
//! テストや集計で「何が起きたか」を構造化して追えるようにする。

use serde::{Deserialize, Serialize};

use super::ids::{EntityId, RailId, RequestToken};
use super::state::WorkflowOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RailEvent {
    /// The initial rail fetch failed; the rail stays hidden.
    LoadFailed { rail: RailId, error: String },

    ReplacementRequested {
        rail: RailId,
        source: EntityId,
        token: RequestToken,
    },

    /// A newer request for the same source cancelled this one.
    Superseded {
        rail: RailId,
        source: EntityId,
        token: RequestToken,
    },

    FetchFailed {
        rail: RailId,
        source: EntityId,
        error: String,
    },

    NoSubstitute { rail: RailId, source: EntityId },

    Committed {
        rail: RailId,
        source: EntityId,
        substitute: Option<EntityId>,
        revision: u64,
    },

    Finished {
        rail: RailId,
        source: EntityId,
        token: RequestToken,
        outcome: WorkflowOutcome,
    },

    Detached { rail: RailId, cancelled: usize },
}

impl RailEvent {
    /// Short name, matches the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            RailEvent::LoadFailed { .. } => "load_failed",
            RailEvent::ReplacementRequested { .. } => "replacement_requested",
            RailEvent::Superseded { .. } => "superseded",
            RailEvent::FetchFailed { .. } => "fetch_failed",
            RailEvent::NoSubstitute { .. } => "no_substitute",
            RailEvent::Committed { .. } => "committed",
            RailEvent::Finished { .. } => "finished",
            RailEvent::Detached { .. } => "detached",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn name_matches_serialized_tag() {
        let ev = RailEvent::FetchFailed {
            rail: RailId::from_ulid(Ulid::new()),
            source: EntityId::new("c"),
            error: "transport error: reset".to_string(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], ev.name());
        assert_eq!(v["source"], "c");
    }
}
