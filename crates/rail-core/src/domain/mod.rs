//! Domain model (IDs, entities, workflow states, requests, events, errors).

pub mod entity;
pub mod errors;
pub mod events;
pub mod ids;
pub mod rail_kind;
pub mod request;
pub mod state;

pub use self::entity::{AnimationPhase, AnimationState, Channel, Entity};
pub use self::errors::{FetchError, RailError};
pub use self::events::RailEvent;
pub use self::ids::{EntityId, RailId, RequestToken};
pub use self::rail_kind::{RailDescriptor, RailKind};
pub use self::request::ReplacementRequest;
pub use self::state::{FollowStatus, WorkflowOutcome, WorkflowState};
