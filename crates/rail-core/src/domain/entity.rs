//! Displayed entities and their transient animation state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EntityId, RailId};

/// Animation phase of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Idle,
    Entering,
    Exiting,
}

/// A named, independently progressed visual property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Opacity,
    Offset,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Opacity => f.write_str("opacity"),
            Channel::Offset => f.write_str("offset"),
        }
    }
}

/// Per-entity animation channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub phase: AnimationPhase,
    pub opacity: f64,
    /// Vertical offset in points; cards slide on the y axis.
    pub offset: f64,
}

impl AnimationState {
    /// Fully visible and at rest.
    pub fn idle() -> Self {
        Self {
            phase: AnimationPhase::Idle,
            opacity: 1.0,
            offset: 0.0,
        }
    }

    /// Start of an incoming card: invisible, shifted up by `y_delta`.
    pub fn entering(y_delta: f64) -> Self {
        Self {
            phase: AnimationPhase::Entering,
            opacity: 0.0,
            offset: -y_delta,
        }
    }

    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Opacity => self.opacity,
            Channel::Offset => self.offset,
        }
    }

    pub fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Opacity => self.opacity = value,
            Channel::Offset => self.offset = value,
        }
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::idle()
    }
}

/// One displayed item (artist, sale, ...).
///
/// `display` is opaque to the rail; it is handed to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,

    #[serde(default)]
    pub display: serde_json::Value,

    #[serde(default)]
    pub animation: AnimationState,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, display: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            display,
            animation: AnimationState::idle(),
        }
    }

    /// List key for this card.
    ///
    /// The same entity may show up in several rails on one screen, so the key
    /// is composed with the rail id.
    pub fn card_key(&self, rail: RailId) -> String {
        format!("{rail}{}", self.id)
    }
}
