//! Renderer port - 描画側への通知
//!
//! 通知は rail のロックを保持したまま同期的に呼ばれる。
//! 実装はブロックせず、rail に再入しないこと。

use crate::domain::{Channel, Entity, EntityId, FollowStatus};

pub trait Renderer: Send + Sync {
    /// Called after every committed list mutation.
    ///
    /// May be called with an identical list; treat that as a no-op render.
    fn on_state_changed(&self, entities: &[Entity]);

    /// Called on each animation tick. `id` may already be gone from the list.
    fn on_animation_progress(&self, id: &EntityId, channel: Channel, value: f64);

    /// Follow control on a card changed status.
    fn on_follow_status(&self, _id: &EntityId, _status: FollowStatus) {}
}

/// Renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn on_state_changed(&self, _entities: &[Entity]) {}

    fn on_animation_progress(&self, _id: &EntityId, _channel: Channel, _value: f64) {}
}
