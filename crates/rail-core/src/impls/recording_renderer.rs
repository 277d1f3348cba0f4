//! RecordingRenderer - 通知を記録するだけの Renderer（テスト・デモ用）
//!
//! # 記録するもの
//! - on_state_changed の呼び出し回数と、内容ハッシュが変わった回数
//! - 最後に受け取ったリスト
//! - アニメーションの tick（id, channel, value）
//! - follow ボタンの状態変化

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{Channel, Entity, EntityId, FollowStatus};
use crate::ports::Renderer;

#[derive(Default)]
struct Recorded {
    state_changes: usize,
    visible_changes: usize,
    last_hash: Option<u64>,
    last: Vec<Entity>,
    progress: Vec<(EntityId, Channel, f64)>,
    follow: Vec<(EntityId, FollowStatus)>,
}

#[derive(Default)]
pub struct RecordingRenderer {
    inner: Mutex<Recorded>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hash of the list content as the user would see it.
    pub fn content_hash(entities: &[Entity]) -> u64 {
        let mut hasher = DefaultHasher::new();
        // serde_json gives a stable text form even with f64 and JSON payloads
        serde_json::to_string(entities)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }

    /// Number of `on_state_changed` calls.
    pub fn state_changes(&self) -> usize {
        self.lock().state_changes
    }

    /// Number of calls whose content differed from the previous one.
    pub fn visible_changes(&self) -> usize {
        self.lock().visible_changes
    }

    pub fn last_state(&self) -> Vec<Entity> {
        self.lock().last.clone()
    }

    pub fn last_ids(&self) -> Vec<String> {
        self.lock().last.iter().map(|e| e.id.to_string()).collect()
    }

    pub fn progress_for(&self, id: &EntityId) -> Vec<(Channel, f64)> {
        self.lock()
            .progress
            .iter()
            .filter(|(pid, _, _)| pid == id)
            .map(|&(_, c, v)| (c, v))
            .collect()
    }

    /// Ids that received at least one animation tick, in first-seen order.
    pub fn animated_ids(&self) -> Vec<EntityId> {
        let mut seen: Vec<EntityId> = Vec::new();
        for (id, _, _) in self.lock().progress.iter() {
            if !seen.contains(id) {
                seen.push(id.clone());
            }
        }
        seen
    }

    pub fn follow_statuses(&self) -> Vec<(EntityId, FollowStatus)> {
        self.lock().follow.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn on_state_changed(&self, entities: &[Entity]) {
        let hash = Self::content_hash(entities);
        let mut rec = self.lock();
        rec.state_changes += 1;
        if rec.last_hash != Some(hash) {
            rec.visible_changes += 1;
            rec.last_hash = Some(hash);
        }
        rec.last = entities.to_vec();
    }

    fn on_animation_progress(&self, id: &EntityId, channel: Channel, value: f64) {
        self.lock().progress.push((id.clone(), channel, value));
    }

    fn on_follow_status(&self, id: &EntityId, status: FollowStatus) {
        self.lock().follow.push((id.clone(), status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_list_twice_is_not_a_visible_change() {
        let r = RecordingRenderer::new();
        let list = vec![Entity::new("a", json!({})), Entity::new("b", json!({}))];

        r.on_state_changed(&list);
        r.on_state_changed(&list);

        assert_eq!(r.state_changes(), 2);
        assert_eq!(r.visible_changes(), 1);

        r.on_state_changed(&list[..1]);
        assert_eq!(r.visible_changes(), 2);
        assert_eq!(r.last_ids(), vec!["a"]);
    }

    #[test]
    fn progress_is_filtered_by_id() {
        let r = RecordingRenderer::new();
        r.on_animation_progress(&EntityId::new("a"), Channel::Opacity, 0.5);
        r.on_animation_progress(&EntityId::new("b"), Channel::Offset, 3.0);
        assert_eq!(
            r.progress_for(&EntityId::new("b")),
            vec![(Channel::Offset, 3.0)]
        );
        assert_eq!(
            r.animated_ids(),
            vec![EntityId::new("a"), EntityId::new("b")]
        );
    }
}
