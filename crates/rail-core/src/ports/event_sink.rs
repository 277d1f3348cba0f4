//! EventSink port - イベント記録の抽象化
//!
//! # 実装
//! - NoopEventSink: 何もしない（デフォルト）
//! - InMemoryEventSink（impls）: テスト・デモ用

use crate::domain::RailEvent;

/// EventSink はドメインイベントを記録
///
/// ワークフローの途中から同期的に呼ばれるので、ブロックしないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RailEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: RailEvent) {}
}
