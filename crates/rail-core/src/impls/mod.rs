//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **ScriptedDataSource**: 台本どおりに応答する DataSource
//! - **RecordingRenderer**: 通知を記録する Renderer
//! - **InMemoryEventSink**: イベントをメモリに保持
//!
//! 本番用の DataSource（GraphQL クライアント）や Renderer（UI フレームワーク）は
//! このクレートの外側で実装します。

pub mod memory_sink;
pub mod recording_renderer;
pub mod scripted_source;

pub use self::memory_sink::InMemoryEventSink;
pub use self::recording_renderer::RecordingRenderer;
pub use self::scripted_source::{Deferred, ScriptedDataSource};
