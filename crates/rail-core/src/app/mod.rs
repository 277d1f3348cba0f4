//! App - アプリケーション層
//!
//! ports と rail を組み合わせてライフサイクルとワークフローを実装します。
//!
//! # 主要コンポーネント
//! - **RailBuilder**: 構築とワイヤリング（Fail-fast）
//! - **RailController**: attach / props / detach / follow
//! - **ReplacementWorkflow**: follow された entity の置き換え
//! - **RailStatus**: 外から覗くためのスナップショット

pub mod builder;
pub mod controller;
pub mod status;
pub mod workflow;

pub use self::builder::{BuildError, RailBuilder};
pub use self::controller::RailController;
pub use self::status::{RailStatus, WorkflowCounts};
pub use self::workflow::ReplacementWorkflow;
