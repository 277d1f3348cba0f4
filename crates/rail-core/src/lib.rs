//! rail-core
//!
//! Follow-and-replace rail: a horizontal list of cards where following one
//! card animates it away and swaps in a suggested substitute.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, entity, state, request, rail_kind, errors, events）
//! - **ports**: 抽象化レイヤー（DataSource, Renderer, EventSink, Clock, IdGenerator）
//! - **rail**: RailState とリクエスト登録簿（1 つのロックの下）
//! - **animation**: tween と破棄可能なアニメーションハンドル
//! - **app**: builder, controller, workflow, status
//! - **config**: RailConfig（プロセス全体で一度だけ設定）
//! - **impls**: テスト・デモ用の実装（ScriptedDataSource など）

pub mod animation;
pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod rail;
