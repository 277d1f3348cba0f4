//! Errors - エラー型と分類
//!
//! - **RailError**: RailState の操作エラー（プログラミングエラー or 競合）
//! - **FetchError**: DataSource の失敗。ワークフロー境界で捕まえて
//!   「代替なしで取り除く」経路に変換する。Renderer には届かない。

use thiserror::Error;

use super::ids::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RailError {
    /// The id is not (or no longer) in the rail.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("rail is already initialized")]
    AlreadyInitialized,

    /// The id is already displayed at another index.
    #[error("entity already in rail: {0}")]
    DuplicateEntity(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
