//! DataSource port - 置き換え候補と rail の中身を取得する
//!
//! GraphQL クライアント・通信層はこの trait の向こう側にある。
//! タイムアウトは transport 側の責務（ここでは扱わない）。

use async_trait::async_trait;

use crate::domain::{Entity, EntityId, FetchError, RailDescriptor};

/// DataSource は外部からエンティティを取得
///
/// # 要件
/// - 異なる `source_id` に対して並行に呼ばれても安全であること
/// - 呼び出し間の順序は保証しない
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch one substitute for `source_id`.
    ///
    /// `Ok(None)` means no suggestion is available.
    async fn fetch_replacement(&self, source_id: &EntityId) -> Result<Option<Entity>, FetchError>;

    /// Fetch the rail's initial contents.
    async fn fetch_rail(&self, rail: &RailDescriptor) -> Result<Vec<Entity>, FetchError>;
}
