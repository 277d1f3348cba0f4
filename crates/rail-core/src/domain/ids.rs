//! Domain identifiers.
//!
//! # ID の種類
//! - **RailId**: rail インスタンスごとの ID（ULID + Phantom type）
//! - **EntityId**: バックエンドが払い出す安定 ID（artist の `_id` など）
//! - **RequestToken**: 置き換えリクエストの世代番号（単調増加）
//!
//! RailId は `Id<T>` で実装しています。`T` は実行時には使わないマーカー型で、
//! 将来 ID の種類が増えても混同をコンパイル時に防げます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"rail-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ULID ベースのジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Rail のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rail {}

impl IdMarker for Rail {
    fn prefix() -> &'static str {
        "rail-"
    }
}

/// Identifier of one mounted rail.
pub type RailId = Id<Rail>;

/// Stable identity of a displayed entity, as handed out by the backend.
///
/// Used as the list key and for replacement lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Generation number of a replacement request.
///
/// Only the result carrying the latest token for a source id may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rail_id_display_has_prefix() {
        let ulid = Ulid::new();
        let id = RailId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert!(id.to_string().starts_with("rail-"));
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        assert_eq!(std::mem::size_of::<RailId>(), std::mem::size_of::<Ulid>());
    }

    #[test]
    fn entity_id_serializes_as_plain_string() {
        let id = EntityId::new("4d8b92b34eb68a1b2c0003f4");
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"4d8b92b34eb68a1b2c0003f4\"");
    }

    #[test]
    fn request_tokens_are_monotonic() {
        let t1 = RequestToken::new(1);
        let t2 = t1.next();
        assert!(t2 > t1);
        assert_eq!(t2.get(), 2);
        assert_eq!(t2.to_string(), "#2");
    }
}
