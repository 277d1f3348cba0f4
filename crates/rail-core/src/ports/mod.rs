//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。rail の外側にあるもの
//! （GraphQL クライアント、UI フレームワーク、時計、テレメトリ）を
//! trait として切り出し、実装の詳細を隠蔽します。

pub mod clock;
pub mod data_source;
pub mod event_sink;
pub mod id_generator;
pub mod renderer;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::data_source::DataSource;
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::renderer::{NullRenderer, Renderer};
