//! RailBuilder - rail のワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - DataSource と Renderer は必須。足りなければ build() が BuildError を返す
//! - アニメーション設定の明らかな誤り（非有限の y_delta）もここで弾く

use std::sync::Arc;

use super::controller::RailController;
use super::workflow::ReplacementWorkflow;
use crate::config::{self, RailConfig};
use crate::domain::RailDescriptor;
use crate::ports::{
    Clock, DataSource, EventSink, IdGenerator, NoopEventSink, Renderer, SystemClock, UlidGenerator,
};
use crate::rail::Rail;

/// Builds a `RailController`.
///
/// # 使用例
/// ```ignore
/// let controller = RailBuilder::new(RailDescriptor::new("node-1", RailKind::Trending))
///     .data_source(source)
///     .renderer(renderer)
///     .build()?;
/// ```
pub struct RailBuilder {
    descriptor: RailDescriptor,
    source: Option<Arc<dyn DataSource>>,
    renderer: Option<Arc<dyn Renderer>>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    config: Option<RailConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no data source configured; call data_source() before build()")]
    MissingDataSource,

    #[error("no renderer configured; call renderer() before build()")]
    MissingRenderer,

    #[error("invalid animation config: {0}")]
    InvalidConfig(String),
}

impl RailBuilder {
    pub fn new(descriptor: RailDescriptor) -> Self {
        Self {
            descriptor,
            source: None,
            renderer: None,
            events: Arc::new(NoopEventSink),
            clock: Arc::new(SystemClock),
            ids: Box::new(UlidGenerator::new(SystemClock)),
            config: None,
        }
    }

    pub fn data_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Use `config` instead of the process-wide one.
    pub fn config(mut self, config: RailConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<RailController, BuildError> {
        let source = self.source.ok_or(BuildError::MissingDataSource)?;
        let renderer = self.renderer.ok_or(BuildError::MissingRenderer)?;
        let config = self.config.unwrap_or_else(|| config::global().clone());
        if !config.animation.y_delta.is_finite() {
            return Err(BuildError::InvalidConfig(format!(
                "y_delta must be finite, got {}",
                config.animation.y_delta
            )));
        }

        let rail = Arc::new(Rail::new(
            self.ids.generate_rail_id(),
            config.animation.y_delta,
            Arc::clone(&renderer),
        ));
        let workflow = Arc::new(ReplacementWorkflow::new(
            Arc::clone(&rail),
            Arc::clone(&source),
            renderer,
            Arc::clone(&self.events),
            self.clock,
            config.animation,
        ));
        Ok(RailController::new(
            rail,
            self.descriptor,
            workflow,
            source,
            self.events,
            config.environment,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationConfig;
    use crate::domain::RailKind;
    use crate::impls::{RecordingRenderer, ScriptedDataSource};
    use crate::ports::{FixedClock, NullRenderer};
    use chrono::{TimeZone, Utc};

    fn descriptor() -> RailDescriptor {
        RailDescriptor::new("node-1", RailKind::Popular)
    }

    #[test]
    fn build_success() {
        let controller = RailBuilder::new(descriptor())
            .data_source(Arc::new(ScriptedDataSource::new()))
            .renderer(Arc::new(NullRenderer))
            .build();
        assert!(controller.is_ok());
    }

    #[test]
    fn build_without_data_source_fails() {
        let result = RailBuilder::new(descriptor())
            .renderer(Arc::new(NullRenderer))
            .build();
        assert!(matches!(result, Err(BuildError::MissingDataSource)));
    }

    #[test]
    fn build_without_renderer_fails() {
        let result = RailBuilder::new(descriptor())
            .data_source(Arc::new(ScriptedDataSource::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingRenderer)));
    }

    #[test]
    fn non_finite_y_delta_is_rejected() {
        let config = RailConfig {
            animation: AnimationConfig {
                y_delta: f64::NAN,
                ..AnimationConfig::default()
            },
            ..RailConfig::default()
        };
        let result = RailBuilder::new(descriptor())
            .data_source(Arc::new(ScriptedDataSource::new()))
            .renderer(Arc::new(RecordingRenderer::new()))
            .config(config)
            .build();
        assert!(matches!(result, Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn rail_id_comes_from_the_generator() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let controller = RailBuilder::new(descriptor())
            .data_source(Arc::new(ScriptedDataSource::new()))
            .renderer(Arc::new(NullRenderer))
            .id_generator(UlidGenerator::new(FixedClock::new(at)))
            .clock(Arc::new(FixedClock::new(at)))
            .build()
            .unwrap();
        assert_eq!(
            controller.id().as_ulid().timestamp_ms(),
            at.timestamp_millis() as u64
        );
        assert_eq!(controller.descriptor().subtitle(), Some("Popular on Artsy"));
    }
}
