use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rail_core::app::RailBuilder;
use rail_core::config::{self, RailConfig};
use rail_core::domain::{
    Channel, Entity, EntityId, FetchError, FollowStatus, RailDescriptor, RailKind,
};
use rail_core::ports::{DataSource, Renderer};

/// Fake backend: a fixed rail, and suggestions with a bit of latency.
///
/// Artists whose name starts with "z" have no suggestion; "flaky" fails.
struct DemoSource {
    next: AtomicU32,
}

impl DemoSource {
    fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    fn artist(id: &str, name: &str) -> Entity {
        Entity::new(id, json!({ "name": name, "href": format!("/artist/{id}") }))
    }
}

#[async_trait]
impl DataSource for DemoSource {
    async fn fetch_replacement(&self, source_id: &EntityId) -> Result<Option<Entity>, FetchError> {
        sleep(Duration::from_millis(150)).await;
        match source_id.as_str() {
            "flaky" => Err(FetchError::Transport("connection reset".to_string())),
            id if id.starts_with('z') => Ok(None),
            _ => {
                let n = self.next.fetch_add(1, Ordering::Relaxed);
                let id = format!("suggested-{n}");
                Ok(Some(Self::artist(&id, &format!("Suggested Artist {n}"))))
            }
        }
    }

    async fn fetch_rail(&self, rail: &RailDescriptor) -> Result<Vec<Entity>, FetchError> {
        sleep(Duration::from_millis(50)).await;
        debug!(node = %rail.node_id, "serving demo rail");
        Ok(vec![
            Self::artist("banksy", "Banksy"),
            Self::artist("flaky", "Flaky Artist"),
            Self::artist("kusama", "Yayoi Kusama"),
            Self::artist("zao", "Zao Wou-Ki"),
        ])
    }
}

/// Logs what a UI would draw.
struct LogRenderer;

impl Renderer for LogRenderer {
    fn on_state_changed(&self, entities: &[Entity]) {
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        info!(?ids, "render rail");
    }

    fn on_animation_progress(&self, id: &EntityId, channel: Channel, value: f64) {
        tracing::trace!(%id, %channel, value, "frame");
    }

    fn on_follow_status(&self, id: &EntityId, status: FollowStatus) {
        info!(%id, ?status, "follow button");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rail_core=debug,rail_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // optional: path to a JSON RailConfig
    if let Some(path) = std::env::args().nth(1) {
        let loaded = RailConfig::from_path(&path)?;
        if config::install(loaded).is_err() {
            warn!("config already installed, ignoring {path}");
        }
    }

    let controller = RailBuilder::new(RailDescriptor::new("home-artists", RailKind::Trending))
        .data_source(Arc::new(DemoSource::new()))
        .renderer(Arc::new(LogRenderer))
        .build()?;
    info!(
        rail = %controller.id(),
        title = RailKind::TITLE,
        subtitle = ?controller.descriptor().subtitle(),
        "rail built"
    );

    controller.on_attach().await?;

    let follows = vec![
        controller.follow("banksy"),
        controller.follow("flaky"),
        controller.follow("zao"),
    ];
    // a second tap on the same card supersedes the first
    sleep(Duration::from_millis(20)).await;
    let kusama_first = controller.follow("kusama");
    let kusama_second = controller.follow("kusama");

    for join in follows.into_iter().chain([kusama_first, kusama_second]) {
        let outcome = join.await?;
        info!(?outcome, "workflow finished");
    }

    let status = controller.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    controller.on_detach().await;
    Ok(())
}
