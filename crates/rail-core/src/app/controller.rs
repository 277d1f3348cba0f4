//! RailController - rail 1 本のライフサイクルを持つ
//!
//! # ライフサイクル
//! - `on_attach()`: 初回ロード（DataSource::fetch_rail）
//! - `on_props_changed()`: 最初の空でない一覧で初期化
//! - `follow()` / `run()`: 置き換えワークフロー
//! - `on_detach()`: 進行中のワークフローとロードを全部止める
//!
//! shutdown は WorkerGroup と同じく `watch::Sender<bool>` で配る。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use super::status::RailStatus;
use super::workflow::ReplacementWorkflow;
use crate::config::Environment;
use crate::domain::{
    Entity, EntityId, RailDescriptor, RailError, RailEvent, RailId, WorkflowOutcome,
};
use crate::ports::{DataSource, EventSink};
use crate::rail::Rail;

pub struct RailController {
    rail: Arc<Rail>,
    descriptor: RailDescriptor,
    workflow: Arc<ReplacementWorkflow>,
    source: Arc<dyn DataSource>,
    events: Arc<dyn EventSink>,
    environment: Environment,
    shutdown_tx: watch::Sender<bool>,
    load_failed: AtomicBool,
    /// Bumped by every `on_attach`; an older load whose number is stale drops its result.
    load_seq: AtomicU64,
}

impl RailController {
    pub(crate) fn new(
        rail: Arc<Rail>,
        descriptor: RailDescriptor,
        workflow: Arc<ReplacementWorkflow>,
        source: Arc<dyn DataSource>,
        events: Arc<dyn EventSink>,
        environment: Environment,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            rail,
            descriptor,
            workflow,
            source,
            events,
            environment,
            shutdown_tx,
            load_failed: AtomicBool::new(false),
            load_seq: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> RailId {
        self.rail.id()
    }

    pub fn rail(&self) -> &Arc<Rail> {
        &self.rail
    }

    pub fn descriptor(&self) -> &RailDescriptor {
        &self.descriptor
    }

    /// Fetch the rail contents and initialize.
    ///
    /// A second call supersedes a load that is still in flight. Fetch errors
    /// are not returned: the rail is marked as failed and stays hidden.
    pub async fn on_attach(&self) -> Result<(), RailError> {
        let span = info_span!("rail.load", rail = %self.rail.id(), node = %self.descriptor.node_id);
        self.load().instrument(span).await
    }

    async fn load(&self) -> Result<(), RailError> {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut shutdown = self.shutdown_tx.subscribe();
        if *shutdown.borrow() {
            debug!("rail detached, not loading");
            return Ok(());
        }

        let fetched = tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => {
                debug!("load cancelled by detach");
                return Ok(());
            }
            r = self.source.fetch_rail(&self.descriptor) => r,
        };
        if self.load_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "load superseded, dropping result");
            return Ok(());
        }

        match fetched {
            Ok(entities) => {
                self.load_failed.store(false, Ordering::SeqCst);
                self.on_props_changed(entities).await
            }
            Err(e) => {
                error!(error = %e, "rail load failed");
                self.load_failed.store(true, Ordering::SeqCst);
                self.events.emit(RailEvent::LoadFailed {
                    rail: self.rail.id(),
                    error: e.to_string(),
                });
                Ok(())
            }
        }
    }

    /// New entity list from the host.
    ///
    /// Empty lists are ignored. A second non-empty list hits the
    /// `AlreadyInitialized` policy of the configured `Environment`.
    pub async fn on_props_changed(&self, entities: Vec<Entity>) -> Result<(), RailError> {
        if entities.is_empty() {
            debug!(rail = %self.rail.id(), "empty entity list, rail stays hidden");
            return Ok(());
        }
        if self.rail.is_detached().await {
            debug!(rail = %self.rail.id(), "rail detached, ignoring entities");
            return Ok(());
        }

        let count = entities.len();
        match self.rail.initialize(entities).await {
            Ok(revision) => {
                info!(rail = %self.rail.id(), count, revision, "rail initialized");
                Ok(())
            }
            Err(RailError::AlreadyInitialized) => match self.environment {
                Environment::Development => {
                    error!(rail = %self.rail.id(), "rail initialized twice");
                    Err(RailError::AlreadyInitialized)
                }
                Environment::Production => {
                    debug!(rail = %self.rail.id(), "already initialized, keeping current list");
                    Ok(())
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Stop everything. No workflow writes to the rail after this returns.
    pub async fn on_detach(&self) {
        // send_replace stores the flag even with no load listening
        self.shutdown_tx.send_replace(true);
        let cancelled = self.rail.detach().await;
        info!(rail = %self.rail.id(), cancelled, "rail detached");
        self.events.emit(RailEvent::Detached {
            rail: self.rail.id(),
            cancelled,
        });
    }

    /// Follow tapped on `id`: run the replacement in the background.
    pub fn follow(&self, id: impl Into<EntityId>) -> JoinHandle<WorkflowOutcome> {
        let workflow = Arc::clone(&self.workflow);
        let id = id.into();
        tokio::spawn(async move { workflow.run(id).await }.in_current_span())
    }

    /// Same as `follow`, awaited inline.
    pub async fn run(&self, id: impl Into<EntityId>) -> WorkflowOutcome {
        self.workflow.run(id.into()).await
    }

    pub async fn status(&self) -> RailStatus {
        RailStatus {
            rail_id: self.rail.id(),
            kind: self.descriptor.kind,
            revision: self.rail.revision().await,
            entities: self.rail.snapshot().await,
            load_failed: self.load_failed.load(Ordering::SeqCst),
            detached: self.rail.is_detached().await,
            in_flight: self.rail.workflow_counts().await,
        }
    }

    pub async fn is_visible(&self) -> bool {
        self.status().await.is_visible()
    }
}
