//! ReplacementWorkflow - follow された entity を代替候補と差し替える
//!
//! # フロー
//! 1. Requesting: DataSource::fetch_replacement を 1 回だけ呼ぶ
//!    （失敗・空なら「代替なし」。リトライしない）
//! 2. AnimatingOut: follow されたカードを消す（opacity 1→0, offset 0→Δ）
//! 3. Committing: RailState::replace（トークン確認と同じロック内）
//! 4. AnimatingIn: 代替カードを出す（opacity 0→1, offset −Δ→0）
//!
//! どの待ち（fetch / アニメーション）もキャンセルと競合させる。
//! キャンセル後のワークフローは RailState に書き込まない。
//! `run` の future が途中で drop されてもリクエストは解放される（ReleaseOnDrop）。

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::animation::{self, Animator};
use crate::config::AnimationConfig;
use crate::domain::{
    AnimationPhase, Entity, EntityId, FollowStatus, RailEvent, RequestToken, WorkflowOutcome,
    WorkflowState,
};
use crate::ports::{Clock, DataSource, EventSink, Renderer};
use crate::rail::{Commit, Rail, Ticket};

pub struct ReplacementWorkflow {
    rail: Arc<Rail>,
    source: Arc<dyn DataSource>,
    renderer: Arc<dyn Renderer>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    animator: Animator,
    animation: AnimationConfig,
}

impl ReplacementWorkflow {
    pub fn new(
        rail: Arc<Rail>,
        source: Arc<dyn DataSource>,
        renderer: Arc<dyn Renderer>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        animation: AnimationConfig,
    ) -> Self {
        let animator = Animator::new(Arc::clone(&rail), animation.frame_interval());
        Self {
            rail,
            source,
            renderer,
            events,
            clock,
            animator,
            animation,
        }
    }

    /// Find a substitute for `source_id` and swap it in.
    ///
    /// Starting a second run for the same id cancels this one. Dropping the
    /// returned future before it completes releases the request.
    pub async fn run(&self, source_id: EntityId) -> WorkflowOutcome {
        let span = info_span!("rail.replacement", rail = %self.rail.id(), source = %source_id);
        self.replace_one(source_id).instrument(span).await
    }

    async fn replace_one(&self, source_id: EntityId) -> WorkflowOutcome {
        if !self.rail.contains(&source_id).await {
            debug!("source not in rail, nothing to replace");
            return WorkflowOutcome::Skipped;
        }

        let Some(begun) = self
            .rail
            .begin_request(source_id.clone(), self.clock.now())
            .await
        else {
            debug!("rail detached, not starting");
            return WorkflowOutcome::Cancelled;
        };
        let mut ticket = begun.ticket;
        let _release = ReleaseOnDrop {
            rail: Arc::clone(&self.rail),
            source: ticket.source.clone(),
            token: ticket.token,
        };
        let rail = self.rail.id();

        if let Some(old) = begun.superseded {
            debug!(token = %old, "superseded previous request");
            self.events.emit(RailEvent::Superseded {
                rail,
                source: source_id.clone(),
                token: old,
            });
        }
        self.events.emit(RailEvent::ReplacementRequested {
            rail,
            source: source_id.clone(),
            token: ticket.token,
        });

        // Requesting
        let fetched = tokio::select! {
            _ = ticket.cancelled() => return self.cancelled(&ticket).await,
            r = self.source.fetch_replacement(&source_id) => r,
        };
        if !self.rail.is_current(&ticket).await {
            // a newer request owns this id now; drop our result
            return self.cancelled(&ticket).await;
        }

        let mut fetch_failed = false;
        let substitute: Option<Entity> = match fetched {
            Ok(Some(entity)) => Some(entity),
            Ok(None) => {
                info!("no substitute available, removing");
                self.events.emit(RailEvent::NoSubstitute {
                    rail,
                    source: source_id.clone(),
                });
                None
            }
            Err(error) => {
                warn!(%error, "fetch replacement failed, removing");
                self.events.emit(RailEvent::FetchFailed {
                    rail,
                    source: source_id.clone(),
                    error: error.to_string(),
                });
                fetch_failed = true;
                None
            }
        };

        self.renderer
            .on_follow_status(&source_id, FollowStatus::Following);

        // AnimatingOut
        if !self.rail.advance(&ticket, WorkflowState::AnimatingOut).await {
            return self.cancelled(&ticket).await;
        }
        self.rail
            .set_animation_phase(&source_id, AnimationPhase::Exiting)
            .await;
        let mut out = self
            .animator
            .start(source_id.clone(), animation::outgoing(&self.animation));
        let finished = tokio::select! {
            _ = ticket.cancelled() => false,
            done = out.finished() => done,
        };
        if !finished {
            out.release();
            return self.cancelled(&ticket).await;
        }

        // Committing
        if !self.rail.advance(&ticket, WorkflowState::Committing).await {
            return self.cancelled(&ticket).await;
        }
        let commit = self.rail.commit(&ticket, substitute).await;
        let substitute_id = match commit {
            Commit::Cancelled => return self.cancelled(&ticket).await,
            Commit::NotFound => {
                debug!("source vanished before commit, skipping");
                return self
                    .finish(&ticket, WorkflowState::Failed, WorkflowOutcome::Skipped)
                    .await;
            }
            Commit::Removed { revision } => {
                self.events.emit(RailEvent::Committed {
                    rail,
                    source: source_id.clone(),
                    substitute: None,
                    revision,
                });
                let state = if fetch_failed {
                    WorkflowState::Failed
                } else {
                    WorkflowState::Done
                };
                return self
                    .finish(&ticket, state, WorkflowOutcome::Removed { fetch_failed })
                    .await;
            }
            Commit::Substituted {
                substitute,
                revision,
            } => {
                self.events.emit(RailEvent::Committed {
                    rail,
                    source: source_id.clone(),
                    substitute: Some(substitute.clone()),
                    revision,
                });
                substitute
            }
        };

        // AnimatingIn
        if !self.rail.advance(&ticket, WorkflowState::AnimatingIn).await {
            return self.cancelled(&ticket).await;
        }
        let mut incoming = self
            .animator
            .start(substitute_id.clone(), animation::incoming(&self.animation));
        let finished = tokio::select! {
            _ = ticket.cancelled() => false,
            done = incoming.finished() => done,
        };
        if !finished {
            incoming.release();
            return self.cancelled(&ticket).await;
        }
        self.rail
            .set_animation_phase(&substitute_id, AnimationPhase::Idle)
            .await;

        self.finish(
            &ticket,
            WorkflowState::Done,
            WorkflowOutcome::Replaced {
                substitute: substitute_id,
            },
        )
        .await
    }

    async fn finish(
        &self,
        ticket: &Ticket,
        state: WorkflowState,
        outcome: WorkflowOutcome,
    ) -> WorkflowOutcome {
        self.rail.advance(ticket, state).await;
        self.rail.release(&ticket.source, ticket.token).await;
        debug!(token = %ticket.token, ?outcome, "replacement finished");
        self.events.emit(RailEvent::Finished {
            rail: self.rail.id(),
            source: ticket.source.clone(),
            token: ticket.token,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Cancellation is silent: no state change, no error.
    async fn cancelled(&self, ticket: &Ticket) -> WorkflowOutcome {
        self.rail.release(&ticket.source, ticket.token).await;
        debug!(token = %ticket.token, "replacement cancelled");
        WorkflowOutcome::Cancelled
    }
}

/// Releases the request when `run` is dropped mid-flight.
///
/// After a normal finish the entry is already gone and this is a no-op.
struct ReleaseOnDrop {
    rail: Arc<Rail>,
    source: EntityId,
    token: RequestToken,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        if self.rail.try_abandon(&self.source, self.token) {
            return;
        }
        // lock busy: finish the release on the runtime
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let rail = Arc::clone(&self.rail);
            let source = self.source.clone();
            let token = self.token;
            handle.spawn(async move { rail.abandon(&source, token).await });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, FetchError, RailId};
    use crate::impls::{InMemoryEventSink, RecordingRenderer, ScriptedDataSource};
    use crate::ports::SystemClock;
    use serde_json::json;
    use std::time::Duration;
    use tracing_test::traced_test;
    use ulid::Ulid;

    struct Fixture {
        rail: Arc<Rail>,
        source: Arc<ScriptedDataSource>,
        renderer: Arc<RecordingRenderer>,
        events: Arc<InMemoryEventSink>,
        workflow: Arc<ReplacementWorkflow>,
    }

    async fn fixture(ids: &[&str]) -> Fixture {
        let renderer = Arc::new(RecordingRenderer::new());
        let source = Arc::new(ScriptedDataSource::new());
        let events = Arc::new(InMemoryEventSink::new());
        let config = AnimationConfig::default();
        let rail = Arc::new(Rail::new(
            RailId::from_ulid(Ulid::new()),
            config.y_delta,
            renderer.clone(),
        ));
        rail.initialize(ids.iter().map(|id| Entity::new(*id, json!({}))).collect())
            .await
            .unwrap();
        let workflow = Arc::new(ReplacementWorkflow::new(
            rail.clone(),
            source.clone(),
            renderer.clone(),
            events.clone(),
            Arc::new(SystemClock),
            config,
        ));
        Fixture {
            rail,
            source,
            renderer,
            events,
            workflow,
        }
    }

    fn ids(entities: &[Entity]) -> Vec<String> {
        entities.iter().map(|e| e.id.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn substitute_takes_the_source_slot() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("b", Entity::new("b2", json!({ "name": "B2" })));

        let outcome = f.workflow.run(EntityId::new("b")).await;

        assert_eq!(
            outcome,
            WorkflowOutcome::Replaced {
                substitute: EntityId::new("b2")
            }
        );
        let snap = f.rail.snapshot().await;
        assert_eq!(ids(&snap), vec!["a", "b2", "c"]);
        assert_eq!(snap[1].animation.opacity, 1.0);
        assert_eq!(snap[1].animation.offset, 0.0);
        assert_eq!(snap[1].animation.phase, AnimationPhase::Idle);
        assert_eq!(
            f.renderer.follow_statuses(),
            vec![(EntityId::new("b"), FollowStatus::Following)]
        );
        assert_eq!(f.rail.workflow_state(&EntityId::new("b")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn outgoing_then_incoming_phases() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("b", Entity::new("b2", json!({})));

        f.workflow.run(EntityId::new("b")).await;

        // exactly two animated cards: b out, then b2 in
        assert_eq!(
            f.renderer.animated_ids(),
            vec![EntityId::new("b"), EntityId::new("b2")]
        );
        let out: Vec<f64> = f
            .renderer
            .progress_for(&EntityId::new("b"))
            .into_iter()
            .filter(|(c, _)| *c == Channel::Offset)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(out.last().copied(), Some(20.0));
        let incoming: Vec<f64> = f
            .renderer
            .progress_for(&EntityId::new("b2"))
            .into_iter()
            .filter(|(c, _)| *c == Channel::Offset)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(incoming.first().copied(), Some(-20.0));
        assert_eq!(incoming.last().copied(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_removes_without_incoming_animation() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.reply("a", Ok(None));

        let outcome = f.workflow.run(EntityId::new("a")).await;

        assert_eq!(outcome, WorkflowOutcome::Removed { fetch_failed: false });
        assert_eq!(outcome.terminal_state(), WorkflowState::Done);
        assert_eq!(ids(&f.rail.snapshot().await), vec!["b", "c"]);
        assert_eq!(f.renderer.animated_ids(), vec![EntityId::new("a")]);
        assert_eq!(f.events.count("no_substitute"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_removes_once_without_retry() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source
            .fail("c", FetchError::Transport("connection reset".to_string()));

        let outcome = f.workflow.run(EntityId::new("c")).await;

        assert_eq!(outcome, WorkflowOutcome::Removed { fetch_failed: true });
        assert_eq!(outcome.terminal_state(), WorkflowState::Failed);
        assert_eq!(ids(&f.rail.snapshot().await), vec!["a", "b"]);
        assert_eq!(f.source.calls(&EntityId::new("c")), 1);
        assert_eq!(f.events.count("fetch_failed"), 1);
        assert_eq!(f.events.count("committed"), 1);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn fetch_error_is_logged_once() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.fail("c", FetchError::Timeout);

        f.workflow.run(EntityId::new("c")).await;

        assert!(logs_contain("fetch replacement failed"));
        assert!(logs_contain("request timed out"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|l| l.contains("fetch replacement failed"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one fetch failure log line, got {n}")),
            }
        });
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_source_is_skipped_without_fetching() {
        let f = fixture(&["a"]).await;
        let outcome = f.workflow.run(EntityId::new("nope")).await;
        assert_eq!(outcome, WorkflowOutcome::Skipped);
        assert_eq!(f.source.calls(&EntityId::new("nope")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_result_never_commits() {
        let f = fixture(&["a", "b", "c"]).await;
        let first = f.source.defer("a");
        let second = f.source.defer("a");

        let run1 = tokio::spawn({
            let wf = f.workflow.clone();
            async move { wf.run(EntityId::new("a")).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        let run2 = tokio::spawn({
            let wf = f.workflow.clone();
            async move { wf.run(EntityId::new("a")).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        second.resolve(Ok(Some(Entity::new("a2", json!({})))));
        first.resolve(Ok(Some(Entity::new("a1", json!({})))));

        assert_eq!(run1.await.unwrap(), WorkflowOutcome::Cancelled);
        assert_eq!(
            run2.await.unwrap(),
            WorkflowOutcome::Replaced {
                substitute: EntityId::new("a2")
            }
        );
        let snap = f.rail.snapshot().await;
        assert_eq!(ids(&snap), vec!["a2", "b", "c"]);
        assert!(f.renderer.progress_for(&EntityId::new("a1")).is_empty());
        assert_eq!(f.events.count("superseded"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_during_animating_out_blocks_commit() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("b", Entity::new("b2", json!({})));

        let run = tokio::spawn({
            let wf = f.workflow.clone();
            async move { wf.run(EntityId::new("b")).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            f.rail.workflow_state(&EntityId::new("b")).await,
            Some(WorkflowState::AnimatingOut)
        );
        let revision = f.rail.revision().await;

        f.rail.detach().await;
        assert_eq!(run.await.unwrap(), WorkflowOutcome::Cancelled);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(f.rail.revision().await, revision);
        assert_eq!(ids(&f.rail.snapshot().await), vec!["a", "b", "c"]);
        assert_eq!(f.events.count("committed"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_during_animating_in_keeps_commit_and_stops_ticks() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("b", Entity::new("b2", json!({})));
        let b2 = EntityId::new("b2");

        let run = tokio::spawn({
            let wf = f.workflow.clone();
            async move { wf.run(EntityId::new("b")).await }
        });
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            f.rail.workflow_state(&EntityId::new("b")).await,
            Some(WorkflowState::AnimatingIn)
        );

        f.rail.detach().await;
        assert_eq!(run.await.unwrap(), WorkflowOutcome::Cancelled);
        let ticks = f.renderer.progress_for(&b2).len();
        assert!(ticks > 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.renderer.progress_for(&b2).len(), ticks);
        assert_eq!(ids(&f.rail.snapshot().await), vec!["a", "b2", "c"]);
        assert_eq!(f.events.count("committed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_during_fetch_releases_request() {
        let f = fixture(&["a", "b", "c"]).await;
        let _pending = f.source.defer("b");

        let timed_out = tokio::time::timeout(
            Duration::from_millis(5),
            f.workflow.run(EntityId::new("b")),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.rail.workflow_counts().await.total(), 0);
        assert_eq!(f.rail.workflow_state(&EntityId::new("b")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_during_animating_out_puts_card_back() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("b", Entity::new("b2", json!({})));
        let b = EntityId::new("b");

        let run = tokio::spawn({
            let wf = f.workflow.clone();
            async move { wf.run(EntityId::new("b")).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            f.rail.workflow_state(&b).await,
            Some(WorkflowState::AnimatingOut)
        );
        run.abort();
        assert!(run.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.rail.workflow_counts().await.total(), 0);
        let snap = f.rail.snapshot().await;
        assert_eq!(ids(&snap), vec!["a", "b", "c"]);
        assert_eq!(snap[1].animation.phase, AnimationPhase::Idle);
        assert_eq!(snap[1].animation.opacity, 1.0);
        assert_eq!(snap[1].animation.offset, 0.0);

        // the id can be followed again
        f.source.suggest("b", Entity::new("b3", json!({})));
        assert_eq!(
            f.workflow.run(b).await,
            WorkflowOutcome::Replaced {
                substitute: EntityId::new("b3")
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_workflows_on_different_ids() {
        let f = fixture(&["a", "b", "c"]).await;
        f.source.suggest("a", Entity::new("a2", json!({})));
        f.source.reply("c", Ok(None));

        let (ra, rc) = tokio::join!(
            f.workflow.run(EntityId::new("a")),
            f.workflow.run(EntityId::new("c")),
        );

        assert!(matches!(ra, WorkflowOutcome::Replaced { .. }));
        assert_eq!(rc, WorkflowOutcome::Removed { fetch_failed: false });
        assert_eq!(ids(&f.rail.snapshot().await), vec!["a2", "b"]);
        assert_eq!(f.rail.workflow_counts().await.total(), 0);
    }
}
