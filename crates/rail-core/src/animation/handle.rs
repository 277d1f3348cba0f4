//! Animation driver and its disposable handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Instrument;

use super::tween::Tween;
use crate::domain::{Channel, EntityId};
use crate::rail::Rail;

/// Starts tweens against a rail.
///
/// Each tick writes the sampled values into RailState and forwards them to
/// the renderer (see `Rail::apply_progress`).
#[derive(Clone)]
pub struct Animator {
    rail: Arc<Rail>,
    frame_interval: Duration,
}

impl Animator {
    pub fn new(rail: Arc<Rail>, frame_interval: Duration) -> Self {
        Self {
            rail,
            frame_interval,
        }
    }

    /// Start driving `tweens` on `id`.
    ///
    /// The returned handle owns the driver task: dropping or releasing it
    /// stops the animation immediately.
    pub fn start(&self, id: EntityId, tweens: Vec<Tween>) -> AnimationHandle {
        let rail = Arc::clone(&self.rail);
        let frame = self.frame_interval;
        let join = tokio::spawn(drive(rail, id, tweens, frame).in_current_span());
        AnimationHandle { join: Some(join) }
    }
}

async fn drive(rail: Arc<Rail>, id: EntityId, tweens: Vec<Tween>, frame: Duration) {
    let start = Instant::now();
    let mut ticker = tokio::time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let elapsed = start.elapsed();
        let values: Vec<(Channel, f64)> = tweens
            .iter()
            .map(|t| (t.channel, t.sample(elapsed)))
            .collect();
        rail.apply_progress(&id, &values).await;

        if tweens.iter().all(|t| t.is_finished(elapsed)) {
            break;
        }
    }
}

/// A running animation. Released on drop.
#[must_use = "dropping the handle stops the animation"]
pub struct AnimationHandle {
    join: Option<JoinHandle<()>>,
}

impl AnimationHandle {
    /// Wait until every channel reached its target.
    ///
    /// Returns false if the driver was stopped before finishing.
    pub async fn finished(&mut self) -> bool {
        let Some(join) = self.join.as_mut() else {
            return false;
        };
        let done = join.await.is_ok();
        self.join = None;
        done
    }

    pub fn is_active(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Stop the animation now.
    pub fn release(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
