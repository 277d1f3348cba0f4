//! Animation channels for outgoing/incoming cards.

mod handle;
mod tween;

pub use handle::{AnimationHandle, Animator};
pub use tween::{Easing, Tween};

use crate::config::AnimationConfig;
use crate::domain::Channel;

/// Followed card: fade out and slide down by `y_delta`.
pub fn outgoing(config: &AnimationConfig) -> Vec<Tween> {
    let d = config.out_duration();
    vec![
        Tween::new(Channel::Opacity, 1.0, 0.0, d, config.easing),
        Tween::new(Channel::Offset, 0.0, config.y_delta, d, config.easing),
    ]
}

/// Suggested card: fade in and slide from `-y_delta` to rest.
pub fn incoming(config: &AnimationConfig) -> Vec<Tween> {
    let d = config.in_duration();
    vec![
        Tween::new(Channel::Opacity, 0.0, 1.0, d, config.easing),
        Tween::new(Channel::Offset, -config.y_delta, 0.0, d, config.easing),
    ]
}
