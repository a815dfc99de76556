use std::time::{Duration, Instant};

use super::publisher::{PixelPosition, ShaderFeed};

/// How long one ripple plays
pub const RIPPLE_DURATION: Duration = Duration::from_millis(600);

/// Parameters for one frame of the effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleFrame {
    /// Where the effect is centred (the head, in pixels)
    pub center: PixelPosition,
    /// 0 when idle, falls from 1 to 0 while a ripple plays
    pub intensity: f32,
    /// Ring radius as a fraction of its final size
    pub spread: f32,
}

/// Stand-in for the distortion shader: reads the feed once per frame and
/// owns its own playback timer.
pub struct RippleEffect {
    feed: ShaderFeed,
    started: Option<Instant>,
    duration: Duration,
}

impl RippleEffect {
    pub fn new(feed: ShaderFeed) -> Self {
        Self {
            feed,
            started: None,
            duration: RIPPLE_DURATION,
        }
    }

    pub fn update(&mut self, now: Instant) -> RippleFrame {
        // Any eat restarts the animation
        if self.feed.take_eat().is_some() {
            while self.feed.take_eat().is_some() {}
            self.started = Some(now);
        }

        let center = self.feed.latest_head();
        let Some(started) = self.started else {
            return RippleFrame {
                center,
                intensity: 0.0,
                spread: 0.0,
            };
        };

        let elapsed = now.saturating_duration_since(started);
        if elapsed >= self.duration {
            self.started = None;
            return RippleFrame {
                center,
                intensity: 0.0,
                spread: 0.0,
            };
        }

        let spread = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        RippleFrame {
            center,
            intensity: 1.0 - spread,
            spread,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }
}
