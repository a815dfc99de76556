//! Sub-tick smoothing between two committed snapshots
//!
//! Frames arrive faster than ticks and at no fixed ratio to them. Each frame
//! blends the previous and current segment lists by how far wall-clock time
//! has moved through the tick interval. Only snapshots flow in; nothing flows
//! back to the engine.

use std::time::{Duration, Instant};

use crate::game::{Position, TickSnapshot};

/// Continuous grid coordinates, in cells
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellPoint {
    pub x: f32,
    pub y: f32,
}

impl CellPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear blend from `from` to `to` by `t` in `[0, 1]`; a jump lands on `to`
    pub fn lerp(from: Position, to: Position, t: f32) -> Self {
        if is_jump(from, to) {
            return to.into();
        }
        Self {
            x: from.x as f32 + (to.x - from.x) as f32 * t,
            y: from.y as f32 + (to.y - from.y) as f32 * t,
        }
    }
}

impl From<Position> for CellPoint {
    fn from(pos: Position) -> Self {
        Self::new(pos.x as f32, pos.y as f32)
    }
}

/// More than one cell apart on either axis: a wrap or a reset, never a step
fn is_jump(from: Position, to: Position) -> bool {
    (to.x - from.x).abs() > 1 || (to.y - from.y).abs() > 1
}

pub struct Interpolator {
    tick_interval: Duration,
    previous: Vec<Position>,
    current: TickSnapshot,
}

impl Interpolator {
    /// Start from a snapshot with no motion in flight
    pub fn new(tick_interval: Duration, snapshot: TickSnapshot) -> Self {
        Self {
            tick_interval,
            previous: snapshot.segments.clone(),
            current: snapshot,
        }
    }

    /// Take in the latest snapshot.
    ///
    /// A new `seq` shifts current into previous; the same `seq` only refreshes
    /// phase, food and score so a pause doesn't cut a move short.
    pub fn observe(&mut self, snapshot: TickSnapshot) {
        if snapshot.seq != self.current.seq {
            self.previous = std::mem::take(&mut self.current.segments);
        }
        self.current = snapshot;
    }

    /// Latest snapshot as seen by this layer
    pub fn current(&self) -> &TickSnapshot {
        &self.current
    }

    /// Fraction of the tick interval elapsed at `now`, clamped to `[0, 1]`
    pub fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.current.at);
        (elapsed.as_secs_f32() / self.tick_interval.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Whether the head jumped more than one cell (reset or wrap), in which
    /// case frames show the raw current state
    pub fn is_snapped(&self) -> bool {
        let (Some(from), Some(to)) = (self.previous.first(), self.current.segments.first()) else {
            return true;
        };
        is_jump(*from, *to)
    }

    /// Smoothed position of every segment at `now`, head first
    pub fn sample(&self, now: Instant) -> Vec<CellPoint> {
        if self.is_snapped() {
            return self.current.segments.iter().copied().map(CellPoint::from).collect();
        }

        let t = self.progress(now);
        self.current
            .segments
            .iter()
            .enumerate()
            .map(|(i, &to)| {
                // A segment added by growth starts where it already is
                let from = self.previous.get(i).copied().unwrap_or(to);
                CellPoint::lerp(from, to, t)
            })
            .collect()
    }

    /// Smoothed head position at `now`
    pub fn head(&self, now: Instant) -> CellPoint {
        let head = self.current.head();
        if self.is_snapped() {
            return head.into();
        }
        let from = self.previous.first().copied().unwrap_or(head);
        CellPoint::lerp(from, head, self.progress(now))
    }
}
