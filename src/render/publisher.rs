//! Head-position feed for the shader-side consumer
//!
//! The position is a latest-value slot: written once per frame, read at the
//! consumer's own cadence, never queued. Eating is a separate edge-triggered
//! event. Both halves are created together by whoever composes the engine and
//! the effect, and the engine side only ever sees the `ShaderSink` trait.

use tokio::sync::{broadcast, watch};

use super::interpolation::CellPoint;
use crate::game::Position;

/// Pending eat events kept for a slow consumer
const EAT_EVENT_CAPACITY: usize = 8;

/// Screen-space position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPosition {
    pub x: f32,
    pub y: f32,
}

impl PixelPosition {
    /// Centre of `cell`, for cells `cell_size` pixels wide
    pub fn from_cell(cell: CellPoint, cell_size: f32) -> Self {
        Self {
            x: cell.x * cell_size + cell_size / 2.0,
            y: cell.y * cell_size + cell_size / 2.0,
        }
    }

    /// Inverse of [`PixelPosition::from_cell`]
    pub fn to_cell(self, cell_size: f32) -> CellPoint {
        CellPoint::new(
            (self.x - cell_size / 2.0) / cell_size,
            (self.y - cell_size / 2.0) / cell_size,
        )
    }
}

/// Fired once per food eaten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EatEvent {
    pub cell: Position,
    pub score: u32,
}

/// Where per-frame head positions and eat triggers go
pub trait ShaderSink {
    fn publish_head(&self, position: PixelPosition);
    fn trigger_eat(&self, event: EatEvent);
}

/// Sending half of the shader feed
pub struct ShaderChannel {
    head: watch::Sender<PixelPosition>,
    eat: broadcast::Sender<EatEvent>,
}

/// Receiving half of the shader feed
pub struct ShaderFeed {
    head: watch::Receiver<PixelPosition>,
    eat: broadcast::Receiver<EatEvent>,
}

impl ShaderChannel {
    pub fn new(initial: PixelPosition) -> (Self, ShaderFeed) {
        let (head_tx, head_rx) = watch::channel(initial);
        let (eat_tx, eat_rx) = broadcast::channel(EAT_EVENT_CAPACITY);
        (
            Self {
                head: head_tx,
                eat: eat_tx,
            },
            ShaderFeed {
                head: head_rx,
                eat: eat_rx,
            },
        )
    }
}

impl ShaderSink for ShaderChannel {
    fn publish_head(&self, position: PixelPosition) {
        self.head.send_replace(position);
    }

    fn trigger_eat(&self, event: EatEvent) {
        // No subscriber is not an error
        let _ = self.eat.send(event);
    }
}

impl ShaderFeed {
    /// Most recently published head position
    pub fn latest_head(&self) -> PixelPosition {
        *self.head.borrow()
    }

    /// Next unseen eat event, skipping over any the consumer lagged past
    pub fn take_eat(&mut self) -> Option<EatEvent> {
        loop {
            match self.eat.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Converts the interpolated head to pixels and pushes it into a sink
pub struct PositionPublisher {
    cell_size: f32,
    sink: Box<dyn ShaderSink>,
}

impl PositionPublisher {
    pub fn new(cell_size: f32, sink: Box<dyn ShaderSink>) -> Self {
        Self { cell_size, sink }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Publish this frame's head; returns what was published
    pub fn publish_frame(&self, head: CellPoint) -> PixelPosition {
        let position = PixelPosition::from_cell(head, self.cell_size);
        self.sink.publish_head(position);
        position
    }

    pub fn publish_eat(&self, event: EatEvent) {
        self.sink.trigger_eat(event);
    }
}
