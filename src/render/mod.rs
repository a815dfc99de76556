//! Everything that runs at frame rate: interpolation, the head-position feed
//! and the terminal renderer.

pub mod interpolation;
pub mod publisher;
pub mod renderer;
pub mod ripple;

pub use interpolation::{CellPoint, Interpolator};
pub use publisher::{EatEvent, PixelPosition, PositionPublisher, ShaderChannel, ShaderFeed, ShaderSink};
pub use renderer::{FrameView, Renderer};
pub use ripple::{RippleEffect, RippleFrame};
