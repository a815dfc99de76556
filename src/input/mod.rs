pub mod buffer;
pub mod handler;

pub use buffer::HeadingSlot;
pub use handler::{InputHandler, KeyAction};
