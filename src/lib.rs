//! Ripple Snake - a grid snake with smooth sub-cell motion
//!
//! This library provides:
//! - Core game logic: the fixed-tick movement state machine (game module)
//! - Direction buffering and key mapping (input module)
//! - Frame-rate interpolation, the head-position feed and TUI rendering (render module)
//! - Session stats (metrics module)
//! - The keyboard play loop tying it together (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
