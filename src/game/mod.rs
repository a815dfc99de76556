//! Core game logic module for Snake
//!
//! This module contains the game logic with no terminal or rendering dependencies;
//! the only I/O is loading a `GameConfig` from a JSON file.
//! The engine advances on fixed ticks and hands out snapshots; nothing here
//! knows about frames or pixels.

pub mod action;
pub mod config;
pub mod engine;
pub mod food;
pub mod state;

// Re-export commonly used types
pub use action::{Command, Direction};
pub use config::{ConfigError, EdgePolicy, GameConfig, ResumePhase};
pub use engine::{GameEngine, TickOutcome};
pub use food::place_food;
pub use state::{CollisionType, GameState, Phase, Position, Snake, TickSnapshot};
