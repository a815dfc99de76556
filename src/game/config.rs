use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::action::Direction;
use super::state::{Position, Snake};

/// What happens when the head leaves the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Leaving the grid kills the snake
    #[default]
    Wall,
    /// The grid is a torus
    Wrap,
}

/// Phase the game enters once a death has been reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResumePhase {
    #[default]
    Running,
    Paused,
}

/// Precondition violations caught when an engine is built
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("initial snake length must be at least 1")]
    EmptySnake,
    #[error("initial snake does not fit a {width}x{height} grid (segment at {x},{y})")]
    SnakeOutOfBounds {
        width: usize,
        height: usize,
        x: i32,
        y: i32,
    },
    #[error("{0} interval must be non-zero")]
    ZeroInterval(&'static str),
    #[error("cell size must be a positive number of pixels, got {0}")]
    InvalidCellSize(f32),
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Head cell of the initial layout; grid centre when unset
    pub initial_head: Option<Position>,
    /// Heading at start and after every reset. `None` keeps the snake still
    /// until the first key press.
    pub initial_heading: Option<Direction>,

    /// Fixed simulation tick
    pub tick_interval_ms: u64,
    /// Display refresh used for interpolation frames
    pub frame_interval_ms: u64,
    /// Wall-clock delay between a collision and the reset
    pub reset_delay_ms: u64,
    /// Side of one grid cell in screen pixels
    pub cell_size_px: f32,

    pub edge_policy: EdgePolicy,
    pub post_reset_phase: ResumePhase,
    /// Start in `Paused` instead of `Running`
    pub start_paused: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_snake_length: 3,
            initial_head: None,
            initial_heading: Some(Direction::Right),
            tick_interval_ms: 125,
            frame_interval_ms: 16,
            reset_delay_ms: 1000,
            cell_size_px: 20.0,
            edge_policy: EdgePolicy::Wall,
            post_reset_phase: ResumePhase::Running,
            start_paused: false,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Read a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config in {:?}", path))?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Head cell of the initial layout
    pub fn initial_head_position(&self) -> Position {
        self.initial_head.unwrap_or(Position::new(
            (self.grid_width / 2) as i32,
            (self.grid_height / 2) as i32,
        ))
    }

    /// Snake as laid out at start and after each reset
    pub fn initial_snake(&self) -> Snake {
        // A still snake is laid out as if it faced right
        let facing = self.initial_heading.unwrap_or(Direction::Right);
        Snake::new(
            self.initial_head_position(),
            facing,
            self.initial_snake_length,
        )
    }

    /// Reject configurations that would leave per-tick behaviour undefined
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.initial_snake_length == 0 {
            return Err(ConfigError::EmptySnake);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("tick"));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("frame"));
        }
        if !self.cell_size_px.is_finite() || self.cell_size_px <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size_px));
        }

        let width = self.grid_width as i32;
        let height = self.grid_height as i32;
        let snake = self.initial_snake();
        if let Some(outside) = snake
            .body
            .iter()
            .find(|p| p.x < 0 || p.x >= width || p.y < 0 || p.y >= height)
        {
            return Err(ConfigError::SnakeOutOfBounds {
                width: self.grid_width,
                height: self.grid_height,
                x: outside.x,
                y: outside.y,
            });
        }

        Ok(())
    }
}
