use anyhow::{Context, Result};
use clap::Parser;
use ripple_snake::game::{EdgePolicy, GameConfig, ResumePhase};
use ripple_snake::modes::HumanMode;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "ripple_snake")]
#[command(version, about = "Snake with smooth motion and a ripple effect")]
struct Cli {
    /// JSON game configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Milliseconds per game tick
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Display frames per second
    #[arg(long)]
    fps: Option<u64>,

    /// What the grid edge does
    #[arg(long, value_enum)]
    edge: Option<EdgePolicy>,

    /// Phase to enter after a death resets
    #[arg(long, value_enum)]
    after_death: Option<ResumePhase>,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Write logs to this file (the terminal belongs to the game)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_json_file(path)?,
            None => GameConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(fps) = self.fps {
            config.frame_interval_ms = frame_interval_ms(fps);
        }
        if let Some(edge) = self.edge {
            config.edge_policy = edge;
        }
        if let Some(after_death) = self.after_death {
            config.post_reset_phase = after_death;
        }
        config.start_paused |= self.paused;

        Ok(config)
    }
}

/// Milliseconds between frames for a target rate; rates above 1000 run at 1 ms
fn frame_interval_ms(fps: u64) -> u64 {
    (1000 / fps.max(1)).max(1)
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {:?}", path))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = cli.game_config()?;
    tracing::info!(?config, "starting");

    let mut human_mode = HumanMode::new(config)?;
    human_mode.run().await?;

    Ok(())
}
