use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{Stream, StreamExt};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io::{Stderr, stderr};
use std::time::Instant;
use tokio::time::{MissedTickBehavior, interval, sleep_until};
use tracing::{debug, info};

use crate::game::{GameConfig, GameEngine, TickOutcome};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::{
    EatEvent, FrameView, Interpolator, PixelPosition, PositionPublisher, Renderer, RippleEffect,
    ShaderChannel,
};

/// Raw mode, alternate screen and hidden cursor, undone on drop so every exit
/// path (errors and panics included) gives the terminal back.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stderr>>,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let terminal = match Terminal::new(CrosstermBackend::new(stderr())) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                return Err(err).context("Failed to create terminal");
            }
        };

        // From here on Drop restores the terminal
        let mut session = Self { terminal };
        execute!(session.terminal.backend_mut(), EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;
        session
            .terminal
            .hide_cursor()
            .context("Failed to hide cursor")?;
        session.terminal.clear().context("Failed to clear terminal")?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Keyboard play: composes the engine, the frame-rate side and the shader feed
pub struct HumanMode {
    engine: GameEngine,
    interpolator: Interpolator,
    publisher: PositionPublisher,
    ripple: RippleEffect,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig) -> Result<Self> {
        let engine = GameEngine::new(config).context("Invalid game configuration")?;
        let snapshot = engine.snapshot();
        let cell_size = engine.config().cell_size_px;

        let (channel, feed) =
            ShaderChannel::new(PixelPosition::from_cell(snapshot.head().into(), cell_size));
        let interpolator = Interpolator::new(engine.config().tick_interval(), snapshot);

        Ok(Self {
            engine,
            interpolator,
            publisher: PositionPublisher::new(cell_size, Box::new(channel)),
            ripple: RippleEffect::new(feed),
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut session = TerminalSession::enter()?;
        info!("session started");

        let result = self
            .run_game_loop(&mut session.terminal, EventStream::new())
            .await;

        drop(session);
        info!(deaths = self.metrics.deaths, best = self.metrics.best_score, "session ended");
        result
    }

    async fn run_game_loop<B, S>(&mut self, terminal: &mut Terminal<B>, mut events: S) -> Result<()>
    where
        B: Backend,
        S: Stream<Item = std::io::Result<Event>> + Unpin,
    {
        let mut tick_timer = interval(self.engine.config().tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut frame_timer = interval(self.engine.config().frame_interval());
        frame_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Wall-clock reset timer, armed on death and independent of ticks
        let reset_timer = sleep_until(tokio::time::Instant::now());
        tokio::pin!(reset_timer);
        let mut reset_armed = false;

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => debug!(%err, "terminal event error"),
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    if let TickOutcome::Died(_) = self.on_tick(Instant::now()) {
                        if let Some(deadline) = self.engine.reset_deadline() {
                            reset_timer
                                .as_mut()
                                .reset(tokio::time::Instant::from_std(deadline));
                            reset_armed = true;
                        }
                    }
                }

                _ = &mut reset_timer, if reset_armed => {
                    reset_armed = false;
                    self.on_reset(Instant::now());
                }

                // Render frame
                _ = frame_timer.tick() => {
                    self.draw_frame(terminal, Instant::now())?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Game(command) => {
                    self.engine.apply(command);
                    // Same seq, so this only refreshes phase for the renderer
                    self.interpolator.observe(self.engine.snapshot());
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }
    }

    fn on_tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.engine.tick(now);

        match outcome {
            TickOutcome::Idle => return outcome,
            TickOutcome::Moved => {}
            TickOutcome::Grew => {
                let state = self.engine.state();
                let event = EatEvent {
                    cell: state.snake.head(),
                    score: state.score,
                };
                self.metrics.on_food(event.score);
                self.publisher.publish_eat(event);
            }
            TickOutcome::Died(collision) => {
                self.metrics.on_death(self.engine.state().score);
                debug!(?collision, "reset pending");
            }
        }

        if self.engine.needs_food() {
            self.engine.relocate_food();
        }
        self.interpolator.observe(self.engine.snapshot());
        outcome
    }

    fn on_reset(&mut self, now: Instant) {
        self.engine.complete_reset(now);
        self.metrics.on_game_start();
        self.interpolator.observe(self.engine.snapshot());
    }

    fn draw_frame<B: Backend>(&mut self, terminal: &mut Terminal<B>, now: Instant) -> Result<()> {
        let segments = self.interpolator.sample(now);
        let head_px = self.publisher.publish_frame(self.interpolator.head(now));
        let ripple = self.ripple.update(now);
        self.metrics.update();

        let view = FrameView {
            snapshot: self.interpolator.current(),
            segments: &segments,
            head_px,
            ripple,
            cell_size: self.publisher.cell_size(),
        };
        terminal
            .draw(|frame| {
                self.renderer.render(frame, &view, &self.metrics);
            })
            .context("Failed to draw frame")?;

        Ok(())
    }
}
