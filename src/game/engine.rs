use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use super::{
    action::{Command, Direction},
    config::{ConfigError, EdgePolicy, GameConfig, ResumePhase},
    food::place_food,
    state::{CollisionType, GameState, Phase, Position, TickSnapshot},
};
use crate::input::HeadingSlot;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or no heading yet; nothing was committed
    Idle,
    /// Moved one cell
    Moved,
    /// Moved onto the food and grew; food awaits relocation
    Grew,
    /// Collided; the segment list is the pre-death one
    Died(CollisionType),
}

/// The movement state machine. Sole owner of canonical game state.
pub struct GameEngine<R: Rng = StdRng> {
    config: GameConfig,
    state: GameState,
    heading: HeadingSlot,
    rng: R,
    seq: u64,
    committed_at: Instant,
}

impl GameEngine<StdRng> {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> GameEngine<R> {
    /// Create an engine drawing food positions from `rng`
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let phase = if config.start_paused {
            Phase::Paused
        } else {
            Phase::Running
        };
        let mut engine = Self {
            state: GameState::new(
                config.initial_snake(),
                None,
                config.grid_width,
                config.grid_height,
                phase,
            ),
            heading: HeadingSlot::new(config.initial_heading),
            config,
            rng,
            seq: 0,
            committed_at: Instant::now(),
        };
        engine.relocate_food();

        info!(
            width = engine.config.grid_width,
            height = engine.config.grid_height,
            edge = ?engine.config.edge_policy,
            "game engine ready"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Last committed heading
    pub fn heading(&self) -> Option<Direction> {
        self.heading.committed()
    }

    /// Route an outside command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Steer(direction) => self.request_direction(direction),
            Command::TogglePause => self.toggle_pause(),
        }
    }

    /// Buffer a direction for the next tick. Ignored unless running.
    pub fn request_direction(&mut self, direction: Direction) {
        if !self.state.phase.is_running() {
            return;
        }

        if !self.heading.request(direction) {
            trace!(?direction, "reversal dropped");
        }
    }

    /// Running <-> Paused. No effect while dying.
    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            Phase::Running => Phase::Paused,
            Phase::Paused => Phase::Running,
            dying @ Phase::Dying { .. } => dying,
        };
        debug!(phase = self.state.phase.label(), "pause toggled");
    }

    /// Advance the simulation one cell
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if !self.state.phase.is_running() {
            return TickOutcome::Idle;
        }

        let Some(direction) = self.heading.commit() else {
            return TickOutcome::Idle;
        };

        let mut new_head = self.state.snake.head().moved_in_direction(direction);

        if !self.state.is_in_bounds(new_head) {
            match self.config.edge_policy {
                EdgePolicy::Wall => return self.die(CollisionType::Wall, now),
                EdgePolicy::Wrap => {
                    new_head = new_head.wrapped(self.state.grid_width, self.state.grid_height)
                }
            }
        }

        // Checked against the pre-move body, tail included
        if self.state.snake.occupies(new_head) {
            return self.die(CollisionType::SelfCollision, now);
        }

        let grow = self.state.food == Some(new_head);
        self.state.snake.advance(new_head, grow);
        self.commit(now);

        if grow {
            self.state.score += 1;
            self.state.food = None;
            debug!(score = self.state.score, x = new_head.x, y = new_head.y, "food eaten");
            TickOutcome::Grew
        } else {
            TickOutcome::Moved
        }
    }

    /// Whether the food has to be (re)placed
    pub fn needs_food(&self) -> bool {
        self.state.food.is_none()
    }

    /// Place food on a free cell if none is on the board.
    ///
    /// Kept apart from `tick` so random draws never sit on the movement path.
    pub fn relocate_food(&mut self) -> Option<Position> {
        if self.state.food.is_none() {
            self.state.food = place_food(
                &mut self.rng,
                self.state.grid_width,
                self.state.grid_height,
                &self.state.snake.body,
            );
            if self.state.food.is_none() {
                warn!(length = self.state.snake.len(), "no free cell left for food");
            }
        }
        self.state.food
    }

    /// When the pending death reset is due, if dying
    pub fn reset_deadline(&self) -> Option<Instant> {
        match self.state.phase {
            Phase::Dying { since } => Some(since + self.config.reset_delay()),
            _ => None,
        }
    }

    /// Complete the reset if its deadline has passed. Returns true on reset.
    pub fn poll_reset(&mut self, now: Instant) -> bool {
        match self.reset_deadline() {
            Some(deadline) if now >= deadline => {
                self.complete_reset(now);
                true
            }
            _ => false,
        }
    }

    /// Restore the initial layout after a death
    pub fn complete_reset(&mut self, now: Instant) {
        if !self.state.phase.is_dying() {
            return;
        }

        let phase = match self.config.post_reset_phase {
            ResumePhase::Running => Phase::Running,
            ResumePhase::Paused => Phase::Paused,
        };
        self.state = GameState::new(
            self.config.initial_snake(),
            None,
            self.config.grid_width,
            self.config.grid_height,
            phase,
        );
        self.heading.reset(self.config.initial_heading);
        self.relocate_food();
        self.commit(now);

        info!(phase = phase.label(), "game reset");
    }

    /// Copy of the state the render side is allowed to see
    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            seq: self.seq,
            segments: self.state.snake.body.clone(),
            heading: self.heading.committed(),
            phase: self.state.phase,
            food: self.state.food,
            score: self.state.score,
            grid_width: self.state.grid_width,
            grid_height: self.state.grid_height,
            at: self.committed_at,
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    fn die(&mut self, collision: CollisionType, now: Instant) -> TickOutcome {
        self.state.phase = Phase::Dying { since: now };
        self.commit(now);

        info!(?collision, score = self.state.score, "snake died");
        TickOutcome::Died(collision)
    }

    fn commit(&mut self, now: Instant) {
        self.seq += 1;
        self.committed_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Snake;
    use std::time::Duration;

    fn engine(config: GameConfig) -> GameEngine {
        GameEngine::with_rng(config, StdRng::seed_from_u64(7)).unwrap()
    }

    /// Park the food where the snake won't reach it during a test
    fn park_food(engine: &mut GameEngine, pos: Position) {
        engine.state_mut().food = Some(pos);
    }

    #[test]
    fn test_new_engine() {
        let engine = engine(GameConfig::default());
        let state = engine.state();

        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.len(), 3);
        assert!(!state.snake.occupies(state.food.unwrap()));
        assert_eq!(engine.heading(), Some(Direction::Right));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = GameEngine::new(GameConfig::new(0, 0));
        assert!(matches!(result, Err(ConfigError::EmptyGrid { .. })));
    }

    #[test]
    fn test_three_ticks_right() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(0, 0));
        let start = engine.state().snake.head();
        let now = Instant::now();

        for _ in 0..3 {
            assert_eq!(engine.tick(now), TickOutcome::Moved);
        }

        assert_eq!(engine.state().snake.head(), Position::new(start.x + 3, 5));
        assert_eq!(engine.state().snake.len(), 3);
    }

    #[test]
    fn test_food_consumption_and_relocation() {
        let mut engine = engine(GameConfig::small());
        let head = engine.state().snake.head();
        park_food(&mut engine, head.moved_in_direction(Direction::Right));
        let tail = engine.state().snake.tail();

        assert_eq!(engine.tick(Instant::now()), TickOutcome::Grew);
        assert_eq!(engine.state().snake.len(), 4);
        assert_eq!(engine.state().snake.tail(), tail);
        assert_eq!(engine.state().score, 1);
        assert!(engine.needs_food());

        let food = engine.relocate_food().unwrap();
        assert!(!engine.state().snake.occupies(food));
        assert!(!engine.needs_food());
    }

    #[test]
    fn test_wall_collision_keeps_pre_death_segments() {
        let mut config = GameConfig::small();
        config.initial_head = Some(Position::new(9, 5));
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));
        let before = engine.state().snake.body.clone();

        let outcome = engine.tick(Instant::now());

        assert_eq!(outcome, TickOutcome::Died(CollisionType::Wall));
        assert!(engine.phase().is_dying());
        assert_eq!(engine.snapshot().segments, before);
    }

    #[test]
    fn test_wrap_policy_crosses_edge() {
        let mut config = GameConfig::small();
        config.initial_head = Some(Position::new(9, 5));
        config.edge_policy = EdgePolicy::Wrap;
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));

        assert_eq!(engine.tick(Instant::now()), TickOutcome::Moved);
        assert_eq!(engine.state().snake.head(), Position::new(0, 5));
    }

    #[test]
    fn test_self_collision() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(8, 8));

        // Length 5 so the loop closes on a body segment
        engine.state_mut().snake = Snake::new(Position::new(5, 5), Direction::Right, 5);
        let now = Instant::now();

        engine.request_direction(Direction::Down);
        engine.tick(now);
        engine.request_direction(Direction::Left);
        engine.tick(now);
        engine.request_direction(Direction::Up);
        let outcome = engine.tick(now);

        assert_eq!(outcome, TickOutcome::Died(CollisionType::SelfCollision));
    }

    #[test]
    fn test_moving_into_tail_cell_is_fatal() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(0, 0));
        // 2x2 loop: head (5,5), then (5,6), (4,6), tail (4,5)
        engine.state_mut().snake.body = vec![
            Position::new(5, 5),
            Position::new(5, 6),
            Position::new(4, 6),
            Position::new(4, 5),
        ];
        engine.heading.reset(Some(Direction::Up));

        engine.request_direction(Direction::Left);
        assert_eq!(
            engine.tick(Instant::now()),
            TickOutcome::Died(CollisionType::SelfCollision)
        );
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(0, 0));

        engine.request_direction(Direction::Left);
        engine.tick(Instant::now());

        assert_eq!(engine.heading(), Some(Direction::Right));
        assert_eq!(engine.state().snake.head(), Position::new(6, 5));
    }

    #[test]
    fn test_still_snake_waits_for_input() {
        let mut config = GameConfig::small();
        config.initial_heading = None;
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));

        assert_eq!(engine.tick(Instant::now()), TickOutcome::Idle);
        assert_eq!(engine.state().snake.head(), Position::new(5, 5));

        engine.request_direction(Direction::Up);
        assert_eq!(engine.tick(Instant::now()), TickOutcome::Moved);
        assert_eq!(engine.state().snake.head(), Position::new(5, 4));
    }

    #[test]
    fn test_pause_gates_ticks_and_input() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(0, 0));
        let head = engine.state().snake.head();

        engine.apply(Command::TogglePause);
        assert_eq!(engine.phase(), Phase::Paused);

        engine.apply(Command::Steer(Direction::Up));
        assert_eq!(engine.tick(Instant::now()), TickOutcome::Idle);
        assert_eq!(engine.state().snake.head(), head);

        engine.apply(Command::TogglePause);
        assert_eq!(engine.tick(Instant::now()), TickOutcome::Moved);
        // The request made while paused was ignored
        assert_eq!(engine.heading(), Some(Direction::Right));
    }

    #[test]
    fn test_start_paused() {
        let mut config = GameConfig::small();
        config.start_paused = true;
        let engine = engine(config);
        assert_eq!(engine.phase(), Phase::Paused);
    }

    #[test]
    fn test_dying_ignores_pause_and_input() {
        let mut config = GameConfig::small();
        config.initial_head = Some(Position::new(9, 5));
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));
        engine.tick(Instant::now());

        engine.toggle_pause();
        assert!(engine.phase().is_dying());

        engine.request_direction(Direction::Up);
        assert_eq!(engine.heading.pending(), None);
        assert_eq!(engine.tick(Instant::now()), TickOutcome::Idle);
    }

    #[test]
    fn test_reset_after_delay() {
        let mut config = GameConfig::small();
        config.initial_head = Some(Position::new(9, 5));
        config.reset_delay_ms = 500;
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));

        let died_at = Instant::now();
        engine.tick(died_at);
        engine.state_mut().score = 4;
        assert_eq!(
            engine.reset_deadline(),
            Some(died_at + Duration::from_millis(500))
        );

        assert!(!engine.poll_reset(died_at + Duration::from_millis(499)));
        assert!(engine.phase().is_dying());

        assert!(engine.poll_reset(died_at + Duration::from_millis(500)));
        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(engine.state().snake.head(), Position::new(9, 5));
        assert_eq!(engine.state().score, 0);
        assert_eq!(engine.heading(), Some(Direction::Right));
        assert!(!engine.state().snake.occupies(engine.state().food.unwrap()));
    }

    #[test]
    fn test_reset_can_land_paused() {
        let mut config = GameConfig::small();
        config.initial_head = Some(Position::new(9, 5));
        config.post_reset_phase = ResumePhase::Paused;
        let mut engine = engine(config);
        park_food(&mut engine, Position::new(0, 0));

        let now = Instant::now();
        engine.tick(now);
        engine.complete_reset(now);

        assert_eq!(engine.phase(), Phase::Paused);
    }

    #[test]
    fn test_reset_is_noop_when_alive() {
        let mut engine = engine(GameConfig::small());
        let seq = engine.snapshot().seq;
        engine.complete_reset(Instant::now());
        assert_eq!(engine.snapshot().seq, seq);
        assert!(!engine.poll_reset(Instant::now()));
    }

    #[test]
    fn test_snapshot_seq_tracks_commits() {
        let mut engine = engine(GameConfig::small());
        park_food(&mut engine, Position::new(0, 0));
        let start = engine.snapshot().seq;

        engine.toggle_pause();
        assert_eq!(engine.snapshot().seq, start);
        assert_eq!(engine.snapshot().phase, Phase::Paused);

        engine.toggle_pause();
        let now = Instant::now();
        engine.tick(now);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.seq, start + 1);
        assert_eq!(snapshot.at, now);
    }

    #[test]
    fn test_movement_is_deterministic() {
        let script = [
            None,
            Some(Direction::Up),
            None,
            Some(Direction::Left),
            Some(Direction::Down),
            None,
        ];

        let run = |seed: u64| {
            let mut engine = GameEngine::with_rng(GameConfig::new(12, 12), StdRng::seed_from_u64(seed))
                .unwrap();
            engine.state_mut().food = Some(Position::new(0, 11));
            let mut history = Vec::new();
            for request in script {
                if let Some(direction) = request {
                    engine.request_direction(direction);
                }
                engine.tick(Instant::now());
                history.push(engine.state().snake.body.clone());
            }
            history
        };

        assert_eq!(run(1), run(99));
    }

    #[test]
    fn test_running_invariants_hold_over_long_play() {
        let mut engine = GameEngine::with_rng(GameConfig::new(8, 8), StdRng::seed_from_u64(3))
            .unwrap();
        let turns = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
        let now = Instant::now();

        for i in 0..400 {
            if i % 5 == 0 {
                engine.request_direction(turns[(i / 5) % turns.len()]);
            }
            engine.tick(now);
            if engine.needs_food() {
                engine.relocate_food();
            }
            if engine.phase().is_dying() {
                engine.complete_reset(now);
                continue;
            }

            let state = engine.state();
            for (idx, seg) in state.snake.body.iter().enumerate() {
                assert!(state.is_in_bounds(*seg));
                assert!(!state.snake.body[idx + 1..].contains(seg));
            }
            if let Some(food) = state.food {
                assert!(!state.snake.occupies(food));
            }
        }
    }
}
