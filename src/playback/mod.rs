//! Timed playback over the stepping engine
//!
//! - [`PlaybackController`]: the play/pause state machine and its cadence
//! - [`Player`]: an [`Engine`] driven by a controller
//!
//! # Scheduling
//!
//! Nothing here owns a timer. The caller passes the current [`Instant`] into
//! [`Player::tick`], which performs at most one step when one is due. Steps
//! are synchronous and `tick` takes `&mut self`, so two steps can never
//! overlap and a pause always lands between steps.

use std::time::{Duration, Instant};

use crate::config::{clamp_speed, ConfigError, DEFAULT_BASE_INTERVAL, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
use crate::interpreter::engine::Engine;
use crate::interpreter::errors::EngineError;
use crate::snapshot::StepResult;
use tracing::debug;

/// Where playback stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "IDLE",
            PlaybackState::Running => "RUNNING",
            PlaybackState::Paused => "PAUSED",
            PlaybackState::Completed => "DONE",
            PlaybackState::Failed => "FAILED",
        }
    }

    /// Whether the run has ended and only a reset can continue it
    pub fn is_finished(self) -> bool {
        matches!(self, PlaybackState::Completed | PlaybackState::Failed)
    }
}

/// Play/pause state machine with a speed-derived step interval
#[derive(Debug, Clone)]
pub struct PlaybackController {
    state: PlaybackState,
    speed: f64,
    base_interval: Duration,

    /// When the next automatic step fires; only set while running
    next_due: Option<Instant>,

    /// When the last step was recorded
    last_step: Option<Instant>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        PlaybackController::new(DEFAULT_BASE_INTERVAL, DEFAULT_SPEED)
    }
}

impl PlaybackController {
    /// Out-of-range speeds are clamped; invalid ones fall back to the default
    pub fn new(base_interval: Duration, speed: f64) -> Self {
        PlaybackController {
            state: PlaybackState::Idle,
            speed: clamp_speed(speed).unwrap_or(DEFAULT_SPEED),
            base_interval,
            next_due: None,
            last_step: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// `base_interval / speed`
    pub fn interval(&self) -> Duration {
        self.base_interval.div_f64(self.speed)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Start or resume; the first step is due immediately
    pub fn play(&mut self, now: Instant) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Paused) {
            self.state = PlaybackState::Running;
            self.next_due = Some(now);
        }
    }

    /// Stop scheduling steps; the step in progress, if any, is unaffected
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Paused;
            self.next_due = None;
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.state == PlaybackState::Running {
            self.pause();
        } else {
            self.play(now);
        }
    }

    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.next_due = None;
        self.last_step = None;
    }

    /// Change the cadence of future steps. Never steps by itself.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.speed = clamp_speed(speed)?;
        if self.state == PlaybackState::Running {
            if let Some(last) = self.last_step {
                self.next_due = Some(last + self.interval());
            }
        }
        Ok(())
    }

    /// Nudge the speed by `delta`, staying within bounds and on a 0.1 grid
    pub fn adjust_speed(&mut self, delta: f64) {
        let target = ((self.speed + delta) * 10.0).round() / 10.0;
        // Clamped target is always valid
        let _ = self.set_speed(target.clamp(MIN_SPEED, MAX_SPEED));
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.state == PlaybackState::Running && self.next_due.is_some_and(|due| now >= due)
    }

    /// Time left until the next step, zero when overdue
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Fold a step's outcome into the state machine
    pub fn record(&mut self, result: &StepResult, program_len: usize, now: Instant) {
        self.last_step = Some(now);
        if result.error.is_some() {
            self.fail();
        } else if result.new_cursor >= program_len {
            self.complete();
        } else if self.state == PlaybackState::Running {
            self.next_due = Some(now + self.interval());
        }
    }

    pub fn complete(&mut self) {
        self.state = PlaybackState::Completed;
        self.next_due = None;
    }

    pub fn fail(&mut self) {
        self.state = PlaybackState::Failed;
        self.next_due = None;
    }
}

/// An engine plus the controller that paces it
#[derive(Debug)]
pub struct Player {
    engine: Engine,
    controller: PlaybackController,
    last_result: Option<StepResult>,
}

impl Player {
    pub fn new(engine: Engine, controller: PlaybackController) -> Self {
        let mut player = Player {
            engine,
            controller,
            last_result: None,
        };
        if player.engine.is_complete() {
            player.controller.complete();
        }
        player
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    /// Result of the most recent step since the last reset
    pub fn last_result(&self) -> Option<&StepResult> {
        self.last_result.as_ref()
    }

    pub fn play(&mut self, now: Instant) {
        if self.engine.is_complete() {
            self.controller.complete();
        } else {
            self.controller.play(now);
        }
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.controller.state() == PlaybackState::Running {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Perform one step if the controller says one is due
    pub fn tick(&mut self, now: Instant) -> Result<Option<&StepResult>, EngineError> {
        if !self.controller.is_due(now) {
            return Ok(None);
        }
        self.advance(now)
    }

    /// Manual single step; refused once the run has completed or failed
    pub fn step_once(&mut self, now: Instant) -> Result<Option<&StepResult>, EngineError> {
        if self.controller.state().is_finished() {
            return Ok(None);
        }
        self.advance(now)
    }

    fn advance(&mut self, now: Instant) -> Result<Option<&StepResult>, EngineError> {
        if self.engine.is_complete() {
            self.controller.complete();
            return Ok(None);
        }

        let result = self.engine.step()?;
        let program_len = self.engine.program().map_or(0, |program| program.len());
        self.controller.record(&result, program_len, now);
        debug!(state = ?self.controller.state(), cursor = self.engine.cursor(), "playback advanced");

        self.last_result = Some(result);
        Ok(self.last_result.as_ref())
    }

    /// Back to the first line with a fresh environment
    pub fn reset(&mut self) {
        self.engine.reset();
        self.controller.reset();
        self.last_result = None;
        if self.engine.is_complete() {
            self.controller.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::engine::EngineConfig;

    fn player(source: &str) -> Player {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run(source).unwrap();
        Player::new(engine, PlaybackController::default())
    }

    #[test]
    fn test_interval_follows_speed() {
        let mut controller = PlaybackController::default();
        assert_eq!(controller.interval(), Duration::from_secs(1));
        controller.set_speed(2.0).unwrap();
        assert_eq!(controller.interval(), Duration::from_millis(500));
        controller.set_speed(100.0).unwrap();
        assert_eq!(controller.speed(), MAX_SPEED);
        assert!(controller.set_speed(0.0).is_err());
        assert!(controller.set_speed(f64::NAN).is_err());
    }

    #[test]
    fn test_adjust_speed_stays_in_range() {
        let mut controller = PlaybackController::new(Duration::from_secs(1), 0.2);
        controller.adjust_speed(-0.1);
        assert_eq!(controller.speed(), 0.1);
        controller.adjust_speed(-0.1);
        assert_eq!(controller.speed(), MIN_SPEED);
        controller.adjust_speed(0.3);
        assert_eq!(controller.speed(), 0.4);
    }

    #[test]
    fn test_play_pause_transitions() {
        let now = Instant::now();
        let mut controller = PlaybackController::default();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(!controller.is_due(now));

        controller.play(now);
        assert_eq!(controller.state(), PlaybackState::Running);
        assert!(controller.is_due(now));

        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(!controller.is_due(now + Duration::from_secs(10)));

        controller.toggle(now);
        assert_eq!(controller.state(), PlaybackState::Running);
        controller.reset();
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_tick_steps_only_when_due() {
        let start = Instant::now();
        let mut player = player("a = 1\nb = 2\nc = 3");
        player.play(start);

        assert!(player.tick(start).unwrap().is_some());
        assert_eq!(player.engine().cursor(), 1);

        // Not due again until a full interval has passed
        assert!(player.tick(start + Duration::from_millis(500)).unwrap().is_none());
        assert!(player.tick(start + Duration::from_secs(1)).unwrap().is_some());
        assert!(player.tick(start + Duration::from_secs(2)).unwrap().is_some());
        assert_eq!(player.state(), PlaybackState::Completed);
        assert!(player.tick(start + Duration::from_secs(3)).unwrap().is_none());
    }

    #[test]
    fn test_failure_stops_playback() {
        let start = Instant::now();
        let mut player = player("a = 1\nb = missing\nc = 3");
        player.play(start);
        player.tick(start).unwrap();
        let result = player.tick(start + Duration::from_secs(1)).unwrap().cloned().unwrap();
        assert!(result.error.is_some());
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(player.engine().cursor(), 1);
        assert!(player.step_once(start + Duration::from_secs(5)).unwrap().is_none());
    }

    #[test]
    fn test_set_speed_while_paused_never_steps() {
        let start = Instant::now();
        let mut player = player("a = 1\nb = 2");
        player.play(start);
        player.tick(start).unwrap();
        player.pause();
        player.controller_mut().set_speed(3.0).unwrap();
        assert!(player.tick(start + Duration::from_secs(60)).unwrap().is_none());
        assert_eq!(player.engine().cursor(), 1);
    }

    #[test]
    fn test_speed_change_reschedules_from_last_step() {
        let start = Instant::now();
        let mut player = player("a = 1\nb = 2\nc = 3");
        player.play(start);
        player.tick(start).unwrap();
        player.controller_mut().set_speed(2.0).unwrap();
        assert_eq!(
            player.controller().next_due(),
            Some(start + Duration::from_millis(500))
        );
    }

    #[test]
    fn test_step_once_while_idle_and_reset() {
        let now = Instant::now();
        let mut player = player("print('x')\ny = 1");
        let output = player.step_once(now).unwrap().map(|r| r.output.clone());
        assert_eq!(output.as_deref(), Some("x\n"));
        assert_eq!(player.state(), PlaybackState::Idle);

        player.reset();
        assert_eq!(player.engine().cursor(), 0);
        assert!(player.last_result().is_none());
        assert!(player.engine().environment().is_empty());
    }

    #[test]
    fn test_empty_program_completes_on_play() {
        let now = Instant::now();
        let mut player = player("");
        assert_eq!(player.state(), PlaybackState::Completed);
        player.reset();
        player.play(now);
        assert_eq!(player.state(), PlaybackState::Completed);
    }
}
