//! Main TUI application state and logic

use super::panes::{
    render_error_popup, render_memory_pane, render_output_pane, render_source_pane,
    render_status_bar, render_variables_pane, SourceRenderData, SourceScrollState,
    StatusRenderData,
};
use crate::interpreter::EngineError;
use crate::playback::{PlaybackState, Player};
use crate::snapshot::{EnvSnapshot, StepError, StepResult};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Longest the event loop waits for a key before re-checking the timer
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Variables,
    Output,
    Memory,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> output -> variables -> memory)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Variables,
            FocusedPane::Variables => FocusedPane::Memory,
            FocusedPane::Memory => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Memory,
            FocusedPane::Output => FocusedPane::Source,
            FocusedPane::Variables => FocusedPane::Output,
            FocusedPane::Memory => FocusedPane::Variables,
        }
    }
}

/// The main application state
pub struct App {
    pub player: Player,

    /// Longest value repr shown in the variables pane
    pub repr_limit: usize,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: SourceScrollState,
    pub variables_scroll: usize,
    pub output_scroll: usize,
    pub memory_scroll: usize,

    /// Names bound or rebound by the last step
    pub changed: Vec<String>,

    pub should_quit: bool,

    pub status_message: String,

    /// Failure waiting to be acknowledged; playback stays halted while set
    pub error_popup: Option<StepError>,

    /// Line whose step failed, kept until reset
    pub error_line: Option<usize>,
}

impl App {
    pub fn new(player: Player, repr_limit: usize) -> Self {
        App {
            player,
            repr_limit,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            variables_scroll: 0,
            output_scroll: 0,
            memory_scroll: 0,
            changed: Vec::new(),
            should_quit: false,
            status_message: String::from("Ready! Press space to play"),
            error_popup: None,
            error_line: None,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            self.poll_timer(Instant::now());

            let timeout = self
                .player
                .controller()
                .time_until_due(Instant::now())
                .map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 4 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Variables (top) | Memory (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        let engine = self.player.engine();
        let variables = engine.environment().variables();

        if let Some(program) = engine.program() {
            let last_step = self
                .player
                .last_result()
                .filter(|result| result.advanced)
                .map(|result| result.cursor..result.new_cursor);
            let data = SourceRenderData {
                program,
                current_line: (!engine.is_complete()).then(|| engine.cursor()),
                last_step,
                error_line: self.error_line,
            };
            render_source_pane(
                frame,
                left_rows[0],
                &data,
                self.focused_pane == FocusedPane::Source,
                &mut self.source_scroll,
            );
        }

        render_output_pane(
            frame,
            left_rows[1],
            engine.transcript(),
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        render_variables_pane(
            frame,
            right_rows[0],
            &variables,
            &self.changed,
            self.repr_limit,
            self.focused_pane == FocusedPane::Variables,
            &mut self.variables_scroll,
        );

        render_memory_pane(
            frame,
            right_rows[1],
            &variables,
            self.focused_pane == FocusedPane::Memory,
            &mut self.memory_scroll,
        );

        let status = StatusRenderData {
            state: self.player.state(),
            steps_taken: engine.steps_taken(),
            cursor: engine.cursor(),
            total_lines: engine.program().map_or(0, |program| program.len()),
            speed: self.player.controller().speed(),
            message: &self.status_message,
        };
        render_status_bar(frame, main_chunks[1], &status);

        if let Some(error) = &self.error_popup {
            render_error_popup(frame, size, error);
        }
    }

    /// Take a timed step when one is due. The environment is snapshotted
    /// for change tracking only then, not on every poll.
    fn poll_timer(&mut self, now: Instant) {
        if self.error_popup.is_some() || !self.player.controller().is_due(now) {
            return;
        }
        let before = self.player.engine().environment();
        match self.player.tick(now) {
            Ok(Some(result)) => {
                let result = result.clone();
                self.after_step(&before, &result);
            }
            Ok(None) => {}
            Err(e) => self.engine_error(e),
        }
    }

    /// Update pane state after a step, successful or not
    fn after_step(&mut self, before: &EnvSnapshot, result: &StepResult) {
        self.changed = result
            .environment
            .iter()
            .filter(|(name, value)| before.get(name) != Some(*value))
            .map(|(name, _)| name.to_string())
            .collect();

        if let Some(error) = &result.error {
            warn!(line = result.cursor + 1, error = %error.message, "step failed");
            self.error_line = Some(result.cursor);
            self.status_message = error.message.clone();
            self.error_popup = Some(error.clone());
            return;
        }

        self.output_scroll = usize::MAX;
        self.status_message = match (&result.value, self.player.state()) {
            (_, PlaybackState::Completed) => "Run complete".to_string(),
            (Some(value), _) => format!("=> {}", value),
            (None, PlaybackState::Running) => "Playing...".to_string(),
            (None, _) => format!(
                "Stepped line {}",
                if result.lines_consumed() > 1 {
                    format!("{}-{}", result.cursor + 1, result.new_cursor)
                } else {
                    (result.cursor + 1).to_string()
                }
            ),
        };
    }

    fn engine_error(&mut self, error: EngineError) {
        debug!(%error, "step refused");
        self.status_message = error.to_string();
    }

    fn step_once(&mut self) {
        let before = self.player.engine().environment();
        match self.player.step_once(Instant::now()) {
            Ok(Some(result)) => {
                let result = result.clone();
                self.after_step(&before, &result);
            }
            Ok(None) => {
                self.status_message = match self.player.state() {
                    PlaybackState::Failed => "Run failed; press r to reset".to_string(),
                    _ => "Run complete; press r to reset".to_string(),
                };
            }
            Err(e) => self.engine_error(e),
        }
    }

    fn reset(&mut self) {
        self.player.reset();
        self.changed.clear();
        self.error_popup = None;
        self.error_line = None;
        self.output_scroll = 0;
        self.variables_scroll = 0;
        self.memory_scroll = 0;
        self.status_message = "Reset to line 1".to_string();
    }

    fn adjust_speed(&mut self, delta: f64) {
        self.player.controller_mut().adjust_speed(delta);
        self.status_message = format!("Speed {:.1}x", self.player.controller().speed());
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        // The popup swallows everything except dismiss and quit
        if self.error_popup.is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.error_popup = None,
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.player.toggle(Instant::now());
                self.status_message = match self.player.state() {
                    PlaybackState::Running => "Playing...".to_string(),
                    PlaybackState::Paused => "Paused".to_string(),
                    PlaybackState::Completed => "Run complete; press r to reset".to_string(),
                    PlaybackState::Failed => "Run failed; press r to reset".to_string(),
                    PlaybackState::Idle => "Ready!".to_string(),
                };
            }
            KeyCode::Right | KeyCode::Char('n') => {
                self.player.pause();
                self.step_once();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_speed(0.1),
            KeyCode::Char('-') => self.adjust_speed(-0.1),
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Variables => {
                    self.variables_scroll = self.variables_scroll.saturating_sub(1);
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_sub(1);
                }
                FocusedPane::Memory => {
                    self.memory_scroll = self.memory_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Variables => {
                    self.variables_scroll = self.variables_scroll.saturating_add(1);
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_add(1);
                }
                FocusedPane::Memory => {
                    self.memory_scroll = self.memory_scroll.saturating_add(1);
                }
            },
            _ => {}
        }
    }
}
