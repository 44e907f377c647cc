// Stepping engine: owns the program, the environment and the cursor of a run

use crate::interpreter::constants::DEFAULT_MAX_OPERATIONS;
use crate::interpreter::errors::{EngineError, SyntaxError};
use crate::interpreter::step;
use crate::memory::environment::Environment;
use crate::parser::parse_program;
use crate::program::Program;
use crate::snapshot::{EnvSnapshot, StepResult, Transcript};
use tracing::{debug, info, warn};

/// Tunables for step execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Statements plus loop iterations a single step may execute
    pub max_operations: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

/// The stepping engine behind the UI and the playback controller
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,

    /// Source of the current run; `None` until a run starts
    program: Option<Program>,

    /// Bindings of the current run
    env: Environment,

    /// Next line to execute (0-based); equals the program length on completion
    cursor: usize,

    /// Output of every successful step so far
    transcript: Transcript,

    /// Successful steps since the run started
    steps_taken: usize,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            ..Engine::default()
        }
    }

    /// Start a run of `source`.
    ///
    /// The whole text must parse; on failure the previous run, if any, is
    /// left exactly as it was.
    pub fn start_run(&mut self, source: &str) -> Result<(), SyntaxError> {
        if let Err(err) = parse_program(source) {
            let err = SyntaxError::from(err);
            warn!(error = %err, "program rejected");
            return Err(err);
        }

        let program = Program::load(source);
        info!(lines = program.len(), "run started");
        self.program = Some(program);
        self.restart();
        Ok(())
    }

    /// Advance by one line or one whole block.
    ///
    /// A failed step is still `Ok`: the error is inside the result and the
    /// cursor does not move.
    pub fn step(&mut self) -> Result<StepResult, EngineError> {
        let program = self.program.as_ref().ok_or(EngineError::NotStarted)?;
        if self.cursor >= program.len() {
            return Err(EngineError::Completed);
        }

        let result = step::step(program, self.cursor, &mut self.env, &self.config)?;
        let program_len = program.len();

        match &result.error {
            Some(error) => {
                warn!(line = result.cursor + 1, error = %error.message, "step failed");
            }
            None => {
                debug!(
                    line = result.cursor + 1,
                    next = result.new_cursor + 1,
                    output_bytes = result.output.len(),
                    "step ok"
                );
                self.transcript.record(&result.output, result.cursor);
                self.cursor = result.new_cursor;
                self.steps_taken += 1;
                if self.cursor >= program_len {
                    info!(steps = self.steps_taken, "run completed");
                }
            }
        }

        Ok(result)
    }

    /// Fresh environment, cursor back to the first line, same source
    pub fn reset(&mut self) {
        info!("run reset");
        self.restart();
    }

    fn restart(&mut self) {
        self.env.reset();
        self.cursor = 0;
        self.transcript.clear();
        self.steps_taken = 0;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Copy of the current bindings
    pub fn environment(&self) -> EnvSnapshot {
        self.env.get_all()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn is_started(&self) -> bool {
        self.program.is_some()
    }

    /// Whether the cursor has reached the end of the program
    pub fn is_complete(&self) -> bool {
        self.program
            .as_ref()
            .is_some_and(|program| self.cursor >= program.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Value;

    #[test]
    fn test_step_before_start() {
        let mut engine = Engine::new(EngineConfig::default());
        assert_eq!(engine.step(), Err(EngineError::NotStarted));
        assert!(!engine.is_started());
    }

    #[test]
    fn test_run_to_completion() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("a = 1\n\nb = a + 1\n").unwrap();
        while !engine.is_complete() {
            assert!(engine.step().unwrap().is_ok());
        }
        assert_eq!(engine.cursor(), 3);
        assert_eq!(engine.steps_taken(), 3);
        assert_eq!(engine.environment().get("b"), Some(&Value::Int(2)));
        assert_eq!(engine.step(), Err(EngineError::Completed));
    }

    #[test]
    fn test_syntax_error_keeps_previous_run() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("x = 1\ny = 2").unwrap();
        engine.step().unwrap();

        let err = engine.start_run("x = (1").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(engine.cursor(), 1);
        assert_eq!(engine.environment().get("x"), Some(&Value::Int(1)));
        assert_eq!(engine.program().map(Program::len), Some(2));
    }

    #[test]
    fn test_failed_step_keeps_cursor() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("x = 1\ny = x / 0\nz = 3").unwrap();
        engine.step().unwrap();
        let result = engine.step().unwrap();
        assert!(!result.is_ok());
        assert_eq!(engine.cursor(), 1);
        assert_eq!(engine.steps_taken(), 1);
        assert_eq!(engine.environment().names(), vec!["x"]);
    }

    #[test]
    fn test_transcript_and_reset() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("print('a')\nprint('b')").unwrap();
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.transcript().get_output(), vec!["a", "b"]);

        engine.reset();
        assert_eq!(engine.cursor(), 0);
        assert!(engine.transcript().is_empty());
        assert!(engine.environment().is_empty());
        assert!(engine.is_started());
    }

    #[test]
    fn test_empty_program_is_complete_immediately() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.start_run("").unwrap();
        assert!(engine.is_complete());
        assert_eq!(engine.step(), Err(EngineError::Completed));
    }

    #[test]
    fn test_operation_budget_from_config() {
        let mut engine = Engine::new(EngineConfig { max_operations: 50 });
        engine.start_run("n = 0\nwhile True:\n    n += 1").unwrap();
        engine.step().unwrap();
        let result = engine.step().unwrap();
        let error = result.error.unwrap();
        assert!(error.message.starts_with("RuntimeError: operation limit of 50"));
        assert_eq!(engine.environment().get("n"), Some(&Value::Int(0)));
    }
}
