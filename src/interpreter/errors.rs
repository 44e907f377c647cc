//! Error types for the stepping interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! while a step executes, [`SyntaxError`] for programs that cannot be parsed at
//! all, and [`EngineError`] for misuse of the stepping contract.
//!
//! Runtime errors are reported per step; they halt playback but never corrupt
//! the environment.

use crate::parser::ast::SourceLocation;
use crate::parser::ParseError;

/// Runtime errors that can occur while executing a fragment
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// Undefined variable reference
    #[error("name '{name}' is not defined")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Operation applied to a value of the wrong type
    #[error("{message}")]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    /// Right type, unacceptable value
    #[error("{message}")]
    ValueError {
        message: String,
        location: SourceLocation,
    },

    /// Division or modulo by zero
    #[error("{message}")]
    DivisionByZero {
        message: String,
        location: SourceLocation,
    },

    /// Sequence index out of range
    #[error("{message}")]
    IndexOutOfRange {
        message: String,
        location: SourceLocation,
    },

    /// Unknown method on a value
    #[error("'{type_name}' object has no attribute '{attribute}'")]
    MissingAttribute {
        type_name: &'static str,
        attribute: String,
        location: SourceLocation,
    },

    /// Missing dict key; `key` holds the key's repr
    #[error("{key}")]
    MissingKey {
        key: String,
        location: SourceLocation,
    },

    /// Arithmetic result does not fit (64-bit ints, float range)
    #[error("{message}")]
    Overflow {
        message: String,
        location: SourceLocation,
    },

    /// `break` or `continue` with no enclosing loop
    #[error("'{keyword}' outside loop")]
    LoopControlOutsideLoop {
        keyword: &'static str,
        location: SourceLocation,
    },

    /// Operation budget used up, most likely by a non-terminating loop
    #[error("operation limit of {limit} exceeded (possible infinite loop)")]
    OperationLimitExceeded { limit: u64, location: SourceLocation },

    /// Construct the interpreter recognises but does not implement
    #[error("{message}")]
    UnsupportedOperation {
        message: String,
        location: SourceLocation,
    },

    /// A fragment failed to parse
    #[error("{message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::ValueError { location, .. }
            | RuntimeError::DivisionByZero { location, .. }
            | RuntimeError::IndexOutOfRange { location, .. }
            | RuntimeError::MissingAttribute { location, .. }
            | RuntimeError::MissingKey { location, .. }
            | RuntimeError::Overflow { location, .. }
            | RuntimeError::LoopControlOutsideLoop { location, .. }
            | RuntimeError::OperationLimitExceeded { location, .. }
            | RuntimeError::UnsupportedOperation { location, .. }
            | RuntimeError::Syntax { location, .. } => *location,
        }
    }

    /// Error class name as the language reports it (`NameError`, ...)
    pub fn class_name(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedVariable { .. } => "NameError",
            RuntimeError::TypeError { .. } | RuntimeError::UnsupportedOperation { .. } => {
                "TypeError"
            }
            RuntimeError::ValueError { .. } => "ValueError",
            RuntimeError::DivisionByZero { .. } => "ZeroDivisionError",
            RuntimeError::IndexOutOfRange { .. } => "IndexError",
            RuntimeError::MissingAttribute { .. } => "AttributeError",
            RuntimeError::MissingKey { .. } => "KeyError",
            RuntimeError::Overflow { .. } => "OverflowError",
            RuntimeError::LoopControlOutsideLoop { .. } | RuntimeError::Syntax { .. } => {
                "SyntaxError"
            }
            RuntimeError::OperationLimitExceeded { .. } => "RuntimeError",
        }
    }

    /// `Class: message`, the form shown to the user
    pub fn describe(&self) -> String {
        format!("{}: {}", self.class_name(), self)
    }

    pub(crate) fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn value_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::ValueError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn index_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::IndexOutOfRange {
            message: message.into(),
            location,
        }
    }
}

impl From<ParseError> for RuntimeError {
    fn from(err: ParseError) -> Self {
        RuntimeError::Syntax {
            message: err.message,
            location: err.location,
        }
    }
}

/// The whole program failed to parse; the run does not start
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("SyntaxError: {message} (line {line}, column {column})")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<ParseError> for SyntaxError {
    fn from(err: ParseError) -> Self {
        SyntaxError {
            message: err.message,
            line: err.location.line,
            column: err.location.column,
        }
    }
}

/// Misuse of the stepping contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no program loaded; start a run first")]
    NotStarted,

    #[error("program has already completed; reset to run it again")]
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_uses_class_name() {
        let err = RuntimeError::UndefinedVariable {
            name: "foo".to_string(),
            location: SourceLocation::new(1, 1),
        };
        assert_eq!(err.describe(), "NameError: name 'foo' is not defined");

        let err = RuntimeError::MissingKey {
            key: "'k'".to_string(),
            location: SourceLocation::new(2, 5),
        };
        assert_eq!(err.describe(), "KeyError: 'k'");
        assert_eq!(err.location().line, 2);
    }

    #[test]
    fn test_parse_error_conversions() {
        let parse = ParseError {
            message: "expected an indented block".to_string(),
            location: SourceLocation::new(3, 9),
        };
        let syntax = SyntaxError::from(parse.clone());
        assert_eq!(
            syntax.to_string(),
            "SyntaxError: expected an indented block (line 3, column 9)"
        );
        let runtime = RuntimeError::from(parse);
        assert_eq!(runtime.class_name(), "SyntaxError");
    }
}
