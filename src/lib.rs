//! # Introduction
//!
//! stepviz runs a small Python-flavoured scripting language one source line at
//! a time and shows the state after every step: the variables in scope, what
//! has been printed and roughly how much memory each binding takes. Playback
//! is driven by a timer in a terminal UI built with
//! [ratatui](https://docs.rs/ratatui), or by a plain headless runner.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Program lines → Step → (Lexer → Parser → Evaluator) → Snapshot → TUI
//! ```
//!
//! 1. [`program`]: the source split into lines, plus block-extent discovery
//!    for compound statements.
//! 2. [`parser`]: tokenises one fragment (a line or a whole block) and builds
//!    an AST.
//! 3. [`interpreter`]: executes a fragment against a scratch copy of the
//!    environment and commits it only on success. [`interpreter::Engine`]
//!    owns the cursor and the run.
//! 4. [`memory`]: [`memory::value::Value`] and the flat global
//!    [`memory::environment::Environment`].
//! 5. [`snapshot`]: immutable per-step results, output transcript and
//!    renderer-facing variable views.
//! 6. [`playback`]: play, pause, speed and the step cadence.
//! 7. [`ui`] and [`headless`]: the two front ends.
//!
//! ## Supported language subset
//!
//! Values: `int`, `float`, `str`, `bool`, `None`, lists, tuples, dicts, ranges.
//! Statements: assignment (plain, augmented, indexed, tuple unpacking),
//! `if/elif/else`, `while`, `for`, `break`, `continue`, `pass`.
//! Builtins: `print`, `range`, `len`, `str`, `int`, `float`, `sorted`,
//! `enumerate`, `zip` and friends, plus the common list, str and dict methods.
//! There are no user-defined functions, classes or imports.

pub mod config;
pub mod headless;
pub mod interpreter;
pub mod logging;
pub mod memory;
pub mod parser;
pub mod playback;
pub mod program;
pub mod snapshot;
pub mod ui;
