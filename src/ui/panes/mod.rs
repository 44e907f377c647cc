//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Program text with syntax highlighting and the next line to run
//! - [`variables`]: Current bindings with value reprs and types
//! - [`output`]: Everything the program has printed so far
//! - [`memory`]: Approximate size of every binding
//! - [`status`]: Status bar with playback state, speed and keybindings
//! - [`popup`]: Modal box describing a failed step
//!
//! Each pane exports a `render_*` function. Panes that scroll take a mutable
//! offset (or a state struct) owned by the app.

mod utils;

pub mod memory;
pub mod output;
pub mod popup;
pub mod source;
pub mod status;
pub mod variables;

pub use memory::render_memory_pane;
pub use output::render_output_pane;
pub use popup::render_error_popup;
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use variables::render_variables_pane;
