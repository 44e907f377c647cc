//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source code pane, which displays the program
//! being stepped with basic syntax highlighting and execution indicators.
//!
//! # Features
//!
//! - Syntax highlighting for keywords, builtins, strings, numbers and comments
//! - Next line to execute highlighted with an arrow indicator
//! - Lines covered by the previous step marked in the gutter
//! - Failed line shown in red until reset
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring a full lexer.

use std::ops::Range;

use super::utils::{border_style, inner_height};
use crate::interpreter::constants::BUILTIN_NAMES;
use crate::program::Program;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for one source line
fn highlight_source_code(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>, is_call: bool| {
        if !word.is_empty() {
            let style = get_keyword_style(word, is_call);
            spans.push(Span::styled(std::mem::take(word), style));
        }
    };

    while i < chars.len() {
        let c = chars[i];

        // Comments run to the end of the line
        if c == '#' {
            flush(&mut current_word, &mut spans, false);
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            // An f-string prefix stays attached to its literal
            let prefix = if current_word.eq_ignore_ascii_case("f") {
                std::mem::take(&mut current_word)
            } else {
                flush(&mut current_word, &mut spans, false);
                String::new()
            };
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                format!("{}{}", prefix, chars[i..end].iter().collect::<String>()),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush(&mut current_word, &mut spans, c == '(');

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                ':' => Style::default().fg(DEFAULT_THEME.secondary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush(&mut current_word, &mut spans, false);
    Line::from(spans)
}

fn get_keyword_style(word: &str, is_call: bool) -> Style {
    match word {
        "if" | "elif" | "else" | "while" | "for" | "in" | "break" | "continue" | "pass" | "and"
        | "or" | "not" | "is" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "True" | "False" | "None" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_call && BUILTIN_NAMES.contains(&word) => {
            Style::default().fg(DEFAULT_THEME.type_name)
        }
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to; `None` until first render
    pub target_line_row: Option<usize>,
}

/// What the source pane needs to know about execution
pub struct SourceRenderData<'a> {
    pub program: &'a Program,
    /// Next line to execute (0-based); `None` once the run is complete
    pub current_line: Option<usize>,
    /// Lines covered by the most recent successful step
    pub last_step: Option<Range<usize>>,
    /// Line whose step failed
    pub error_line: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: &SourceRenderData,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = Block::default()
        .title(" Source Code ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let total_lines = data.program.len();
    let visible_height = inner_height(area);

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the line of interest at the pinned row
    if let Some(focus_line) = data.error_line.or(data.current_line) {
        scroll_state.offset = focus_line.saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = data
        .program
        .lines()
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let is_error = data.error_line == Some(idx);
            let is_current = data.current_line == Some(idx);
            let was_stepped = data.last_step.as_ref().is_some_and(|r| r.contains(&idx));

            let marker = if is_error {
                "✗"
            } else if is_current {
                "▶"
            } else if was_stepped {
                "│"
            } else {
                " "
            };
            let line_num_str = format!("{:4} {} ", idx + 1, marker);

            let (num_style, content_base_style) = if is_error {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_current {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Style::default().bg(DEFAULT_THEME.current_line_bg),
                )
            } else if was_stepped {
                (Style::default().fg(DEFAULT_THEME.success), Style::default())
            } else {
                (Style::default().fg(DEFAULT_THEME.comment), Style::default())
            };

            let mut content_line = highlight_source_code(line);
            if is_error {
                for span in &mut content_line.spans {
                    span.style = content_base_style;
                }
            } else if is_current {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(content_base_style);
                }
            }

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
