//! Status bar rendering with keybindings and state indicators

use crate::playback::PlaybackState;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Everything the status bar shows
pub struct StatusRenderData<'a> {
    pub state: PlaybackState,
    pub steps_taken: usize,
    /// Next line to execute (0-based)
    pub cursor: usize,
    pub total_lines: usize,
    pub speed: f64,
    pub message: &'a str,
}

fn state_color(state: PlaybackState) -> Color {
    match state {
        PlaybackState::Idle => DEFAULT_THEME.comment,
        PlaybackState::Running => DEFAULT_THEME.secondary,
        PlaybackState::Paused => DEFAULT_THEME.primary,
        PlaybackState::Completed => DEFAULT_THEME.success,
        PlaybackState::Failed => DEFAULT_THEME.error,
    }
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let bar_style = Style::default().bg(DEFAULT_THEME.status_bg);
    let sep_style = bar_style.fg(DEFAULT_THEME.comment);

    let line_text = if data.state == PlaybackState::Completed {
        format!(" done/{} ", data.total_lines)
    } else {
        format!(" line {}/{} ", data.cursor + 1, data.total_lines)
    };

    let left_spans = vec![
        Span::styled(
            format!(" {} ", data.state.label().to_uppercase()),
            Style::default()
                .bg(state_color(data.state))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" step {} ", data.steps_taken),
            bar_style.fg(DEFAULT_THEME.fg),
        ),
        Span::styled("│", sep_style),
        Span::styled(line_text, bar_style.fg(DEFAULT_THEME.fg)),
        Span::styled("│", sep_style),
        Span::styled(
            format!(" {:.1}x ", data.speed),
            bar_style.fg(DEFAULT_THEME.number),
        ),
        Span::styled("│", sep_style),
        Span::styled(
            format!(" {} ", data.message),
            bar_style.fg(if data.state == PlaybackState::Failed {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.fg
            }),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(bar_style)
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = bar_style.fg(DEFAULT_THEME.fg);

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in [
        (" ⎵ ", " play/pause "),
        (" → ", " step "),
        (" r ", " reset "),
        (" +/- ", " speed "),
        (" ⇥ ", " focus "),
        (" q ", " quit "),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(key, key_style));
        right_spans.push(Span::styled(desc, desc_style));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(bar_style)
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}
