//! Error popup shown when a step fails

use super::utils::centered_rect;
use crate::snapshot::StepError;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render `error` in a box over the middle of `area`
pub fn render_error_popup(frame: &mut Frame, area: Rect, error: &StepError) {
    let popup_area = centered_rect(70, 50, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", error.kind))
        .title_bottom(Line::from(" Enter/Esc to dismiss ").alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(DEFAULT_THEME.bg));

    let mut lines = vec![
        Line::from(Span::styled(
            error.message.clone(),
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(error.detail.lines().map(|line| {
        Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(DEFAULT_THEME.fg),
        ))
    }));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);
}
