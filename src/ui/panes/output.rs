//! Program output pane rendering

use super::utils::{border_style, clamp_scroll, inner_height};
use crate::snapshot::Transcript;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Render the cumulative output of the run
pub fn render_output_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &Transcript,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(" Output ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if transcript.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));

    // One row per printed line, tagged with the source line that printed it
    let rows: Vec<(usize, &str)> = transcript
        .lines
        .iter()
        .flat_map(|entry| {
            entry
                .text
                .strip_suffix('\n')
                .unwrap_or(&entry.text)
                .split('\n')
                .map(move |text| (entry.source_line, text))
        })
        .collect();

    let visible_height = inner_height(area);
    clamp_scroll(scroll_offset, rows.len(), visible_height);

    let items: Vec<ListItem> = rows
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(source_line, text)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>4} │ ", source_line),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(text.to_string(), Style::default().fg(DEFAULT_THEME.fg)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
