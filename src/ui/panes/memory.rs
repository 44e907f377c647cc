//! Memory pane: approximate size of every binding
//!
//! Sizes are shallow, modelled on 64-bit CPython's `sys.getsizeof`, so a list
//! counts its pointer slots but not the elements behind them. Each row gets a
//! bar scaled against the largest binding.

use super::utils::{border_style, clamp_scroll, inner_height, size_bar};
use crate::snapshot::VariableView;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Cells reserved for the size bar
const BAR_WIDTH: usize = 12;

/// Render the memory pane
pub fn render_memory_pane(
    frame: &mut Frame,
    area: Rect,
    variables: &[VariableView],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let total: usize = variables.iter().map(|v| v.size_bytes).sum();
    let block = Block::default()
        .title(format!(" Memory ({} bytes) ", total))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if variables.is_empty() {
        let paragraph = Paragraph::new("(empty)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let largest = variables.iter().map(|v| v.size_bytes).max().unwrap_or(0);
    let name_width = variables
        .iter()
        .map(|v| v.name.chars().count())
        .max()
        .unwrap_or(0);

    let visible_height = inner_height(area);
    clamp_scroll(scroll_offset, variables.len(), visible_height);

    let items: Vec<ListItem> = variables
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|var| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<width$} ", var.name, width = name_width),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
                Span::styled(
                    format!("{:<6}", var.type_name),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ),
                Span::styled(
                    format!("{:>7} B ", var.size_bytes),
                    Style::default().fg(DEFAULT_THEME.number),
                ),
                Span::styled(
                    size_bar(var.size_bytes, largest, BAR_WIDTH),
                    Style::default().fg(DEFAULT_THEME.bar),
                ),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
