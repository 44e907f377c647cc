//! Variables pane: one row per binding with its value and type

use super::utils::{border_style, clamp_scroll, inner_height};
use crate::snapshot::{truncate_repr, VariableView};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Style for a value repr, picked by the value's type
fn value_style(type_name: &str) -> Style {
    match type_name {
        "int" | "float" | "bool" | "NoneType" => Style::default().fg(DEFAULT_THEME.number),
        "str" => Style::default().fg(DEFAULT_THEME.string),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Render the variables pane
pub fn render_variables_pane(
    frame: &mut Frame,
    area: Rect,
    variables: &[VariableView],
    changed: &[String],
    repr_limit: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(format!(" Variables ({}) ", variables.len()))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if variables.is_empty() {
        let paragraph = Paragraph::new("(no variables)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
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
            let name_style = if changed.contains(&var.name) {
                Style::default()
                    .fg(DEFAULT_THEME.changed)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<width$}", var.name, width = name_width), name_style),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(truncate_repr(&var.repr, repr_limit), value_style(var.type_name)),
                Span::styled(
                    format!("  {}", var.type_name),
                    Style::default()
                        .fg(DEFAULT_THEME.type_name)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
