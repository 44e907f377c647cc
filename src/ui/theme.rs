//! Color palette shared by every pane (Catppuccin Mocha tones)

use ratatui::style::Color;

pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    /// Brackets, paused state
    pub primary: Color,
    /// Current-line marker, running state
    pub secondary: Color,
    /// Comments, line numbers, placeholders
    pub comment: Color,
    pub success: Color,
    pub error: Color,

    // Syntax
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    pub function: Color,
    pub type_name: Color,

    // Chrome
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub status_bg: Color,

    /// Names bound by the last step
    pub changed: Color,
    /// Filled part of a memory size bar
    pub bar: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    bg: Color::Rgb(30, 30, 46),
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),
    secondary: Color::Rgb(250, 179, 135),
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),

    keyword: Color::Rgb(203, 166, 247),
    string: Color::Rgb(166, 227, 161),
    number: Color::Rgb(250, 179, 135),
    function: Color::Rgb(249, 226, 175),
    type_name: Color::Rgb(148, 226, 213),

    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(88, 91, 112),
    current_line_bg: Color::Rgb(50, 50, 70),
    status_bg: Color::Rgb(24, 24, 37),

    changed: Color::Rgb(245, 194, 231),
    bar: Color::Rgb(116, 199, 236),
};
