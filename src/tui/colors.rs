//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Low priority, success notifications
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Medium priority, focused form fields
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// High priority, error notifications, confirmation dialogs
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Reminder popup
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Text color readable on top of `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        GOLD => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => GOLD,
        Priority::Low => Color::LightGreen,
    }
}
