//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Scope, TaskStatus};

pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
/// Overdue due dates.
pub const LATE_RED: Color = Color::Rgb(220, 50, 47);

/// Foreground for a row by status.
pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::ToDo => Color::White,
        TaskStatus::InProgress => GOLD,
        TaskStatus::Blocked => LATE_RED,
        TaskStatus::Completed => Color::DarkGray,
    }
}

/// Header band color per dashboard, so the scope is visible at a glance.
pub fn scope_color(scope: Scope) -> Color {
    match scope {
        Scope::Personal => Color::Blue,
        Scope::Department => DARK_GREEN,
        Scope::Company => DARK_PURPLE,
        Scope::HrAdmin => DARK_RED,
    }
}
