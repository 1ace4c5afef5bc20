pub mod confirm_overlay;
pub mod help_overlay;
pub mod panes;
pub mod render;
pub mod spinner;
pub mod status_bar;

use crate::app::{Conclusion, RunStatus};
use ratatui::layout::Rect;
use ratatui::style::Color;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn status_icon(status: RunStatus, conclusion: Option<Conclusion>) -> (&'static str, Color) {
    match (status, conclusion) {
        (RunStatus::Completed, Some(Conclusion::Success)) => ("✓", Color::Green),
        (
            RunStatus::Completed,
            Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure),
        ) => ("✗", Color::Red),
        (RunStatus::Completed, Some(Conclusion::Cancelled)) => ("⊘", Color::Yellow),
        (RunStatus::Completed, Some(Conclusion::Skipped)) => ("⊘", Color::DarkGray),
        (RunStatus::Completed, _) => ("·", Color::DarkGray),
        (RunStatus::InProgress, _) => ("⟳", Color::Yellow),
        (RunStatus::Queued | RunStatus::Waiting | RunStatus::Pending | RunStatus::Requested, _) => {
            ("◌", Color::Blue)
        }
        (RunStatus::Unknown, _) => ("·", Color::DarkGray),
    }
}

/// Cut `s` to at most `max_width` terminal columns, ending in `…` when shortened.
pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        result.push(c);
        width += cw;
    }
    result.push('…');
    result
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
