use crate::app::{Mode, Snapshot};
use crate::tui::{confirm_overlay, help_overlay, panes, status_bar};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

pub fn render(f: &mut Frame, snap: &Snapshot<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // panes
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    if *snap.mode == Mode::FullscreenLog {
        panes::render_fullscreen_log(f, chunks[0], snap);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(55),
            ])
            .split(chunks[0]);
        panes::render_workflows(f, columns[0], snap);
        panes::render_runs(f, columns[1], snap);
        panes::render_logs(f, columns[2], snap);
    }
    status_bar::render(f, chunks[1], snap);

    // Overlays (drawn on top of everything)
    if let Mode::Confirming(pending) = snap.mode {
        confirm_overlay::render(f, pending);
    }
    if snap.show_help {
        help_overlay::render(f);
    }
}
