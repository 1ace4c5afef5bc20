//! The three side-by-side panes: workflows, runs, and jobs with the log tail.

use crate::app::{Pane, Snapshot};
use crate::list::FilteredList;
use crate::tui::{spinner, status_icon, truncate};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

fn pane_block(snap: &Snapshot<'_>, pane: Pane, name: &str) -> Block<'static> {
    let focused = snap.focused == pane;
    let title = if focused && snap.loading {
        format!(" {name} {} ", spinner::frame(snap.spinner_frame))
    } else {
        format!(" {name} ")
    };
    let (border, title_style) = if focused {
        (
            Style::default().fg(Color::Cyan),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Gray),
        )
    };
    Block::default()
        .title(Span::styled(title, title_style))
        .borders(Borders::ALL)
        .border_style(border)
}

fn row_style(selected: bool, focused: bool) -> Style {
    match (selected, focused) {
        (true, true) => Style::default().add_modifier(Modifier::REVERSED),
        (true, false) => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}

/// "n/total" for the selected row, "0/0" when nothing is visible.
pub fn scroll_position(selected: Option<usize>, len: usize) -> String {
    match selected {
        Some(idx) if len > 0 => format!("{}/{len}", idx + 1),
        _ => "0/0".to_string(),
    }
}

/// First row to draw so the selection stays inside `rows` visible rows.
fn window_start(selected: Option<usize>, rows: usize) -> usize {
    match selected {
        Some(sel) if rows > 0 && sel >= rows => sel + 1 - rows,
        _ => 0,
    }
}

fn list_lines<T>(
    list: &FilteredList<T>,
    rows: usize,
    focused: bool,
    render: impl Fn(&T) -> Vec<Span<'static>>,
) -> Vec<Line<'static>> {
    let selected = list.selected_index();
    let start = window_start(selected, rows);
    list.items()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(i, item)| Line::from(render(item)).style(row_style(selected == Some(i), focused)))
        .collect()
}

fn render_list<T>(
    f: &mut Frame,
    area: Rect,
    snap: &Snapshot<'_>,
    pane: Pane,
    (name, empty_msg): (&str, &str),
    list: &FilteredList<T>,
    render: impl Fn(&T) -> Vec<Span<'static>>,
) {
    let block = pane_block(snap, pane, name);
    let inner_height = area.height.saturating_sub(2) as usize;
    // last inner row is reserved for the scroll position
    let rows = inner_height.saturating_sub(1);

    let mut lines = if list.is_empty() {
        let msg = if snap.loading { "" } else { empty_msg };
        vec![Line::styled(msg.to_string(), Style::default().fg(Color::DarkGray))]
    } else {
        list_lines(list, rows, snap.focused == pane, render)
    };
    while lines.len() < rows {
        lines.push(Line::raw(""));
    }
    lines.truncate(rows);
    lines.push(Line::styled(
        scroll_position(list.selected_index(), list.len()),
        Style::default().fg(Color::DarkGray),
    ));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_workflows(f: &mut Frame, area: Rect, snap: &Snapshot<'_>) {
    let width = area.width.saturating_sub(2) as usize;
    render_list(
        f,
        area,
        snap,
        Pane::Workflows,
        ("Workflows", "No workflows"),
        snap.workflows,
        |wf| {
            let style = if wf.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            vec![Span::styled(truncate(&wf.name, width), style)]
        },
    );
}

pub fn render_runs(f: &mut Frame, area: Rect, snap: &Snapshot<'_>) {
    let width = area.width.saturating_sub(2) as usize;
    render_list(
        f,
        area,
        snap,
        Pane::Runs,
        ("Runs", "No runs"),
        snap.runs,
        |run| {
            let (icon, color) = status_icon(run.status, run.conclusion);
            let label = format!("#{} {}", run.id, run.branch);
            vec![
                Span::styled(icon, Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(truncate(&label, width.saturating_sub(2))),
            ]
        },
    );
}

/// Jobs on top, then as much of the log tail as fits.
pub fn render_logs(f: &mut Frame, area: Rect, snap: &Snapshot<'_>) {
    let block = pane_block(snap, Pane::Logs, "Logs");
    let width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let focused = snap.focused == Pane::Logs;

    let job_rows = snap.jobs.len().min(inner_height / 2);
    let mut lines = list_lines(snap.jobs, job_rows, focused, |job| {
        let (icon, color) = status_icon(job.status, job.conclusion);
        vec![
            Span::styled(icon, Style::default().fg(color)),
            Span::raw(" "),
            Span::raw(truncate(&job.name, width.saturating_sub(2))),
        ]
    });

    if !lines.is_empty() {
        lines.push(Line::raw(""));
    }
    let log_rows = inner_height.saturating_sub(lines.len());
    lines.extend(log_lines(snap, log_rows, width));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn log_lines(snap: &Snapshot<'_>, rows: usize, width: usize) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    if snap.jobs.selected().is_none() {
        let msg = if snap.loading || snap.runs.is_empty() {
            ""
        } else {
            "No jobs"
        };
        return vec![Line::styled(msg.to_string(), dim)];
    }
    if !snap.log.is_loaded() {
        return vec![Line::styled("Loading log…".to_string(), dim)];
    }
    let offset = snap.log.offset(rows);
    snap.log
        .lines()
        .iter()
        .skip(offset)
        .take(rows)
        .map(|l| Line::raw(truncate(l, width)))
        .collect()
}

/// The log alone, filling `area`, with the scroll range in the title.
pub fn render_fullscreen_log(f: &mut Frame, area: Rect, snap: &Snapshot<'_>) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let total = snap.log.lines().len();
    let offset = snap.log.offset(inner_height);

    let job = snap.jobs.selected().map_or("Logs", |j| j.name.as_str());
    let scroll_info = if total > inner_height {
        format!(
            " [{}-{}/{}]",
            offset + 1,
            (offset + inner_height).min(total),
            total
        )
    } else {
        String::new()
    };
    let follow = if snap.log.is_following() { " follow" } else { "" };
    let truncated = if snap.log.is_truncated() {
        " (tail)"
    } else {
        ""
    };
    let title = format!(" {job}{truncated}{scroll_info}{follow} ");

    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines: Vec<Line> = snap
        .log
        .lines()
        .iter()
        .skip(offset)
        .take(inner_height)
        .map(|l| Line::raw(l.as_str()))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}
