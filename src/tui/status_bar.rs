use crate::app::{Mode, Pane, Snapshot, StatusMessage};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

fn hints(snap: &Snapshot<'_>) -> &'static [(&'static str, &'static str)] {
    if *snap.mode == Mode::FullscreenLog {
        return &[
            ("j/k", "scroll"),
            ("PgUp/PgDn", "page"),
            ("g/G", "top/bottom"),
            ("L/Esc", "back"),
            ("?", "help"),
            ("q", "quit"),
        ];
    }
    match snap.focused {
        Pane::Workflows => &[
            ("/", "filter"),
            ("^R", "refresh"),
            ("Tab", "next pane"),
            ("?", "help"),
            ("q", "quit"),
        ],
        Pane::Runs => &[
            ("c", "cancel"),
            ("r", "rerun"),
            ("R", "rerun-failed"),
            ("y", "yank"),
            ("/", "filter"),
            ("?", "help"),
            ("q", "quit"),
        ],
        Pane::Logs => &[
            ("L", "fullscreen"),
            ("y", "yank"),
            ("/", "filter"),
            ("Esc", "back"),
            ("?", "help"),
            ("q", "quit"),
        ],
    }
}

/// One line, first match wins: filter prompt, flash, error, key hints.
pub fn render(f: &mut Frame, area: Rect, snap: &Snapshot<'_>) {
    let line = if let Mode::Filtering(input) = snap.mode {
        let (before, at, after) = input.split_at_cursor();
        let cursor = at.map_or_else(|| " ".to_string(), |c| c.to_string());
        Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(Color::Cyan)),
            Span::raw(before),
            Span::styled(cursor, Style::default().add_modifier(Modifier::REVERSED)),
            Span::raw(after),
        ])
    } else {
        match snap.status {
            Some(StatusMessage::Flash { text, .. }) => Line::from(Span::styled(
                text.as_str(),
                Style::default().fg(Color::Green),
            )),
            Some(StatusMessage::Error(msg)) => Line::from(Span::styled(
                format!("Error: {msg}"),
                Style::default().fg(Color::Red),
            )),
            None => {
                let mut spans: Vec<Span> = Vec::new();
                for (i, (key, desc)) in hints(snap).iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::raw(" "));
                    }
                    spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
                    spans.push(Span::styled(
                        format!(" {desc}"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            }
        }
    };

    f.render_widget(Paragraph::new(line), area);
}
