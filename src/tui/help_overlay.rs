use crate::tui::centered;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/↓", "Move down"),
            ("k/↑", "Move up"),
            ("h/←", "Previous pane"),
            ("l/→", "Next pane"),
            ("Tab", "Next pane"),
            ("Shift+Tab", "Previous pane"),
        ],
    ),
    (
        "Actions",
        &[
            ("c", "Cancel run"),
            ("r", "Rerun workflow"),
            ("R", "Rerun failed jobs only"),
            ("y", "Copy URL to clipboard"),
            ("Ctrl+R", "Refresh runs"),
        ],
    ),
    (
        "View",
        &[
            ("/", "Filter"),
            ("L", "Full-screen log"),
            ("Esc", "Close/Back"),
            ("?", "Toggle help"),
            ("q", "Quit"),
        ],
    ),
];

pub fn render(f: &mut Frame) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, (heading, keys)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            *heading,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<11}"), Style::default().fg(Color::Cyan)),
                Span::raw(*desc),
            ]));
        }
    }

    let height = lines.len() as u16 + 2;
    let area = centered(f.area(), 42, height);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .title_bottom(Line::from(" ? or Esc to close ").centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block), area);
}
