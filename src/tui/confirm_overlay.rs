use crate::app::PendingAction;
use crate::tui::centered;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, pending: &PendingAction) {
    let overlay_area = centered(f.area(), 40, 7);
    f.render_widget(Clear, overlay_area);

    let title = format!(" {} ", pending.action.label());
    let hints = Line::from(vec![
        Span::styled(
            "y",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "n",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" no ", Style::default().fg(Color::DarkGray)),
    ]);

    let block = Block::default()
        .title(title)
        .title_bottom(hints.centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let message = Line::from(Span::styled(
        pending.prompt.as_str(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(vec![Line::from(""), message])
        .block(block)
        .wrap(Wrap { trim: true })
        .centered();
    f.render_widget(paragraph, overlay_area);
}
