use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Escape: close help, leave fullscreen, or dismiss an error, in that order.
    Back,
    ToggleHelp,
    MoveUp,
    MoveDown,
    FocusNext,
    FocusPrev,
    StartFilter,
    /// Raw key routed to the filter text input.
    FilterKey(KeyEvent),
    CancelRun,
    Rerun,
    RerunFailed,
    ConfirmAccept,
    ConfirmReject,
    ToggleFullscreen,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    CopyUrl,
    Refresh,
    None,
}

/// Interaction mode, which decides how a key press is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Filtering,
    Confirming,
    FullscreenLog,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub mode: InputMode,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match ctx.mode {
        InputMode::Filtering => Action::FilterKey(key),
        InputMode::Confirming => match key.code {
            KeyCode::Char('y' | 'Y') => Action::ConfirmAccept,
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Action::ConfirmReject,
            _ => Action::None,
        },
        InputMode::FullscreenLog => match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Esc => Action::Back,
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Char('L') => Action::ToggleFullscreen,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') | KeyCode::Home => Action::ScrollToTop,
            KeyCode::Char('G') | KeyCode::End => Action::ScrollToBottom,
            _ => Action::None,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::Refresh
            }
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Esc => Action::Back,
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
            KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Action::FocusNext,
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => Action::FocusPrev,
            KeyCode::Char('/') => Action::StartFilter,
            KeyCode::Char('c') => Action::CancelRun,
            KeyCode::Char('r') => Action::Rerun,
            KeyCode::Char('R') => Action::RerunFailed,
            KeyCode::Char('L') => Action::ToggleFullscreen,
            KeyCode::Char('y') => Action::CopyUrl,
            _ => Action::None,
        },
    }
}
