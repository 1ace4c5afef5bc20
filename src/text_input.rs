//! Single-line text input used for the filter prompt.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Enter: the caller should take `value()`.
    Commit,
    /// Escape: the caller should discard the input.
    Cancel,
    Changed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars, `0..=value.chars().count()`.
    cursor: usize,
    char_limit: usize,
}

impl TextInput {
    pub fn new(char_limit: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            char_limit,
        }
    }

    /// Start with `initial` (truncated to the limit) and the cursor at the end.
    pub fn with_value(initial: &str, char_limit: usize) -> Self {
        let value: String = initial.chars().take(char_limit).collect();
        let cursor = value.chars().count();
        Self {
            value,
            cursor,
            char_limit,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => InputOutcome::Commit,
            KeyCode::Esc => InputOutcome::Cancel,
            KeyCode::Char('u') if ctrl => {
                if self.value.is_empty() {
                    return InputOutcome::Ignored;
                }
                self.value.clear();
                self.cursor = 0;
                InputOutcome::Changed
            }
            KeyCode::Char('a') if ctrl => self.move_to(0),
            KeyCode::Char('e') if ctrl => self.move_to(self.char_count()),
            KeyCode::Char(_) if ctrl => InputOutcome::Ignored,
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return InputOutcome::Ignored;
                }
                self.cursor -= 1;
                let at = self.byte_offset(self.cursor);
                self.value.remove(at);
                InputOutcome::Changed
            }
            KeyCode::Delete => {
                if self.cursor >= self.char_count() {
                    return InputOutcome::Ignored;
                }
                let at = self.byte_offset(self.cursor);
                self.value.remove(at);
                InputOutcome::Changed
            }
            KeyCode::Left => self.move_to(self.cursor.saturating_sub(1)),
            KeyCode::Right => self.move_to((self.cursor + 1).min(self.char_count())),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(self.char_count()),
            _ => InputOutcome::Ignored,
        }
    }

    fn insert(&mut self, c: char) -> InputOutcome {
        if self.char_count() >= self.char_limit {
            return InputOutcome::Ignored;
        }
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
        InputOutcome::Changed
    }

    fn move_to(&mut self, pos: usize) -> InputOutcome {
        if pos == self.cursor {
            InputOutcome::Ignored
        } else {
            self.cursor = pos;
            InputOutcome::Changed
        }
    }

    /// Split around the cursor for rendering: `(before, at_cursor, after)`.
    pub fn split_at_cursor(&self) -> (&str, Option<char>, &str) {
        let at = self.byte_offset(self.cursor);
        let (before, rest) = self.value.split_at(at);
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) => (before, Some(c), chars.as_str()),
            None => (before, None, ""),
        }
    }
}
