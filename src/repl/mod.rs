//! Interactive terminal session.
//!
//! A raw-mode crossterm loop that owns a [`Session`] and redraws on every
//! keystroke: prompt line, suggestion list, live result (or error), and a
//! status bar. Keys: printable characters edit, Tab inserts the first
//! suggestion, Enter accepts, Esc or Ctrl-C cancels.
//!
//! The loop is synchronous: each key event is fully processed (edit →
//! completion → evaluation → redraw) before the next one is read.

pub mod theme;

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute, queue, style::Print};

use crate::document::path::ROOT_SYMBOL;
use crate::error::Result;
use crate::formatter::Formatter;
use crate::session::{Session, SessionStatus};
use theme::ColorScheme;

/// How an interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplOutcome {
    /// The user accepted; carries the emitted query text.
    Accepted(String),
    /// The user cancelled.
    Cancelled,
}

/// Line editor state: the buffer plus a character cursor.
#[derive(Debug, Default)]
struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn insert(&mut self, ch: char) {
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
            true
        } else {
            false
        }
    }

    fn delete(&mut self) -> bool {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
            true
        } else {
            false
        }
    }

    fn set(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
    }

    fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }
}

/// Interactive terminal front end over a [`Session`].
pub struct Repl {
    session: Session,
    scheme: ColorScheme,
    formatter: Formatter,
    buffer: LineBuffer,
}

impl Repl {
    /// Create the interactive front end.
    ///
    /// The input starts seeded with the root symbol so the user sees the
    /// whole document and its top-level suggestions immediately.
    pub fn new(session: Session, scheme: ColorScheme, indent: usize, color: bool) -> Self {
        Self {
            session,
            scheme,
            formatter: Formatter::new(indent, color),
            buffer: LineBuffer::from_text(ROOT_SYMBOL),
        }
    }

    /// Run the loop until the session reaches a terminal state.
    pub fn run(&mut self) -> Result<ReplOutcome> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let outcome = self.event_loop(&mut stdout);

        execute!(stdout, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        outcome
    }

    fn event_loop(&mut self, stdout: &mut io::Stdout) -> Result<ReplOutcome> {
        self.session.edit(&self.buffer.text());

        loop {
            self.draw(stdout)?;

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(outcome) = self.handle_key(key) {
                        return Ok(outcome);
                    }
                }
                Event::Resize(_, _) => {} // redraw on next iteration
                _ => {}
            }
        }
    }

    /// Process one key press; `Some` ends the loop.
    fn handle_key(&mut self, key: KeyEvent) -> Option<ReplOutcome> {
        match key.code {
            KeyCode::Esc => {
                self.session.cancel();
                return Some(ReplOutcome::Cancelled);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.session.cancel();
                return Some(ReplOutcome::Cancelled);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.clear();
                self.session.edit("");
            }
            KeyCode::Enter => {
                if self.session.accept() {
                    let query = self
                        .session
                        .accepted_query()
                        .expect("accepted session exposes a query")
                        .to_string();
                    return Some(ReplOutcome::Accepted(query));
                }
                // nothing evaluated successfully yet, stay in the session
            }
            KeyCode::Tab => {
                if let Some(first) = self.session.state().suggestions.first() {
                    let first = first.clone();
                    self.buffer.set(&first);
                    self.session.edit(&first);
                }
            }
            KeyCode::Backspace => {
                if self.buffer.backspace() {
                    self.session.edit(&self.buffer.text());
                }
            }
            KeyCode::Delete => {
                if self.buffer.delete() {
                    self.session.edit(&self.buffer.text());
                }
            }
            KeyCode::Left => {
                self.buffer.cursor = self.buffer.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.buffer.cursor < self.buffer.chars.len() {
                    self.buffer.cursor += 1;
                }
            }
            KeyCode::Home => self.buffer.cursor = 0,
            KeyCode::End => self.buffer.cursor = self.buffer.chars.len(),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.buffer.insert(ch);
                self.session.edit(&self.buffer.text());
            }
            _ => {}
        }
        None
    }

    /// Redraw the whole screen.
    fn draw(&self, stdout: &mut io::Stdout) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        let state = self.session.state();

        queue!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

        // prompt line
        queue!(
            stdout,
            Print(self.scheme.prompt.paint("> ").to_string()),
            Print(self.scheme.input.paint(self.buffer.text()).to_string())
        )?;

        // suggestion list
        let mut row: u16 = 1;
        if !state.suggestions.is_empty() {
            queue!(
                stdout,
                cursor::MoveTo(0, row),
                Print(self.scheme.hint.paint("Suggestions:").to_string())
            )?;
            row += 1;
            for suggestion in &state.suggestions {
                if row >= rows.saturating_sub(2) {
                    break;
                }
                queue!(
                    stdout,
                    cursor::MoveTo(0, row),
                    Print(
                        self.scheme
                            .suggestion
                            .paint(format!("  {suggestion}"))
                            .to_string()
                    )
                )?;
                row += 1;
            }
        }

        // result area
        row += 1;
        let result_top = row;
        match &state.outcome {
            Some(Ok(value)) => {
                let rendered = self.formatter.format(value);
                for line in rendered.lines() {
                    if row >= rows.saturating_sub(1) {
                        break;
                    }
                    let clipped: String = line.chars().take(cols as usize).collect();
                    queue!(stdout, cursor::MoveTo(0, row), Print(clipped))?;
                    row += 1;
                }
            }
            Some(Err(error)) => {
                queue!(
                    stdout,
                    cursor::MoveTo(0, result_top),
                    Print(self.scheme.error.paint(error.to_string()).to_string())
                )?;
            }
            None => {}
        }

        // status bar
        let status = match &state.outcome {
            Some(Ok(value)) => format!(
                "{} · enter accept · tab complete · esc cancel",
                value.kind()
            ),
            Some(Err(_)) => "error · edit to fix · esc cancel".to_string(),
            None => "type an expression, '_' is the document".to_string(),
        };
        queue!(
            stdout,
            cursor::MoveTo(0, rows.saturating_sub(1)),
            Print(self.scheme.hint.paint(status).to_string())
        )?;

        // park the terminal cursor at the edit position
        let cursor_col = (2 + self.buffer.cursor).min(cols.saturating_sub(1) as usize) as u16;
        queue!(stdout, cursor::MoveTo(cursor_col, 0))?;

        stdout.flush()?;
        Ok(())
    }

    /// Final session status, for exit-code mapping.
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_editing() {
        let mut buffer = LineBuffer::from_text("_");
        assert_eq!(buffer.text(), "_");
        assert_eq!(buffer.cursor, 1);

        buffer.insert('[');
        assert_eq!(buffer.text(), "_[");

        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "_");
        assert!(buffer.backspace());
        assert!(!buffer.backspace());

        buffer.set("_['items']");
        assert_eq!(buffer.cursor, 10);

        buffer.cursor = 0;
        assert!(buffer.delete());
        assert_eq!(buffer.text(), "['items']");

        buffer.clear();
        assert_eq!(buffer.text(), "");
        assert!(!buffer.delete());
    }

    #[test]
    fn test_mid_buffer_insert() {
        let mut buffer = LineBuffer::from_text("ac");
        buffer.cursor = 1;
        buffer.insert('b');
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.cursor, 2);
    }
}
