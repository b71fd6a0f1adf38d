use super::raw_mode::PromptSession;
use crate::history::History;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use std::io::{self, Write};

/// Single-line editor for interactive sessions.
pub struct LineEditor {
    buffer: String,
    /// Cursor position in chars, not bytes.
    cursor_pos: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor_pos: 0,
        }
    }

    /// Reads one line. `None` means end of input (Ctrl-D on an empty line).
    pub fn read_line(&mut self, prompt: &str, history: &mut History) -> io::Result<Option<String>> {
        self.buffer.clear();
        self.cursor_pos = 0;
        history.reset_position();

        let session = PromptSession::start(prompt)?;

        loop {
            let Event::Key(key_event) = event::read()? else {
                continue;
            };

            match key_event {
                KeyEvent {
                    code: KeyCode::Enter,
                    ..
                } => {
                    session.finish("")?;
                    return Ok(Some(self.buffer.clone()));
                }

                // Ctrl+C drops the current line
                KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => {
                    session.finish("^C")?;
                    return Ok(Some(String::new()));
                }

                KeyEvent {
                    code: KeyCode::Char('d'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => {
                    if self.buffer.is_empty() {
                        session.finish("")?;
                        return Ok(None);
                    }
                    self.delete_forward();
                }

                KeyEvent {
                    code: KeyCode::Backspace,
                    ..
                } => self.delete_back(),

                KeyEvent {
                    code: KeyCode::Delete,
                    ..
                } => self.delete_forward(),

                KeyEvent {
                    code: KeyCode::Left,
                    ..
                } => self.cursor_pos = self.cursor_pos.saturating_sub(1),

                KeyEvent {
                    code: KeyCode::Right,
                    ..
                } => self.cursor_pos = (self.cursor_pos + 1).min(self.char_len()),

                KeyEvent {
                    code: KeyCode::Home,
                    ..
                }
                | KeyEvent {
                    code: KeyCode::Char('a'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => self.cursor_pos = 0,

                KeyEvent {
                    code: KeyCode::End,
                    ..
                }
                | KeyEvent {
                    code: KeyCode::Char('e'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => self.cursor_pos = self.char_len(),

                KeyEvent {
                    code: KeyCode::Up,
                    ..
                } => {
                    if let Some(entry) = history.previous() {
                        self.set_buffer(entry.clone());
                    }
                }

                KeyEvent {
                    code: KeyCode::Down,
                    ..
                } => match history.next() {
                    Some(entry) => self.set_buffer(entry.clone()),
                    None => self.set_buffer(String::new()),
                },

                KeyEvent {
                    code: KeyCode::Char('k'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => self.kill_to_end(),

                KeyEvent {
                    code: KeyCode::Char('u'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => self.kill_to_start(),

                KeyEvent {
                    code: KeyCode::Char('w'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => self.kill_word_back(),

                KeyEvent {
                    code: KeyCode::Char('l'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => {
                    let mut stdout = io::stdout();
                    execute!(stdout, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
                }

                KeyEvent {
                    code: KeyCode::Char(c),
                    modifiers: KeyModifiers::NONE | KeyModifiers::SHIFT,
                    ..
                } => self.insert_char(c),

                _ => continue,
            }

            self.redraw(prompt)?;
        }
    }

    fn redraw(&self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::UntilNewLine),
            Print(prompt),
            Print(&self.buffer),
        )?;

        let column = Self::visual_length(prompt) + self.cursor_pos;
        execute!(stdout, cursor::MoveToColumn(column as u16))?;
        stdout.flush()
    }

    /// Length of `s` on screen, ignoring ANSI color sequences.
    fn visual_length(s: &str) -> usize {
        let mut in_escape = false;
        let mut length = 0;

        for c in s.chars() {
            if c == '\x1b' {
                in_escape = true;
                continue;
            }
            if in_escape {
                if c == 'm' {
                    in_escape = false;
                }
                continue;
            }
            length += 1;
        }
        length
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index_at_char_pos(&self, char_pos: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    fn set_buffer(&mut self, text: String) {
        self.buffer = text;
        self.cursor_pos = self.char_len();
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.insert(at, c);
        self.cursor_pos += 1;
    }

    fn delete_back(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_index_at_char_pos(self.cursor_pos);
            self.buffer.remove(at);
        }
    }

    fn delete_forward(&mut self) {
        if self.cursor_pos < self.char_len() {
            let at = self.byte_index_at_char_pos(self.cursor_pos);
            self.buffer.remove(at);
        }
    }

    fn kill_to_end(&mut self) {
        let at = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.truncate(at);
    }

    fn kill_to_start(&mut self) {
        let at = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.drain(..at);
        self.cursor_pos = 0;
    }

    fn kill_word_back(&mut self) {
        let chars: Vec<char> = self.buffer.chars().collect();
        let mut start = self.cursor_pos;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }

        let from = self.byte_index_at_char_pos(start);
        let to = self.byte_index_at_char_pos(self.cursor_pos);
        self.buffer.drain(from..to);
        self.cursor_pos = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> LineEditor {
        let mut editor = LineEditor::new();
        for c in text.chars() {
            editor.insert_char(c);
        }
        editor
    }

    #[test]
    fn test_insert_and_delete() {
        let mut editor = editor_with("sleep 5");
        editor.cursor_pos = 5;
        editor.insert_char('é');
        assert_eq!(editor.buffer, "sleepé 5");

        editor.delete_back();
        assert_eq!(editor.buffer, "sleep 5");
        editor.delete_forward();
        assert_eq!(editor.buffer, "sleep5");
        assert_eq!(editor.cursor_pos, 5);
    }

    #[test]
    fn test_kill_commands() {
        let mut editor = editor_with("echo hello  world");
        editor.kill_word_back();
        assert_eq!(editor.buffer, "echo hello  ");
        editor.kill_word_back();
        assert_eq!(editor.buffer, "echo ");

        let mut editor = editor_with("kill 9 3");
        editor.cursor_pos = 4;
        editor.kill_to_end();
        assert_eq!(editor.buffer, "kill");

        let mut editor = editor_with("kill 9 3");
        editor.cursor_pos = 5;
        editor.kill_to_start();
        assert_eq!(editor.buffer, "9 3");
        assert_eq!(editor.cursor_pos, 0);
    }

    #[test]
    fn test_visual_length() {
        assert_eq!(LineEditor::visual_length("smash> "), 7);
        assert_eq!(LineEditor::visual_length("\x1b[1;32msmash>\x1b[0m "), 7);
    }
}
