/// In-memory line history for the interactive editor.
pub struct History {
    commands: Vec<String>,
    position: usize,
}

impl History {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            position: 0,
        }
    }

    pub fn add(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }

        // Don't add duplicate of last command
        if self.commands.last().map(String::as_str) != Some(command) {
            self.commands.push(command.to_string());
        }

        self.position = self.commands.len();
    }

    pub fn previous(&mut self) -> Option<&String> {
        if self.position > 0 {
            self.position -= 1;
            self.commands.get(self.position)
        } else {
            None
        }
    }

    pub fn next(&mut self) -> Option<&String> {
        if self.position + 1 < self.commands.len() {
            self.position += 1;
            Some(&self.commands[self.position])
        } else {
            self.position = self.commands.len();
            None
        }
    }

    pub fn reset_position(&mut self) {
        self.position = self.commands.len();
    }
}
