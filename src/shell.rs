use crate::command::Command;
use crate::config::Config;
use crate::editor::LineEditor;
use crate::error::{report, SmashError};
use crate::history::History;
use crate::jobs::JobTable;
use crate::parser::{ParsedLine, Wiring};
use crate::pipes::run_pipe;
use crate::prompt::Prompt;
use crate::redirects::run_redirected;
use log::debug;
use std::io::{self, BufRead, ErrorKind, IsTerminal};
use std::path::PathBuf;

/// Everything a command may read or change. One instance per shell,
/// handed to each command by mutable reference.
pub struct ShellState {
    pub config: Config,
    pub prompt: Prompt,
    /// Directory before the last successful `cd`.
    pub prev_dir: Option<PathBuf>,
    pub jobs: JobTable,
}

impl ShellState {
    pub fn new(config: Config) -> Self {
        Self {
            prompt: Prompt::new(&config.prompt),
            prev_dir: None,
            jobs: JobTable::new(config.max_jobs),
            config,
        }
    }

    /// Parses and runs one line, including any redirection or pipe.
    /// Returns `false` when the shell should exit.
    pub fn execute_line(&mut self, line: &str) -> bool {
        let parsed = match ParsedLine::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                report(&e);
                return true;
            }
        };

        let outcome = match parsed.wiring() {
            Wiring::Redirect(redirection) => run_redirected(self, redirection),
            Wiring::Pipe(split) => run_pipe(self, split),
            Wiring::None => {
                if parsed.is_empty() {
                    return true;
                }
                let cmd = Command::parse(&parsed);
                debug!("dispatching {:?}", cmd);
                return cmd.execute(self);
            }
        };

        outcome.unwrap_or_else(|e| {
            report(&e);
            true
        })
    }
}

/// One line from a non-interactive input. Bytes that are not UTF-8 are
/// replaced rather than rejected so a bad line only affects itself.
fn read_plain_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut raw = Vec::new();
    match input.read_until(b'\n', &mut raw)? {
        0 => Ok(None),
        _ => Ok(Some(String::from_utf8_lossy(&raw).into_owned())),
    }
}

pub struct Shell {
    state: ShellState,
    history: History,
    editor: Option<LineEditor>,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        let editor = io::stdin().is_terminal().then(LineEditor::new);
        debug!("interactive: {}", editor.is_some());

        Self {
            state: ShellState::new(config),
            history: History::new(),
            editor,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.editor.as_mut() {
            Some(editor) => {
                let prompt = self.state.prompt.colored_string();
                editor.read_line(&prompt, &mut self.history)
            }
            None => read_plain_line(&mut io::stdin().lock()),
        }
    }

    pub fn run(&mut self) {
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    report(&SmashError::io("read", e));
                    break;
                }
            };

            self.state.jobs.reap_finished();
            self.history.add(&line);

            if !self.state.execute_line(&line) {
                break;
            }
        }
        debug!("shell loop finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults() {
        let config = Config {
            prompt: "mysh".to_string(),
            max_jobs: 3,
            ..Config::default()
        };
        let state = ShellState::new(config);
        assert_eq!(state.prompt.get_string(), "mysh> ");
        assert_eq!(state.jobs.capacity(), 3);
        assert!(state.prev_dir.is_none());
    }

    #[test]
    fn test_read_plain_line_tolerates_invalid_utf8() {
        let mut input = io::Cursor::new(b"echo \xff\xfe\nshowpid\nlast".to_vec());
        assert_eq!(
            read_plain_line(&mut input).unwrap().as_deref(),
            Some("echo \u{fffd}\u{fffd}\n")
        );
        assert_eq!(read_plain_line(&mut input).unwrap().as_deref(), Some("showpid\n"));
        assert_eq!(read_plain_line(&mut input).unwrap().as_deref(), Some("last"));
        assert_eq!(read_plain_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_execute_line_builtins() {
        let mut state = ShellState::new(Config::default());
        assert!(state.execute_line("   "));
        assert!(state.execute_line("chprompt tiny &"));
        assert_eq!(state.prompt.name(), "tiny");
        assert!(state.execute_line("kill 9 17"));
        assert!(state.execute_line("ls |"));
        assert!(!state.execute_line("quit"));
    }
}
