use crossterm::{execute, style::Print, terminal};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);
static RESTORE_ON_PANIC: Once = Once::new();

/// The raw-mode span of one prompt. Starting it shows the prompt, ending it
/// echoes how the line was finished and moves to a fresh row, so commands
/// always run with a cooked terminal and their output starts at column 0.
pub struct PromptSession {
    stdout: Stdout,
}

impl PromptSession {
    pub fn start(prompt: &str) -> io::Result<Self> {
        RESTORE_ON_PANIC.call_once(|| {
            let prev = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
                    let _ = terminal::disable_raw_mode();
                    let _ = io::stdout().write_all(b"\r\n");
                }
                prev(info);
            }));
        });

        terminal::enable_raw_mode()?;
        RAW_ACTIVE.store(true, Ordering::SeqCst);

        let mut session = Self {
            stdout: io::stdout(),
        };
        execute!(session.stdout, Print(prompt))?;
        session.stdout.flush()?;
        Ok(session)
    }

    /// Ends the prompt. `echo` is shown before the line break, e.g. `^C`.
    pub fn finish(mut self, echo: &str) -> io::Result<()> {
        execute!(self.stdout, Print(echo), Print("\r\n"))?;
        Ok(())
    }
}

impl Drop for PromptSession {
    fn drop(&mut self) {
        if RAW_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = terminal::disable_raw_mode();
        }
    }
}
