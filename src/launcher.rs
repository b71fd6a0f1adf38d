use crate::error::{report, Result, SmashError};
use crate::shell::ShellState;
use crate::signal_handler;
use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{execvp, fork, setpgid, ForkResult, Pid};
use std::ffi::{CStr, CString};
use std::io::{self, Write};

/// Runs `text` through the configured interpreter in a new process.
///
/// Every launch is registered in the job table. Foreground launches block
/// until the child terminates or stops and then drop the entry; background
/// launches return at once and leave the entry for the reaper.
pub fn launch(state: &mut ShellState, text: &str, background: bool) -> Result<()> {
    let _ = io::stdout().flush();

    // SAFETY: the child only resets signal dispositions and calls execvp
    // (or exits) before touching anything else.
    match unsafe { fork() }.map_err(|e| SmashError::sys("fork", e))? {
        ForkResult::Child => exec_interpreter(&state.config.interpreter, text),
        ForkResult::Parent { child } => {
            debug!("forked pid {} for {:?} (background: {})", child, text, background);

            if !text.is_empty() {
                if let Err(e) = state.jobs.add_job(text, child) {
                    report(&e);
                }
            }

            if background {
                return Ok(());
            }

            let waited = wait_foreground(child);
            state.jobs.remove_job_by_pid(child);
            waited
        }
    }
}

/// Blocks until `pid` terminates or stops. Ctrl-C during the wait is
/// forwarded to `pid`.
pub fn wait_foreground(pid: Pid) -> Result<()> {
    signal_handler::set_foreground(Some(pid));
    let result = loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status) => {
                debug!("foreground pid {} finished: {:?}", pid, status);
                break Ok(());
            }
            Err(Errno::EINTR) => continue,
            // Already collected by someone else; nothing left to wait for.
            Err(Errno::ECHILD) => break Ok(()),
            Err(e) => break Err(SmashError::sys("waitpid", e)),
        }
    };
    signal_handler::set_foreground(None);
    result
}

/// Child side of a launch. Never returns into shell logic.
fn exec_interpreter(interpreter: &str, text: &str) -> ! {
    if let Err(e) = setpgid(Pid::from_raw(0), Pid::from_raw(0)) {
        debug!("setpgid failed in child: {}", e);
    }
    signal_handler::restore_defaults();

    let err = match (CString::new(interpreter), CString::new(text)) {
        (Ok(program), Ok(line)) => {
            let argv: [&CStr; 3] = [&program, c"-c", &line];
            match execvp(&program, &argv) {
                Ok(never) => match never {},
                Err(e) => SmashError::sys("execvp", e),
            }
        }
        _ => SmashError::InvalidArguments("execvp"),
    };

    report(&err);
    exit_child(1)
}

/// Terminates a forked child without returning to the caller.
pub fn exit_child(code: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    std::process::exit(code)
}
