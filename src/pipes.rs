use crate::error::{report, Result, SmashError};
use crate::launcher::exit_child;
use crate::parser::{PipeSplit, PipeTarget};
use crate::redirects::{FdRedirect, StdStream};
use crate::shell::ShellState;
use crate::signal_handler;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{fork, pipe, ForkResult, Pid};
use std::io::{self, Write};
use std::os::fd::AsFd;

/// Connects `split.left` to `split.right` through a pipe.
///
/// A short-lived helper process runs the left half with its stdout (or
/// stderr for `|&`) on the write end and exits. The shell itself runs the
/// right half with stdin on the read end, then restores stdin and collects
/// the helper.
pub fn run_pipe(state: &mut ShellState, split: &PipeSplit) -> Result<bool> {
    let (read_end, write_end) = pipe().map_err(|e| SmashError::sys("pipe", e))?;
    let _ = io::stdout().flush();

    // SAFETY: the helper only runs the left half of the line and exits.
    match unsafe { fork() }.map_err(|e| SmashError::sys("fork", e))? {
        ForkResult::Child => {
            if let Err(e) = signal_handler::ignore_interrupts() {
                warn!("pipe helper keeps the SIGINT handler: {}", e);
            }
            drop(read_end);
            let stream = match split.target {
                PipeTarget::Stdout => StdStream::Stdout,
                PipeTarget::Stderr => StdStream::Stderr,
            };
            let installed = FdRedirect::install(stream, write_end.as_fd());
            drop(write_end);
            let code = match installed {
                Ok(_guard) => {
                    state.execute_line(&split.left);
                    0
                }
                Err(e) => {
                    report(&e);
                    1
                }
            };
            exit_child(code)
        }
        ForkResult::Parent { child } => {
            debug!("pipe helper pid {} runs {:?}", child, split.left);
            drop(write_end);

            let guard = FdRedirect::install(StdStream::Stdin, read_end.as_fd());
            drop(read_end);
            let keep_running = match guard {
                Ok(guard) => {
                    let keep_running = state.execute_line(&split.right);
                    drop(guard);
                    keep_running
                }
                Err(e) => {
                    report(&e);
                    true
                }
            };

            collect_helper(child);
            Ok(keep_running)
        }
    }
}

fn collect_helper(pid: Pid) {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                debug!("pipe helper {} done: {:?}", pid, status);
                return;
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("could not collect pipe helper {}: {}", pid, e);
                return;
            }
        }
    }
}
