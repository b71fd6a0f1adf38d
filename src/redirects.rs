use crate::error::{Result, SmashError};
use crate::parser::{RedirectMode, Redirection};
use crate::shell::ShellState;
use log::{debug, warn};
use nix::unistd::{dup, dup2_stderr, dup2_stdin, dup2_stdout};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;

const REDIRECT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl StdStream {
    fn duplicate(self) -> nix::Result<OwnedFd> {
        match self {
            StdStream::Stdin => dup(io::stdin()),
            StdStream::Stdout => dup(io::stdout()),
            StdStream::Stderr => dup(io::stderr()),
        }
    }

    /// Makes this stream refer to the same open file as `src`.
    fn point_at(self, src: BorrowedFd<'_>) -> nix::Result<()> {
        match self {
            StdStream::Stdin => dup2_stdin(src),
            StdStream::Stdout => dup2_stdout(src),
            StdStream::Stderr => dup2_stderr(src),
        }
    }
}

fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

/// A standard stream pointed somewhere else. The previous descriptor is
/// put back when the guard drops. A guard exists only once the new
/// descriptor is installed, so failed setups have nothing to restore.
pub struct FdRedirect {
    stream: StdStream,
    saved: OwnedFd,
}

impl FdRedirect {
    pub fn install(stream: StdStream, replacement: BorrowedFd<'_>) -> Result<Self> {
        flush_std_streams();
        let saved = stream.duplicate().map_err(|e| SmashError::sys("dup", e))?;
        stream
            .point_at(replacement)
            .map_err(|e| SmashError::sys("dup2", e))?;
        debug!(
            "{:?} now points at fd {} (saved as fd {})",
            stream,
            replacement.as_raw_fd(),
            saved.as_raw_fd()
        );
        Ok(Self { stream, saved })
    }
}

impl Drop for FdRedirect {
    fn drop(&mut self) {
        flush_std_streams();
        match self.stream.point_at(self.saved.as_fd()) {
            Ok(()) => debug!("{:?} restored", self.stream),
            Err(e) => warn!("failed to restore {:?}: {}", self.stream, e),
        }
    }
}

fn open_target(path: &str, mode: RedirectMode) -> Result<std::fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(REDIRECT_FILE_MODE);
    match mode {
        RedirectMode::Overwrite => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options.open(path).map_err(|e| SmashError::io("open", e))
}

/// Runs `redirection.command` with stdout sent to the target file.
/// Returns whether the shell keeps running.
pub fn run_redirected(state: &mut ShellState, redirection: &Redirection) -> Result<bool> {
    let file = open_target(&redirection.path, redirection.mode)?;
    let guard = FdRedirect::install(StdStream::Stdout, file.as_fd())?;
    drop(file);

    let keep_running = state.execute_line(&redirection.command);

    drop(guard);
    Ok(keep_running)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::fstat;
    use serial_test::serial;
    use std::fs;
    use std::io::BufRead;
    use tempfile::tempdir;

    #[test]
    fn test_open_target_modes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();

        {
            let mut file = open_target(path, RedirectMode::Overwrite).unwrap();
            writeln!(file, "first").unwrap();
        }
        {
            let mut file = open_target(path, RedirectMode::Append).unwrap();
            writeln!(file, "second").unwrap();
        }
        assert_eq!(fs::read_to_string(path).unwrap(), "first\nsecond\n");

        {
            let mut file = open_target(path, RedirectMode::Overwrite).unwrap();
            writeln!(file, "third").unwrap();
        }
        assert_eq!(fs::read_to_string(path).unwrap(), "third\n");
    }

    #[test]
    #[serial]
    fn test_guard_points_stdin_at_file_and_restores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, "from file\n").unwrap();
        let file = fs::File::open(&path).unwrap();
        let inode = |fd: BorrowedFd<'_>| fstat(fd).unwrap().st_ino;

        let original = inode(io::stdin().as_fd());
        let guard = FdRedirect::install(StdStream::Stdin, file.as_fd()).unwrap();
        assert_eq!(inode(io::stdin().as_fd()), inode(file.as_fd()));

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).unwrap();
        assert_eq!(line, "from file\n");

        drop(guard);
        assert_eq!(inode(io::stdin().as_fd()), original);
    }

    #[test]
    fn test_open_target_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let err = open_target(path.to_str().unwrap(), RedirectMode::Overwrite).unwrap_err();
        assert!(err.to_string().starts_with("open failed: "));
    }
}
