use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicI32, Ordering};

/// Pid the shell is currently blocked on, 0 when nothing runs in the
/// foreground.
static FOREGROUND_PID: AtomicI32 = AtomicI32::new(0);

pub fn set_foreground(pid: Option<Pid>) {
    FOREGROUND_PID.store(pid.map(Pid::as_raw).unwrap_or(0), Ordering::SeqCst);
}

pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only touches an atomic and calls write(2)/kill(2).
    unsafe { signal::sigaction(Signal::SIGINT, &action) }?;
    Ok(())
}

/// Used by the pipe helper, which shares the shell's process group. The
/// shell alone reports Ctrl-C and kills the foreground job.
pub fn ignore_interrupts() -> nix::Result<()> {
    // SAFETY: SIG_IGN installs no Rust code.
    unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) }?;
    Ok(())
}

/// Puts the dispositions the shell changed back to their defaults. Called
/// in children right before they replace their image.
pub fn restore_defaults() {
    for sig in [Signal::SIGINT, Signal::SIGPIPE] {
        // SAFETY: SIG_DFL installs no Rust code.
        let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
    }
}

extern "C" fn handle_sigint(_: libc::c_int) {
    write_stdout(b"smash: got ctrl-C\n");

    let pid = FOREGROUND_PID.load(Ordering::SeqCst);
    if pid > 0 {
        // SAFETY: kill(2) is async-signal-safe.
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
        let mut buf = [0u8; 12];
        write_stdout(b"smash: process ");
        write_stdout(format_pid(pid, &mut buf));
        write_stdout(b" was killed\n");
    }
}

fn write_stdout(bytes: &[u8]) {
    // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
    unsafe {
        libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Decimal rendering without allocation.
fn format_pid(pid: i32, buf: &mut [u8; 12]) -> &[u8] {
    let mut value = pid.unsigned_abs();
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    if pid < 0 {
        start -= 1;
        buf[start] = b'-';
    }
    &buf[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pid() {
        let mut buf = [0u8; 12];
        assert_eq!(format_pid(0, &mut buf), b"0");
        assert_eq!(format_pid(4242, &mut buf), b"4242");
        assert_eq!(format_pid(i32::MAX, &mut buf), b"2147483647");
        assert_eq!(format_pid(-17, &mut buf), b"-17");
    }

    #[test]
    fn test_foreground_tracking() {
        set_foreground(Some(Pid::from_raw(1234)));
        assert_eq!(FOREGROUND_PID.load(Ordering::SeqCst), 1234);
        set_foreground(None);
        assert_eq!(FOREGROUND_PID.load(Ordering::SeqCst), 0);
    }
}
