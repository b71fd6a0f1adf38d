use crate::error::{report, Result, SmashError};
use crate::launcher;
use crate::parser::{nth_word, ParsedLine};
use crate::shell::ShellState;
use nix::sys::signal::{self, Signal};
use nix::unistd::getpid;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

const MIN_SIGNUM: i32 = 1;
const MAX_SIGNUM: i32 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChangePrompt(Option<String>),
    ShowPid,
    PrintWorkingDir,
    ChangeDir(Vec<String>),
    ListJobs,
    Foreground(Vec<String>),
    Kill(Vec<String>),
    ChangeMode(Vec<String>),
    Quit { kill: bool },
    External { text: String, background: bool },
}

impl Command {
    /// Picks the command for a line by its first word. Anything that is not
    /// a built-in runs as an external command.
    pub fn parse(line: &ParsedLine) -> Self {
        let args: Vec<String> = line.args().to_vec();

        match line.first_word() {
            "chprompt" => Command::ChangePrompt(args.into_iter().next()),
            "showpid" => Command::ShowPid,
            "pwd" => Command::PrintWorkingDir,
            "cd" => Command::ChangeDir(args),
            "jobs" => Command::ListJobs,
            "fg" => Command::Foreground(args),
            "kill" => Command::Kill(args),
            "chmod" => Command::ChangeMode(args),
            "quit" => Command::Quit {
                kill: nth_word(line.text(), 2) == "kill" && nth_word(line.text(), 3).is_empty(),
            },
            _ => Command::External {
                text: line.text().to_string(),
                background: line.is_background(),
            },
        }
    }

    /// Runs the command, reporting any failure itself. Returns `false` only
    /// when the shell should exit.
    pub fn execute(&self, state: &mut ShellState) -> bool {
        match self.run(state) {
            Ok(keep_running) => keep_running,
            Err(e) => {
                report(&e);
                true
            }
        }
    }

    fn run(&self, state: &mut ShellState) -> Result<bool> {
        match self {
            Command::ChangePrompt(name) => state.prompt.set(name.as_deref()),

            Command::ShowPid => println!("{} pid is {}", state.prompt.name(), getpid()),

            Command::PrintWorkingDir => {
                let path = env::current_dir().map_err(|e| SmashError::io("getcwd", e))?;
                println!("{}", path.display());
            }

            Command::ChangeDir(args) => change_dir(state, args)?,

            Command::ListJobs => state.jobs.print_all(),

            Command::Foreground(args) => foreground(state, args)?,

            Command::Kill(args) => {
                let (signum, id) = parse_kill_args(args)?;
                let pid = state
                    .jobs
                    .get_job_by_id(id)
                    .map(|job| job.pid)
                    .ok_or(SmashError::JobNotFound { cmd: "kill", id })?;
                signal::kill(pid, signum).map_err(|e| SmashError::sys("kill", e))?;
                println!("signal number {} was sent to pid {}", signum as i32, pid);
            }

            Command::ChangeMode(args) => {
                let (mode, path) = match args.as_slice() {
                    [mode, path] => (
                        parse_mode(mode).ok_or(SmashError::InvalidArguments("chmod"))?,
                        path,
                    ),
                    _ => return Err(SmashError::InvalidArguments("chmod")),
                };
                fs::set_permissions(path, fs::Permissions::from_mode(mode))
                    .map_err(|e| SmashError::io("chmod", e))?;
            }

            Command::Quit { kill } => {
                if *kill {
                    state.jobs.kill_all();
                }
                return Ok(false);
            }

            Command::External { text, background } => launcher::launch(state, text, *background)?,
        }
        Ok(true)
    }
}

fn change_dir(state: &mut ShellState, args: &[String]) -> Result<()> {
    if args.len() > 1 {
        return Err(SmashError::TooManyArguments("cd"));
    }

    let target = match args.first().map(String::as_str) {
        Some("-") => state.prev_dir.clone().ok_or(SmashError::OldPwdNotSet)?,
        Some(path) => PathBuf::from(path),
        None => env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/")),
    };

    let current = env::current_dir().map_err(|e| SmashError::io("getcwd", e))?;
    env::set_current_dir(&target).map_err(|e| SmashError::io("chdir", e))?;
    state.prev_dir = Some(current);
    Ok(())
}

fn foreground(state: &mut ShellState, args: &[String]) -> Result<()> {
    let id = match args {
        [] if state.jobs.is_empty() => return Err(SmashError::NoJobs),
        [id] => parse_positive(id).ok_or(SmashError::InvalidArguments("fg"))?,
        _ => return Err(SmashError::InvalidArguments("fg")),
    };

    let job = state
        .jobs
        .get_job_by_id(id)
        .cloned()
        .ok_or(SmashError::JobNotFound { cmd: "fg", id })?;

    println!("{} : {}", job.command, job.pid);
    let waited = launcher::wait_foreground(job.pid);
    state.jobs.remove_job_by_id(job.id);
    waited
}

fn parse_positive(word: &str) -> Option<usize> {
    word.parse::<usize>().ok().filter(|&n| n > 0)
}

/// `<signum> <job-id>`, both positive, signal within the standard range.
fn parse_kill_args(args: &[String]) -> Result<(Signal, usize)> {
    let invalid = SmashError::InvalidArguments("kill");
    let [signum, id] = args else {
        return Err(invalid);
    };
    let (Some(signum), Some(id)) = (parse_positive(signum), parse_positive(id)) else {
        return Err(invalid);
    };
    let signum = i32::try_from(signum).map_err(|_| SmashError::InvalidArguments("kill"))?;
    if !(MIN_SIGNUM..=MAX_SIGNUM).contains(&signum) {
        return Err(invalid);
    }
    let signal = Signal::try_from(signum).map_err(|_| SmashError::InvalidArguments("kill"))?;
    Ok((signal, id))
}

/// Exactly three octal digits.
fn parse_mode(word: &str) -> Option<u32> {
    if word.len() != 3 || !word.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return None;
    }
    u32::from_str_radix(word, 8).ok()
}
