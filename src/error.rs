use std::io;
use thiserror::Error;

/// Everything a command line can fail with. Reported once, at the command
/// boundary, and never allowed to stop the shell.
#[derive(Debug, Error)]
pub enum SmashError {
    #[error("{0}: invalid arguments")]
    InvalidArguments(&'static str),

    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),

    #[error("{cmd}: job-id {id} does not exist")]
    JobNotFound { cmd: &'static str, id: usize },

    #[error("fg: jobs list is empty")]
    NoJobs,

    #[error("cd: OLDPWD not set")]
    OldPwdNotSet,

    #[error("jobs: job table is full ({0} slots)")]
    JobTableFull(usize),

    #[error("jobs: cannot register a job without command text")]
    EmptyJobText,

    #[error("redirection: missing target path")]
    MissingRedirectTarget,

    #[error("{call} failed: {source}")]
    Sys {
        call: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("{call} failed: {source}")]
    Io {
        call: &'static str,
        #[source]
        source: io::Error,
    },
}

impl SmashError {
    pub fn sys(call: &'static str, source: nix::Error) -> Self {
        SmashError::Sys { call, source }
    }

    pub fn io(call: &'static str, source: io::Error) -> Self {
        SmashError::Io { call, source }
    }
}

pub type Result<T> = std::result::Result<T, SmashError>;

pub fn report(err: &SmashError) {
    log::debug!("reporting {:?}", err);
    eprintln!("smash error: {}", err);
}
