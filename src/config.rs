use anyhow::{bail, Context, Result};
use std::env;

pub const DEFAULT_INTERPRETER: &str = "/bin/sh";
pub const DEFAULT_PROMPT: &str = "smash";
pub const DEFAULT_MAX_JOBS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Program external commands are handed to as `<interpreter> -c <line>`.
    pub interpreter: String,
    pub prompt: String,
    pub max_jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(interpreter) = lookup("SMASH_INTERPRETER") {
            if interpreter.trim().is_empty() {
                bail!("SMASH_INTERPRETER is set but empty");
            }
            config.interpreter = interpreter;
        }

        if let Some(prompt) = lookup("SMASH_PROMPT") {
            let prompt = prompt.trim();
            if !prompt.is_empty() {
                config.prompt = prompt.to_string();
            }
        }

        if let Some(raw) = lookup("SMASH_MAX_JOBS") {
            let max_jobs: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("SMASH_MAX_JOBS must be a positive integer, got {:?}", raw))?;
            if max_jobs == 0 {
                bail!("SMASH_MAX_JOBS must be at least 1");
            }
            config.max_jobs = max_jobs;
        }

        Ok(config)
    }
}
