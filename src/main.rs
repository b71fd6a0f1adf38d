use anyhow::{Context, Result};
use std::env;
use std::process;

mod command;
mod config;
mod editor;
mod error;
mod history;
mod jobs;
mod launcher;
mod parser;
mod pipes;
mod prompt;
mod redirects;
mod shell;
mod signal_handler;

use config::Config;

fn print_help() {
    println!("smash - small job-control shell");
    println!();
    println!("Usage: smash [OPTIONS]");
    println!("  -h, --help       Print this help");
    println!("  -v, --version    Print version");
    println!();
    println!("Environment:");
    println!("  SMASH_INTERPRETER  interpreter for external commands (default /bin/sh)");
    println!("  SMASH_PROMPT       default prompt name (default smash)");
    println!("  SMASH_MAX_JOBS     job table capacity (default 100)");
    println!("  RUST_LOG           log filter (default warn)");
}

fn print_version() {
    println!("smash v{}", env!("CARGO_PKG_VERSION"));
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        process::exit(0);
    }

    if args.iter().any(|a| a == "-v" || a == "--version" || a == "-V") {
        print_version();
        process::exit(0);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::from_env().context("invalid configuration")?;
    log::debug!("starting with {:?}", config);

    signal_handler::install().context("failed to install the SIGINT handler")?;

    let mut shell = shell::Shell::new(config);
    shell.run();

    Ok(())
}
