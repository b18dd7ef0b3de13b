//! Binary entry point: argument parsing, logging setup, mode routing.

mod cli;
mod commands;

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use asciiplay::cache::CacheError;
use asciiplay::decode::DecodeError;
use asciiplay::looks_like_cache;
use asciiplay::player::{AudioError, PlayerError};
use asciiplay::Config;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        return;
    }
    if cli.license {
        commands::license::run();
        return;
    }

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli)?;
    let config = Config::load()?;

    let file = cli
        .file
        .as_deref()
        .context("no input file given")?;

    if let Some(output) = cli.cache.as_deref() {
        commands::convert::run(cli, &config, file, output)
    } else if looks_like_cache(file) {
        debug!(path = %file.display(), "input detected as a frame cache");
        commands::replay::run(cli, &config, file)
    } else {
        commands::play::run(cli, &config, file)
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("invalid log level: {}", cli.log_level))?;

    match &cli.log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Maps each failure class to a distinct non-zero exit status.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(player) = err.downcast_ref::<PlayerError>() {
        return match player {
            PlayerError::Audio(_) => 3,
            PlayerError::Cache(_) => 5,
            PlayerError::InvalidFrameRate(_) => 4,
            PlayerError::Render(_) => 1,
        };
    }
    if err.is::<AudioError>() {
        3
    } else if err.is::<DecodeError>() {
        4
    } else if err.is::<CacheError>() {
        5
    } else {
        1
    }
}
