//! Top-level drivers, one per execution mode.
//!
//! - `play`: live decode through the bounded channel to the renderer
//! - `convert`: decode once and persist the frame stream to a cache
//! - `replay`: play a previously written cache, no decoder involved
//! - `license`: print license and credits
//!
//! The drivers own the terminal session and the interrupt handler; every
//! exit path (normal, error, interrupt) restores the terminal exactly
//! once before the process reports anything.

pub mod convert;
pub mod license;
pub mod play;
pub mod replay;

use std::sync::Arc;

use anyhow::{Context, Result};

use asciiplay::player::GlyphRamp;
use asciiplay::terminal::TerminalSession;
use asciiplay::Config;

use crate::cli::Cli;

/// Resolves the glyph ramp from flags and config, flags winning.
fn glyph_ramp(cli: &Cli, config: &Config) -> Result<GlyphRamp> {
    let ramp = cli.grayscale.as_deref().unwrap_or(&config.grayscale);
    let reverse = cli.reverse || config.reverse;
    GlyphRamp::new(ramp, reverse).context("invalid grayscale ramp")
}

/// Routes ^C through the terminal session: restore, then exit.
///
/// There is no graceful drain on interrupt; buffered frames are
/// discarded.
fn install_interrupt(session: Arc<TerminalSession>) -> Result<()> {
    ctrlc::set_handler(move || {
        session.restore();
        std::process::exit(130);
    })
    .context("failed to install interrupt handler")
}

/// Play modes need a real terminal on stdout.
fn require_tty() -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        anyhow::bail!("stdout is not a terminal; refusing to render glyph frames");
    }
    Ok(())
}
