//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

/// A media player that plays video files as glyph art in the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "asciiplay",
    version,
    about = "Play video files as glyph art in the terminal",
    long_about = "A media player that renders video as terminal glyph art with \
synchronized audio.\n\nA file ending in .apcache that passes the structural probe is \
replayed straight from the frame cache, skipping the decoder entirely; use --cache \
to produce such a file."
)]
pub struct Cli {
    /// Media file to play, or a .apcache frame cache to replay.
    #[arg(
        value_name = "FILE",
        required_unless_present_any = ["license", "completions"]
    )]
    pub file: Option<PathBuf>,

    /// Decode into a frame cache instead of playing.
    #[arg(short, long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Play video without audio.
    #[arg(short = 'n', long)]
    pub no_audio: bool,

    /// Grayscale glyph ramp, darkest to brightest.
    #[arg(short, long, value_name = "RAMP")]
    pub grayscale: Option<String>,

    /// Reverse the glyph ramp end-to-end.
    #[arg(short, long)]
    pub reverse: bool,

    /// Frame rate override; by default it is derived from the stream.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Log verbosity: trace, debug, info, warn or error.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Show license and credits.
    #[arg(short, long)]
    pub license: bool,

    /// Generate shell completions and exit.
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
