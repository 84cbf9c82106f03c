//! CLI Module
//!
//! Command-line interface for working with clips and soundboard libraries.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::Waveform;

/// SoundDeck - soundboard clip tools
#[derive(Parser, Debug)]
#[command(name = "sounddeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the header of a WAV file
    Info {
        /// WAV file to inspect
        path: PathBuf,
    },

    /// Synthesize a tone into a WAV file
    Tone {
        /// Frequency in Hz
        #[arg(short, long, default_value_t = 440.0)]
        frequency: f64,

        /// sine, square, sawtooth or triangle
        #[arg(short, long, default_value_t = Waveform::Sine)]
        waveform: Waveform,

        /// Duration in seconds
        #[arg(short, long, default_value_t = 1.0)]
        duration: f64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Trim, normalize and fade one clip
    Process {
        /// Input WAV file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        stages: StageFlags,
    },

    /// Process every WAV file under a directory
    Batch {
        /// Directory to scan recursively
        input: PathBuf,

        /// Directory receiving processed clips
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        stages: StageFlags,
    },

    /// Save one selection of a clip
    Chop {
        /// Input WAV file
        input: PathBuf,

        /// Selection start in seconds
        #[arg(long)]
        start: f64,

        /// Selection end in seconds
        #[arg(long)]
        end: f64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a clip at its silences
    Split {
        /// Input WAV file
        input: PathBuf,

        /// Directory receiving one file per segment
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Seed a library with the demo pads
    Demo {
        /// Library directory
        library: PathBuf,
    },

    /// Mix library pads offline into one WAV file
    Render {
        /// Library directory
        library: PathBuf,

        /// Pad IDs to trigger together
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output sample rate
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Render length limit in seconds (looping pads play until it)
        #[arg(long, default_value_t = 10.0)]
        max_secs: f64,
    },

    /// Write a library to an export bundle
    Export {
        /// Library directory
        library: PathBuf,

        /// Bundle file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Merge an export bundle into a library
    Import {
        /// Library directory
        library: PathBuf,

        /// Bundle file to read
        bundle: PathBuf,

        /// Replace pads whose names already exist instead of skipping them
        #[arg(long)]
        replace: bool,
    },
}

/// Stages to switch off; all run by default
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct StageFlags {
    /// Skip silence trimming
    #[arg(long)]
    pub no_trim: bool,

    /// Skip peak normalization
    #[arg(long)]
    pub no_normalize: bool,

    /// Skip the fade envelope
    #[arg(long)]
    pub no_fade: bool,
}

impl From<StageFlags> for crate::ingest::ProcessingOptions {
    fn from(flags: StageFlags) -> Self {
        Self {
            trim: !flags.no_trim,
            normalize: !flags.no_normalize,
            fade: !flags.no_fade,
        }
    }
}
