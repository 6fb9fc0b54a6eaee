//! Command-line configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dsp::oscillator::DEFAULT_SAMPLE_RATE;
use crate::params::AudioQuery;
use crate::server::{ServerConfig, DEFAULT_ADDR};

/// Render note lists and score melodies to WAV.
#[derive(Parser, Debug)]
#[command(name = "scorewave", version)]
#[command(about = "Render note lists and score melodies to WAV")]
pub struct Cli {
    /// Log filter (e.g. info, debug, scorewave=trace). Falls back to RUST_LOG.
    #[arg(long, global = true, env = "SCOREWAVE_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve GET /audio and the static UI
    Serve(ServeArgs),
    /// Render to a WAV file
    Render(RenderArgs),
    /// Print the melody extracted from a score as JSON
    Melody {
        /// Score file
        score: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (host:port, or :port for all interfaces)
    #[arg(long, env = "SCOREWAVE_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Score rendered in melody mode
    #[arg(long, env = "SCOREWAVE_SCORE", default_value = "scores/fur_elise.score")]
    pub score: PathBuf,

    /// Directory served at /
    #[arg(long, env = "SCOREWAVE_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        ServerConfig {
            addr: args.addr,
            score_path: args.score,
            static_dir: args.static_dir,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Offline render options. Values are validated the same way as the HTTP
/// query parameters of the same names.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Comma-separated note names (note mode)
    #[arg(long)]
    pub notes: Option<String>,

    /// Render the melody of this score instead of a note list
    #[arg(long, conflicts_with = "notes")]
    pub score: Option<PathBuf>,

    /// sine, harmonic, square, sawtooth or triangle
    #[arg(short, long)]
    pub waveform: Option<String>,

    /// Harmonic amplitudes as a JSON array, e.g. "[1, 0.5, 0.25]"
    #[arg(long)]
    pub harmonics: Option<String>,

    /// Seconds per note (note mode)
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Seconds per quarter note (score mode)
    #[arg(long)]
    pub duration_factor: Option<String>,

    /// fade or adsr
    #[arg(long)]
    pub envelope: Option<String>,

    #[arg(long)]
    pub attack: Option<String>,

    #[arg(long)]
    pub decay: Option<String>,

    #[arg(long)]
    pub sustain: Option<String>,

    #[arg(long)]
    pub release: Option<String>,

    /// Output WAV path
    #[arg(short = 'o', long, default_value = "output.wav")]
    pub output: PathBuf,
}

impl RenderArgs {
    pub fn to_query(&self) -> AudioQuery {
        AudioQuery {
            mode: Some(if self.score.is_some() { "melody" } else { "note" }.to_string()),
            waveform: self.waveform.clone(),
            harmonics: self.harmonics.clone(),
            duration_factor: self.duration_factor.clone(),
            duration: self.duration.clone(),
            notes: self.notes.clone(),
            envelope: self.envelope.clone(),
            attack: self.attack.clone(),
            decay: self.decay.clone(),
            sustain: self.sustain.clone(),
            release: self.release.clone(),
        }
    }
}
