//! scorewave - render note lists and score melodies to WAV.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scorewave::config::{Cli, Command, RenderArgs};
use scorewave::dsp::oscillator::DEFAULT_SAMPLE_RATE;
use scorewave::dsp::renderer::render_wav;
use scorewave::error::SynthError;
use scorewave::melody::extract_melody;
use scorewave::params::RenderParams;
use scorewave::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::Serve(args) => server::serve(args.into()).await,
        Command::Render(args) => render(&args),
        Command::Melody { score } => melody(&score),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(args: &RenderArgs) -> Result<()> {
    let params = RenderParams::from_query(&args.to_query())?;
    let score_path = args.score.as_deref().unwrap_or(Path::new(""));
    let samples = params
        .render(score_path, DEFAULT_SAMPLE_RATE)
        .map_err(|e| score_failure(score_path, e))?;

    let wav = render_wav(&samples, DEFAULT_SAMPLE_RATE);
    std::fs::write(&args.output, &wav)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        samples = samples.len(),
        bytes = wav.len(),
        "wrote wav"
    );
    Ok(())
}

fn melody(path: &Path) -> Result<()> {
    let score = scorewave::load_score(path).map_err(|e| score_failure(path, e))?;
    let events = extract_melody(&score);
    info!(title = ?score.title, events = events.len(), "extracted melody");
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

/// Print an annotated source report for score errors before propagating.
fn score_failure(path: &Path, err: SynthError) -> anyhow::Error {
    if let SynthError::Score(score_err) = &err {
        if let Ok(source) = std::fs::read_to_string(path) {
            eprint!("{}", score_err.report(&path.display().to_string(), &source));
        }
    }
    err.into()
}
