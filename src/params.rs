//! Render parameters: textual request values validated into typed settings.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::dsp::envelope::{Adsr, Shaping};
use crate::dsp::frequency::FrequencyTable;
use crate::dsp::oscillator::{Waveform, DEFAULT_HARMONICS};
use crate::dsp::renderer::{render_wav, Renderer};
use crate::error::SynthError;
use crate::melody::extract_melody;

pub const DEFAULT_NOTE_DURATION: f64 = 2.0;
pub const DEFAULT_DURATION_FACTOR: f64 = 0.25;
pub const DEFAULT_NOTE: &str = "A4";

/// Longest render accepted, in seconds of output. Also caps each duration,
/// duration factor and ADSR segment on its own.
pub const MAX_RENDER_SECONDS: f64 = 600.0;

/// What to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// An explicit note list, each note held for a fixed duration.
    #[default]
    Note,
    /// The melody of the configured score, durations scaled.
    Melody,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Note => "note",
            Mode::Melody => "melody",
        })
    }
}

impl FromStr for Mode {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Mode::Note),
            "melody" => Ok(Mode::Melody),
            _ => Err(SynthError::malformed(format!(
                "unknown mode '{s}' (expected note or melody)"
            ))),
        }
    }
}

/// Raw query string of `GET /audio`. Every field is optional text; defaults
/// and validation live in [`RenderParams::from_query`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioQuery {
    pub mode: Option<String>,
    pub waveform: Option<String>,
    /// JSON array of floats, e.g. `[1, 0.5, 0.25]`.
    pub harmonics: Option<String>,
    pub duration_factor: Option<String>,
    pub duration: Option<String>,
    /// Comma-separated pitch names.
    pub notes: Option<String>,
    /// `fade` or `adsr`.
    pub envelope: Option<String>,
    pub attack: Option<String>,
    pub decay: Option<String>,
    pub sustain: Option<String>,
    pub release: Option<String>,
}

/// Validated render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub mode: Mode,
    pub waveform: Waveform,
    pub harmonics: Vec<f64>,
    /// Seconds per note in note mode.
    pub duration: f64,
    /// Seconds per quarter note in melody mode.
    pub duration_factor: f64,
    pub notes: Vec<String>,
    pub shaping: Shaping,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            mode: Mode::Note,
            waveform: Waveform::Sine,
            harmonics: DEFAULT_HARMONICS.to_vec(),
            duration: DEFAULT_NOTE_DURATION,
            duration_factor: DEFAULT_DURATION_FACTOR,
            notes: vec![DEFAULT_NOTE.to_string()],
            shaping: Shaping::default(),
        }
    }
}

impl RenderParams {
    /// Apply defaults and validate. Every field is checked regardless of mode.
    pub fn from_query(query: &AudioQuery) -> Result<Self, SynthError> {
        let mut params = RenderParams::default();

        if let Some(mode) = &query.mode {
            params.mode = mode.trim().parse()?;
        }
        if let Some(waveform) = &query.waveform {
            params.waveform = waveform.trim().parse()?;
        }
        if let Some(harmonics) = &query.harmonics {
            params.harmonics = parse_harmonics(harmonics)?;
        }
        if let Some(duration) = &query.duration {
            params.duration = parse_seconds("duration", duration)?;
        }
        if let Some(factor) = &query.duration_factor {
            params.duration_factor = parse_seconds("duration_factor", factor)?;
        }
        if let Some(notes) = &query.notes {
            params.notes = parse_notes(notes)?;
        }
        params.shaping = parse_shaping(query)?;

        if params.mode == Mode::Note {
            check_total(params.duration.max(0.0) * params.notes.len() as f64)?;
        }

        Ok(params)
    }

    /// Render to mono 16-bit samples. `score_path` is only read in melody mode.
    pub fn render(&self, score_path: &Path, sample_rate: u32) -> Result<Vec<i16>, SynthError> {
        let renderer =
            Renderer::new(FrequencyTable::standard(), sample_rate).with_shaping(self.shaping);
        match self.mode {
            Mode::Note => {
                check_total(self.duration.max(0.0) * self.notes.len() as f64)?;
                Ok(renderer.render_notes(
                    self.notes.as_slice(),
                    self.waveform,
                    &self.harmonics,
                    self.duration,
                ))
            }
            Mode::Melody => {
                let score = crate::load_score(score_path)?;
                let melody = extract_melody(&score);
                let quarters: f64 = melody.iter().map(|e| e.duration.max(0.0)).sum();
                check_total(quarters * self.duration_factor.max(0.0))?;
                debug!(events = melody.len(), path = %score_path.display(), "extracted melody");
                Ok(renderer.render_melody(
                    &melody,
                    self.waveform,
                    &self.harmonics,
                    self.duration_factor,
                ))
            }
        }
    }

    /// [`RenderParams::render`] wrapped in a mono WAV container.
    pub fn render_wav(&self, score_path: &Path, sample_rate: u32) -> Result<Vec<u8>, SynthError> {
        let samples = self.render(score_path, sample_rate)?;
        Ok(render_wav(&samples, sample_rate))
    }
}

fn parse_harmonics(text: &str) -> Result<Vec<f64>, SynthError> {
    serde_json::from_str::<Vec<f64>>(text)
        .map_err(|e| SynthError::malformed(format!("harmonics must be a JSON array of numbers: {e}")))
}

fn parse_number(name: &str, text: &str) -> Result<f64, SynthError> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SynthError::malformed(format!(
            "{name} must be a finite number, got '{text}'"
        ))),
    }
}

/// A finite number of seconds no larger than [`MAX_RENDER_SECONDS`].
fn parse_seconds(name: &str, text: &str) -> Result<f64, SynthError> {
    let value = parse_number(name, text)?;
    if value > MAX_RENDER_SECONDS {
        return Err(SynthError::malformed(format!(
            "{name} must be at most {MAX_RENDER_SECONDS} seconds, got {value}"
        )));
    }
    Ok(value)
}

fn check_total(seconds: f64) -> Result<(), SynthError> {
    if seconds.is_nan() || seconds > MAX_RENDER_SECONDS {
        return Err(SynthError::malformed(format!(
            "render would last {seconds} seconds, limit is {MAX_RENDER_SECONDS}"
        )));
    }
    Ok(())
}

fn parse_notes(text: &str) -> Result<Vec<String>, SynthError> {
    let notes: Vec<String> = text.split(',').map(|n| n.trim().to_string()).collect();
    if notes.iter().all(|n| n.is_empty()) {
        return Err(SynthError::malformed("notes must name at least one pitch"));
    }
    Ok(notes)
}

fn parse_shaping(query: &AudioQuery) -> Result<Shaping, SynthError> {
    match query.envelope.as_deref().map(str::trim) {
        None | Some("fade") => Ok(Shaping::default()),
        Some("adsr") => {
            let defaults = Adsr::default();
            let segment = |name: &str, value: &Option<String>, default: f64| -> Result<f64, SynthError> {
                let Some(text) = value else {
                    return Ok(default);
                };
                let seconds = parse_seconds(name, text)?;
                if seconds < 0.0 {
                    return Err(SynthError::malformed(format!("{name} must not be negative")));
                }
                Ok(seconds)
            };
            let adsr = Adsr {
                attack: segment("attack", &query.attack, defaults.attack)?,
                decay: segment("decay", &query.decay, defaults.decay)?,
                sustain: match &query.sustain {
                    Some(text) => parse_number("sustain", text)?,
                    None => defaults.sustain,
                },
                release: segment("release", &query.release, defaults.release)?,
            };
            if !(0.0..=1.0).contains(&adsr.sustain) {
                return Err(SynthError::malformed(format!(
                    "sustain must be between 0 and 1, got {}",
                    adsr.sustain
                )));
            }
            Ok(Shaping::Adsr(adsr))
        }
        Some(other) => Err(SynthError::malformed(format!(
            "unknown envelope '{other}' (expected fade or adsr)"
        ))),
    }
}
