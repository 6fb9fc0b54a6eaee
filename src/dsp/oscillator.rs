//! Closed-form periodic waveforms sampled on a fixed time grid.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::envelope::{apply_fade, DEFAULT_FADE_DURATION, FULL_SCALE};
use crate::error::SynthError;

/// Output sample rate used throughout.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Harmonic amplitudes used when a caller gives none (index 0 = fundamental).
pub const DEFAULT_HARMONICS: [f64; 4] = [1.0, 0.5, 0.25, 0.125];

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    /// Additive: fundamental plus overtones weighted by a harmonic list.
    Harmonic,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Harmonic,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Harmonic => "harmonic",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Unshaped float samples at `amplitude` scale.
    ///
    /// `harmonics` is only read by [`Waveform::Harmonic`].
    pub fn raw(
        &self,
        frequency: f64,
        duration: f64,
        harmonics: &[f64],
        sample_rate: u32,
        amplitude: f64,
    ) -> Vec<f64> {
        let samples = sample_count(sample_rate, duration);
        let t = time_grid(duration, samples);
        match self {
            Waveform::Sine => t
                .map(|t| amplitude * (2.0 * PI * frequency * t).sin())
                .collect(),
            Waveform::Harmonic => harmonic_sum(frequency, t, samples, harmonics, amplitude),
            Waveform::Square => t
                .map(|t| amplitude * sign((2.0 * PI * frequency * t).sin()))
                .collect(),
            Waveform::Sawtooth => t
                .map(|t| {
                    let x = t * frequency;
                    amplitude * (2.0 * (x - x.floor()) - 1.0)
                })
                .collect(),
            Waveform::Triangle => t
                .map(|t| {
                    let x = t * frequency;
                    amplitude * (2.0 * (2.0 * (x - (x + 0.5).floor())).abs() - 1.0)
                })
                .collect(),
        }
    }

    /// Raw samples passed through the click-suppressing fade.
    pub fn generate(
        &self,
        frequency: f64,
        duration: f64,
        harmonics: &[f64],
        params: &ToneParams,
    ) -> Vec<i16> {
        let raw = self.raw(
            frequency,
            duration,
            harmonics,
            params.sample_rate,
            params.amplitude,
        );
        apply_fade(&raw, params.sample_rate, params.fade_duration)
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| SynthError::InvalidWaveformKind(s.to_string()))
    }
}

/// Per-call generator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    pub sample_rate: u32,
    /// Peak amplitude of the raw waveform.
    pub amplitude: f64,
    /// Fade in/out length in seconds.
    pub fade_duration: f64,
}

impl Default for ToneParams {
    fn default() -> Self {
        ToneParams {
            sample_rate: DEFAULT_SAMPLE_RATE,
            amplitude: FULL_SCALE,
            fade_duration: DEFAULT_FADE_DURATION,
        }
    }
}

/// `floor(sample_rate * duration)`; negative or NaN durations give 0.
pub fn sample_count(sample_rate: u32, duration: f64) -> usize {
    (sample_rate as f64 * duration) as usize
}

/// `samples` evenly spaced instants over `[0, duration)`.
fn time_grid(duration: f64, samples: usize) -> impl Iterator<Item = f64> {
    (0..samples).map(move |i| duration * i as f64 / samples as f64)
}

/// Sign with `sign(0) = 0`.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Sum of `harmonics[k] * sin(2π f (k+1) t)`, rescaled so the peak equals
/// `amplitude`. A silent sum is returned as-is.
fn harmonic_sum(
    frequency: f64,
    t: impl Iterator<Item = f64>,
    samples: usize,
    harmonics: &[f64],
    amplitude: f64,
) -> Vec<f64> {
    let mut wave = Vec::with_capacity(samples);
    for t in t {
        let mut sample = 0.0;
        for (k, h) in harmonics.iter().enumerate() {
            sample += h * (2.0 * PI * frequency * (k + 1) as f64 * t).sin();
        }
        wave.push(sample);
    }

    let peak = wave.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak > 0.0 && peak.is_finite() {
        let scale = amplitude / peak;
        for s in wave.iter_mut() {
            *s *= scale;
        }
    }
    wave
}

pub fn sine_wave(frequency: f64, duration: f64, params: &ToneParams) -> Vec<i16> {
    Waveform::Sine.generate(frequency, duration, &[], params)
}

pub fn harmonic_wave(
    frequency: f64,
    duration: f64,
    harmonics: &[f64],
    params: &ToneParams,
) -> Vec<i16> {
    Waveform::Harmonic.generate(frequency, duration, harmonics, params)
}

pub fn square_wave(frequency: f64, duration: f64, params: &ToneParams) -> Vec<i16> {
    Waveform::Square.generate(frequency, duration, &[], params)
}

pub fn sawtooth_wave(frequency: f64, duration: f64, params: &ToneParams) -> Vec<i16> {
    Waveform::Sawtooth.generate(frequency, duration, &[], params)
}

pub fn triangle_wave(frequency: f64, duration: f64, params: &ToneParams) -> Vec<i16> {
    Waveform::Triangle.generate(frequency, duration, &[], params)
}
