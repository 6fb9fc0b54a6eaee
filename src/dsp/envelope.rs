//! Envelope shapers applied to a raw float waveform before quantization.
//!
//! Two independent passes are available: a short linear fade in/out that
//! suppresses clicks at note boundaries, and a four-segment ADSR envelope for
//! musically shaped notes. They are alternatives; a note gets one or the other.

/// Default fade length in seconds (5 ms).
pub const DEFAULT_FADE_DURATION: f64 = 0.005;

/// Peak magnitude of a full-scale 16-bit sample.
pub const FULL_SCALE: f64 = 32767.0;

/// Convert a float sample to 16 bit, truncating toward zero and saturating
/// at the type bounds.
pub fn quantize(sample: f64) -> i16 {
    sample as i16
}

/// Point `i` of an `n`-point inclusive ramp from 0 to 1.
fn ramp_point(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}

/// Linear fade in over the first and fade out over the last
/// `floor(sample_rate * fade_duration)` samples.
///
/// When the two ramps do not fit inside the buffer (or the fade is shorter
/// than one sample) the samples are only cast to 16 bit. When they fit, the
/// first and last output samples are exactly zero.
pub fn apply_fade(wave: &[f64], sample_rate: u32, fade_duration: f64) -> Vec<i16> {
    let fade = (sample_rate as f64 * fade_duration) as usize;
    let len = wave.len();
    if fade == 0 || fade * 2 >= len {
        return wave.iter().map(|&s| quantize(s)).collect();
    }

    let fade_out_start = len - fade;
    wave.iter()
        .enumerate()
        .map(|(i, &s)| {
            let gain = if i < fade {
                ramp_point(i, fade)
            } else if i >= fade_out_start {
                // Mirror of the fade in, so a one-sample fade still ends on 0.
                ramp_point(len - 1 - i, fade)
            } else {
                1.0
            };
            quantize(s * gain)
        })
        .collect()
}

/// ADSR envelope parameters. Times are in seconds, sustain is a level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for Adsr {
    fn default() -> Self {
        Adsr {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.1,
        }
    }
}

impl Adsr {
    /// Gain curve for a buffer of `len` samples.
    ///
    /// Attack ramps 0→1 and decay 1→sustain (both exclusive of their end
    /// value), sustain holds, release ramps sustain→0 inclusive. When the
    /// segments do not fit, sustain shrinks to zero and release takes what is
    /// left after attack and decay; attack and decay are never shortened but
    /// are cut off at the end of the buffer.
    pub fn envelope(&self, len: usize, sample_rate: u32) -> Vec<f64> {
        let sr = sample_rate as f64;
        let attack = (sr * self.attack) as usize;
        let decay = (sr * self.decay) as usize;
        let mut release = (sr * self.release) as usize;
        let attack_decay = attack.saturating_add(decay);
        if attack_decay.saturating_add(release) > len {
            release = len.saturating_sub(attack_decay);
        }
        let sustain_end = len - release;

        let mut env = vec![0.0; len];
        for (i, gain) in env.iter_mut().enumerate().take(attack) {
            *gain = i as f64 / attack as f64;
        }
        for (j, gain) in env.iter_mut().skip(attack).take(decay).enumerate() {
            *gain = 1.0 + (self.sustain - 1.0) * j as f64 / decay as f64;
        }
        for gain in env.iter_mut().take(sustain_end).skip(attack_decay) {
            *gain = self.sustain;
        }
        for (j, gain) in env.iter_mut().skip(sustain_end).enumerate() {
            *gain = self.sustain * (1.0 - ramp_point(j, release));
        }
        env
    }
}

/// Multiply by the ADSR envelope, rescale to full 16-bit range (unless the
/// result is silent), then quantize.
pub fn apply_adsr(wave: &[f64], sample_rate: u32, adsr: &Adsr) -> Vec<i16> {
    let env = adsr.envelope(wave.len(), sample_rate);
    let shaped: Vec<f64> = wave.iter().zip(&env).map(|(s, g)| s * g).collect();

    let peak = shaped.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        shaped.iter().map(|s| quantize(s / peak * FULL_SCALE)).collect()
    } else {
        shaped.iter().map(|&s| quantize(s)).collect()
    }
}

/// How a rendered note is shaped before quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shaping {
    Fade { duration: f64 },
    Adsr(Adsr),
}

impl Default for Shaping {
    fn default() -> Self {
        Shaping::Fade {
            duration: DEFAULT_FADE_DURATION,
        }
    }
}

impl Shaping {
    pub fn apply(&self, wave: &[f64], sample_rate: u32) -> Vec<i16> {
        match self {
            Shaping::Fade { duration } => apply_fade(wave, sample_rate, *duration),
            Shaping::Adsr(adsr) => apply_adsr(wave, sample_rate, adsr),
        }
    }
}
