//! Sequence renderer: note lists and melodies to one mono 16-bit buffer,
//! and the WAV container around it.

use std::iter;

use tracing::debug;

use super::envelope::{Shaping, FULL_SCALE};
use super::frequency::FrequencyTable;
use super::oscillator::{sample_count, Waveform, DEFAULT_SAMPLE_RATE};
use crate::melody::NoteEvent;

/// Size of the canonical RIFF/WAVE header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Renders sequences of named pitches by concatenating one shaped waveform
/// (or a run of silence) per element.
#[derive(Debug, Clone)]
pub struct Renderer<'a> {
    table: &'a FrequencyTable,
    sample_rate: u32,
    shaping: Shaping,
}

impl Default for Renderer<'static> {
    fn default() -> Self {
        Renderer::new(FrequencyTable::standard(), DEFAULT_SAMPLE_RATE)
    }
}

impl<'a> Renderer<'a> {
    pub fn new(table: &'a FrequencyTable, sample_rate: u32) -> Self {
        Renderer {
            table,
            sample_rate,
            shaping: Shaping::default(),
        }
    }

    pub fn with_shaping(mut self, shaping: Shaping) -> Self {
        self.shaping = shaping;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Every note held for the same `duration` seconds.
    pub fn render_notes<S: AsRef<str>>(
        &self,
        notes: &[S],
        waveform: Waveform,
        harmonics: &[f64],
        duration: f64,
    ) -> Vec<i16> {
        let mut out = Vec::new();
        for note in notes {
            self.render_element(note.as_ref(), duration, waveform, harmonics, &mut out);
        }
        out
    }

    /// Each event held for `event.duration * duration_scale` seconds.
    pub fn render_melody(
        &self,
        events: &[NoteEvent],
        waveform: Waveform,
        harmonics: &[f64],
        duration_scale: f64,
    ) -> Vec<i16> {
        let mut out = Vec::new();
        for event in events {
            let duration = event.duration * duration_scale;
            self.render_element(&event.label, duration, waveform, harmonics, &mut out);
        }
        out
    }

    fn render_element(
        &self,
        label: &str,
        duration: f64,
        waveform: Waveform,
        harmonics: &[f64],
        out: &mut Vec<i16>,
    ) {
        if duration.is_nan() || duration <= 0.0 {
            debug!(note = label, duration, "skipping empty element");
            return;
        }

        let frequency = self.table.lookup(label);
        if frequency == 0.0 {
            let samples = sample_count(self.sample_rate, duration);
            debug!(note = label, duration, samples, "rendering silence");
            out.extend(iter::repeat_n(0, samples));
            return;
        }

        debug!(note = label, frequency, duration, %waveform, "rendering note");
        let raw = waveform.raw(frequency, duration, harmonics, self.sample_rate, FULL_SCALE);
        out.extend(self.shaping.apply(&raw, self.sample_rate));
    }
}

/// Largest sample count whose data chunk still fits the 32-bit RIFF sizes.
pub const MAX_WAV_SAMPLES: usize = (u32::MAX as usize - 36) / 2;

/// Wrap mono samples in a WAV container.
pub fn render_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    encode_wav(samples, sample_rate)
}

/// Encode mono i16 PCM samples to a WAV byte buffer. Samples past
/// [`MAX_WAV_SAMPLES`] are dropped so the header sizes stay exact.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let samples = &samples[..samples.len().min(MAX_WAV_SAMPLES)];
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::dsp::envelope::Adsr;
    use crate::dsp::oscillator::{DEFAULT_HARMONICS, ToneParams};

    fn decode(wav: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let reader = hound::WavReader::new(Cursor::new(wav)).expect("valid wav");
        let spec = reader.spec();
        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .expect("samples");
        (spec, samples)
    }

    #[test]
    fn one_second_of_a4() {
        let out = Renderer::default().render_notes(&["A4"], Waveform::Sine, &[], 1.0);
        assert_eq!(out.len(), 44100);
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn matches_direct_generator_output() {
        let out = Renderer::default().render_notes(&["A4"], Waveform::Square, &[], 0.5);
        let direct = Waveform::Square.generate(440.0, 0.5, &[], &ToneParams::default());
        assert_eq!(out, direct);
    }

    #[test]
    fn rest_and_unknown_names_are_silent() {
        let renderer = Renderer::default();
        for label in ["rest", "H4", "Eb4"] {
            let out = renderer.render_notes(&[label], Waveform::Harmonic, &DEFAULT_HARMONICS, 1.0);
            assert_eq!(out.len(), 44100, "{label}");
            assert!(out.iter().all(|&s| s == 0), "{label}");
        }
    }

    #[test]
    fn notes_concatenate_in_order() {
        let renderer = Renderer::default();
        let out = renderer.render_notes(&["C4", "rest", "E4"], Waveform::Sine, &[], 0.25);
        assert_eq!(out.len(), 3 * 11025);
        assert!(out[11025..22050].iter().all(|&s| s == 0));
        let c4 = renderer.render_notes(&["C4"], Waveform::Sine, &[], 0.25);
        assert_eq!(&out[..11025], &c4[..]);
    }

    #[test]
    fn zero_durations_produce_nothing() {
        let renderer = Renderer::default();
        assert!(renderer.render_notes(&["A4", "rest"], Waveform::Sine, &[], 0.0).is_empty());
        let events = vec![NoteEvent::new("A4", 0.0), NoteEvent::new("rest", 0.0)];
        assert!(renderer.render_melody(&events, Waveform::Sine, &[], 0.25).is_empty());
    }

    #[test]
    fn melody_scales_durations() {
        let events = vec![
            NoteEvent::new("E5", 0.5),
            NoteEvent::new("rest", 1.0),
            NoteEvent::new("A4", 2.0),
        ];
        let out = Renderer::default().render_melody(&events, Waveform::Triangle, &[], 0.25);
        let expected = (44100.0 * 0.125) as usize + (44100.0 * 0.25) as usize + 22050;
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn rendering_is_bit_identical() {
        let events = vec![NoteEvent::new("C#5", 1.0), NoteEvent::new("G3", 0.5)];
        let renderer = Renderer::default();
        for waveform in Waveform::ALL {
            let a = renderer.render_melody(&events, waveform, &DEFAULT_HARMONICS, 0.25);
            let b = renderer.render_melody(&events, waveform, &DEFAULT_HARMONICS, 0.25);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn adsr_shaping_is_used_when_configured() {
        let renderer = Renderer::default().with_shaping(Shaping::Adsr(Adsr::default()));
        let out = renderer.render_notes(&["A4"], Waveform::Sine, &[], 1.0);
        let peak = out.iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert_eq!(peak, 32767);
        assert_eq!(out[out.len() - 1], 0);
    }

    #[test]
    fn custom_table_and_rate() {
        let table = FrequencyTable::build(4, 4);
        let renderer = Renderer::new(&table, 8000);
        let out = renderer.render_notes(&["A4", "A5"], Waveform::Sine, &[], 0.5);
        assert_eq!(renderer.sample_rate(), 8000);
        assert_eq!(out.len(), 8000);
        assert!(out[4000..].iter().all(|&s| s == 0));
    }

    #[test]
    fn wav_header_fields() {
        let samples = Renderer::default().render_notes(&["A4"], Waveform::Sine, &[], 0.1);
        let wav = render_wav(&samples, 44100);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(wav.len(), WAV_HEADER_LEN + samples.len() * 2);

        let riff_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        assert_eq!(riff_size as usize, wav.len() - 8);

        let (spec, decoded) = decode(&wav);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn mono_block_align_and_byte_rate() {
        let wav = render_wav(&[1, -1, 2, -2], 22050);
        let (spec, decoded) = decode(&wav);
        assert_eq!(spec.channels, 1);
        assert_eq!(decoded, vec![1, -1, 2, -2]);
        let byte_rate = u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]);
        assert_eq!(byte_rate, 22050 * 2);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2);
    }

    #[test]
    fn wav_size_limit_fits_riff_header() {
        let data_size = MAX_WAV_SAMPLES as u64 * 2;
        assert!(data_size + 36 <= u32::MAX as u64);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let wav = render_wav(&[], 44100);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        let (_, decoded) = decode(&wav);
        assert!(decoded.is_empty());
    }
}
