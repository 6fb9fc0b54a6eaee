//! Equal-tempered frequency table, A4 = 440 Hz.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Sharp-spelled pitch classes, index = semitones above C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference pitch for A4.
pub const A4_FREQUENCY: f64 = 440.0;

const A4_INDEX: i32 = 9;
const A4_OCTAVE: i32 = 4;

/// Octave range of the process-wide table.
pub const STANDARD_OCTAVES: (i32, i32) = (0, 8);

// std LazyLock in place of once_cell::sync::Lazy.
static STANDARD: LazyLock<FrequencyTable> =
    LazyLock::new(|| FrequencyTable::build(STANDARD_OCTAVES.0, STANDARD_OCTAVES.1));

/// Immutable map from pitch name (`"C#4"`) to frequency in Hz.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    notes: HashMap<String, f64>,
}

impl FrequencyTable {
    /// Build the table for `start_octave..=end_octave`.
    pub fn build(start_octave: i32, end_octave: i32) -> Self {
        let mut notes = HashMap::new();
        for octave in start_octave..=end_octave {
            for (i, name) in NOTE_NAMES.iter().enumerate() {
                let semitone_diff = (octave - A4_OCTAVE) * 12 + (i as i32 - A4_INDEX);
                let frequency = A4_FREQUENCY * 2.0_f64.powf(semitone_diff as f64 / 12.0);
                notes.insert(format!("{name}{octave}"), frequency);
            }
        }
        FrequencyTable { notes }
    }

    /// The shared octave 0-8 table, built on first use.
    pub fn standard() -> &'static FrequencyTable {
        &STANDARD
    }

    /// Frequency for `name`, or 0.0 for anything not in the table
    /// (including `"rest"`).
    pub fn lookup(&self, name: &str) -> f64 {
        self.notes.get(name).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_exact() {
        assert_eq!(FrequencyTable::standard().lookup("A4"), 440.0);
    }

    #[test]
    fn covers_nine_octaves() {
        let table = FrequencyTable::standard();
        assert_eq!(table.len(), 9 * 12);
        assert!(table.lookup("C0") > 16.0 && table.lookup("C0") < 16.5);
        assert!(table.lookup("B8") > 7900.0);
        assert_eq!(table.lookup("C9"), 0.0);
    }

    #[test]
    fn semitone_steps_are_equal_tempered() {
        let table = FrequencyTable::standard();
        let ratio = 2.0_f64.powf(1.0 / 12.0);
        for octave in 0..=8 {
            for i in 1..12 {
                let below = table.lookup(&format!("{}{octave}", NOTE_NAMES[i - 1]));
                let above = table.lookup(&format!("{}{octave}", NOTE_NAMES[i]));
                assert!(
                    (above - below * ratio).abs() < 1e-9 * above,
                    "{}{octave}: {above} vs {}",
                    NOTE_NAMES[i],
                    below * ratio
                );
            }
        }
    }

    #[test]
    fn octave_boundary_step() {
        let table = FrequencyTable::standard();
        let b3 = table.lookup("B3");
        let c4 = table.lookup("C4");
        assert!((c4 / b3 - 2.0_f64.powf(1.0 / 12.0)).abs() < 1e-12);
        assert!((c4 - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn unknown_names_are_silent() {
        let table = FrequencyTable::standard();
        assert_eq!(table.lookup("rest"), 0.0);
        assert_eq!(table.lookup("Eb4"), 0.0);
        assert_eq!(table.lookup(""), 0.0);
    }

    #[test]
    fn partial_range() {
        let table = FrequencyTable::build(4, 4);
        assert_eq!(table.len(), 12);
        assert_eq!(table.lookup("A4"), 440.0);
        assert_eq!(table.lookup("A3"), 0.0);
    }
}
