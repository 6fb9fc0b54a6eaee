use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsp::frequency::NOTE_NAMES;

/// A parsed score file, statement by statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A top-level score statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `C#4 /2`
    Note {
        pitch: Pitch,
        duration: Option<DurationExpr>,
        span_start: usize,
        span_end: usize,
    },
    /// `[A2, E3, A3] 1`
    Chord {
        pitches: Vec<Pitch>,
        duration: Option<DurationExpr>,
        span_start: usize,
        span_end: usize,
    },
    /// `R /2`, or a standalone duration.
    Rest {
        duration: Option<DurationExpr>,
        span_start: usize,
        span_end: usize,
    },
    /// `score.property = value;`
    Assignment {
        target: String,
        value: Expr,
        span_start: usize,
        span_end: usize,
    },
    /// `// text`
    Comment(String),
}

/// A duration in quarter lengths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum DurationExpr {
    /// `/N` shorthand for 1/N of a quarter.
    Inverse(f64),
    /// `N/M` fraction of a quarter.
    Fraction(f64, f64),
    /// Plain quarter count (`2`, `0.5`).
    Quarters(f64),
}

impl DurationExpr {
    pub fn quarter_length(&self) -> f64 {
        match *self {
            DurationExpr::Inverse(n) => 1.0 / n,
            DurationExpr::Fraction(n, m) => n / m,
            DurationExpr::Quarters(n) => n,
        }
    }
}

/// Right-hand side of a property assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expr {
    StringLit(String),
    DurationLit(DurationExpr),
}

/// A written pitch: step letter, accidental and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    /// `'A'..='G'`
    pub step: char,
    /// -1 for flat, 0 natural, 1 sharp.
    pub alter: i8,
    pub octave: i32,
}

impl Pitch {
    /// Parse a pitch such as `C4`, `F#3` or `Bb5`.
    pub fn parse(text: &str) -> Option<Pitch> {
        let mut chars = text.chars();
        let step = chars.next()?.to_ascii_uppercase();
        if !('A'..='G').contains(&step) {
            return None;
        }
        let rest = chars.as_str();
        let (alter, octave_str) = match rest.as_bytes().first() {
            Some(b'#') => (1, &rest[1..]),
            Some(b'b') => (-1, &rest[1..]),
            _ => (0, rest),
        };
        // At most two digits keeps `midi` well inside i32.
        if octave_str.is_empty()
            || octave_str.len() > 2
            || !octave_str.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let octave = octave_str.parse().ok()?;
        Some(Pitch { step, alter, octave })
    }

    /// MIDI note number (C4 = 60).
    pub fn midi(&self) -> i32 {
        let base = match self.step {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            _ => 11,
        };
        (self.octave + 1) * 12 + base + self.alter as i32
    }

    pub fn pitch_class(&self) -> usize {
        self.midi().rem_euclid(12) as usize
    }

    /// Enharmonic sharp spelling, octave adjusted across the B/C boundary:
    /// `Eb4` -> `D#4`, `Cb4` -> `B3`, `B#3` -> `C4`.
    pub fn canonical_name(&self) -> String {
        let midi = self.midi();
        let octave = midi.div_euclid(12) - 1;
        format!("{}{octave}", NOTE_NAMES[self.pitch_class()])
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.alter {
            1 => "#",
            -1 => "b",
            _ => "",
        };
        write!(f, "{}{accidental}{}", self.step, self.octave)
    }
}

// ── Span accessors ──────────────────────────────────────────

impl Statement {
    /// Returns the source byte range `(span_start, span_end)` for this statement.
    /// Comments have no span information and return `(usize::MAX, usize::MAX)`.
    pub fn span(&self) -> (usize, usize) {
        match self {
            Statement::Note { span_start, span_end, .. }
            | Statement::Chord { span_start, span_end, .. }
            | Statement::Rest { span_start, span_end, .. }
            | Statement::Assignment { span_start, span_end, .. } => (*span_start, *span_end),
            Statement::Comment(_) => (usize::MAX, usize::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_naturals_sharps_and_flats() {
        assert_eq!(
            Pitch::parse("C4"),
            Some(Pitch { step: 'C', alter: 0, octave: 4 })
        );
        assert_eq!(
            Pitch::parse("F#3"),
            Some(Pitch { step: 'F', alter: 1, octave: 3 })
        );
        assert_eq!(
            Pitch::parse("Bb5"),
            Some(Pitch { step: 'B', alter: -1, octave: 5 })
        );
    }

    #[test]
    fn rejects_non_pitches() {
        for text in ["H4", "C", "C#", "title", "C4x", "R"] {
            assert_eq!(Pitch::parse(text), None, "{text} should not parse");
        }
    }

    #[test]
    fn octave_is_at_most_two_digits() {
        assert_eq!(Pitch::parse("C99").unwrap().midi(), 1200);
        for text in ["C100", "C2147483647", "Bb99999999999"] {
            assert_eq!(Pitch::parse(text), None, "{text} should not parse");
        }
    }

    #[test]
    fn midi_numbers() {
        assert_eq!(Pitch::parse("C4").unwrap().midi(), 60);
        assert_eq!(Pitch::parse("A4").unwrap().midi(), 69);
        assert_eq!(Pitch::parse("C0").unwrap().midi(), 12);
    }

    #[test]
    fn canonical_spelling_uses_sharps() {
        assert_eq!(Pitch::parse("Eb4").unwrap().canonical_name(), "D#4");
        assert_eq!(Pitch::parse("Cb4").unwrap().canonical_name(), "B3");
        assert_eq!(Pitch::parse("B#3").unwrap().canonical_name(), "C4");
        assert_eq!(Pitch::parse("G#2").unwrap().canonical_name(), "G#2");
    }

    #[test]
    fn display_keeps_written_spelling() {
        assert_eq!(Pitch::parse("Eb4").unwrap().to_string(), "Eb4");
        assert_eq!(Pitch::parse("c#4").unwrap().to_string(), "C#4");
    }

    #[test]
    fn duration_quarter_lengths() {
        assert_eq!(DurationExpr::Inverse(2.0).quarter_length(), 0.5);
        assert_eq!(DurationExpr::Fraction(3.0, 4.0).quarter_length(), 0.75);
        assert_eq!(DurationExpr::Quarters(2.0).quarter_length(), 2.0);
    }
}
