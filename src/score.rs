//! Flattened score model: the `{Note, Chord, Rest}` element stream read by
//! the melody extractor.

use serde::{Deserialize, Serialize};

use crate::ast::{DurationExpr, Expr, Pitch, Program, Statement};
use crate::error::ParseError;
use crate::token::Span;

/// Quarter length used when neither the element nor `score.duration` gives one.
pub const DEFAULT_QUARTER_LENGTH: f64 = 1.0;

/// A score reduced to its ordered elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub title: Option<String>,
    pub elements: Vec<ScoreElement>,
}

/// One element of the flattened score. Durations are quarter lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoreElement {
    Note { pitch: Pitch, duration: f64 },
    Chord { pitches: Vec<Pitch>, duration: f64 },
    Rest { duration: f64 },
}

impl ScoreElement {
    pub fn duration(&self) -> f64 {
        match self {
            ScoreElement::Note { duration, .. }
            | ScoreElement::Chord { duration, .. }
            | ScoreElement::Rest { duration } => *duration,
        }
    }

    /// The sounding pitch standing in for this element: the note itself, a
    /// chord's root, nothing for a rest.
    pub fn root(&self) -> Option<Pitch> {
        match self {
            ScoreElement::Note { pitch, .. } => Some(*pitch),
            ScoreElement::Chord { pitches, .. } => chord_root(pitches),
            ScoreElement::Rest { .. } => None,
        }
    }
}

/// Root of a chord: the tone over which the others stack most strongly in
/// thirds. A candidate earns 2 for every other pitch class a third or fifth
/// above it and 1 for every seventh; ties go to the lowest-sounding pitch.
/// Returns `None` only for an empty slice.
pub fn chord_root(pitches: &[Pitch]) -> Option<Pitch> {
    let mut best: Option<(u32, Pitch)> = None;
    for candidate in pitches {
        let score: u32 = pitches
            .iter()
            .filter(|p| p.pitch_class() != candidate.pitch_class())
            .map(|p| match (p.midi() - candidate.midi()).rem_euclid(12) {
                3 | 4 | 7 => 2,
                10 | 11 => 1,
                _ => 0,
            })
            .sum();
        best = match best {
            Some((s, p)) if s > score || (s == score && p.midi() <= candidate.midi()) => Some((s, p)),
            _ => Some((score, *candidate)),
        };
    }
    best.map(|(_, p)| p)
}

struct FlattenCtx {
    default_duration: f64,
}

impl FlattenCtx {
    fn resolve_duration(&self, dur: &Option<DurationExpr>) -> f64 {
        dur.map_or(self.default_duration, |d| d.quarter_length())
    }
}

/// Resolve a parsed program into score order with concrete durations.
pub fn flatten(program: &Program) -> Result<Score, ParseError> {
    let mut ctx = FlattenCtx {
        default_duration: DEFAULT_QUARTER_LENGTH,
    };
    let mut score = Score::default();

    for stmt in &program.statements {
        match stmt {
            Statement::Note { pitch, duration, .. } => score.elements.push(ScoreElement::Note {
                pitch: *pitch,
                duration: ctx.resolve_duration(duration),
            }),
            Statement::Chord {
                pitches, duration, ..
            } => score.elements.push(ScoreElement::Chord {
                pitches: pitches.clone(),
                duration: ctx.resolve_duration(duration),
            }),
            Statement::Rest { duration, .. } => score.elements.push(ScoreElement::Rest {
                duration: ctx.resolve_duration(duration),
            }),
            Statement::Assignment {
                target,
                value,
                span_start,
                span_end,
            } => {
                let span = Span {
                    start: *span_start,
                    end: *span_end,
                };
                match (target.as_str(), value) {
                    ("score.title", Expr::StringLit(title)) => score.title = Some(title.clone()),
                    ("score.duration", Expr::DurationLit(d)) => {
                        ctx.default_duration = d.quarter_length()
                    }
                    ("score.title" | "score.duration", _) => {
                        return Err(ParseError::InvalidValue {
                            target: target.clone(),
                            span,
                        });
                    }
                    _ => {
                        return Err(ParseError::UnknownProperty {
                            name: target.clone(),
                            span,
                        });
                    }
                }
            }
            Statement::Comment(_) => {}
        }
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitches(names: &[&str]) -> Vec<Pitch> {
        names.iter().map(|n| Pitch::parse(n).unwrap()).collect()
    }

    fn flatten_src(src: &str) -> Result<Score, ParseError> {
        let program = crate::parse(src).expect("parse failed");
        flatten(&program)
    }

    #[test]
    fn root_of_root_position_triad() {
        let root = chord_root(&pitches(&["C4", "E4", "G4"])).unwrap();
        assert_eq!(root.to_string(), "C4");
    }

    #[test]
    fn root_of_inverted_triad() {
        let root = chord_root(&pitches(&["E4", "G4", "C5"])).unwrap();
        assert_eq!(root.to_string(), "C5");
        let root = chord_root(&pitches(&["B3", "E4", "G#4"])).unwrap();
        assert_eq!(root.to_string(), "E4");
    }

    #[test]
    fn root_of_seventh_chord() {
        let root = chord_root(&pitches(&["F4", "G3", "B3", "D4"])).unwrap();
        assert_eq!(root.to_string(), "G3");
    }

    #[test]
    fn root_of_octave_doubling_prefers_lowest() {
        let root = chord_root(&pitches(&["A3", "A2"])).unwrap();
        assert_eq!(root.to_string(), "A2");
    }

    #[test]
    fn root_of_single_note_and_empty() {
        assert_eq!(chord_root(&pitches(&["D5"])).unwrap().to_string(), "D5");
        assert_eq!(chord_root(&[]), None);
    }

    #[test]
    fn flatten_resolves_default_duration() {
        let score = flatten_src("C4\nscore.duration = /2\nD4\nE4 2\n").unwrap();
        let durations: Vec<f64> = score.elements.iter().map(|e| e.duration()).collect();
        assert_eq!(durations, vec![1.0, 0.5, 2.0]);
    }

    #[test]
    fn flatten_keeps_order_and_title() {
        let score = flatten_src("score.title = \"Test\"\nC4 1\nR /2\n[E4, G#4, B4] 1").unwrap();
        assert_eq!(score.title.as_deref(), Some("Test"));
        assert!(matches!(score.elements[0], ScoreElement::Note { .. }));
        assert_eq!(score.elements[1], ScoreElement::Rest { duration: 0.5 });
        assert!(matches!(&score.elements[2], ScoreElement::Chord { pitches, .. } if pitches.len() == 3));
    }

    #[test]
    fn flatten_rejects_unknown_property() {
        let err = flatten_src("score.tempo = 120").unwrap_err();
        assert!(matches!(err, ParseError::UnknownProperty { ref name, .. } if name == "score.tempo"));
    }

    #[test]
    fn flatten_rejects_mistyped_property() {
        let err = flatten_src("score.duration = \"long\"").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
        assert!(flatten_src("score.title = 2").is_err());
    }
}
