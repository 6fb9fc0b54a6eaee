//! Monophonic melody extraction from a flattened score.

use serde::{Deserialize, Serialize};

use crate::score::{Score, ScoreElement};

/// Label carried by rest events. Not a pitch name, so it looks up as silence.
pub const REST_LABEL: &str = "rest";

/// One step of a melody: a pitch name (or [`REST_LABEL`]) held for
/// `duration` quarter notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub label: String,
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(label: impl Into<String>, duration: f64) -> Self {
        NoteEvent {
            label: label.into(),
            duration,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.label == REST_LABEL
    }
}

/// One event per score element, in score order. Chords collapse to their
/// root; labels use sharp spelling so they resolve in the frequency table.
pub fn extract_melody(score: &Score) -> Vec<NoteEvent> {
    score
        .elements
        .iter()
        .map(|element| match element {
            ScoreElement::Note { pitch, duration } => {
                NoteEvent::new(pitch.canonical_name(), *duration)
            }
            ScoreElement::Chord { duration, .. } => match element.root() {
                Some(root) => NoteEvent::new(root.canonical_name(), *duration),
                None => NoteEvent::new(REST_LABEL, *duration),
            },
            ScoreElement::Rest { duration } => NoteEvent::new(REST_LABEL, *duration),
        })
        .collect()
}
