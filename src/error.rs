use std::ops::Range;
use std::path::PathBuf;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::token::{token_to_string, Span, Token};

/// Error type for rendering requests.
///
/// Every variant is fatal to the request that raised it: synthesis is pure,
/// so nothing here is worth retrying and no partial buffer is ever returned.
#[derive(Error, Debug)]
pub enum SynthError {
    /// Waveform name outside the five supported kinds.
    #[error("invalid waveform kind '{0}' (expected sine, harmonic, square, sawtooth or triangle)")]
    InvalidWaveformKind(String),

    /// Unparsable harmonics, durations, note list, mode or envelope.
    #[error("malformed parameters: {0}")]
    MalformedParameters(String),

    /// Melody mode was requested but the backing score file is absent.
    #[error("score source not found: {}", .0.display())]
    MissingScoreSource(PathBuf),

    /// The score file exists but does not parse.
    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    /// Shorthand for [`SynthError::MalformedParameters`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        SynthError::MalformedParameters(msg.into())
    }

    /// True when the request parameters are at fault rather than the score
    /// file or the host. Both kinds fail the request the same way.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SynthError::InvalidWaveformKind(_) | SynthError::MalformedParameters(_)
        )
    }
}

/// Failure to read score notation.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug, PartialEq)]
pub enum LexError {
    #[error("Unexpected char '{ch}' at pos {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unterminated string at pos {pos}")]
    UnterminatedString { pos: usize },
    #[error("Invalid number '{text}' at pos {pos}")]
    InvalidNumber { text: String, pos: usize },
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Expected {expected}, found {} at pos {}", token_to_string(.found), .span.start)]
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },
    #[error("Invalid pitch '{text}' at pos {}", .span.start)]
    InvalidPitch { text: String, span: Span },
    #[error("Unknown score property '{name}' at pos {}", .span.start)]
    UnknownProperty { name: String, span: Span },
    #[error("Invalid duration at pos {}: {reason}", .span.start)]
    InvalidDuration { reason: String, span: Span },
    #[error("Invalid value for '{target}' at pos {}", .span.start)]
    InvalidValue { target: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Range<usize> {
        match self {
            LexError::UnexpectedChar { ch, pos } => *pos..*pos + ch.len_utf8(),
            LexError::UnterminatedString { pos } => *pos..*pos + 1,
            LexError::InvalidNumber { text, pos } => *pos..*pos + text.len(),
        }
    }
}

impl ParseError {
    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidPitch { span, .. }
            | ParseError::UnknownProperty { span, .. }
            | ParseError::InvalidDuration { span, .. }
            | ParseError::InvalidValue { span, .. } => span.range(),
        }
    }
}

impl ScoreError {
    /// Byte range in the score source that the error points at.
    pub fn span(&self) -> Range<usize> {
        match self {
            ScoreError::Lex(e) => e.span(),
            ScoreError::Parse(e) => e.span(),
        }
    }

    /// Render an annotated, uncoloured source report for terminal output.
    pub fn report(&self, source_name: &str, source: &str) -> String {
        let span = self.span();
        let span = span.start.min(source.len())..span.end.min(source.len());
        let label = match self {
            ScoreError::Lex(_) => "not valid score notation",
            ScoreError::Parse(_) => "unexpected here",
        };

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, (source_name, span.clone()))
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(self.to_string())
            .with_label(Label::new((source_name, span)).with_message(label))
            .finish()
            .write((source_name, Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => format!("{source_name}: {self}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(SynthError::InvalidWaveformKind("noise".into()).is_client_error());
        assert!(SynthError::malformed("harmonics").is_client_error());
        assert!(!SynthError::MissingScoreSource(PathBuf::from("x.score")).is_client_error());
    }

    #[test]
    fn missing_score_message_names_the_path() {
        let err = SynthError::MissingScoreSource(PathBuf::from("scores/none.score"));
        assert!(err.to_string().contains("scores/none.score"));
    }

    #[test]
    fn report_mentions_message_and_source_name() {
        let source = "C4 /4\nC4 $\n";
        let err = ScoreError::Lex(LexError::UnexpectedChar { ch: '$', pos: 9 });
        let report = err.report("bad.score", source);
        assert!(report.contains("bad.score"), "report was: {report}");
        assert!(report.contains("Unexpected char '$'"), "report was: {report}");
    }

    #[test]
    fn report_clamps_span_past_end() {
        let err = ScoreError::Parse(ParseError::UnexpectedToken {
            expected: "duration".into(),
            found: Token::EOF,
            span: Span { start: 40, end: 40 },
        });
        let report = err.report("short.score", "C4 /");
        assert!(report.contains("end of file"), "report was: {report}");
    }
}
