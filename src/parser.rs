use crate::ast::*;
use crate::error::ParseError;
use crate::token::{Span, Spanned, Token};

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

/// Identifiers that stand for a rest instead of a pitch.
const REST_WORDS: [&str; 3] = ["R", "r", "rest"];

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0 }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn peek(&self) -> Token {
        self.tokens
            .get(self.pos)
            .map_or(Token::EOF, |s| s.token.clone())
    }

    fn span(&self) -> Span {
        match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(s) => s.span,
            None => Span { start: 0, end: 0 },
        }
    }

    fn advance(&mut self) -> Option<Spanned> {
        let s = self.tokens.get(self.pos).cloned();
        if s.is_some() {
            self.pos += 1;
        }
        s
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(&self.peek()) == std::mem::discriminant(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.peek(),
            span: self.span(),
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<Span, ParseError> {
        if self.check(expected) {
            let span = self.span();
            self.advance();
            Ok(span)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let span = self.span();
                self.advance();
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_number(&mut self) -> Result<f64, ParseError> {
        match self.peek() {
            Token::Number(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    /// End offset of the most recently consumed token.
    fn last_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }

    /// Skip newlines and return any comments found.
    fn skip_newlines_collecting_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            match self.peek() {
                Token::Newline | Token::Semicolon => {
                    self.advance();
                }
                Token::Comment(text) => {
                    comments.push(text);
                    self.advance();
                }
                _ => break,
            }
        }
        comments
    }

    // ── Program ──────────────────────────────────────────────

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            for c in self.skip_newlines_collecting_comments() {
                statements.push(Statement::Comment(c));
            }
            if self.is_at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Token::Score => self.parse_assignment(),
            Token::LBracket => self.parse_chord(),
            Token::Number(_) => {
                // Standalone number = rest
                let start_span = self.span().start;
                let duration = self.parse_duration_expr()?;
                Ok(Statement::Rest {
                    duration: Some(duration),
                    span_start: start_span,
                    span_end: self.last_end(),
                })
            }
            Token::Ident(_) => self.parse_note_or_rest(),
            _ => Err(self.unexpected("note, chord, rest or score property")),
        }
    }

    fn parse_note_or_rest(&mut self) -> Result<Statement, ParseError> {
        let (name, span) = self.expect_ident()?;
        let duration = self.try_parse_duration()?;
        let span_end = self.last_end();

        if REST_WORDS.contains(&name.as_str()) {
            return Ok(Statement::Rest {
                duration,
                span_start: span.start,
                span_end,
            });
        }
        let pitch = Pitch::parse(&name).ok_or(ParseError::InvalidPitch { text: name, span })?;
        Ok(Statement::Note {
            pitch,
            duration,
            span_start: span.start,
            span_end,
        })
    }

    // ── Assignment ──────────────────────────────────────────

    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.expect(&Token::Score, "score")?.start;
        self.expect(&Token::Dot, ".")?;
        let (property, _) = self.expect_ident()?;
        self.expect(&Token::Eq, "=")?;
        let value = self.parse_expr()?;
        Ok(Statement::Assignment {
            target: format!("score.{property}"),
            value,
            span_start: start_span,
            span_end: self.last_end(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Token::StringLit(s) => {
                self.advance();
                Ok(Expr::StringLit(s))
            }
            Token::Number(_) | Token::Slash => Ok(Expr::DurationLit(self.parse_duration_expr()?)),
            _ => Err(self.unexpected("string or duration")),
        }
    }

    // ── Chord ───────────────────────────────────────────────

    fn parse_chord(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.expect(&Token::LBracket, "[")?.start;
        let mut pitches = vec![self.parse_chord_pitch()?];
        while self.eat(&Token::Comma) {
            while self.eat(&Token::Newline) {}
            pitches.push(self.parse_chord_pitch()?);
        }
        self.expect(&Token::RBracket, "] or ,")?;

        let duration = self.try_parse_duration()?;
        Ok(Statement::Chord {
            pitches,
            duration,
            span_start: start_span,
            span_end: self.last_end(),
        })
    }

    fn parse_chord_pitch(&mut self) -> Result<Pitch, ParseError> {
        let (name, span) = self.expect_ident()?;
        Pitch::parse(&name).ok_or(ParseError::InvalidPitch { text: name, span })
    }

    // ── Duration Expressions ────────────────────────────────

    /// Try to parse an optional duration on the same line.
    fn try_parse_duration(&mut self) -> Result<Option<DurationExpr>, ParseError> {
        match self.peek() {
            Token::Slash | Token::Number(_) => Ok(Some(self.parse_duration_expr()?)),
            _ => Ok(None),
        }
    }

    /// Parse a duration expression: `/N`, `N/M` or `N`.
    fn parse_duration_expr(&mut self) -> Result<DurationExpr, ParseError> {
        let start = self.span().start;
        let expr = match self.peek() {
            Token::Slash => {
                self.advance();
                DurationExpr::Inverse(self.expect_number()?)
            }
            Token::Number(n) => {
                self.advance();
                if self.eat(&Token::Slash) {
                    DurationExpr::Fraction(n, self.expect_number()?)
                } else {
                    DurationExpr::Quarters(n)
                }
            }
            _ => return Err(self.unexpected("duration (/N, N/M or N)")),
        };

        let divisor = match expr {
            DurationExpr::Inverse(d) | DurationExpr::Fraction(_, d) => d,
            DurationExpr::Quarters(_) => 1.0,
        };
        if divisor == 0.0 {
            return Err(ParseError::InvalidDuration {
                reason: "division by zero".into(),
                span: Span {
                    start,
                    end: self.last_end(),
                },
            });
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(input: &str) -> Result<Program, Box<dyn std::error::Error>> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Parser::new(tokens);
        Ok(parser.parse_program()?)
    }

    fn parse_err(input: &str) -> ParseError {
        let tokens = Lexer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse_program().unwrap_err()
    }

    fn significant(program: &Program) -> Vec<&Statement> {
        program
            .statements
            .iter()
            .filter(|s| !matches!(s, Statement::Comment(_)))
            .collect()
    }

    #[test]
    fn test_parse_notes_with_durations() {
        let program = parse("E5 /2 D#5 /2\nE5").unwrap();
        let stmts = significant(&program);
        assert_eq!(stmts.len(), 3);
        match stmts[1] {
            Statement::Note { pitch, duration, .. } => {
                assert_eq!(pitch.to_string(), "D#5");
                assert_eq!(*duration, Some(DurationExpr::Inverse(2.0)));
            }
            other => panic!("Expected Note, got {other:?}"),
        }
        match stmts[2] {
            Statement::Note { duration, .. } => assert_eq!(*duration, None),
            other => panic!("Expected Note, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_chord() {
        let program = parse("[A2, E3,\n A3] 1/2").unwrap();
        match significant(&program)[0] {
            Statement::Chord {
                pitches, duration, ..
            } => {
                let names: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
                assert_eq!(names, vec!["A2", "E3", "A3"]);
                assert_eq!(*duration, Some(DurationExpr::Fraction(1.0, 2.0)));
            }
            other => panic!("Expected Chord, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rests() {
        let program = parse("C3 /4\n4\nR /2\nrest\nD3").unwrap();
        let stmts = significant(&program);
        assert!(matches!(stmts[0], Statement::Note { .. }));
        assert!(matches!(
            stmts[1],
            Statement::Rest { duration: Some(DurationExpr::Quarters(n)), .. } if *n == 4.0
        ));
        assert!(matches!(
            stmts[2],
            Statement::Rest { duration: Some(DurationExpr::Inverse(n)), .. } if *n == 2.0
        ));
        assert!(matches!(stmts[3], Statement::Rest { duration: None, .. }));
        assert!(matches!(stmts[4], Statement::Note { .. }));
    }

    #[test]
    fn test_parse_assignments() {
        let program = parse("score.title = \"Für Elise\";\nscore.duration = /2;").unwrap();
        let stmts = significant(&program);
        match stmts[0] {
            Statement::Assignment { target, value, .. } => {
                assert_eq!(target, "score.title");
                assert_eq!(*value, Expr::StringLit("Für Elise".into()));
            }
            other => panic!("Expected Assignment, got {other:?}"),
        }
        match stmts[1] {
            Statement::Assignment { value, .. } => {
                assert_eq!(*value, Expr::DurationLit(DurationExpr::Inverse(2.0)));
            }
            other => panic!("Expected Assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_semicolons_separate_elements() {
        let program = parse("C4;D4;;E4").unwrap();
        assert_eq!(significant(&program).len(), 3);
    }

    #[test]
    fn test_comments_are_kept() {
        let program = parse("// intro\nC4 // first note\n").unwrap();
        let comments: Vec<_> = program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Comment(c) => Some(c.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(comments, vec!["intro", "first note"]);
    }

    #[test]
    fn test_statement_spans() {
        let program = parse("C4 /2 [E4, G4] 1").unwrap();
        let stmts = significant(&program);
        assert_eq!(stmts[0].span(), (0, 5));
        assert_eq!(stmts[1].span(), (6, 16));
    }

    #[test]
    fn test_invalid_pitch() {
        let err = parse_err("C4 H4");
        assert_eq!(
            err,
            ParseError::InvalidPitch {
                text: "H4".into(),
                span: Span { start: 3, end: 5 }
            }
        );
    }

    #[test]
    fn test_oversized_octave_is_invalid_pitch() {
        assert_eq!(
            parse_err("C2147483647"),
            ParseError::InvalidPitch {
                text: "C2147483647".into(),
                span: Span { start: 0, end: 11 }
            }
        );
    }

    #[test]
    fn test_zero_divisor_rejected() {
        assert!(matches!(
            parse_err("C4 /0"),
            ParseError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn test_unclosed_chord() {
        match parse_err("[C4, E4 G4]") {
            ParseError::UnexpectedToken { found, .. } => {
                assert_eq!(found, Token::Ident("G4".into()));
            }
            other => panic!("Expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_chord_rejected() {
        assert!(matches!(
            parse_err("[]"),
            ParseError::UnexpectedToken { .. }
        ));
    }
}
