#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    StringLit(String),
    /// Pitch names (`C#4`, `Eb3`), rests (`R`) and property names.
    Ident(String),

    // Keywords
    Score,

    // Punctuation
    Slash,     // /
    Dot,       // .
    Semicolon, // ;
    Comma,     // ,
    Eq,        // =
    LBracket,  // [
    RBracket,  // ]

    // Structural
    Newline,
    Comment(String),
    EOF,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

/// Convert a token back to its approximate source representation.
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::Number(n) => {
            if *n == (*n as i64) as f64 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Token::StringLit(s) => format!("\"{s}\""),
        Token::Ident(s) => s.clone(),
        Token::Score => "score".into(),
        Token::Slash => "/".into(),
        Token::Dot => ".".into(),
        Token::Semicolon => ";".into(),
        Token::Comma => ",".into(),
        Token::Eq => "=".into(),
        Token::LBracket => "[".into(),
        Token::RBracket => "]".into(),
        Token::Newline => "newline".into(),
        Token::Comment(s) => format!("// {s}"),
        Token::EOF => "end of file".into(),
    }
}
