use crate::error::LexError;
use crate::token::{Span, Spanned, Token};

pub struct Lexer {
    chars: Vec<char>,
    /// Precomputed byte offset for each char index.
    /// `byte_offsets[i]` = byte offset of `chars[i]` in the original `&str`.
    /// `byte_offsets[chars.len()]` = total byte length (sentinel for EOF).
    byte_offsets: Vec<usize>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for ch in &chars {
            byte_offsets.push(offset);
            offset += ch.len_utf8();
        }
        byte_offsets.push(offset);
        Lexer {
            chars,
            byte_offsets,
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let is_eof = spanned.token == Token::EOF;
            tokens.push(spanned);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Convert a char index to a byte offset.
    fn byte_pos_of(&self, char_idx: usize) -> usize {
        self.byte_offsets[char_idx.min(self.chars.len())]
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            span: Span {
                start: self.byte_pos_of(start),
                end: self.byte_pos_of(self.pos),
            },
        }
    }

    fn single(&mut self, token: Token, start: usize) -> Result<Spanned, LexError> {
        self.advance();
        Ok(self.spanned(token, start))
    }

    fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        if self.pos >= self.chars.len() {
            let end = self.byte_pos_of(self.pos);
            return Ok(Spanned {
                token: Token::EOF,
                span: Span { start: end, end },
            });
        }

        let start = self.pos;
        let ch = self.chars[self.pos];

        match ch {
            '\n' => self.single(Token::Newline, start),
            '/' if self.peek_at(1) == Some('/') => self.lex_comment(start),
            '/' => self.single(Token::Slash, start),
            '.' => self.single(Token::Dot, start),
            ';' => self.single(Token::Semicolon, start),
            ',' => self.single(Token::Comma, start),
            '=' => self.single(Token::Eq, start),
            '[' => self.single(Token::LBracket, start),
            ']' => self.single(Token::RBracket, start),
            '"' | '\'' => self.lex_string(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident(start),
            _ => Err(LexError::UnexpectedChar {
                ch,
                pos: self.byte_pos_of(start),
            }),
        }
    }

    fn lex_comment(&mut self, start: usize) -> Result<Spanned, LexError> {
        self.pos += 2; // skip //
        let text_start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
        let text: String = self.chars[text_start..self.pos].iter().collect();
        Ok(self.spanned(Token::Comment(text.trim().to_string()), start))
    }

    fn lex_string(&mut self, start: usize) -> Result<Spanned, LexError> {
        let Some(quote) = self.advance() else {
            return Err(LexError::UnterminatedString {
                pos: self.byte_pos_of(start),
            });
        };
        let mut s = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('\\') => s.push('\\'),
                    Some(c) if c == quote => s.push(c),
                    Some(c) => {
                        s.push('\\');
                        s.push(c);
                    }
                    None => {
                        return Err(LexError::UnterminatedString {
                            pos: self.byte_pos_of(start),
                        });
                    }
                },
                Some('\n') | None => {
                    return Err(LexError::UnterminatedString {
                        pos: self.byte_pos_of(start),
                    });
                }
                Some(c) => s.push(c),
            }
        }
        Ok(self.spanned(Token::StringLit(s), start))
    }

    fn lex_number(&mut self, start: usize) -> Result<Spanned, LexError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_digit() {
                self.pos += 1;
            } else if ch == '.' {
                // Only consume dot as decimal if followed by a digit
                if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let num: f64 = text.parse().map_err(|_| LexError::InvalidNumber {
            text: text.clone(),
            pos: self.byte_pos_of(start),
        })?;
        Ok(self.spanned(Token::Number(num), start))
    }

    /// Identifiers may carry `#` so that sharps lex as part of the pitch.
    fn lex_ident(&mut self, start: usize) -> Result<Spanned, LexError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '#' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let token = match text.as_str() {
            "score" => Token::Score,
            _ => Token::Ident(text),
        };
        Ok(self.spanned(token, start))
    }
}
