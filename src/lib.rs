pub mod ast;
pub mod config;
pub mod dsp;
pub mod error;
pub mod lexer;
pub mod melody;
pub mod params;
pub mod parser;
pub mod score;
pub mod server;
pub mod token;

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ScoreError, SynthError};
use crate::lexer::Lexer;
use crate::parser::Parser;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse score notation into a `Program` AST.
pub fn parse(input: &str) -> Result<ast::Program, ScoreError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse_program()?)
}

/// Parse score notation and flatten it into score order.
pub fn parse_score(input: &str) -> Result<score::Score, ScoreError> {
    let program = parse(input)?;
    Ok(score::flatten(&program)?)
}

/// Read and parse a score file. A missing file is reported as
/// [`SynthError::MissingScoreSource`].
pub fn load_score(path: &Path) -> Result<score::Score, SynthError> {
    let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SynthError::MissingScoreSource(path.to_path_buf()),
        _ => SynthError::Io(e),
    })?;
    Ok(parse_score(&source)?)
}
