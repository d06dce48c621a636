mod common;
mod python;
mod script;

use crate::model::{Fidelity, ParseResult};
use std::path::Path;
use thiserror::Error;

pub use python::PythonParser;
pub use script::ScriptParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse: {0}")]
    Parse(String),
    #[error("Unsupported language for file: {0}")]
    UnsupportedLanguage(String),
}

/// Turns one file's text into a [`ParseResult`].
///
/// Implementations declare their [`Fidelity`] so consumers can tell exact
/// structure from pattern-matched guesses.
pub trait SourceParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn extensions(&self) -> &[&str];
    fn fidelity(&self) -> Fidelity;
    fn parse(&self, path: &Path, source: &str) -> Result<ParseResult, ParseError>;
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn SourceParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(PythonParser::new()), Box::new(ScriptParser::new())],
        }
    }

    pub fn find_parser(&self, path: &Path) -> Option<&dyn SourceParser> {
        let ext = path.extension()?.to_str()?;
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .map(|p| p.as_ref())
    }

    /// Parse with whichever parser claims the file's extension.
    pub fn parse(&self, path: &Path, source: &str) -> Result<ParseResult, ParseError> {
        match self.find_parser(path) {
            Some(parser) => parser.parse(path, source),
            None => Err(ParseError::UnsupportedLanguage(path.display().to_string())),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
