//! Result and errors.
use std::{
    fmt::{self, Display, Formatter, Write},
    io,
};

use smol_str::SmolStr;

use crate::tokens::{Span, INT_MAX};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Malformed token.
    Lex(LexError),
    /// Token sequence that does not match the grammar.
    Syntax(SyntaxError),
    /// Unreadable source or unwritable output.
    Io(io::Error),
    Fmt(fmt::Error),
}

impl JackError {
    /// Format the error with the offending line of source code
    /// and a marker pointing at the location.
    ///
    /// I/O errors have no location and are formatted as is.
    pub fn render(&self, source: &str) -> String {
        match self {
            Self::Lex(err) => err.render(source),
            Self::Syntax(err) => err.render(source),
            Self::Io(_) | Self::Fmt(_) => self.to_string(),
        }
    }
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Fmt(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<SyntaxError> for JackError {
    fn from(err: SyntaxError) -> Self {
        JackError::Syntax(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<fmt::Error> for JackError {
    fn from(err: fmt::Error) -> Self {
        JackError::Fmt(err)
    }
}

/// Location of an error in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnknownCharacter(char),
    /// Integer constant larger than the machine word allows.
    IntegerOverflow(SmolStr),
    /// String constant that hits a newline or the end of the file
    /// before its closing quote.
    UnterminatedString,
    /// Block comment without a closing `*/`.
    UnterminatedComment,
}

impl LexError {
    pub fn new(kind: LexErrorKind, location: Location) -> Self {
        Self { kind, location }
    }

    pub fn render(&self, source: &str) -> String {
        render_snippet(source, &self.location, &self.to_string())
    }
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Location { line, column, .. } = self.location;
        write!(f, "lexical error at {line}:{column}: ")?;
        match &self.kind {
            LexErrorKind::UnknownCharacter(c) => write!(f, "unknown character {c:?}"),
            LexErrorKind::IntegerOverflow(text) => {
                write!(f, "integer constant {text} exceeds {INT_MAX}")
            }
            LexErrorKind::UnterminatedString => write!(f, "unterminated string constant"),
            LexErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
        }
    }
}

impl std::error::Error for LexError {}

// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A required grammar element is missing.
    Expected { expected: String, found: String },
    /// A name was used where a declared variable is required.
    Undeclared(SmolStr),
    /// A name was declared twice in the same scope.
    Redeclared(SmolStr),
    /// Tokens remain after the class body was closed.
    TrailingInput(String),
    /// A count or constant the target machine cannot represent.
    Exceeds { what: String, limit: u16 },
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, location: Location) -> Self {
        Self { kind, location }
    }

    pub fn render(&self, source: &str) -> String {
        render_snippet(source, &self.location, &self.to_string())
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Location { line, column, .. } = self.location;
        write!(f, "syntax error at {line}:{column}: ")?;
        match &self.kind {
            SyntaxErrorKind::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            SyntaxErrorKind::Undeclared(name) => write!(f, "undeclared variable '{name}'"),
            SyntaxErrorKind::Redeclared(name) => {
                write!(f, "'{name}' is already declared in this scope")
            }
            SyntaxErrorKind::TrailingInput(found) => {
                write!(f, "unexpected {found} after end of class")
            }
            SyntaxErrorKind::Exceeds { what, limit } => write!(f, "{what} exceeds {limit}"),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Builds a message block that quotes the source line and
/// underlines the offending span.
///
/// ```text
/// syntax error at 3:13: expected ';', found keyword 'let'
///    |
///  3 |     let x = 1 let
///    |               ^^^
/// ```
fn render_snippet(source: &str, location: &Location, message: &str) -> String {
    let (line_text, line_span) = location.span.surrounding_line(source);
    let line_text = line_text.trim_end_matches(['\n', '\r']);
    let gutter = location.line.to_string().len();

    // Marker offset is counted in characters, not bytes.
    let prefix_end = (location.span.index.saturating_sub(line_span.index) as usize).min(line_text.len());
    let offset = line_text
        .get(..prefix_end)
        .map(|s| s.chars().count())
        .unwrap_or_default();
    let width = location
        .span
        .fragment(source)
        .lines()
        .next()
        .map(|s| s.chars().count())
        .unwrap_or_default()
        .max(1);

    let mut buf = String::new();
    // Writing into a string can't fail.
    let _ = writeln!(buf, "{message}");
    let _ = writeln!(buf, "{:gutter$} |", "");
    let _ = writeln!(buf, "{:>gutter$} | {line_text}", location.line);
    let _ = write!(buf, "{:gutter$} | {:offset$}{}", "", "", "^".repeat(width));
    buf
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_marker() {
        const CODE: &str = "class Main {\n  let x = 99999;\n}";
        let err = LexError::new(
            LexErrorKind::IntegerOverflow("99999".into()),
            Location {
                span: Span::new(23, 5),
                line: 2,
                column: 11,
            },
        );

        let rendered = err.render(CODE);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "lexical error at 2:11: integer constant 99999 exceeds 32767");
        assert_eq!(lines[2], "2 |   let x = 99999;");
        assert_eq!(lines[3], "  |           ^^^^^");
    }
}
