//! Tokens
use std::fmt;

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column of the first character, starting at 1.
    pub column: u32,
}

impl Token {
    /// Source text covered by this token, including the quotes
    /// of a string constant.
    #[inline]
    pub fn fragment<'a>(&self, source: &'a str) -> &'a str {
        self.span.fragment(source)
    }

    /// Decoded text of the token.
    ///
    /// For string constants this is the text between the quotes,
    /// for everything else it's the same as [`Token::fragment`].
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        let fragment = self.fragment(source);
        match self.kind {
            TokenKind::Str => fragment
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(fragment),
            _ => fragment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// One of `{ } ( ) [ ] . , ; + - * / & | < > = ~`
    Symbol(char),
    Ident,
    /// Integer constant in the range 0..=32767
    Int(u16),
    /// String constant, without embedded quotes or newlines
    Str,
    /// End-of-file
    EOF,
}

impl TokenKind {
    #[inline]
    pub fn is_symbol(&self, c: char) -> bool {
        matches!(self, TokenKind::Symbol(s) if *s == c)
    }

    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == keyword)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            Self::Symbol(c) => write!(f, "symbol '{c}'"),
            Self::Ident => write!(f, "identifier"),
            Self::Int(value) => write!(f, "integer constant {value}"),
            Self::Str => write!(f, "string constant"),
            Self::EOF => write!(f, "end-of-file"),
        }
    }
}

/// The closed set of single character symbols.
pub const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

#[inline]
pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(&c)
}

/// Largest value an integer constant may hold.
pub const INT_MAX: u16 = 32767;

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Program structure
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,

    // ------------------------------------------------------------------------
    // Types
    Int,
    Char,
    Boolean,
    Void,

    // ------------------------------------------------------------------------
    // Constants
    True,
    False,
    Null,
    This,

    // ------------------------------------------------------------------------
    // Statements
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }

    /// Keywords that name a built-in variable type.
    #[inline]
    pub fn is_primitive_type(&self) -> bool {
        matches!(self, Self::Int | Self::Char | Self::Boolean)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk of source code, encoded as starting byte position and size.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.index as usize + self.size as usize)]
    }

    /// The full line of source text that contains the start of this span,
    /// and that line's own span.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> (&'a str, Span) {
        const NEWLINE: char = '\n';
        const RETURN: char = '\r';

        let mut chars = text.char_indices().peekable();
        let mut start = 0;
        let mut end = text.len();

        while let Some((i, c)) = chars.next() {
            if i < self.index as usize {
                if c == NEWLINE {
                    if chars.peek().map(|(_, c)| *c) == Some(RETURN) {
                        chars.next();
                    }

                    // Line starts at the character after the newline (\n) and carriage return (\r)
                    if let Some((i, _)) = chars.peek() {
                        start = *i;
                    }
                }
            } else if c == NEWLINE {
                end = i + 1;

                if chars.peek().map(|(_, c)| *c) == Some(RETURN) {
                    chars.next();
                    end += 1;
                }

                break;
            }
        }

        let line_span = Span {
            index: start as u32,
            size: end as u32 - start as u32,
        };

        (&text[start..end], line_span)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_span_fragment() {
        const CODE: &str = "let x = 42;";

        let spans = &[
            Span::new(0, 3), // let
            Span::new(4, 1), // x
            Span::new(6, 1), // =
            Span::new(8, 2), // 42
        ];

        assert_eq!(spans[0].fragment(CODE), "let");
        assert_eq!(spans[1].fragment(CODE), "x");
        assert_eq!(spans[2].fragment(CODE), "=");
        assert_eq!(spans[3].fragment(CODE), "42");
    }

    #[test]
    #[rustfmt::skip]
    fn test_span_surrounding_line() {
        const CODE: &str = "------------\n....here....\n------------";

        let span = Span::new(17, 4);
        assert_eq!(span.fragment(CODE), "here");

        let (line, line_span) = span.surrounding_line(CODE);
        assert_eq!(line, "....here....\n");
        assert_eq!(line_span, Span { index: 13, size: 13 });
    }

    #[test]
    fn test_span_surrounding_full_text() {
        const CODE: &str = "....here....";

        let span = Span::new(4, 4);
        let (line, line_span) = span.surrounding_line(CODE);
        assert_eq!(line, "....here....");
        assert_eq!(line_span, Span { index: 0, size: 12 });
    }

    #[test]
    fn test_keyword_roundtrip() {
        for text in [
            "class", "constructor", "function", "method", "field", "static", "var", "int", "char",
            "boolean", "void", "true", "false", "null", "this", "let", "do", "if", "else", "while",
            "return",
        ] {
            let keyword = Keyword::parse(text).expect(text);
            assert_eq!(keyword.as_str(), text);
        }

        assert_eq!(Keyword::parse("Class"), None);
        assert_eq!(Keyword::parse("classy"), None);
    }

    #[test]
    fn test_string_text_strips_quotes() {
        const CODE: &str = "\"hi there\"";
        let token = Token {
            kind: TokenKind::Str,
            span: Span::new(0, 10),
            line: 1,
            column: 1,
        };
        assert_eq!(token.fragment(CODE), "\"hi there\"");
        assert_eq!(token.text(CODE), "hi there");
    }
}
