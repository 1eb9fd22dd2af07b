//! Lexical analysis (tokenizer)
use crate::{
    error::{LexError, LexErrorKind, Location},
    tokens::{is_symbol, Keyword, Span, Token, TokenKind, INT_MAX},
};

use itertools::{multipeek, MultiPeek};
use std::{iter::Iterator, str::CharIndices};

/// Lexical analyzer.
///
/// Comments and whitespace are consumed between tokens and
/// never produced as tokens themselves.
pub struct Lexer<'a> {
    source: SourceText<'a>,
    token_start: SourcePos,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            source: SourceText::new(source_code),
            token_start: SourcePos {
                offset: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.source.original
    }

    /// Indicates whether any token remains in the source.
    ///
    /// Only whitespace and comments left means there's nothing more.
    /// An unterminated block comment counts as remaining content,
    /// so the following [`Lexer::next_token`] can report it.
    pub fn has_more(&mut self) -> bool {
        self.peek_char().is_some()
    }

    /// Look at the first character of the next token without
    /// consuming anything.
    ///
    /// Whitespace and comments are looked past, so the answer is the same
    /// regardless of the trivia between tokens. Returns `None` at the
    /// end of the source.
    pub fn peek_char(&mut self) -> Option<char> {
        let c = self.source.scan_significant();
        self.source.reset_peek();
        c
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Returns a token of kind [`TokenKind::EOF`] when the source is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as T;

        self.skip_trivia()?;
        self.start_token();

        let c = match self.source.next_char() {
            Some(c) => c,
            None => return Ok(self.make_token(T::EOF)),
        };

        match c {
            '"' => self.consume_string(),
            '0'..='9' => self.consume_number(),
            '_' | 'a'..='z' | 'A'..='Z' => Ok(self.consume_ident()),
            c if is_symbol(c) => Ok(self.make_token(T::Symbol(c))),
            c => Err(self.error(LexErrorKind::UnknownCharacter(c))),
        }
    }

    /// Prime the lexer state for recording a new token.
    fn start_token(&mut self) {
        self.token_start = self.source.pos();
    }

    fn make_span(&self) -> Span {
        let start = self.token_start.offset;
        let end = self.source.offset;
        debug_assert!(end >= start);
        Span::new(start as u32, (end - start) as u32)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            span: self.make_span(),
            line: self.token_start.line,
            column: self.token_start.column,
        }
    }

    #[cold]
    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError::new(
            kind,
            Location {
                span: self.make_span(),
                line: self.token_start.line,
                column: self.token_start.column,
            },
        )
    }

    fn fragment(&self) -> &'a str {
        self.make_span().fragment(self.source.original)
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Erase whitespace, line comments and block comments up to the start
    /// of the next token.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.source.peek_char2() {
                (Some(c), _) if c.is_whitespace() => {
                    self.source.next_char();
                }
                (Some('/'), Some('/')) => {
                    while !matches!(self.source.peek_char(), Some('\n') | None) {
                        self.source.next_char();
                    }
                }
                (Some('/'), Some('*')) => self.erase_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Erase a `/* ... */` comment, which may span lines.
    fn erase_block_comment(&mut self) -> Result<(), LexError> {
        self.start_token();
        self.source.next_char(); // '/'
        self.source.next_char(); // '*'

        loop {
            match self.source.next_char() {
                Some('*') if self.source.peek_char() == Some('/') => {
                    self.source.next_char();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.error(LexErrorKind::UnterminatedComment)),
            }
        }
    }

    /// Make a string constant token.
    ///
    /// The opening quote has already been consumed.
    fn consume_string(&mut self) -> Result<Token, LexError> {
        loop {
            match self.source.peek_char() {
                Some('"') => {
                    self.source.next_char();
                    return Ok(self.make_token(TokenKind::Str));
                }
                Some('\n') | Some('\r') | None => {
                    return Err(self.error(LexErrorKind::UnterminatedString));
                }
                Some(_) => {
                    self.source.next_char();
                }
            }
        }
    }

    /// Make an integer constant token.
    fn consume_number(&mut self) -> Result<Token, LexError> {
        while let Some('0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }

        // Anything that doesn't fit into 16 bits is out of range anyway.
        match self.fragment().parse::<u16>() {
            Ok(value) if value <= INT_MAX => Ok(self.make_token(TokenKind::Int(value))),
            _ => Err(self.error(LexErrorKind::IntegerOverflow(self.fragment().into()))),
        }
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        while let Some('_' | 'a'..='z' | 'A'..='Z' | '0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }

        // If a valid keyword can be parsed from the source fragment, then
        // the token is a reserved keyword instead of a user defined identifier.
        let token_kind = match Keyword::parse(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };
        self.make_token(token_kind)
    }
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Yields every token up to, but excluding, the end-of-file. Iteration
/// stops after the first lexical error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.lexer.next_token() {
            Ok(token) if token.kind == TokenKind::EOF => {
                self.done = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Wrapper for source code that keeps a cursor position.
///
/// Allows forward lookup via peeking.
struct SourceText<'a> {
    /// Keep reference to the source so the lexer can
    /// slice fragments from it.
    original: &'a str,

    /// Iterator over UTF-8 encoded source code.
    ///
    /// An important semantic feature of `MultiPeek` is that peeking advances
    /// the internal peek cursor by 1. Each call will return the next element.
    /// The peek cursor offset is restored to 0 when calling `MultiPeek::next()`
    /// or `MultiPeek::reset_peek()`.
    chars: MultiPeek<CharIndices<'a>>,

    /// Byte position of the next unconsumed character.
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            original: source,
            chars: multipeek(source.char_indices()),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> SourcePos {
        SourcePos {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    /// Advance the cursor and return the consumed character.
    fn next_char(&mut self) -> Option<char> {
        let (index, c) = self.chars.next()?;
        self.offset = index + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Peeks the next unconsumed character.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.reset_peek();
        self.peek_next()
    }

    /// Two character lookahead.
    fn peek_char2(&mut self) -> (Option<char>, Option<char>) {
        self.chars.reset_peek();
        (self.peek_next(), self.peek_next())
    }

    /// Advance the peek cursor by one character.
    fn peek_next(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Set peek cursor back to the current cursor.
    fn reset_peek(&mut self) {
        self.chars.reset_peek()
    }

    /// Peek past whitespace and comments to the first character
    /// of the next token.
    ///
    /// Leaves the peek cursor wherever the scan stopped.
    fn scan_significant(&mut self) -> Option<char> {
        let mut lookahead = self.peek_char();

        loop {
            match lookahead? {
                c if c.is_whitespace() => lookahead = self.peek_next(),
                '/' => match self.peek_next() {
                    Some('/') => loop {
                        match self.peek_next()? {
                            '\n' => {
                                lookahead = self.peek_next();
                                break;
                            }
                            _ => continue,
                        }
                    },
                    Some('*') => {
                        let mut prev = '\0';
                        loop {
                            match self.peek_next() {
                                Some('/') if prev == '*' => break,
                                Some(c) => prev = c,
                                // The unterminated comment is itself content.
                                None => return Some('/'),
                            }
                        }
                        lookahead = self.peek_next();
                    }
                    _ => return Some('/'),
                },
                c => return Some(c),
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SourcePos {
    offset: usize,
    line: u32,
    column: u32,
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .into_iter()
            .map(|result| result.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(kinds("32767"), vec![TokenKind::Int(32767)]);
        assert_eq!(kinds("0"), vec![TokenKind::Int(0)]);

        let err = Lexer::new("32768").next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerOverflow("32768".into()));

        let err = Lexer::new("99999999999").next_token().unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::IntegerOverflow(_)));
    }

    #[test]
    fn test_string_constant() {
        const CODE: &str = "\"hi\"";
        let token = Lexer::new(CODE).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Str);
        assert_eq!(token.text(CODE), "hi");

        let err = Lexer::new("\"hi\nthere\"").next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);

        let err = Lexer::new("\"hi").next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class classy _this this9 this"),
            vec![
                TokenKind::Keyword(Keyword::Class),
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::This),
            ]
        );
    }

    #[test]
    fn test_symbols() {
        let expected: Vec<TokenKind> = "{}()[].,;+-*/&|<>=~".chars().map(TokenKind::Symbol).collect();
        assert_eq!(kinds("{}()[].,;+-*/&|<>=~"), expected);
        assert_eq!(kinds("{ } ( ) [ ] . , ; + - * / & | < > = ~"), expected);
    }

    #[test]
    fn test_comments_are_transparent() {
        let plain = kinds("let x = 1;");
        let commented = kinds("// leading\nlet /* inline */ x /** doc\n spanning */ = 1; // trailing");
        assert_eq!(plain, commented);
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new("let /* never closed");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword(Keyword::Let));
        assert!(lexer.has_more());
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.location.column, 5);
    }

    #[test]
    fn test_unknown_character() {
        let err = Lexer::new("let x = #;").into_iter().find_map(Result::err).unwrap();
        assert_eq!(err.kind, LexErrorKind::UnknownCharacter('#'));
        assert_eq!(err.location.line, 1);
        assert_eq!(err.location.column, 9);
    }

    #[test]
    fn test_has_more() {
        let mut lexer = Lexer::new("x // only a comment follows\n   /* and another */  ");
        assert!(lexer.has_more());
        lexer.next_token().unwrap();
        assert!(!lexer.has_more());
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);

        assert!(!Lexer::new("").has_more());
    }

    #[test]
    fn test_peek_char_does_not_consume() {
        let mut lexer = Lexer::new("a /* gap */ [ 0 ]");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Ident);

        assert_eq!(lexer.peek_char(), Some('['));
        assert_eq!(lexer.peek_char(), Some('['));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Symbol('['));
    }

    #[test]
    fn test_peek_char_division_is_not_comment() {
        let mut lexer = Lexer::new("a / b");
        lexer.next_token().unwrap();
        assert_eq!(lexer.peek_char(), Some('/'));
    }

    #[test]
    fn test_positions() {
        const CODE: &str = "class Main {\n  field int x;\n}";
        let tokens: Vec<Token> = Lexer::new(CODE).into_iter().map(Result::unwrap).collect();

        let field = &tokens[3];
        assert_eq!(field.kind, TokenKind::Keyword(Keyword::Field));
        assert_eq!((field.line, field.column), (2, 3));
        assert_eq!(field.fragment(CODE), "field");

        let close = tokens.last().unwrap();
        assert_eq!((close.line, close.column), (3, 1));
    }
}
