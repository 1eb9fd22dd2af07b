//! Token stream with one token of look ahead.
use std::mem;

use crate::{
    error::{JackError, JackResult, LexError, Location, SyntaxError, SyntaxErrorKind},
    lexer::Lexer,
    tokens::{Keyword, Token, TokenKind},
};

/// Stream of tokens pulled lazily from the lexer.
///
/// The stream always holds the current token, the one the parser
/// is deciding on. Consuming it pulls the next token from the lexer.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
}

impl<'a> TokenStream<'a> {
    /// Create a stream primed with the first token of the source.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self, LexError> {
        let current = lexer.next_token()?;
        Ok(Self {
            original: lexer.source_code(),
            lexer,
            current,
        })
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// The token the parser is currently looking at.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.current
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Decoded text of the current token.
    #[inline]
    pub fn text(&self) -> &'a str {
        self.current.text(self.original)
    }

    /// Indicates whether the current token is the end-of-file.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.kind == TokenKind::EOF
    }

    /// First character of the token after the current one, without
    /// advancing the token stream.
    #[inline]
    pub fn peek_char(&mut self) -> Option<char> {
        self.lexer.peek_char()
    }

    /// Consumes the current token regardless of kind, and returns it.
    pub fn advance(&mut self) -> Result<Token, LexError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    /// Consumes the current token if it is the given symbol.
    ///
    /// Does not consume the token if it doesn't match.
    pub fn match_symbol(&mut self, symbol: char) -> Result<Option<Token>, LexError> {
        if self.current.kind.is_symbol(symbol) {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consumes the current token if it is the given keyword.
    pub fn match_keyword(&mut self, keyword: Keyword) -> Result<Option<Token>, LexError> {
        if self.current.kind.is_keyword(keyword) {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Return the current token and advance the cursor.
    ///
    /// The current token must be the given symbol, otherwise a syntax
    /// error is returned and the cursor is not advanced.
    pub fn consume_symbol(&mut self, symbol: char) -> JackResult<Token> {
        match self.match_symbol(symbol)? {
            Some(token) => Ok(token),
            None => Err(self.expected(format!("'{symbol}'"))),
        }
    }

    /// Consumes the current token if it is one of the given keywords.
    pub fn consume_keyword(&mut self, keywords: &[Keyword]) -> JackResult<(Keyword, Token)> {
        if let TokenKind::Keyword(keyword) = self.current.kind {
            if keywords.contains(&keyword) {
                return Ok((keyword, self.advance()?));
            }
        }

        let names = keywords
            .iter()
            .map(|keyword| format!("'{keyword}'"))
            .collect::<Vec<_>>();
        Err(self.expected(names.join(" or ")))
    }

    /// Consumes the current token if it is an identifier.
    pub fn consume_ident(&mut self) -> JackResult<Token> {
        if self.current.kind == TokenKind::Ident {
            Ok(self.advance()?)
        } else {
            Err(self.expected("identifier"))
        }
    }

    /// Build a syntax error saying the given construct was expected
    /// where the current token is.
    #[cold]
    pub fn expected(&self, expected: impl Into<String>) -> JackError {
        self.error(SyntaxErrorKind::Expected {
            expected: expected.into(),
            found: self.describe(&self.current),
        })
    }

    /// Build a syntax error located at the current token.
    #[cold]
    pub fn error(&self, kind: SyntaxErrorKind) -> JackError {
        SyntaxError::new(kind, self.location(&self.current)).into()
    }

    pub fn location(&self, token: &Token) -> Location {
        Location {
            span: token.span,
            line: token.line,
            column: token.column,
        }
    }

    /// Human readable description of a token, for error messages.
    pub fn describe(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Ident => format!("identifier '{}'", token.fragment(self.original)),
            TokenKind::Str => format!("string constant {}", token.fragment(self.original)),
            kind => kind.to_string(),
        }
    }
}
