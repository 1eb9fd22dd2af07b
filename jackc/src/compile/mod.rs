//! Single pass compiler engine.
//!
//! Parsing is recursive descent with one procedure per production. Code is
//! emitted as a side effect of parsing, there is no intermediate tree that
//! gets walked afterwards.
mod class;
mod context;
mod expr;
mod stmts;

pub use context::{Context, SubroutineKind};

use smol_str::SmolStr;
use std::io;

use crate::{
    error::{JackError, JackResult, Location, SyntaxError, SyntaxErrorKind},
    lexer::Lexer,
    symbol::{SymbolError, SymbolKind, SymbolTable},
    token_stream::TokenStream,
    tokens::Token,
    tree::Node,
    vm::{Segment, VmWriter},
};

/// Compiles one class, writing instructions to the given sink.
///
/// A compiler is good for exactly one class. Compile every class
/// with its own instance.
pub struct Compiler<'a, W: io::Write> {
    stream: TokenStream<'a>,
    symbols: SymbolTable,
    writer: VmWriter<W>,
    ctx: Context,
}

/// Result of a successful class compilation.
pub struct Compilation<W> {
    pub class_name: SmolStr,
    pub tree: Node,
    /// The sink the instructions were written to.
    pub out: W,
}

impl<'a, W: io::Write> Compiler<'a, W> {
    pub fn new(source: &'a str, out: W) -> JackResult<Self> {
        Ok(Self {
            stream: TokenStream::new(Lexer::new(source))?,
            symbols: SymbolTable::new(),
            writer: VmWriter::new(out),
            ctx: Context::new(""),
        })
    }

    /// Compile the class, which must be the only thing in the source.
    pub fn compile(mut self) -> JackResult<Compilation<W>> {
        let tree = self.compile_class()?;

        if !self.stream.at_end() {
            let found = self.stream.describe(self.stream.current());
            return Err(self.stream.error(SyntaxErrorKind::TrailingInput(found)));
        }

        self.writer.flush()?;

        Ok(Compilation {
            class_name: self.ctx.class_name,
            tree,
            out: self.writer.into_inner(),
        })
    }

    #[inline]
    fn source(&self) -> &'a str {
        self.stream.source_code()
    }

    /// Add a token to the parse tree node.
    #[inline]
    fn leaf(&self, node: &mut Node, token: &Token) {
        node.push_token(token, self.source());
    }

    /// Declare the name held by the given token.
    fn define(&mut self, name: &Token, ty: &str, kind: SymbolKind) -> JackResult<u16> {
        let text = name.text(self.source());
        let location = self.stream.location(name);
        self.symbols
            .define(text, ty, kind)
            .map_err(|err| declaration_error(err, location))
    }

    /// Resolve the variable named by the given token to its storage.
    fn resolve(&self, name: &Token) -> JackResult<(Segment, u16)> {
        let text = name.text(self.source());
        match self.symbols.lookup(text) {
            Some(symbol) => Ok((segment_of(symbol.kind), symbol.index)),
            None => Err(SyntaxError::new(
                SyntaxErrorKind::Undeclared(SmolStr::from(text)),
                self.stream.location(name),
            )
            .into()),
        }
    }
}

fn declaration_error(err: SymbolError, location: Location) -> JackError {
    let kind = match err {
        SymbolError::Redeclared(name) => SyntaxErrorKind::Redeclared(name),
        SymbolError::Overflow(kind) => SyntaxErrorKind::Exceeds {
            what: format!("number of {kind} variables"),
            limit: u16::MAX,
        },
    };
    SyntaxError::new(kind, location).into()
}

/// Memory segment a variable of the given kind is stored in.
#[rustfmt::skip]
pub fn segment_of(kind: SymbolKind) -> Segment {
    match kind {
        SymbolKind::Static   => Segment::Static,
        SymbolKind::Field    => Segment::This,
        SymbolKind::Argument => Segment::Argument,
        SymbolKind::Local    => Segment::Local,
    }
}
