//! Parse tree.
//!
//! The tree is built by the compiler engine as it parses, purely as a
//! record of the productions it matched. Nothing reads it back for code
//! generation. It exists to be dumped as XML.
use smol_str::SmolStr;
use std::fmt::{self, Write};

use crate::tokens::{Token, TokenKind};

/// Grammar production a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Class,
    ClassVarDec,
    SubroutineDec,
    ParameterList,
    SubroutineBody,
    VarDec,
    Statements,
    LetStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ReturnStatement,
    Expression,
    Term,
    ExpressionList,
}

impl NodeKind {
    #[rustfmt::skip]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Class           => "class",
            Self::ClassVarDec     => "classVarDec",
            Self::SubroutineDec   => "subroutineDec",
            Self::ParameterList   => "parameterList",
            Self::SubroutineBody  => "subroutineBody",
            Self::VarDec          => "varDec",
            Self::Statements      => "statements",
            Self::LetStatement    => "letStatement",
            Self::IfStatement     => "ifStatement",
            Self::WhileStatement  => "whileStatement",
            Self::DoStatement     => "doStatement",
            Self::ReturnStatement => "returnStatement",
            Self::Expression      => "expression",
            Self::Term            => "term",
            Self::ExpressionList  => "expressionList",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Node(Node),
    Leaf(Leaf),
}

/// Terminal taken from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub kind: TokenKind,
    /// Decoded text, string constants without their quotes.
    pub text: SmolStr,
}

impl Leaf {
    pub fn from_token(token: &Token, source: &str) -> Self {
        Self {
            kind: token.kind,
            text: SmolStr::from(token.text(source)),
        }
    }

    #[rustfmt::skip]
    pub fn tag(&self) -> &'static str {
        match self.kind {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Symbol(_)  => "symbol",
            TokenKind::Ident      => "identifier",
            TokenKind::Int(_)     => "integerConstant",
            TokenKind::Str        => "stringConstant",
            TokenKind::EOF        => "eof",
        }
    }

    /// Write the terminal as a single XML element on its own line.
    pub fn write_xml(&self, out: &mut impl Write, indent: usize) -> fmt::Result {
        let tag = self.tag();
        write!(out, "{:indent$}<{tag}> ", "")?;
        write_escaped(out, &self.text)?;
        writeln!(out, " </{tag}>")
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: vec![],
        }
    }

    #[inline]
    pub fn push_node(&mut self, node: Node) {
        self.children.push(Child::Node(node));
    }

    #[inline]
    pub fn push_token(&mut self, token: &Token, source: &str) {
        self.children.push(Child::Leaf(Leaf::from_token(token, source)));
    }

    /// Serialise the tree as nested XML elements.
    pub fn write_xml(&self, out: &mut impl Write) -> fmt::Result {
        self.write_indented(out, 0)
    }

    pub fn to_xml(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        self.write_xml(&mut buf)?;
        Ok(buf)
    }

    fn write_indented(&self, out: &mut impl Write, depth: usize) -> fmt::Result {
        let tag = self.kind.tag();
        writeln!(out, "{:indent$}<{tag}>", "", indent = depth * 2)?;

        for child in &self.children {
            match child {
                Child::Node(node) => node.write_indented(out, depth + 1)?,
                Child::Leaf(leaf) => leaf.write_xml(out, (depth + 1) * 2)?,
            }
        }

        writeln!(out, "{:indent$}</{tag}>", "", indent = depth * 2)
    }
}

fn write_escaped(out: &mut impl Write, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '&' => out.write_str("&amp;")?,
            '"' => out.write_str("&quot;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}
