//! Expression compilation.
use std::io;

use super::{segment_of, Compiler};
use crate::{
    error::{JackResult, Location, SyntaxError, SyntaxErrorKind},
    tokens::{Keyword, Token, TokenKind, INT_MAX},
    tree::{Node, NodeKind},
    vm::{Arithmetic, Segment},
};

/// Binary operators. None of them bind tighter than another.
const BINARY_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

impl<'a, W: io::Write> Compiler<'a, W> {
    /// `term (op term)*`
    ///
    /// Operators are applied strictly left to right, each one emitted
    /// as soon as its right operand is on the stack.
    pub(super) fn compile_expression(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::Expression);

        let term = self.compile_term()?;
        node.push_node(term);

        while let TokenKind::Symbol(op) = self.stream.kind() {
            if !BINARY_OPS.contains(&op) {
                break;
            }

            let token = self.stream.advance()?;
            self.leaf(&mut node, &token);

            let term = self.compile_term()?;
            node.push_node(term);

            self.compile_binary_op(op)?;
        }

        Ok(node)
    }

    fn compile_binary_op(&mut self, op: char) -> JackResult<()> {
        let cmd = match op {
            '+' => Arithmetic::Add,
            '-' => Arithmetic::Sub,
            '&' => Arithmetic::And,
            '|' => Arithmetic::Or,
            '<' => Arithmetic::Lt,
            '>' => Arithmetic::Gt,
            '=' => Arithmetic::Eq,
            // No native multiply or divide on the machine.
            '*' => return Ok(self.writer.call("Math.multiply", 2)?),
            '/' => return Ok(self.writer.call("Math.divide", 2)?),
            _ => return Err(self.stream.expected("binary operator")),
        };

        Ok(self.writer.arithmetic(cmd)?)
    }

    /// ```text
    /// integerConstant | stringConstant | keywordConstant
    ///   | varName | varName '[' expression ']' | subroutineCall
    ///   | '(' expression ')' | unaryOp term
    /// ```
    fn compile_term(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::Term);

        match self.stream.kind() {
            TokenKind::Int(value) => {
                let token = self.stream.advance()?;
                self.leaf(&mut node, &token);
                self.writer.push(Segment::Constant, value)?;
            }
            TokenKind::Str => {
                let token = self.stream.advance()?;
                self.leaf(&mut node, &token);
                self.compile_string(&token)?;
            }
            TokenKind::Keyword(keyword @ (Keyword::True | Keyword::False | Keyword::Null | Keyword::This)) => {
                let token = self.stream.advance()?;
                self.leaf(&mut node, &token);

                match keyword {
                    Keyword::True => {
                        self.writer.push(Segment::Constant, 0)?;
                        self.writer.arithmetic(Arithmetic::Not)?;
                    }
                    Keyword::This => self.writer.push(Segment::Pointer, 0)?,
                    _ => self.writer.push(Segment::Constant, 0)?,
                }
            }
            TokenKind::Symbol('(') => {
                let token = self.stream.advance()?;
                self.leaf(&mut node, &token);

                let expr = self.compile_expression()?;
                node.push_node(expr);

                let token = self.stream.consume_symbol(')')?;
                self.leaf(&mut node, &token);
            }
            TokenKind::Symbol(op @ ('-' | '~')) => {
                let token = self.stream.advance()?;
                self.leaf(&mut node, &token);

                let term = self.compile_term()?;
                node.push_node(term);

                let cmd = if op == '-' { Arithmetic::Neg } else { Arithmetic::Not };
                self.writer.arithmetic(cmd)?;
            }
            TokenKind::Ident => {
                // Decide what the name starts by peeking at the
                // character after it, leaving the tokens untouched.
                match self.stream.peek_char() {
                    Some('[') => self.compile_array_access(&mut node)?,
                    Some('(' | '.') => {
                        let name = self.stream.advance()?;
                        self.compile_subroutine_call(&mut node, name)?;
                    }
                    _ => {
                        let name = self.stream.advance()?;
                        let (segment, index) = self.resolve(&name)?;
                        self.leaf(&mut node, &name);
                        self.writer.push(segment, index)?;
                    }
                }
            }
            _ => return Err(self.stream.expected("term")),
        }

        Ok(node)
    }

    /// `varName '[' expression ']'`, read through `pointer 1`.
    fn compile_array_access(&mut self, node: &mut Node) -> JackResult<()> {
        let name = self.stream.consume_ident()?;
        let (segment, index) = self.resolve(&name)?;
        self.leaf(node, &name);

        let token = self.stream.consume_symbol('[')?;
        self.leaf(node, &token);

        self.writer.push(segment, index)?;
        let offset = self.compile_expression()?;
        node.push_node(offset);
        self.writer.arithmetic(Arithmetic::Add)?;

        let token = self.stream.consume_symbol(']')?;
        self.leaf(node, &token);

        self.writer.pop(Segment::Pointer, 1)?;
        self.writer.push(Segment::That, 0)?;

        Ok(())
    }

    /// Build a string object at runtime, one character at a time.
    ///
    /// Characters and the length are pushed as constants, so both must fit
    /// in a non-negative integer constant.
    fn compile_string(&mut self, token: &Token) -> JackResult<()> {
        let text = token.text(self.source());
        let exceeds = |what: String| {
            SyntaxError::new(
                SyntaxErrorKind::Exceeds { what, limit: INT_MAX },
                self.stream.location(token),
            )
        };

        if let Some(c) = text.chars().find(|c| u32::from(*c) > u32::from(INT_MAX)) {
            return Err(exceeds(format!("character {c:?} with code {}", u32::from(c))).into());
        }

        let units: Vec<u16> = text.encode_utf16().collect();
        let len = u16::try_from(units.len())
            .ok()
            .filter(|len| *len <= INT_MAX)
            .ok_or_else(|| exceeds(format!("string constant length {}", units.len())))?;

        self.writer.push(Segment::Constant, len)?;
        self.writer.call("String.new", 1)?;

        for unit in units {
            self.writer.push(Segment::Constant, unit)?;
            self.writer.call("String.appendChar", 2)?;
        }

        Ok(())
    }

    /// ```text
    /// subroutineName '(' expressionList ')'
    ///   | (className | varName) '.' subroutineName '(' expressionList ')'
    /// ```
    ///
    /// The leading name has already been consumed by the caller.
    pub(super) fn compile_subroutine_call(&mut self, node: &mut Node, name: Token) -> JackResult<()> {
        let source = self.source();
        let first = name.text(source);
        self.leaf(node, &name);

        let (callee, receivers) = if let Some(dot) = self.stream.match_symbol('.')? {
            self.leaf(node, &dot);

            let method = self.stream.consume_ident()?;
            self.leaf(node, &method);
            let method = method.text(source);

            let variable = self
                .symbols
                .lookup(first)
                .map(|symbol| (segment_of(symbol.kind), symbol.index, symbol.ty.clone()));

            match variable {
                // Method call on an object held in a variable.
                Some((segment, index, ty)) => {
                    self.writer.push(segment, index)?;
                    (format!("{ty}.{method}"), 1)
                }
                // Function or constructor of another class.
                None => (format!("{first}.{method}"), 0),
            }
        } else {
            // Method on the current receiver.
            self.writer.push(Segment::Pointer, 0)?;
            (format!("{}.{first}", self.ctx.class_name), 1)
        };

        let token = self.stream.consume_symbol('(')?;
        self.leaf(node, &token);

        let (list, count) = self.compile_expression_list()?;
        node.push_node(list);

        let token = self.stream.consume_symbol(')')?;
        self.leaf(node, &token);

        let args = count
            .checked_add(receivers)
            .ok_or_else(|| too_many_arguments(self.stream.location(&name)))?;
        self.writer.call(&callee, args)?;

        Ok(())
    }

    /// `(expression (',' expression)*)?`
    ///
    /// Returns the node and the number of expressions pushed.
    fn compile_expression_list(&mut self) -> JackResult<(Node, u16)> {
        let mut node = Node::new(NodeKind::ExpressionList);
        let mut count: u16 = 0;

        if self.stream.kind().is_symbol(')') {
            return Ok((node, count));
        }

        loop {
            let location = self.stream.location(self.stream.current());
            let expr = self.compile_expression()?;
            node.push_node(expr);
            count = count.checked_add(1).ok_or_else(|| too_many_arguments(location))?;

            match self.stream.match_symbol(',')? {
                Some(comma) => self.leaf(&mut node, &comma),
                None => break,
            }
        }

        Ok((node, count))
    }
}

fn too_many_arguments(location: Location) -> SyntaxError {
    SyntaxError::new(
        SyntaxErrorKind::Exceeds {
            what: "number of call arguments".to_string(),
            limit: u16::MAX,
        },
        location,
    )
}
