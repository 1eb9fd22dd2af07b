//! Statement compilation.
use log::debug;
use std::io;

use super::Compiler;
use crate::{
    error::JackResult,
    tokens::{Keyword, TokenKind},
    tree::{Node, NodeKind},
    vm::{Arithmetic, Segment},
};

impl<'a, W: io::Write> Compiler<'a, W> {
    /// `statement*`
    ///
    /// Stops at the first token that can't start a statement, which
    /// the caller expects to be the closing brace.
    pub(super) fn compile_statements(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::Statements);

        loop {
            let statement = match self.stream.kind() {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if()?,
                TokenKind::Keyword(Keyword::While) => self.compile_while()?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                _ => break,
            };
            node.push_node(statement);
        }

        Ok(node)
    }

    /// `'{' statements '}'`, adding all three to the parent node.
    fn compile_block(&mut self, node: &mut Node) -> JackResult<()> {
        let token = self.stream.consume_symbol('{')?;
        self.leaf(node, &token);

        let statements = self.compile_statements()?;
        node.push_node(statements);

        let token = self.stream.consume_symbol('}')?;
        self.leaf(node, &token);

        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::LetStatement);

        let (_, token) = self.stream.consume_keyword(&[Keyword::Let])?;
        self.leaf(&mut node, &token);

        let name = self.stream.consume_ident()?;
        let (segment, index) = self.resolve(&name)?;
        self.leaf(&mut node, &name);

        if let Some(token) = self.stream.match_symbol('[')? {
            self.leaf(&mut node, &token);

            // Element address stays on the stack while the value is computed.
            self.writer.push(segment, index)?;
            let offset = self.compile_expression()?;
            node.push_node(offset);
            self.writer.arithmetic(Arithmetic::Add)?;

            let token = self.stream.consume_symbol(']')?;
            self.leaf(&mut node, &token);
            let token = self.stream.consume_symbol('=')?;
            self.leaf(&mut node, &token);

            let value = self.compile_expression()?;
            node.push_node(value);

            let token = self.stream.consume_symbol(';')?;
            self.leaf(&mut node, &token);

            // The value may itself have used `pointer 1`, so the address
            // is only bound once the value is safely parked.
            self.writer.pop(Segment::Temp, 0)?;
            self.writer.pop(Segment::Pointer, 1)?;
            self.writer.push(Segment::Temp, 0)?;
            self.writer.pop(Segment::That, 0)?;
        } else {
            let token = self.stream.consume_symbol('=')?;
            self.leaf(&mut node, &token);

            let value = self.compile_expression()?;
            node.push_node(value);

            let token = self.stream.consume_symbol(';')?;
            self.leaf(&mut node, &token);

            self.writer.pop(segment, index)?;
        }

        Ok(node)
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::IfStatement);

        let index = self.ctx.next_if_index();
        let label_true = format!("IF_TRUE{index}");
        let label_false = format!("IF_FALSE{index}");
        let label_end = format!("IF_END{index}");

        let (_, token) = self.stream.consume_keyword(&[Keyword::If])?;
        self.leaf(&mut node, &token);
        self.compile_condition(&mut node)?;

        self.writer.if_goto(&label_true)?;
        self.writer.goto(&label_false)?;
        self.writer.label(&label_true)?;

        self.compile_block(&mut node)?;

        if let Some(token) = self.stream.match_keyword(Keyword::Else)? {
            self.writer.goto(&label_end)?;
            self.writer.label(&label_false)?;

            self.leaf(&mut node, &token);
            self.compile_block(&mut node)?;

            self.writer.label(&label_end)?;
        } else {
            self.writer.label(&label_false)?;
        }

        Ok(node)
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::WhileStatement);

        let index = self.ctx.next_while_index();
        let label_exp = format!("WHILE_EXP{index}");
        let label_end = format!("WHILE_END{index}");

        let (_, token) = self.stream.consume_keyword(&[Keyword::While])?;
        self.leaf(&mut node, &token);

        self.writer.label(&label_exp)?;
        self.compile_condition(&mut node)?;
        self.writer.arithmetic(Arithmetic::Not)?;
        self.writer.if_goto(&label_end)?;

        self.compile_block(&mut node)?;

        self.writer.goto(&label_exp)?;
        self.writer.label(&label_end)?;

        Ok(node)
    }

    /// `'(' expression ')'`
    fn compile_condition(&mut self, node: &mut Node) -> JackResult<()> {
        let token = self.stream.consume_symbol('(')?;
        self.leaf(node, &token);

        let cond = self.compile_expression()?;
        node.push_node(cond);

        let token = self.stream.consume_symbol(')')?;
        self.leaf(node, &token);

        Ok(())
    }

    /// `'do' subroutineCall ';'`
    fn compile_do(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::DoStatement);

        let (_, token) = self.stream.consume_keyword(&[Keyword::Do])?;
        self.leaf(&mut node, &token);

        let name = self.stream.consume_ident()?;
        self.compile_subroutine_call(&mut node, name)?;

        let token = self.stream.consume_symbol(';')?;
        self.leaf(&mut node, &token);

        // Every call leaves a value, `do` has no use for it.
        self.writer.pop(Segment::Temp, 0)?;

        Ok(node)
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::ReturnStatement);

        let (_, token) = self.stream.consume_keyword(&[Keyword::Return])?;
        self.leaf(&mut node, &token);

        if let Some(token) = self.stream.match_symbol(';')? {
            // Callers always pop a value, even from void subroutines.
            self.leaf(&mut node, &token);
            self.writer.push(Segment::Constant, 0)?;
        } else {
            if self.ctx.is_void {
                debug!("{} is void but returns a value", self.ctx.function_name());
            }

            let value = self.compile_expression()?;
            node.push_node(value);

            let token = self.stream.consume_symbol(';')?;
            self.leaf(&mut node, &token);
        }

        self.writer.ret()?;

        Ok(node)
    }
}
