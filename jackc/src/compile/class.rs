//! Class structure: declarations and subroutine headers.
use log::debug;
use smol_str::SmolStr;
use std::io;

use super::{declaration_error, Compiler, Context, SubroutineKind};
use crate::{
    error::JackResult,
    symbol::SymbolKind,
    tokens::{Keyword, TokenKind},
    tree::{Node, NodeKind},
    vm::Segment,
};

impl<'a, W: io::Write> Compiler<'a, W> {
    /// `'class' className '{' classVarDec* subroutineDec* '}'`
    pub(super) fn compile_class(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::Class);

        let (_, token) = self.stream.consume_keyword(&[Keyword::Class])?;
        self.leaf(&mut node, &token);

        let name = self.stream.consume_ident()?;
        self.ctx = Context::new(name.text(self.source()));
        debug!("class {}", self.ctx.class_name);
        self.leaf(&mut node, &name);

        let token = self.stream.consume_symbol('{')?;
        self.leaf(&mut node, &token);

        while let TokenKind::Keyword(Keyword::Static | Keyword::Field) = self.stream.kind() {
            let var_dec = self.compile_class_var_dec()?;
            node.push_node(var_dec);
        }

        while let TokenKind::Keyword(Keyword::Constructor | Keyword::Function | Keyword::Method) =
            self.stream.kind()
        {
            let subroutine = self.compile_subroutine()?;
            node.push_node(subroutine);
        }

        let token = self.stream.consume_symbol('}')?;
        self.leaf(&mut node, &token);

        debug!(
            "class {} done, {} static, {} field",
            self.ctx.class_name,
            self.symbols.var_count(SymbolKind::Static),
            self.symbols.var_count(SymbolKind::Field)
        );

        Ok(node)
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::ClassVarDec);

        let (keyword, token) = self
            .stream
            .consume_keyword(&[Keyword::Static, Keyword::Field])?;
        self.leaf(&mut node, &token);
        let kind = match keyword {
            Keyword::Static => SymbolKind::Static,
            _ => SymbolKind::Field,
        };

        let ty = self.compile_type(&mut node, false)?;
        self.compile_var_names(&mut node, &ty, kind)?;

        Ok(node)
    }

    /// `varName (',' varName)* ';'`
    ///
    /// Shared tail of class variable and local variable declarations.
    fn compile_var_names(&mut self, node: &mut Node, ty: &str, kind: SymbolKind) -> JackResult<()> {
        loop {
            let name = self.stream.consume_ident()?;
            self.define(&name, ty, kind)?;
            self.leaf(node, &name);

            match self.stream.match_symbol(',')? {
                Some(comma) => self.leaf(node, &comma),
                None => break,
            }
        }

        let token = self.stream.consume_symbol(';')?;
        self.leaf(node, &token);

        Ok(())
    }

    /// `'int' | 'char' | 'boolean' | className`, and `'void'` when allowed.
    fn compile_type(&mut self, node: &mut Node, allow_void: bool) -> JackResult<SmolStr> {
        let token = match self.stream.kind() {
            TokenKind::Keyword(keyword) if keyword.is_primitive_type() => self.stream.advance()?,
            TokenKind::Keyword(Keyword::Void) if allow_void => self.stream.advance()?,
            TokenKind::Ident => self.stream.advance()?,
            _ if allow_void => return Err(self.stream.expected("'void' or type")),
            _ => return Err(self.stream.expected("type")),
        };

        self.leaf(node, &token);
        Ok(SmolStr::from(token.text(self.source())))
    }

    /// `('constructor' | 'function' | 'method') ('void' | type) subroutineName
    ///  '(' parameterList ')' subroutineBody`
    fn compile_subroutine(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::SubroutineDec);

        let (keyword, token) = self.stream.consume_keyword(&[
            Keyword::Constructor,
            Keyword::Function,
            Keyword::Method,
        ])?;
        self.leaf(&mut node, &token);
        let kind = SubroutineKind::from_keyword(keyword).unwrap_or(SubroutineKind::Function);

        let is_void = self.stream.kind().is_keyword(Keyword::Void);
        self.compile_type(&mut node, true)?;

        let name = self.stream.consume_ident()?;
        self.leaf(&mut node, &name);

        self.symbols.start_subroutine();
        if kind == SubroutineKind::Method {
            // Receiver occupies argument 0, explicit parameters follow.
            // `this` is a keyword so no parameter can collide with it.
            let class_name = self.ctx.class_name.clone();
            let location = self.stream.location(&name);
            self.symbols
                .define("this", &class_name, SymbolKind::Argument)
                .map_err(|err| declaration_error(err, location))?;
        }
        let source = self.source();
        self.ctx.enter_subroutine(name.text(source), kind, is_void);

        let token = self.stream.consume_symbol('(')?;
        self.leaf(&mut node, &token);

        let params = self.compile_parameter_list()?;
        node.push_node(params);

        let token = self.stream.consume_symbol(')')?;
        self.leaf(&mut node, &token);

        let body = self.compile_subroutine_body()?;
        node.push_node(body);

        Ok(node)
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::ParameterList);

        if self.stream.kind().is_symbol(')') {
            return Ok(node);
        }

        loop {
            let ty = self.compile_type(&mut node, false)?;
            let name = self.stream.consume_ident()?;
            self.define(&name, &ty, SymbolKind::Argument)?;
            self.leaf(&mut node, &name);

            match self.stream.match_symbol(',')? {
                Some(comma) => self.leaf(&mut node, &comma),
                None => break,
            }
        }

        Ok(node)
    }

    /// `'{' varDec* statements '}'`
    ///
    /// The function header can only be written once every local is
    /// declared, so it is emitted between the declarations and the
    /// statements.
    fn compile_subroutine_body(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::SubroutineBody);

        let token = self.stream.consume_symbol('{')?;
        self.leaf(&mut node, &token);

        while self.stream.kind().is_keyword(Keyword::Var) {
            let var_dec = self.compile_var_dec()?;
            node.push_node(var_dec);
        }

        let n_locals = self.symbols.var_count(SymbolKind::Local);
        debug!(
            "{} {} with {} locals",
            self.ctx.kind,
            self.ctx.function_name(),
            n_locals
        );
        self.writer.function(&self.ctx.function_name(), n_locals)?;

        match self.ctx.kind {
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.var_count(SymbolKind::Field);
                self.writer.push(Segment::Constant, n_fields)?;
                self.writer.call("Memory.alloc", 1)?;
                self.writer.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.writer.push(Segment::Argument, 0)?;
                self.writer.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        let statements = self.compile_statements()?;
        node.push_node(statements);

        let token = self.stream.consume_symbol('}')?;
        self.leaf(&mut node, &token);

        Ok(node)
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> JackResult<Node> {
        let mut node = Node::new(NodeKind::VarDec);

        let (_, token) = self.stream.consume_keyword(&[Keyword::Var])?;
        self.leaf(&mut node, &token);

        let ty = self.compile_type(&mut node, false)?;
        self.compile_var_names(&mut node, &ty, SymbolKind::Local)?;

        Ok(node)
    }
}
