//! Stack machine instructions and the writer that emits them.
use log::trace;
use smol_str::SmolStr;
use std::{fmt, io};

/// Memory segment operand of `push` and `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    /// Fields of the current receiver, based at `pointer 0`.
    This,
    /// Array elements, based at `pointer 1`.
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local    => "local",
            Segment::Static   => "static",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
        })
    }
}

/// Arithmetic and logical commands operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Arithmetic {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Arithmetic::Add => "add",
            Arithmetic::Sub => "sub",
            Arithmetic::Neg => "neg",
            Arithmetic::Eq  => "eq",
            Arithmetic::Gt  => "gt",
            Arithmetic::Lt  => "lt",
            Arithmetic::And => "and",
            Arithmetic::Or  => "or",
            Arithmetic::Not => "not",
        })
    }
}

/// Stack machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `push segment index`
    Push(Segment, u16),
    /// `pop segment index`
    Pop(Segment, u16),
    Arithmetic(Arithmetic),
    /// `label name`
    Label(SmolStr),
    /// `goto name`
    Goto(SmolStr),
    /// `if-goto name`
    /// Pop the top of the stack and jump when it is not zero.
    IfGoto(SmolStr),
    /// `call name nArgs`
    Call(SmolStr, u16),
    /// `function name nLocals`
    Function(SmolStr, u16),
    Return,
}

/// Outputs instruction in its textual form.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Push(seg, index)       => write!(f, "push {seg} {index}"),
            Instr::Pop(seg, index)        => write!(f, "pop {seg} {index}"),
            Instr::Arithmetic(cmd)        => write!(f, "{cmd}"),
            Instr::Label(name)            => write!(f, "label {name}"),
            Instr::Goto(name)             => write!(f, "goto {name}"),
            Instr::IfGoto(name)           => write!(f, "if-goto {name}"),
            Instr::Call(name, n_args)     => write!(f, "call {name} {n_args}"),
            Instr::Function(name, n_locs) => write!(f, "function {name} {n_locs}"),
            Instr::Return                 => write!(f, "return"),
        }
    }
}

/// Writes instructions to an output sink, one per line.
///
/// The writer knows nothing about the grammar or the symbol table,
/// it only formats what it's given.
pub struct VmWriter<W: io::Write> {
    out: W,
    count: usize,
}

impl<W: io::Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    /// Number of instructions written so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn emit(&mut self, instr: Instr) -> io::Result<()> {
        trace!("{:5} {instr}", self.count);
        writeln!(self.out, "{instr}")?;
        self.count += 1;
        Ok(())
    }

    #[inline]
    pub fn push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(Instr::Push(segment, index))
    }

    #[inline]
    pub fn pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(Instr::Pop(segment, index))
    }

    #[inline]
    pub fn arithmetic(&mut self, cmd: Arithmetic) -> io::Result<()> {
        self.emit(Instr::Arithmetic(cmd))
    }

    #[inline]
    pub fn label(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instr::Label(name.into()))
    }

    #[inline]
    pub fn goto(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instr::Goto(name.into()))
    }

    #[inline]
    pub fn if_goto(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instr::IfGoto(name.into()))
    }

    #[inline]
    pub fn call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        self.emit(Instr::Call(name.into(), n_args))
    }

    #[inline]
    pub fn function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        self.emit(Instr::Function(name.into(), n_locals))
    }

    #[inline]
    pub fn ret(&mut self) -> io::Result<()> {
        self.emit(Instr::Return)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Unwraps the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
