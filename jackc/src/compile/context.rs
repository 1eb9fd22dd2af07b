use smol_str::SmolStr;
use std::fmt;

use crate::tokens::Keyword;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Constructor => Some(Self::Constructor),
            Keyword::Function => Some(Self::Function),
            Keyword::Method => Some(Self::Method),
            _ => None,
        }
    }
}

impl fmt::Display for SubroutineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constructor => write!(f, "constructor"),
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// State threaded through the compilation of one class.
#[derive(Debug)]
pub struct Context {
    pub class_name: SmolStr,
    pub subroutine: SmolStr,
    pub kind: SubroutineKind,
    pub is_void: bool,
    /// Next label suffix for `if` statements.
    if_index: u32,
    /// Next label suffix for `while` statements.
    while_index: u32,
}

impl Context {
    pub fn new(class_name: impl Into<SmolStr>) -> Self {
        Self {
            class_name: class_name.into(),
            subroutine: SmolStr::default(),
            kind: SubroutineKind::Function,
            is_void: false,
            if_index: 0,
            while_index: 0,
        }
    }

    /// Record the subroutine being compiled and restart label numbering.
    pub fn enter_subroutine(&mut self, name: impl Into<SmolStr>, kind: SubroutineKind, is_void: bool) {
        self.subroutine = name.into();
        self.kind = kind;
        self.is_void = is_void;
        self.if_index = 0;
        self.while_index = 0;
    }

    /// Qualified name of the current subroutine, `Class.subroutine`.
    pub fn function_name(&self) -> String {
        format!("{}.{}", self.class_name, self.subroutine)
    }

    pub fn next_if_index(&mut self) -> u32 {
        let index = self.if_index;
        self.if_index += 1;
        index
    }

    pub fn next_while_index(&mut self) -> u32 {
        let index = self.while_index;
        self.while_index += 1;
        index
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_label_counters_reset() {
        let mut ctx = Context::new("Main");
        ctx.enter_subroutine("a", SubroutineKind::Function, true);
        assert_eq!(ctx.next_if_index(), 0);
        assert_eq!(ctx.next_if_index(), 1);
        assert_eq!(ctx.next_while_index(), 0);
        assert_eq!(ctx.function_name(), "Main.a");

        ctx.enter_subroutine("b", SubroutineKind::Method, false);
        assert_eq!(ctx.next_if_index(), 0);
        assert_eq!(ctx.next_while_index(), 0);
        assert_eq!(ctx.function_name(), "Main.b");
    }
}
