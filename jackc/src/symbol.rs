//! Two-scope symbol table.
use smol_str::SmolStr;
use std::{collections::BTreeMap, error, fmt};

/// Storage class of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SymbolKind {
    /// Class level, shared by all instances.
    Static = 0,
    /// Class level, one per instance.
    Field = 1,
    /// Subroutine level, passed in by the caller.
    Argument = 2,
    /// Subroutine level, declared with `var`.
    Local = 3,
}

impl SymbolKind {
    /// Static and field symbols live in the class scope.
    #[inline]
    pub fn is_class_scope(&self) -> bool {
        matches!(self, SymbolKind::Static | SymbolKind::Field)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolKind::Static => write!(f, "static"),
            SymbolKind::Field => write!(f, "field"),
            SymbolKind::Argument => write!(f, "argument"),
            SymbolKind::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive type keyword or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Position within the symbol's kind and scope, starting at 0.
    pub index: u16,
}

/// Maps names to their declared type, kind and index.
///
/// The class scope lives for the whole class compilation. The subroutine
/// scope is cleared at the start of every subroutine. Lookups consult the
/// subroutine scope first, so locals and arguments shadow class variables.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: BTreeMap<SmolStr, Symbol>,
    subroutine: BTreeMap<SmolStr, Symbol>,
    /// Next index to hand out, per kind.
    counters: [u16; 4],
}

impl SymbolTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the subroutine scope and restart the argument and local counters.
    ///
    /// The class scope is left untouched.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
        self.counters[SymbolKind::Argument as usize] = 0;
        self.counters[SymbolKind::Local as usize] = 0;
    }

    /// Declare a new name in the scope its kind belongs to.
    ///
    /// Returns the index assigned to the symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::Redeclared`] if the name is already declared
    /// in the same scope. Shadowing a class variable from the subroutine
    /// scope is allowed.
    ///
    /// Returns [`SymbolError::Overflow`] once a kind runs out of indices.
    pub fn define(&mut self, name: &str, ty: &str, kind: SymbolKind) -> Result<u16, SymbolError> {
        let scope = if kind.is_class_scope() {
            &mut self.class
        } else {
            &mut self.subroutine
        };

        if scope.contains_key(name) {
            return Err(SymbolError::Redeclared(SmolStr::from(name)));
        }

        let counter = &mut self.counters[kind as usize];
        let index = *counter;
        *counter = index.checked_add(1).ok_or(SymbolError::Overflow(kind))?;

        scope.insert(
            SmolStr::from(name),
            Symbol {
                name: SmolStr::from(name),
                ty: SmolStr::from(ty),
                kind,
                index,
            },
        );

        Ok(index)
    }

    /// Number of symbols of the given kind in its current scope.
    #[inline]
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        self.counters[kind as usize]
    }

    /// Lookup the given symbol name according to the scope rules.
    ///
    /// First search the subroutine scope for the symbol, then the class scope.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine.get(name).or_else(|| self.class.get(name))
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|symbol| symbol.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|symbol| symbol.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    Redeclared(SmolStr),
    /// Every index of the kind is taken.
    Overflow(SymbolKind),
}

impl error::Error for SymbolError {}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolError::Redeclared(name) => write!(f, "'{name}' is already declared in this scope"),
            SymbolError::Overflow(kind) => write!(f, "too many {kind} variables"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a", "int", SymbolKind::Field), Ok(0));
        assert_eq!(table.define("b", "int", SymbolKind::Static), Ok(0));
        assert_eq!(table.define("c", "Point", SymbolKind::Field), Ok(1));
        assert_eq!(table.define("d", "int", SymbolKind::Argument), Ok(0));
        assert_eq!(table.define("e", "int", SymbolKind::Local), Ok(0));
        assert_eq!(table.define("f", "int", SymbolKind::Local), Ok(1));

        assert_eq!(table.var_count(SymbolKind::Field), 2);
        assert_eq!(table.var_count(SymbolKind::Static), 1);
        assert_eq!(table.var_count(SymbolKind::Local), 2);
        assert_eq!(table.type_of("c"), Some("Point"));
        assert_eq!(table.kind_of("zzz"), None);
        assert_eq!(table.index_of("zzz"), None);
        assert_eq!(table.type_of("zzz"), None);
    }

    #[test]
    fn test_shadowing() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        table.define("x", "char", SymbolKind::Local).unwrap();

        assert_eq!(table.kind_of("x"), Some(SymbolKind::Local));
        assert_eq!(table.type_of("x"), Some("char"));

        table.start_subroutine();
        assert_eq!(table.kind_of("x"), Some(SymbolKind::Field));
        assert_eq!(table.type_of("x"), Some("int"));
    }

    #[test]
    fn test_start_subroutine_resets() {
        let mut table = SymbolTable::new();
        table.define("s", "int", SymbolKind::Static).unwrap();
        table.define("a", "int", SymbolKind::Argument).unwrap();
        table.define("b", "int", SymbolKind::Argument).unwrap();
        table.define("l", "int", SymbolKind::Local).unwrap();

        table.start_subroutine();
        assert_eq!(table.kind_of("a"), None);
        assert_eq!(table.kind_of("l"), None);
        assert_eq!(table.var_count(SymbolKind::Argument), 0);
        assert_eq!(table.var_count(SymbolKind::Local), 0);
        assert_eq!(table.var_count(SymbolKind::Static), 1);

        assert_eq!(table.define("c", "int", SymbolKind::Argument), Ok(0));
        assert_eq!(table.define("t", "int", SymbolKind::Static), Ok(1));
    }

    #[test]
    fn test_redeclaration_rejected() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        assert_eq!(
            table.define("x", "int", SymbolKind::Static),
            Err(SymbolError::Redeclared("x".into()))
        );

        table.define("y", "int", SymbolKind::Argument).unwrap();
        assert_eq!(
            table.define("y", "int", SymbolKind::Local),
            Err(SymbolError::Redeclared("y".into()))
        );

        // Rejected declarations don't consume an index.
        assert_eq!(table.var_count(SymbolKind::Static), 0);
        assert_eq!(table.var_count(SymbolKind::Local), 0);
    }

    #[test]
    fn test_index_overflow() {
        let mut table = SymbolTable::new();
        table.counters[SymbolKind::Local as usize] = u16::MAX - 1;

        assert_eq!(table.define("last", "int", SymbolKind::Local), Ok(u16::MAX - 1));
        assert_eq!(
            table.define("more", "int", SymbolKind::Local),
            Err(SymbolError::Overflow(SymbolKind::Local))
        );
        assert_eq!(table.kind_of("more"), None);
        assert_eq!(table.var_count(SymbolKind::Local), u16::MAX);

        // Other kinds keep counting.
        assert_eq!(table.define("more", "int", SymbolKind::Argument), Ok(0));
    }

    #[test]
    fn test_lookup_idempotent() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        table.define("y", "boolean", SymbolKind::Argument).unwrap();

        for name in ["x", "y", "missing"] {
            let first = (table.kind_of(name), table.type_of(name).map(str::to_owned), table.index_of(name));
            for _ in 0..3 {
                let again = (table.kind_of(name), table.type_of(name).map(str::to_owned), table.index_of(name));
                assert_eq!(first, again);
            }
        }
    }
}
