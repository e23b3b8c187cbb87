use std::{cmp::Ordering, fmt, hash::{Hash, Hasher}, sync::Arc};

use crate::interner::{Describe, Interner, Symbol};

/// A typed variable. Equality and hashing only look at the name, so a
/// variable matches a constant carrying the same symbol.
#[derive(Clone, Copy, Debug)]
pub struct Variable {
    pub name: Symbol,
    pub kind: Symbol,
}

impl Variable {
    pub fn new(name: Symbol, kind: Symbol) -> Self {
        Self { name, kind }
    }

    pub fn untyped(name: Symbol) -> Self {
        Self { name, kind: Symbol::UNTYPED }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Variable { }

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Term {
    Constant(Symbol),
    Variable(Variable),
}

impl Term {
    #[inline]
    pub fn symbol(&self) -> Symbol {
        match self {
            Self::Constant(s) => *s,
            Self::Variable(v) => v.name,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// `Constant(value)` if this term carries `variable`, `None` otherwise.
    #[inline]
    pub(crate) fn substituted(&self, variable: Symbol, value: Symbol) -> Option<Term> {
        if self.symbol() == variable { Some(Term::Constant(value)) } else { None }
    }
}

impl From<Symbol> for Term {
    fn from(s: Symbol) -> Self {
        Term::Constant(s)
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Variable(v)
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.symbol() == other.symbol()
    }
}
impl Eq for Term { }

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol().hash(state)
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol().cmp(&other.symbol())
    }
}

impl Describe for Term {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(s) => interner.write_symbol(*s, f),
            Self::Variable(v) => v.describe(interner, f),
        }
    }
}

impl Describe for Variable {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        interner.write_symbol(self.name, f)?;
        if !self.kind.is_untyped() {
            write!(f, " - ")?;
            interner.write_symbol(self.kind, f)?;
        }
        Ok(())
    }
}

/// A predicate application. The first term is the predicate name.
///
/// Atoms order lexicographically by symbol, which gives atom sets a canonical
/// enumeration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(Arc<[Term]>);

impl Atom {
    pub fn new(terms: Vec<Term>) -> Self {
        Self(terms.into())
    }

    /// Builds a ground atom out of constants.
    pub fn ground<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        Self(symbols.into_iter().map(Term::Constant).collect())
    }

    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn predicate(&self) -> Option<Symbol> {
        self.0.first().map(Term::symbol)
    }

    pub fn is_ground(&self) -> bool {
        !self.0.iter().any(Term::is_variable)
    }

    pub(crate) fn substituted(&self, variable: Symbol, value: Symbol) -> Option<Atom> {
        if !self.0.iter().any(|t| t.symbol() == variable) {
            return None;
        }
        Some(Self(self.0.iter().map(|t| t.substituted(variable, value).unwrap_or(*t)).collect()))
    }
}

impl Describe for Atom {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, term) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            term.describe(interner, f)?;
        }
        write!(f, ")")
    }
}
