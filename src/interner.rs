use std::fmt;

use indexmap::IndexSet;

use crate::error::Error;

/// Dense identifier of an interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(u32);

impl Symbol {
    /// The empty string. Stands for "no type" wherever a type is expected.
    pub const UNTYPED: Symbol = Symbol(0);

    /// Panics past `u32::MAX` entries rather than aliasing an earlier id.
    fn at(idx: usize) -> Symbol {
        match u32::try_from(idx) {
            Ok(idx) => Symbol(idx),
            Err(_) => panic!("symbol table overflow at index {}", idx),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_untyped(self) -> bool {
        self == Self::UNTYPED
    }
}

/// Append-only, bidirectional string table.
///
/// Ids are handed out in insertion order and never reused. The interner is a
/// plain value: every planning run owns its own, so nothing is shared between
/// independent runs.
#[derive(Clone, Debug)]
pub struct Interner {
    words: IndexSet<String>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Interner {
    pub fn new() -> Self {
        let mut words = IndexSet::new();
        words.insert(String::new());
        Self { words }
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(idx) = self.words.get_index_of(text) {
            return Symbol::at(idx);
        }
        let (idx, _) = self.words.insert_full(text.to_owned());
        Symbol::at(idx)
    }

    /// Looks `text` up without interning it.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.words.get_index_of(text).map(Symbol::at)
    }

    pub fn resolve(&self, symbol: Symbol) -> Result<&str, Error> {
        self.words.get_index(symbol.index()).map(String::as_str).ok_or(Error::UnknownSymbol(symbol))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Wraps `item` so it can be printed with readable names.
    pub fn show<'a, T: Describe + ?Sized>(&'a self, item: &'a T) -> Described<'a, T> {
        Described { item, interner: self }
    }

    pub(crate) fn write_symbol(&self, symbol: Symbol, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve(symbol) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "#{}", symbol.index()),
        }
    }
}

/// Things that only have a readable form next to the interner that named them.
pub trait Describe {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Describe for Symbol {
    fn describe(&self, interner: &Interner, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        interner.write_symbol(*self, f)
    }
}

pub struct Described<'a, T: ?Sized> {
    item: &'a T,
    interner: &'a Interner,
}

impl<T: Describe + ?Sized> fmt::Display for Described<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.item.describe(self.interner, f)
    }
}
