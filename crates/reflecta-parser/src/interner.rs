//! String interning for names and literals.
//!
//! Every parsed file owns one interner; AST nodes carry `Symbol`s that only
//! make sense together with the interner that produced them.

use rustc_hash::FxHashMap;
use std::num::NonZeroU32;

/// An interned string symbol (32-bit index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(NonZeroU32);

impl Symbol {
    #[inline]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
        // index + 1 is never zero
        Symbol(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Placeholder symbol used in "expected token" lists.
    #[inline]
    pub const fn dummy() -> Self {
        Symbol(NonZeroU32::MIN)
    }
}

/// String interner that deduplicates strings.
#[derive(Clone, Default)]
pub struct Interner {
    map: FxHashMap<Box<str>, Symbol>,
    strings: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new interner with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            strings: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning its symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }

        let sym = Symbol::from_index(self.strings.len());
        self.strings.push(s.into());
        self.map.insert(s.into(), sym);
        sym
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// Resolve a symbol back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the symbol did not come from this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner").field("len", &self.strings.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut interner = Interner::new();

        let first = interner.intern("Value");
        let other = interner.intern("Annotated");
        let again = interner.intern("Value");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_and_get() {
        let mut interner = Interner::new();

        let sym = interner.intern("lang\\Value");
        assert_eq!(interner.resolve(sym), "lang\\Value");
        assert_eq!(interner.get("lang\\Value"), Some(sym));
        assert_eq!(interner.get("missing"), None);
    }

    #[test]
    fn test_empty_string_is_internable() {
        let mut interner = Interner::new();
        let sym = interner.intern("");
        assert_eq!(interner.resolve(sym), "");
        assert!(!interner.is_empty());
    }
}
