//! Address-to-symbol resolution for sampled call stacks.
//!
//! The aggregator only depends on the [`Symbolize`] trait. Resolution may
//! fail for any single address; callers substitute a placeholder line and
//! keep going.

pub mod dwarf;

pub use dwarf::DwarfSymbolizer;

use std::collections::HashMap;

/// Resolves a raw code address to a human-readable symbol name
///
/// **Public** - seam between the aggregator and whatever resolver is available
pub trait Symbolize {
    /// Return the symbol containing `address`, or `None` if it cannot be resolved
    fn symbolize(&self, address: u64) -> Option<String>;
}

impl<F> Symbolize for F
where
    F: Fn(u64) -> Option<String>,
{
    fn symbolize(&self, address: u64) -> Option<String> {
        self(address)
    }
}

/// Exact-address symbol table
///
/// Used for recorded profiles, which ship the names their capture host
/// resolved alongside the raw addresses.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    symbols: HashMap<u64, String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u64, name: impl Into<String>) {
        self.symbols.insert(address, name.into());
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<(u64, String)> for SymbolMap {
    fn from_iter<T: IntoIterator<Item = (u64, String)>>(iter: T) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

impl Symbolize for SymbolMap {
    fn symbolize(&self, address: u64) -> Option<String> {
        self.symbols.get(&address).cloned()
    }
}

/// Tries each resolver in turn and returns the first name found
pub struct ChainedSymbolizer<'a> {
    resolvers: Vec<&'a dyn Symbolize>,
}

impl<'a> ChainedSymbolizer<'a> {
    pub fn new(resolvers: Vec<&'a dyn Symbolize>) -> Self {
        Self { resolvers }
    }
}

impl Symbolize for ChainedSymbolizer<'_> {
    fn symbolize(&self, address: u64) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.symbolize(address))
    }
}
