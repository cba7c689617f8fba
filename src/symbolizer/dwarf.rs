//! Symbol resolution for native binaries.
//!
//! Translates code addresses to function names using DWARF debug info,
//! falling back to the ELF symbol table when no debug info covers an address.

use super::Symbolize;
use crate::utils::config::MAX_SYMBOL_LEN;
use crate::utils::error::SymbolizeError;
use addr2line::Context;
use gimli::{EndianRcSlice, RunTimeEndian};
use log::{debug, info};
use object::{Object, ObjectSection, ObjectSymbol, SymbolKind};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

type Reader = EndianRcSlice<RunTimeEndian>;

/// A function symbol from the object's symbol table
#[derive(Debug, Clone)]
struct TableSymbol {
    address: u64,
    size: u64,
    name: String,
}

/// Resolver backed by a binary's debug info and symbol table
///
/// Resolved addresses are cached; heap profiles repeat the same frames
/// across thousands of samples.
pub struct DwarfSymbolizer {
    context: Context<Reader>,
    symbols: Vec<TableSymbol>,
    cache: RefCell<HashMap<u64, Option<String>>>,
}

impl DwarfSymbolizer {
    /// Load symbols from the binary at `binary_path`
    ///
    /// **Public** - main constructor
    ///
    /// # Errors
    /// * `SymbolizeError::Io` - the binary cannot be read
    /// * `SymbolizeError::Object` - the file is not a supported object format
    /// * `SymbolizeError::Dwarf` - debug sections are present but malformed
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Result<Self, SymbolizeError> {
        let path = binary_path.as_ref();
        debug!("Loading binary for symbolization: {}", path.display());

        let file_data = std::fs::read(path)?;
        let obj = object::File::parse(&*file_data)?;

        let endian = if obj.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let load_section = |id: gimli::SectionId| -> Result<Reader, gimli::Error> {
            let data = obj
                .section_by_name(id.name())
                .and_then(|section| section.uncompressed_data().ok())
                .unwrap_or(Cow::Borrowed(&[][..]));
            Ok(EndianRcSlice::new(Rc::from(&*data), endian))
        };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let context = Context::from_dwarf(dwarf)?;

        let mut symbols: Vec<TableSymbol> = obj
            .symbols()
            .chain(obj.dynamic_symbols())
            .filter(|sym| sym.kind() == SymbolKind::Text && sym.address() != 0)
            .filter_map(|sym| {
                let name = sym.name().ok()?;
                Some(TableSymbol {
                    address: sym.address(),
                    size: sym.size(),
                    name: addr2line::demangle_auto(Cow::Borrowed(name), None).into_owned(),
                })
            })
            .collect();
        symbols.sort_by_key(|sym| sym.address);
        symbols.dedup_by_key(|sym| sym.address);

        info!(
            "Loaded {} table symbols from {}",
            symbols.len(),
            path.display()
        );

        Ok(Self {
            context,
            symbols,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Outermost function name from the DWARF frames at `address`
    fn lookup_dwarf(&self, address: u64) -> Option<String> {
        let mut frames = self.context.find_frames(address).skip_all_loads().ok()?;

        // Inlined frames come first; the last one is the real function.
        let mut name = None;
        while let Ok(Some(frame)) = frames.next() {
            if let Some(function) = frame.function {
                if let Ok(demangled) = function.demangle() {
                    name = Some(demangled.into_owned());
                }
            }
        }
        name
    }

    fn lookup_table(&self, address: u64) -> Option<String> {
        let index = match self.symbols.binary_search_by_key(&address, |sym| sym.address) {
            Ok(index) => index,
            Err(0) => return None,
            Err(insert_at) => insert_at - 1,
        };
        let sym = &self.symbols[index];

        // Zero-sized symbols cover everything up to the next symbol.
        if sym.size == 0 || address < sym.address + sym.size {
            Some(sym.name.clone())
        } else {
            None
        }
    }
}

impl Symbolize for DwarfSymbolizer {
    fn symbolize(&self, address: u64) -> Option<String> {
        if let Some(cached) = self.cache.borrow().get(&address) {
            return cached.clone();
        }

        let resolved = self
            .lookup_dwarf(address)
            .or_else(|| self.lookup_table(address))
            .filter(|name| name.len() < MAX_SYMBOL_LEN);

        self.cache.borrow_mut().insert(address, resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_io_error() {
        let result = DwarfSymbolizer::new("/nonexistent/heap-trace-binary");
        assert!(matches!(result, Err(SymbolizeError::Io(_))));
    }

    #[test]
    fn test_non_object_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not an ELF file").unwrap();

        let result = DwarfSymbolizer::new(file.path());
        assert!(matches!(result, Err(SymbolizeError::Object(_))));
    }
}
