//! # Object File Facade
//!
//! Owns the loaded tables and is the single entry point external code uses.
//! Loading is eager and fail-fast: either every table decodes cleanly or the
//! file is rejected with the first structural error. Once constructed the
//! model is read-only and safe to share freely.

use std::io::{Read, Seek};

use tracing::debug;

use crate::error::CoffResult;
use crate::header::{FileHeader, OptionalHeader};
use crate::reader::RecordReader;
use crate::section::{Section, SectionRef, SectionTable};
use crate::strings::StringTable;
use crate::symbol::{DecodeContext, SymbolEntry, SymbolTable};

/// A fully decoded object file.
///
/// Tables load in dependency order — file header, optional header, string
/// table, section table, symbol table — because symbol decoding needs the
/// string table for indirect names and the section table for contextual
/// validation. Each loader seeks to its own known offset, so the order is
/// the data-dependency order, not a stream-position protocol.
pub struct ObjectFile
{
    file_header: FileHeader,
    optional_header: OptionalHeader,
    strings: StringTable,
    sections: SectionTable,
    symbols: SymbolTable,
}

impl ObjectFile
{
    /// Decode a complete object file from a seekable stream.
    ///
    /// ## Errors
    ///
    /// [`crate::error::CoffError::UnsupportedFormat`] before any table is
    /// loaded when the magic numbers or optional-header size don't match
    /// the one supported format; any other decode error aborts the load
    /// with no partial model.
    pub fn load<R: Read + Seek>(stream: R) -> CoffResult<Self>
    {
        let mut reader = RecordReader::new(stream);

        let file_header = FileHeader::load(&mut reader)?;
        debug!(
            sections = file_header.num_sections,
            symbols = file_header.num_symbols,
            "file header accepted"
        );
        let optional_header = OptionalHeader::load(&mut reader)?;

        let strings = StringTable::load(&mut reader, &file_header)?;
        let sections = SectionTable::load(&mut reader, &file_header, &strings)?;
        let symbols = {
            let ctx = DecodeContext { strings: &strings, sections: &sections };
            SymbolTable::load(&mut reader, &file_header, &ctx)?
        };

        Ok(Self {
            file_header,
            optional_header,
            strings,
            sections,
            symbols,
        })
    }

    pub fn file_header(&self) -> &FileHeader
    {
        &self.file_header
    }

    pub fn optional_header(&self) -> &OptionalHeader
    {
        &self.optional_header
    }

    /// Iterate sections in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = &Section>
    {
        self.sections.iter()
    }

    /// Resolve a raw signed section number against the section table.
    pub fn section(&self, number: i16) -> CoffResult<SectionRef<'_>>
    {
        self.sections.resolve(number)
    }

    /// Iterate symbols in table-index order.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolEntry>
    {
        self.symbols.iter()
    }

    /// Look up a symbol by table index; absent indices yield `None`.
    pub fn symbol(&self, index: u32) -> Option<&SymbolEntry>
    {
        self.symbols.get(index)
    }

    /// The name of the symbol at `index`, if one lives there.
    pub fn symbol_name(&self, index: u32) -> Option<&str>
    {
        self.symbols.name_of(index)
    }

    /// Look up a string-table entry; unknown offsets yield `""`.
    pub fn string(&self, offset: u32) -> &str
    {
        self.strings.get(offset)
    }

    /// Number of decoded symbols (auxiliary slots not counted).
    pub fn symbol_count(&self) -> usize
    {
        self.symbols.len()
    }

    /// Number of declared sections.
    pub fn section_count(&self) -> usize
    {
        self.sections.len()
    }
}
