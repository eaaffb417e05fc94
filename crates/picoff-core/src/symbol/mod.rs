//! Symbol table: the central dispatch of the decoder.
//!
//! Symbol records occupy table slots together with their auxiliary records,
//! so decoded indices are non-contiguous: a symbol at index `i` declaring
//! `k` auxiliary records is followed by a symbol at index `i + 1 + k`.
//! The table is keyed by those indices, exactly as other records reference
//! them.

pub mod aux;
pub mod entry;

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use tracing::debug;

use crate::error::{CoffError, CoffResult};
use crate::header::FileHeader;
use crate::reader::RecordReader;
use crate::section::SectionTable;
use crate::strings::StringTable;

pub use aux::{AuxRecord, BlockBounds, CallRef, FileRef, SectionSummary, TagInfo, AUX_RECORD_SIZE};
pub use entry::{
    BoundaryDetail, DataAux, EosDetail, FileDetail, RawSymbol, StorageClass, SymbolDetail,
    SymbolEntry, TagDetail,
};

/// Size of one symbol record (and one table slot) in bytes.
pub const SYMBOL_RECORD_SIZE: usize = 20;

/// Read-only view of the tables symbol decoding depends on.
///
/// Threaded explicitly into every constructor; the decoder has no ambient
/// state. Lifetime is scoped to one file's decode session.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a>
{
    /// For indirect names and `C_FILE` name offsets.
    pub strings: &'a StringTable,
    /// For contextual validation of section references.
    pub sections: &'a SectionTable,
}

/// The loaded symbol table, keyed by (non-contiguous) table index.
#[derive(Debug, Default)]
pub struct SymbolTable
{
    entries: BTreeMap<u32, SymbolEntry>,
}

impl SymbolTable
{
    /// Decode the whole symbol stream.
    ///
    /// Iterates from slot 0 to `num_symbols`, decoding one entry, storing it
    /// under its own index, then skipping the slots its auxiliary records
    /// consumed. Any structural violation aborts the load — there is no
    /// per-record recovery.
    pub fn load<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        header: &FileHeader,
        ctx: &DecodeContext<'_>,
    ) -> CoffResult<Self>
    {
        reader.seek_to(u64::from(header.symbol_table_ptr))?;

        let mut entries = BTreeMap::new();
        let mut index = 0u32;
        while index < header.num_symbols {
            let raw = RawSymbol::read(reader, index, ctx)?;
            let aux_count = raw.aux_count;

            if u64::from(index) + 1 + u64::from(aux_count) > u64::from(header.num_symbols) {
                return Err(CoffError::MalformedRecord(format!(
                    "symbol {index} declares {aux_count} auxiliary records past the table end"
                )));
            }
            let aux = if aux_count > 0 {
                // The per-class expectation (checked in build) never exceeds
                // one record; surplus declarations fail there, but the slots
                // still have to be consumed to report the right error.
                let mut records = Vec::with_capacity(aux_count as usize);
                for _ in 0..aux_count {
                    records.push(AuxRecord::read(reader)?);
                }
                records.into_iter().next()
            } else {
                None
            };

            let entry = SymbolEntry::build(raw, aux, ctx)?;
            entries.insert(index, entry);
            index += 1 + u32::from(aux_count);
        }

        debug!(symbols = entries.len(), slots = header.num_symbols, "loaded symbol table");
        Ok(Self { entries })
    }

    /// Look up an entry by table index. Absent indices (auxiliary slots,
    /// dangling references) yield `None`, never an error.
    pub fn get(&self, index: u32) -> Option<&SymbolEntry>
    {
        self.entries.get(&index)
    }

    /// The name of the symbol at `index`, if one lives there.
    pub fn name_of(&self, index: u32) -> Option<&str>
    {
        self.get(index).map(|entry| entry.name.as_str())
    }

    /// Iterate entries in table-index order.
    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry>
    {
        self.entries.values()
    }

    /// Number of decoded entries (auxiliary slots not counted).
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}
