//! Line-number entries.
//!
//! Fixed 16-byte per-section records mapping code addresses back to source
//! lines. A flag bit marks entries that also name their owning function by
//! symbol index.

use std::io::{Read, Seek};

use crate::error::CoffResult;
use crate::reader::RecordReader;

/// Size of one line-number entry in bytes.
pub const LINENO_ENTRY_SIZE: u16 = 16;

/// Flag bit: the entry carries its owning function's symbol index.
pub const LINENO_HASFCN: u16 = 0x0001;

/// One 16-byte line-number record.
#[derive(Debug, Clone)]
pub struct LineNumberEntry
{
    /// Table index of the associated source-file symbol.
    pub symbol_index: u32,
    /// Source line number.
    pub line_number: u16,
    /// Code address the line maps to.
    pub address: u32,
    /// Flag bits, see [`LINENO_HASFCN`].
    pub flags: u16,
    /// Raw owning-function symbol index; meaningful only when flagged.
    pub function_index_raw: u32,
}

impl LineNumberEntry
{
    fn read<R: Read + Seek>(reader: &mut RecordReader<R>) -> CoffResult<Self>
    {
        Ok(Self {
            symbol_index: reader.read_u32("line number entry")?,
            line_number: reader.read_u16("line number entry")?,
            address: reader.read_u32("line number entry")?,
            flags: reader.read_u16("line number entry")?,
            function_index_raw: reader.read_u32("line number entry")?,
        })
    }

    /// Read a section's line-number table from its file-offset pointer.
    pub fn load_table<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        ptr: u32,
        count: u16,
    ) -> CoffResult<Vec<Self>>
    {
        if count == 0 || ptr == 0 {
            return Ok(Vec::new());
        }
        reader.seek_to(u64::from(ptr))?;
        (0..count).map(|_| Self::read(reader)).collect()
    }

    /// The owning function's symbol index, if the entry declares one.
    pub fn function_index(&self) -> Option<u32>
    {
        (self.flags & LINENO_HASFCN != 0).then_some(self.function_index_raw)
    }
}
