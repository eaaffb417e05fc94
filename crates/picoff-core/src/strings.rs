//! COFF string table.
//!
//! Long names don't fit the 8-byte packed name fields, so the format stores
//! them in a blob of NUL-terminated strings located directly after the symbol
//! table. Offsets into the blob count from the start of the table itself
//! (the 4-byte length prefix included), so the first string lives at offset 4
//! — the same convention a zero-prefixed packed name uses.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CoffResult;
use crate::header::FileHeader;
use crate::reader::{PackedName, RecordReader};
use crate::symbol::SYMBOL_RECORD_SIZE;

/// Offset-keyed table of NUL-terminated strings.
///
/// Built once during load and read-only afterwards. Lookups are deliberately
/// non-fatal: a dangling or zero offset renders as an empty string instead of
/// aborting the decode, since cross-references may legitimately be absent.
#[derive(Debug, Default)]
pub struct StringTable
{
    entries: HashMap<u32, String>,
}

impl StringTable
{
    /// Load the string table from its fixed location after the symbol table.
    ///
    /// A zero or absent length prefix yields an empty table, which is a valid
    /// state (files with only short names have no string table content).
    pub fn load<R: std::io::Read + std::io::Seek>(
        reader: &mut RecordReader<R>,
        header: &FileHeader,
    ) -> CoffResult<Self>
    {
        let start = u64::from(header.symbol_table_ptr)
            + u64::from(header.num_symbols) * SYMBOL_RECORD_SIZE as u64;
        reader.seek_to(start)?;

        // Files with no long names end right after the symbol table; treat a
        // missing length prefix as an empty table rather than truncation.
        let mut len_buf = [0u8; 4];
        if reader.read_bytes(&mut len_buf, "string table length").is_err() {
            return Ok(Self::default());
        }
        let total_len = u32::from_le_bytes(len_buf);
        if total_len <= 4 {
            return Ok(Self::default());
        }

        let mut blob = vec![0u8; (total_len - 4) as usize];
        reader.read_bytes(&mut blob, "string table")?;

        let mut entries = HashMap::new();
        let mut start_of_string = 0usize;
        for (pos, &byte) in blob.iter().enumerate() {
            if byte == 0 {
                let text = String::from_utf8_lossy(&blob[start_of_string..pos]).into_owned();
                entries.insert(4 + start_of_string as u32, text);
                start_of_string = pos + 1;
            }
        }
        // Trailing bytes without a terminator still name something.
        if start_of_string < blob.len() {
            let text = String::from_utf8_lossy(&blob[start_of_string..]).into_owned();
            entries.insert(4 + start_of_string as u32, text);
        }

        debug!(strings = entries.len(), bytes = total_len, "loaded string table");
        Ok(Self { entries })
    }

    /// Look up a string by its table offset.
    ///
    /// Unknown or zero offsets return `""`.
    pub fn get(&self, offset: u32) -> &str
    {
        self.entries.get(&offset).map_or("", String::as_str)
    }

    /// Resolve a packed name against this table.
    pub fn resolve(&self, name: &PackedName) -> String
    {
        match name {
            PackedName::Inline(text) => text.clone(),
            PackedName::Indirect(offset) => self.get(*offset).to_string(),
        }
    }

    /// Number of distinct strings in the table.
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// True when the file carried no string table content.
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<(u32, &str)>) -> Self
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.to_string())).collect(),
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::io::Cursor;

    use super::*;
    use crate::testutil::ImageBuilder;

    #[test]
    fn test_offsets_count_from_table_start()
    {
        let image = ImageBuilder::new().with_strings(&["main_entry_point", "interrupt_table"]).build();
        let mut reader = RecordReader::new(Cursor::new(image.bytes));
        let table = StringTable::load(&mut reader, &image.file_header).unwrap();

        // First string sits right after the 4-byte length prefix.
        assert_eq!(table.get(4), "main_entry_point");
        assert_eq!(table.get(4 + "main_entry_point".len() as u32 + 1), "interrupt_table");
    }

    #[test]
    fn test_unknown_offset_is_empty_not_fatal()
    {
        let table = StringTable::from_entries(vec![(4, "known")]);
        assert_eq!(table.get(999), "");
        assert_eq!(table.get(0), "");
    }

    #[test]
    fn test_packed_name_round_trip_via_table()
    {
        let image = ImageBuilder::new().with_strings(&["a_rather_long_symbol_name"]).build();
        let mut reader = RecordReader::new(Cursor::new(image.bytes));
        let table = StringTable::load(&mut reader, &image.file_header).unwrap();

        assert_eq!(table.resolve(&PackedName::Indirect(4)), "a_rather_long_symbol_name");
        assert_eq!(table.resolve(&PackedName::Inline("short".into())), "short");
    }

    #[test]
    fn test_missing_table_is_empty()
    {
        let image = ImageBuilder::new().build();
        let mut reader = RecordReader::new(Cursor::new(image.bytes));
        let table = StringTable::load(&mut reader, &image.file_header).unwrap();
        assert!(table.is_empty());
    }
}
