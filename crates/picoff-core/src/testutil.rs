//! Synthetic COFF image builder for tests.
//!
//! Assembles a complete little-endian file image in memory: file header,
//! optional header, section headers with their side tables, symbol stream,
//! and string table. Long names are moved to the string table automatically
//! so tests can state intent instead of juggling offsets.

use std::collections::HashMap;

use crate::header::{FileHeader, FILE_MAGIC, OPT_MAGIC};
use crate::reader::PACKED_NAME_SIZE;
use crate::symbol::aux::AUX_RECORD_SIZE;
use crate::symbol::StorageClass;

const FILE_HEADER_SIZE: usize = 20;
const OPT_HEADER_SIZE_BYTES: usize = 18;
const SECTION_HEADER_SIZE: usize = 40;

/// A built image plus the header the loaders will re-read from it.
pub struct Image
{
    pub bytes: Vec<u8>,
    pub file_header: FileHeader,
}

/// Declarative section description.
pub struct SectionSpec
{
    name: SectionName,
    address: u32,
    size: u32,
    flags: u32,
    relocs: Vec<(u32, u32, i16, u16)>,
    linenos: Vec<(u32, u16, u32, u16, u32)>,
}

enum SectionName
{
    Short(String),
    LongAt(u32),
}

impl SectionSpec
{
    pub fn named(name: &str) -> Self
    {
        Self {
            name: SectionName::Short(name.to_string()),
            address: 0,
            size: 0,
            flags: 0,
            relocs: Vec::new(),
            linenos: Vec::new(),
        }
    }

    /// Name via an explicit string-table offset (pair with `with_strings`).
    pub fn long_named(offset: u32) -> Self
    {
        let mut spec = Self::named("");
        spec.name = SectionName::LongAt(offset);
        spec
    }

    pub fn at(mut self, address: u32) -> Self
    {
        self.address = address;
        self
    }

    pub fn sized(mut self, size: u32) -> Self
    {
        self.size = size;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self
    {
        self.flags = flags;
        self
    }

    pub fn reloc(mut self, vaddr: u32, symbol: u32, offset: i16, reloc_type: u16) -> Self
    {
        self.relocs.push((vaddr, symbol, offset, reloc_type));
        self
    }

    pub fn lineno(mut self, symbol: u32, line: u16, addr: u32, flags: u16, fcn: u32) -> Self
    {
        self.linenos.push((symbol, line, addr, flags, fcn));
        self
    }
}

/// Declarative symbol description.
pub struct SymbolSpec
{
    name: String,
    value: u32,
    section_number: i16,
    type_word: u32,
    class: i8,
    aux: Vec<[u8; AUX_RECORD_SIZE]>,
    file_name: Option<String>,
}

impl SymbolSpec
{
    /// A symbol with no auxiliary records and a zero type word.
    pub fn plain(name: &str, class: StorageClass, section_number: i16) -> Self
    {
        Self {
            name: name.to_string(),
            value: 0,
            section_number,
            type_word: 0,
            class: class.raw(),
            aux: Vec::new(),
            file_name: None,
        }
    }

    /// A symbol with an arbitrary (possibly undefined) class byte.
    pub fn raw_class(name: &str, class: i8, section_number: i16) -> Self
    {
        let mut spec = Self::plain(name, StorageClass::Null, section_number);
        spec.class = class;
        spec
    }

    /// A block boundary with its pairing aux record.
    pub fn block(name: &str, line: u16, end_index: u32) -> Self
    {
        let mut aux = [0u8; AUX_RECORD_SIZE];
        aux[4..6].copy_from_slice(&line.to_le_bytes());
        aux[12..16].copy_from_slice(&end_index.to_le_bytes());
        let mut spec = Self::plain(name, StorageClass::Block, 0);
        spec.aux.push(aux);
        spec
    }

    /// An external function symbol with its call-graph aux record.
    pub fn function(name: &str, section_number: i16, callee: u32, interrupt: u32) -> Self
    {
        let mut aux = [0u8; AUX_RECORD_SIZE];
        aux[..4].copy_from_slice(&callee.to_le_bytes());
        aux[4..8].copy_from_slice(&interrupt.to_le_bytes());
        let mut spec = Self::plain(name, StorageClass::External, section_number);
        // int f(): base int with one function derivation.
        spec.type_word = 4 | (2 << 5);
        spec.aux.push(aux);
        spec
    }

    /// A struct/union/enum tag with an empty tag aux record.
    pub fn tag(name: &str, class: StorageClass, section_number: i16) -> Self
    {
        let mut spec = Self::plain(name, class, section_number);
        spec.aux.push([0u8; AUX_RECORD_SIZE]);
        spec
    }

    /// A `.file` marker; the file name goes through the string table.
    pub fn file(name: &str, file_name: &str) -> Self
    {
        let mut spec = Self::plain(name, StorageClass::File, crate::section::N_DEBUG);
        spec.file_name = Some(file_name.to_string());
        spec.aux.push([0u8; AUX_RECORD_SIZE]);
        spec
    }

    pub fn valued(mut self, value: u32) -> Self
    {
        self.value = value;
        self
    }

    pub fn typed(mut self, type_word: u32) -> Self
    {
        self.type_word = type_word;
        self
    }

    pub fn with_aux_bytes(mut self, bytes: [u8; AUX_RECORD_SIZE]) -> Self
    {
        self.aux = vec![bytes];
        self
    }

    /// Reuse the current aux layout under the function-boundary class.
    pub fn function_class(mut self) -> Self
    {
        self.class = StorageClass::Function.raw();
        self
    }

    /// Drop all auxiliary records (to declare fewer than required).
    pub fn no_aux(mut self) -> Self
    {
        self.aux.clear();
        self
    }

    /// Append a surplus zero record (to declare more than required).
    pub fn extra_aux(mut self) -> Self
    {
        self.aux.push([0u8; AUX_RECORD_SIZE]);
        self
    }
}

/// Builder assembling the byte image.
pub struct ImageBuilder
{
    file_magic: u16,
    opt_magic: u16,
    opt_header_size: u16,
    file_flags: u16,
    version_stamp: u32,
    processor: u32,
    strings: Vec<String>,
    sections: Vec<SectionSpec>,
    symbols: Vec<SymbolSpec>,
}

impl ImageBuilder
{
    pub fn new() -> Self
    {
        Self {
            file_magic: FILE_MAGIC,
            opt_magic: OPT_MAGIC,
            opt_header_size: OPT_HEADER_SIZE_BYTES as u16,
            file_flags: 0,
            version_stamp: 0x0103_0014,
            processor: 0x9452,
            strings: Vec::new(),
            sections: Vec::new(),
            symbols: Vec::new(),
        }
    }

    pub fn with_file_magic(mut self, magic: u16) -> Self
    {
        self.file_magic = magic;
        self
    }

    pub fn with_opt_magic(mut self, magic: u16) -> Self
    {
        self.opt_magic = magic;
        self
    }

    pub fn with_opt_header_size(mut self, size: u16) -> Self
    {
        self.opt_header_size = size;
        self
    }

    pub fn with_file_flags(mut self, flags: u16) -> Self
    {
        self.file_flags = flags;
        self
    }

    pub fn with_version_stamp(mut self, stamp: u32) -> Self
    {
        self.version_stamp = stamp;
        self
    }

    pub fn with_processor(mut self, code: u32) -> Self
    {
        self.processor = code;
        self
    }

    pub fn with_strings(mut self, strings: &[&str]) -> Self
    {
        self.strings.extend(strings.iter().map(|s| (*s).to_string()));
        self
    }

    pub fn with_section(mut self, section: SectionSpec) -> Self
    {
        self.sections.push(section);
        self
    }

    pub fn with_symbol(mut self, symbol: SymbolSpec) -> Self
    {
        self.symbols.push(symbol);
        self
    }

    pub fn build(mut self) -> Image
    {
        // Collect every string the image needs: explicit ones first, then
        // file names and any name too long for its 8-byte field.
        let mut table: Vec<String> = self.strings.clone();
        let mut ensure = |table: &mut Vec<String>, s: &str| {
            if !table.iter().any(|existing| existing == s) {
                table.push(s.to_string());
            }
        };
        for symbol in &self.symbols {
            if let Some(file_name) = &symbol.file_name {
                ensure(&mut table, file_name);
            }
            if symbol.name.len() > PACKED_NAME_SIZE {
                ensure(&mut table, &symbol.name);
            }
        }
        for section in &self.sections {
            if let SectionName::Short(name) = &section.name {
                if name.len() > PACKED_NAME_SIZE {
                    ensure(&mut table, name);
                }
            }
        }

        let mut offsets: HashMap<String, u32> = HashMap::new();
        let mut next_offset = 4u32;
        for s in &table {
            offsets.insert(s.clone(), next_offset);
            next_offset += s.len() as u32 + 1;
        }

        let num_sections = self.sections.len() as u16;
        let num_symbols: u32 = self.symbols.iter().map(|s| 1 + s.aux.len() as u32).sum();

        let sections_start = FILE_HEADER_SIZE + self.opt_header_size as usize;
        let side_tables_start = sections_start + self.sections.len() * SECTION_HEADER_SIZE;

        // Assign side-table offsets section by section.
        let mut cursor = side_tables_start;
        let mut reloc_ptrs = Vec::new();
        let mut lineno_ptrs = Vec::new();
        for section in &self.sections {
            reloc_ptrs.push(if section.relocs.is_empty() { 0 } else { cursor as u32 });
            cursor += section.relocs.len() * 12;
            lineno_ptrs.push(if section.linenos.is_empty() { 0 } else { cursor as u32 });
            cursor += section.linenos.len() * 16;
        }
        let symbol_table_ptr = cursor as u32;

        let file_header = FileHeader {
            magic: self.file_magic,
            num_sections,
            timestamp: 0x3b9a_ca00,
            symbol_table_ptr,
            num_symbols,
            opt_header_size: self.opt_header_size,
            flags: self.file_flags,
        };

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&file_header.magic.to_le_bytes());
        bytes.extend_from_slice(&file_header.num_sections.to_le_bytes());
        bytes.extend_from_slice(&file_header.timestamp.to_le_bytes());
        bytes.extend_from_slice(&file_header.symbol_table_ptr.to_le_bytes());
        bytes.extend_from_slice(&file_header.num_symbols.to_le_bytes());
        bytes.extend_from_slice(&file_header.opt_header_size.to_le_bytes());
        bytes.extend_from_slice(&file_header.flags.to_le_bytes());

        bytes.extend_from_slice(&self.opt_magic.to_le_bytes());
        bytes.extend_from_slice(&self.version_stamp.to_le_bytes());
        bytes.extend_from_slice(&self.processor.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes()); // ROM width bits
        bytes.extend_from_slice(&8u32.to_le_bytes()); // RAM width bits
        // Tests may declare a nonstandard optional-header size; pad to it.
        bytes.resize(FILE_HEADER_SIZE + self.opt_header_size as usize, 0);

        let packed = |name: &SectionName| -> [u8; PACKED_NAME_SIZE] {
            match name {
                SectionName::Short(text) => encode_name(text, &offsets),
                SectionName::LongAt(offset) => {
                    let mut buf = [0u8; PACKED_NAME_SIZE];
                    buf[4..].copy_from_slice(&offset.to_le_bytes());
                    buf
                }
            }
        };

        for (i, section) in self.sections.iter().enumerate() {
            bytes.extend_from_slice(&packed(&section.name));
            bytes.extend_from_slice(&section.address.to_le_bytes());
            bytes.extend_from_slice(&section.address.to_le_bytes());
            bytes.extend_from_slice(&section.size.to_le_bytes());
            bytes.extend_from_slice(&0u32.to_le_bytes()); // raw data pointer
            bytes.extend_from_slice(&reloc_ptrs[i].to_le_bytes());
            bytes.extend_from_slice(&lineno_ptrs[i].to_le_bytes());
            bytes.extend_from_slice(&(section.relocs.len() as u16).to_le_bytes());
            bytes.extend_from_slice(&(section.linenos.len() as u16).to_le_bytes());
            bytes.extend_from_slice(&section.flags.to_le_bytes());
        }

        for section in &self.sections {
            for (vaddr, symbol, offset, reloc_type) in &section.relocs {
                bytes.extend_from_slice(&vaddr.to_le_bytes());
                bytes.extend_from_slice(&symbol.to_le_bytes());
                bytes.extend_from_slice(&offset.to_le_bytes());
                bytes.extend_from_slice(&reloc_type.to_le_bytes());
            }
            for (symbol, line, addr, flags, fcn) in &section.linenos {
                bytes.extend_from_slice(&symbol.to_le_bytes());
                bytes.extend_from_slice(&line.to_le_bytes());
                bytes.extend_from_slice(&addr.to_le_bytes());
                bytes.extend_from_slice(&flags.to_le_bytes());
                bytes.extend_from_slice(&fcn.to_le_bytes());
            }
        }

        debug_assert_eq!(bytes.len(), symbol_table_ptr as usize);
        for symbol in &mut self.symbols {
            // C_FILE symbols carry their file name in the aux record as a
            // string-table offset.
            if let (Some(file_name), Some(first)) = (&symbol.file_name, symbol.aux.first_mut()) {
                let offset = offsets[file_name.as_str()];
                first[..4].copy_from_slice(&offset.to_le_bytes());
            }
            bytes.extend_from_slice(&encode_name(&symbol.name, &offsets));
            bytes.extend_from_slice(&symbol.value.to_le_bytes());
            bytes.extend_from_slice(&symbol.section_number.to_le_bytes());
            bytes.extend_from_slice(&symbol.type_word.to_le_bytes());
            bytes.push(symbol.class as u8);
            bytes.push(symbol.aux.len() as u8);
            for record in &symbol.aux {
                bytes.extend_from_slice(record);
            }
        }

        if !table.is_empty() {
            let blob: Vec<u8> = table.iter().flat_map(|s| {
                let mut v = s.as_bytes().to_vec();
                v.push(0);
                v
            }).collect();
            bytes.extend_from_slice(&(blob.len() as u32 + 4).to_le_bytes());
            bytes.extend_from_slice(&blob);
        }

        Image { bytes, file_header }
    }
}

impl Default for ImageBuilder
{
    fn default() -> Self
    {
        Self::new()
    }
}

fn encode_name(name: &str, offsets: &HashMap<String, u32>) -> [u8; PACKED_NAME_SIZE]
{
    let mut buf = [0u8; PACKED_NAME_SIZE];
    if name.len() > PACKED_NAME_SIZE {
        buf[4..].copy_from_slice(&offsets[name].to_le_bytes());
    } else {
        buf[..name.len()].copy_from_slice(name.as_bytes());
    }
    buf
}
