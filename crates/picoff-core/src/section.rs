//! Section table and section-number resolution.
//!
//! One 40-byte header per declared section, materialized in full before any
//! symbol is decoded (symbol validation needs random access to the table).
//! Each section's relocation and line-number side tables are loaded eagerly
//! from their file-offset pointers in the same pass.

use std::fmt;
use std::io::{Read, Seek};

use tracing::debug;

use crate::error::{CoffError, CoffResult};
use crate::header::{FileHeader, FILE_HEADER_SIZE};
use crate::lineno::LineNumberEntry;
use crate::reader::RecordReader;
use crate::reloc::RelocEntry;
use crate::strings::StringTable;

/// Size of one section header record in bytes.
pub const SECTION_HEADER_SIZE: u16 = 40;

// Reserved section numbers.
pub const N_SYNFILE: i16 = -3; // synthetic per-file section
pub const N_DEBUG: i16 = -2; // debugging symbol
pub const N_ABS: i16 = -1; // absolute value, not an address
pub const N_UNDEF: i16 = 0; // undefined external

// Section type/qualifier flag bits.
pub const STYP_TEXT: u32 = 0x00020;
pub const STYP_DATA: u32 = 0x00040;
pub const STYP_BSS: u32 = 0x00080;
pub const STYP_DATA_ROM: u32 = 0x00100;
pub const STYP_ABS: u32 = 0x01000;
pub const STYP_SHARED: u32 = 0x02000;
pub const STYP_OVERLAID: u32 = 0x04000;
pub const STYP_ACCESS: u32 = 0x08000;
pub const STYP_ACTREC: u32 = 0x10000;

/// The 40-byte section header record.
///
/// Physical and virtual address are always equal in this format; both are
/// kept because the record stores both.
#[derive(Debug, Clone)]
pub struct SectionHeader
{
    /// Resolved section name.
    pub name: String,
    /// Physical address of the section.
    pub physical_address: u32,
    /// Virtual address of the section (equals the physical address).
    pub virtual_address: u32,
    /// Section size in bytes.
    pub size: u32,
    /// File offset of the raw section data.
    pub data_ptr: u32,
    /// File offset of the relocation entries.
    pub reloc_ptr: u32,
    /// File offset of the line-number entries.
    pub lineno_ptr: u32,
    /// Number of relocation entries.
    pub num_relocs: u16,
    /// Number of line-number entries.
    pub num_linenos: u16,
    /// Type and qualifier flag bits, see the `STYP_*` constants.
    pub flags: u32,
}

impl SectionHeader
{
    fn read<R: Read + Seek>(reader: &mut RecordReader<R>, strings: &StringTable) -> CoffResult<Self>
    {
        let name = reader.read_packed_name("section header")?;
        Ok(Self {
            name: strings.resolve(&name),
            physical_address: reader.read_u32("section header")?,
            virtual_address: reader.read_u32("section header")?,
            size: reader.read_u32("section header")?,
            data_ptr: reader.read_u32("section header")?,
            reloc_ptr: reader.read_u32("section header")?,
            lineno_ptr: reader.read_u32("section header")?,
            num_relocs: reader.read_u16("section header")?,
            num_linenos: reader.read_u16("section header")?,
            flags: reader.read_u32("section header")?,
        })
    }

    /// Decode the type flags into their symbolic names.
    pub fn flag_names(&self) -> Vec<&'static str>
    {
        let mut names = Vec::new();
        for (bit, name) in [
            (STYP_TEXT, "TEXT"),
            (STYP_DATA, "DATA"),
            (STYP_BSS, "BSS"),
            (STYP_DATA_ROM, "DATA_ROM"),
            (STYP_ABS, "ABS"),
            (STYP_SHARED, "SHARED"),
            (STYP_OVERLAID, "OVERLAID"),
            (STYP_ACCESS, "ACCESS"),
            (STYP_ACTREC, "ACTREC"),
        ] {
            if self.flags & bit != 0 {
                names.push(name);
            }
        }
        names
    }
}

/// One loaded section: its header plus the side tables it owns.
#[derive(Debug, Clone)]
pub struct Section
{
    /// The decoded header record.
    pub header: SectionHeader,
    /// Relocation entries for this section.
    pub relocations: Vec<RelocEntry>,
    /// Line-number entries for this section.
    pub line_numbers: Vec<LineNumberEntry>,
}

/// A resolved view of a raw signed section number.
///
/// Not stored anywhere — recomputed on demand each time a symbol needs to
/// reason about its owning section.
#[derive(Debug, Clone, Copy)]
pub enum SectionRef<'a>
{
    /// `-1`: the value is absolute, not an address in any section.
    Absolute,
    /// `-2`: the symbol is debugging information.
    Debug,
    /// `-3`: synthetic per-file section.
    SyntheticFile,
    /// `0`: undefined external, to be resolved at link time.
    Undefined,
    /// `n > 0`: a concrete row of the section table.
    Concrete(&'a Section),
}

impl SectionRef<'_>
{
    pub fn is_absolute(&self) -> bool
    {
        matches!(self, SectionRef::Absolute)
    }

    pub fn is_debug(&self) -> bool
    {
        matches!(self, SectionRef::Debug)
    }

    pub fn is_synthetic_file(&self) -> bool
    {
        matches!(self, SectionRef::SyntheticFile)
    }
}

impl fmt::Display for SectionRef<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            SectionRef::Absolute => write!(f, "<absolute>"),
            SectionRef::Debug => write!(f, "<debug>"),
            SectionRef::SyntheticFile => write!(f, "<file>"),
            SectionRef::Undefined => write!(f, "<undefined>"),
            SectionRef::Concrete(section) => write!(f, "{}", section.header.name),
        }
    }
}

/// Ordered list of loaded sections, referenced 1-based.
#[derive(Debug, Default)]
pub struct SectionTable
{
    sections: Vec<Section>,
}

impl SectionTable
{
    /// Load all section headers and their side tables.
    ///
    /// Headers sit directly after the optional header; the loop advances by
    /// the fixed record size per entry. Side tables are read afterwards so
    /// the sequential header scan is never interrupted by seeks.
    pub fn load<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        file_header: &FileHeader,
        strings: &StringTable,
    ) -> CoffResult<Self>
    {
        reader.seek_to(u64::from(FILE_HEADER_SIZE) + u64::from(file_header.opt_header_size))?;

        let mut headers = Vec::with_capacity(file_header.num_sections as usize);
        for _ in 0..file_header.num_sections {
            headers.push(SectionHeader::read(reader, strings)?);
        }

        let mut sections = Vec::with_capacity(headers.len());
        for header in headers {
            let relocations = RelocEntry::load_table(reader, header.reloc_ptr, header.num_relocs)?;
            let line_numbers =
                LineNumberEntry::load_table(reader, header.lineno_ptr, header.num_linenos)?;
            sections.push(Section { header, relocations, line_numbers });
        }

        debug!(sections = sections.len(), "loaded section table");
        Ok(Self { sections })
    }

    /// Resolve a raw signed section number to its semantic meaning.
    ///
    /// ## Errors
    ///
    /// [`CoffError::InvalidSectionNumber`] for positive numbers past the end
    /// of the table. The reserved values and zero always resolve.
    pub fn resolve(&self, number: i16) -> CoffResult<SectionRef<'_>>
    {
        match number {
            N_SYNFILE => Ok(SectionRef::SyntheticFile),
            N_DEBUG => Ok(SectionRef::Debug),
            N_ABS => Ok(SectionRef::Absolute),
            N_UNDEF => Ok(SectionRef::Undefined),
            n if n > 0 => self
                .sections
                .get((n - 1) as usize)
                .map(SectionRef::Concrete)
                .ok_or(CoffError::InvalidSectionNumber { number: n, count: self.sections.len() }),
            n => Err(CoffError::InvalidSectionNumber { number: n, count: self.sections.len() }),
        }
    }

    /// Iterate the sections in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Section>
    {
        self.sections.iter()
    }

    /// Number of declared sections.
    pub fn len(&self) -> usize
    {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.sections.is_empty()
    }
}
