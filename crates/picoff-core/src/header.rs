//! File header and optional header records.
//!
//! Layout reference: Microchip COFF as emitted by the MPLAB C18 toolchain.
//! Both headers are fixed-size little-endian records at the start of the
//! file; the optional header's declared size doubles as a format check.

use std::io::{Read, Seek};

use crate::error::{CoffError, CoffResult};
use crate::processor::processor_display;
use crate::reader::RecordReader;

/// Magic number of a Microchip COFF file header.
pub const FILE_MAGIC: u16 = 0x1240;
/// Magic number of the optional header.
pub const OPT_MAGIC: u16 = 0x5678;
/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: u16 = 20;
/// Size of the optional header in bytes. The file header must declare
/// exactly this value for the file to be accepted.
pub const OPT_HEADER_SIZE: u16 = 18;

// File header flag bits.
pub const F_RELFLG: u16 = 0x0001; // relocation info stripped
pub const F_EXEC: u16 = 0x0002; // executable (no unresolved externals)
pub const F_LNNO: u16 = 0x0004; // line numbers stripped
pub const F_ABSOLUTE: u16 = 0x0010; // absolute (non-relocatable) code
pub const F_EXTENDED18: u16 = 0x4000; // PIC18 extended instruction set
pub const F_GENERIC: u16 = 0x8000; // processor-independent object

/// The 20-byte header at the start of every file.
#[derive(Debug, Clone)]
pub struct FileHeader
{
    /// Magic number, must equal [`FILE_MAGIC`].
    pub magic: u16,
    /// Number of entries in the section table.
    pub num_sections: u16,
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: u32,
    /// Byte offset of the symbol table.
    pub symbol_table_ptr: u32,
    /// Number of symbol-table entry slots (auxiliary records included).
    pub num_symbols: u32,
    /// Declared size of the optional header.
    pub opt_header_size: u16,
    /// Flag bits, see the `F_*` constants.
    pub flags: u16,
}

impl FileHeader
{
    /// Read the file header from offset 0 and validate the format markers.
    ///
    /// ## Errors
    ///
    /// [`CoffError::UnsupportedFormat`] when the magic or the declared
    /// optional-header size identify the file as something else entirely —
    /// this is the only check that runs before any table is loaded.
    pub fn load<R: Read + Seek>(reader: &mut RecordReader<R>) -> CoffResult<Self>
    {
        reader.seek_to(0)?;
        let header = Self {
            magic: reader.read_u16("file header")?,
            num_sections: reader.read_u16("file header")?,
            timestamp: reader.read_u32("file header")?,
            symbol_table_ptr: reader.read_u32("file header")?,
            num_symbols: reader.read_u32("file header")?,
            opt_header_size: reader.read_u16("file header")?,
            flags: reader.read_u16("file header")?,
        };

        if header.magic != FILE_MAGIC {
            return Err(CoffError::UnsupportedFormat(format!(
                "file magic 0x{:04x}, expected 0x{FILE_MAGIC:04x}",
                header.magic
            )));
        }
        if header.opt_header_size != OPT_HEADER_SIZE {
            return Err(CoffError::UnsupportedFormat(format!(
                "optional header size {}, expected {OPT_HEADER_SIZE}",
                header.opt_header_size
            )));
        }
        Ok(header)
    }

    /// Decode the flag bits into their symbolic names.
    pub fn flag_names(&self) -> Vec<&'static str>
    {
        let mut names = Vec::new();
        for (bit, name) in [
            (F_RELFLG, "RELFLG"),
            (F_EXEC, "EXEC"),
            (F_LNNO, "LNNO"),
            (F_ABSOLUTE, "ABSOLUTE"),
            (F_EXTENDED18, "EXTENDED18"),
            (F_GENERIC, "GENERIC"),
        ] {
            if self.flags & bit != 0 {
                names.push(name);
            }
        }
        names
    }
}

/// The 18-byte optional header that follows the file header.
#[derive(Debug, Clone)]
pub struct OptionalHeader
{
    /// Magic number, must equal [`OPT_MAGIC`].
    pub magic: u16,
    /// Tool version stamp, three parts packed into 32 bits.
    pub version_stamp: u32,
    /// Target processor code, see [`crate::processor`].
    pub processor_type: u32,
    /// Program-memory bus width in bits.
    pub rom_width_bits: u32,
    /// Data-memory bus width in bits.
    pub ram_width_bits: u32,
}

impl OptionalHeader
{
    /// Read the optional header from its fixed position after the file header.
    pub fn load<R: Read + Seek>(reader: &mut RecordReader<R>) -> CoffResult<Self>
    {
        reader.seek_to(u64::from(FILE_HEADER_SIZE))?;
        let header = Self {
            magic: reader.read_u16("optional header")?,
            version_stamp: reader.read_u32("optional header")?,
            processor_type: reader.read_u32("optional header")?,
            rom_width_bits: reader.read_u32("optional header")?,
            ram_width_bits: reader.read_u32("optional header")?,
        };

        if header.magic != OPT_MAGIC {
            return Err(CoffError::UnsupportedFormat(format!(
                "optional header magic 0x{:04x}, expected 0x{OPT_MAGIC:04x}",
                header.magic
            )));
        }
        Ok(header)
    }

    /// Split the packed version stamp into (major, minor, patch).
    pub fn version(&self) -> (u8, u8, u16)
    {
        let v = self.version_stamp;
        (((v >> 24) & 0xff) as u8, ((v >> 16) & 0xff) as u8, (v & 0xffff) as u16)
    }

    /// Human-readable processor name, falling back to
    /// `unknown processor (0x..)` for codes outside the catalog.
    pub fn processor(&self) -> String
    {
        processor_display(self.processor_type)
    }
}
