//! Relocation entries.
//!
//! Fixed 12-byte per-section records. They reference symbols by table index
//! but carry no cross-referencing logic of their own; the renderer resolves
//! the index opportunistically.

use std::io::{Read, Seek};

use crate::error::CoffResult;
use crate::reader::RecordReader;

/// Size of one relocation entry in bytes.
pub const RELOC_ENTRY_SIZE: u16 = 12;

/// The PIC18 linker relocation kinds.
///
/// Values are the processor-specific type tags emitted by the MPLAB
/// toolchain. The set is closed here; values outside it are kept raw and
/// rendered as `unknown(<n>)` — a strange side-table tag is display data,
/// not a structural violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RelocKind
{
    Call,
    Goto,
    High,
    Low,
    P,
    BankSel,
    PageSel,
    All,
    IBankSel,
    F,
    Tris,
    Movlr,
    Movlb,
    Goto2,
    Ff1,
    Ff2,
    Lfsr1,
    Lfsr2,
    BraRcall,
    CondBra,
    Upper,
    Access,
    PageSelWreg,
    PageSelBits,
    ScnszLow,
    ScnszHigh,
    ScnszUpper,
    ScnendLow,
    ScnendHigh,
    ScnendUpper,
    ScnendLsb,
    ScnszLsb,
    Tris3Bit,
}

impl RelocKind
{
    /// Map a raw type tag to its kind, if defined.
    pub fn from_raw(raw: u16) -> Option<Self>
    {
        use RelocKind::*;
        Some(match raw {
            1 => Call,
            2 => Goto,
            3 => High,
            4 => Low,
            5 => P,
            6 => BankSel,
            7 => PageSel,
            8 => All,
            9 => IBankSel,
            10 => F,
            11 => Tris,
            12 => Movlr,
            13 => Movlb,
            14 => Goto2,
            15 => Ff1,
            16 => Ff2,
            17 => Lfsr1,
            18 => Lfsr2,
            19 => BraRcall,
            20 => CondBra,
            21 => Upper,
            22 => Access,
            23 => PageSelWreg,
            24 => PageSelBits,
            25 => ScnszLow,
            26 => ScnszHigh,
            27 => ScnszUpper,
            28 => ScnendLow,
            29 => ScnendHigh,
            30 => ScnendUpper,
            31 => ScnendLsb,
            32 => ScnszLsb,
            33 => Tris3Bit,
            _ => return None,
        })
    }

    /// Display name of the kind.
    pub fn name(&self) -> &'static str
    {
        use RelocKind::*;
        match self {
            Call => "CALL",
            Goto => "GOTO",
            High => "HIGH",
            Low => "LOW",
            P => "P",
            BankSel => "BANKSEL",
            PageSel => "PAGESEL",
            All => "ALL",
            IBankSel => "IBANKSEL",
            F => "F",
            Tris => "TRIS",
            Movlr => "MOVLR",
            Movlb => "MOVLB",
            Goto2 => "GOTO2",
            Ff1 => "FF1",
            Ff2 => "FF2",
            Lfsr1 => "LFSR1",
            Lfsr2 => "LFSR2",
            BraRcall => "BRA_RCALL",
            CondBra => "CONDBRA",
            Upper => "UPPER",
            Access => "ACCESS",
            PageSelWreg => "PAGESEL_WREG",
            PageSelBits => "PAGESEL_BITS",
            ScnszLow => "SCNSZ_LOW",
            ScnszHigh => "SCNSZ_HIGH",
            ScnszUpper => "SCNSZ_UPPER",
            ScnendLow => "SCNEND_LOW",
            ScnendHigh => "SCNEND_HIGH",
            ScnendUpper => "SCNEND_UPPER",
            ScnendLsb => "SCNEND_LSB",
            ScnszLsb => "SCNSZ_LSB",
            Tris3Bit => "TRIS_3BIT",
        }
    }
}

/// One 12-byte relocation record.
#[derive(Debug, Clone)]
pub struct RelocEntry
{
    /// Virtual address the relocation patches.
    pub virtual_address: u32,
    /// Table index of the referenced symbol.
    pub symbol_index: u32,
    /// Signed addend applied to the symbol value.
    pub offset: i16,
    /// Raw relocation type tag.
    pub reloc_type: u16,
}

impl RelocEntry
{
    fn read<R: Read + Seek>(reader: &mut RecordReader<R>) -> CoffResult<Self>
    {
        Ok(Self {
            virtual_address: reader.read_u32("relocation entry")?,
            symbol_index: reader.read_u32("relocation entry")?,
            offset: reader.read_i16("relocation entry")?,
            reloc_type: reader.read_u16("relocation entry")?,
        })
    }

    /// Read a section's relocation table from its file-offset pointer.
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

    /// The decoded kind, if the raw tag is in the defined set.
    pub fn kind(&self) -> Option<RelocKind>
    {
        RelocKind::from_raw(self.reloc_type)
    }

    /// Display name for the type tag, falling back to `unknown(<n>)`.
    pub fn kind_name(&self) -> String
    {
        match self.kind() {
            Some(kind) => kind.name().to_string(),
            None => format!("unknown({})", self.reloc_type),
        }
    }
}
