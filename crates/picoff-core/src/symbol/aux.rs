//! Auxiliary entry projections.
//!
//! An auxiliary record is a fixed 20-byte buffer trailing its owning symbol
//! record. Its bytes mean different things depending on that symbol's
//! storage class, so the raw buffer is kept and reinterpreted through the
//! typed projections below. The raw form stays available as a rendering
//! fallback for shapes that are not modeled.

use std::fmt::Write as _;
use std::io::{Read, Seek};

use crate::error::CoffResult;
use crate::reader::RecordReader;

/// Size of one auxiliary record in bytes.
pub const AUX_RECORD_SIZE: usize = 20;

/// Callee index value marking an indirect (register) call.
pub const CALLEE_INDIRECT: u32 = 0xffff_ffff;

/// A raw 20-byte auxiliary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxRecord
{
    bytes: [u8; AUX_RECORD_SIZE],
}

impl AuxRecord
{
    /// Wrap a raw buffer.
    pub fn new(bytes: [u8; AUX_RECORD_SIZE]) -> Self
    {
        Self { bytes }
    }

    /// Read one record from the symbol stream.
    pub fn read<R: Read + Seek>(reader: &mut RecordReader<R>) -> CoffResult<Self>
    {
        let mut bytes = [0u8; AUX_RECORD_SIZE];
        reader.read_bytes(&mut bytes, "auxiliary entry")?;
        Ok(Self { bytes })
    }

    fn u8_at(&self, offset: usize) -> u8
    {
        self.bytes[offset]
    }

    fn u16_at(&self, offset: usize) -> u16
    {
        u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn u32_at(&self, offset: usize) -> u32
    {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }

    /// Tag symbol index at offset 0, shared by several projections.
    pub fn tag_index(&self) -> u32
    {
        self.u32_at(0)
    }

    /// The `k`-th 16-bit array dimension (k = 0..3), stored at offset
    /// `8 + 2k`.
    pub fn array_dimension(&self, k: usize) -> u16
    {
        debug_assert!(k < 4);
        self.u16_at(8 + 2 * k)
    }

    /// Render the raw bytes as two 10-byte hex rows.
    pub fn hex_rows(&self) -> (String, String)
    {
        let row = |slice: &[u8]| {
            let mut out = String::with_capacity(slice.len() * 3);
            for byte in slice {
                let _ = write!(out, "{byte:02x} ");
            }
            out.trim_end().to_string()
        };
        (row(&self.bytes[..10]), row(&self.bytes[10..]))
    }
}

/// Call-graph reference carried by function symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallRef
{
    /// Table index of the callee, or [`CALLEE_INDIRECT`].
    pub callee_index: u32,
    /// Interrupt priority marker: 0 none, 1 low, 2 high.
    pub interrupt_priority: u32,
}

impl CallRef
{
    pub fn from_aux(aux: &AuxRecord) -> Self
    {
        Self {
            callee_index: aux.u32_at(0),
            interrupt_priority: aux.u32_at(4),
        }
    }

    /// The callee's symbol index, unless the call is indirect.
    pub fn callee(&self) -> Option<u32>
    {
        (self.callee_index != CALLEE_INDIRECT).then_some(self.callee_index)
    }
}

/// Type detail for tags, end-of-struct markers, and tagged or array
/// variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo
{
    /// Table index of the tag symbol (for variables and C_EOS).
    pub tag_index: u32,
    /// Declaration line number.
    pub line_number: u16,
    /// Size of the struct/union/enum or array in bytes.
    pub size: u16,
    /// Up to four array dimensions.
    pub dimensions: [u16; 4],
    /// Forward link to the next entry past this tag's members.
    pub end_index: u32,
}

impl TagInfo
{
    pub fn from_aux(aux: &AuxRecord) -> Self
    {
        Self {
            tag_index: aux.u32_at(0),
            line_number: aux.u16_at(4),
            size: aux.u16_at(6),
            dimensions: [
                aux.array_dimension(0),
                aux.array_dimension(1),
                aux.array_dimension(2),
                aux.array_dimension(3),
            ],
            end_index: aux.u32_at(12),
        }
    }
}

/// Begin/end pairing data for block and function boundary symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBounds
{
    /// Source line of the boundary.
    pub line_number: u16,
    /// Forward link to the matching end symbol (begin form only).
    pub end_index: u32,
}

impl BlockBounds
{
    pub fn from_aux(aux: &AuxRecord) -> Self
    {
        Self {
            line_number: aux.u16_at(4),
            end_index: aux.u32_at(12),
        }
    }
}

/// File-inclusion data for `C_FILE` symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRef
{
    /// String-table offset of the source file name.
    pub name_offset: u32,
    /// Line at which the file was included.
    pub include_line: u32,
    /// Flag byte.
    pub flags: u8,
}

impl FileRef
{
    pub fn from_aux(aux: &AuxRecord) -> Self
    {
        Self {
            name_offset: aux.u32_at(0),
            include_line: aux.u32_at(4),
            flags: aux.u8_at(8),
        }
    }
}

/// Section summary carried by `C_SECTION` symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSummary
{
    /// Section length in bytes.
    pub length: u32,
    /// Number of relocation entries.
    pub num_relocs: u16,
    /// Number of line-number entries.
    pub num_linenos: u16,
}

impl SectionSummary
{
    pub fn from_aux(aux: &AuxRecord) -> Self
    {
        Self {
            length: aux.u32_at(0),
            num_relocs: aux.u16_at(4),
            num_linenos: aux.u16_at(6),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn record(fill: impl Fn(&mut [u8; AUX_RECORD_SIZE])) -> AuxRecord
    {
        let mut bytes = [0u8; AUX_RECORD_SIZE];
        fill(&mut bytes);
        AuxRecord::new(bytes)
    }

    #[test]
    fn test_call_ref_projection()
    {
        let aux = record(|b| {
            b[..4].copy_from_slice(&17u32.to_le_bytes());
            b[4..8].copy_from_slice(&2u32.to_le_bytes());
        });
        let call = CallRef::from_aux(&aux);
        assert_eq!(call.callee(), Some(17));
        assert_eq!(call.interrupt_priority, 2);
    }

    #[test]
    fn test_indirect_callee()
    {
        let aux = record(|b| b[..4].copy_from_slice(&CALLEE_INDIRECT.to_le_bytes()));
        assert_eq!(CallRef::from_aux(&aux).callee(), None);
    }

    #[test]
    fn test_tag_info_offsets()
    {
        let aux = record(|b| {
            b[..4].copy_from_slice(&9u32.to_le_bytes());
            b[4..6].copy_from_slice(&44u16.to_le_bytes());
            b[6..8].copy_from_slice(&12u16.to_le_bytes());
            b[8..10].copy_from_slice(&3u16.to_le_bytes());
            b[12..16].copy_from_slice(&20u32.to_le_bytes());
        });
        let info = TagInfo::from_aux(&aux);
        assert_eq!(info.tag_index, 9);
        assert_eq!(info.line_number, 44);
        assert_eq!(info.size, 12);
        assert_eq!(info.dimensions[0], 3);
        assert_eq!(info.end_index, 20);
    }

    #[test]
    fn test_hex_rows_fallback()
    {
        let aux = record(|b| b[0] = 0xab);
        let (first, second) = aux.hex_rows();
        assert_eq!(first, "ab 00 00 00 00 00 00 00 00 00");
        assert_eq!(second, "00 00 00 00 00 00 00 00 00 00");
    }
}
