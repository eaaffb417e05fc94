//! Primitive record readers.
//!
//! Everything in a Microchip COFF file is little-endian and fixed-width, so
//! the whole decoder sits on a handful of integer reads plus the dual-encoding
//! "packed name" used by section headers and symbol records.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{CoffError, CoffResult};

/// Length of a packed name field in bytes.
pub const PACKED_NAME_SIZE: usize = 8;

/// An 8-byte name field, either inline ASCII or an indirection into the
/// string table.
///
/// If the first four bytes of the field are all zero, the remaining four
/// bytes hold a string-table offset. Otherwise the eight bytes are the name
/// itself, NUL-padded (all eight bytes are significant when no NUL occurs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedName
{
    /// Name stored inline in the record.
    Inline(String),
    /// Offset into the string table.
    Indirect(u32),
}

/// Cursor over a seekable COFF byte stream.
///
/// Each table loader repositions the reader to its own known start offset
/// before reading, so loaders never depend on where a previous loader left
/// the stream. A read that cannot supply the requested byte count reports
/// [`CoffError::MalformedRecord`] naming the record being decoded.
pub struct RecordReader<R>
{
    inner: R,
}

impl<R: Read + Seek> RecordReader<R>
{
    /// Wrap a seekable byte stream.
    pub fn new(inner: R) -> Self
    {
        Self { inner }
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R
    {
        self.inner
    }

    /// Reposition to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> CoffResult<()>
    {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Current absolute position.
    pub fn position(&mut self) -> CoffResult<u64>
    {
        Ok(self.inner.stream_position()?)
    }

    /// Read exactly `buf.len()` bytes; `what` names the record for errors.
    pub fn read_bytes(&mut self, buf: &mut [u8], what: &str) -> CoffResult<()>
    {
        self.inner.read_exact(buf).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                CoffError::MalformedRecord(format!("truncated file while reading {what}"))
            } else {
                CoffError::Io(err)
            }
        })
    }

    pub fn read_u8(&mut self, what: &str) -> CoffResult<u8>
    {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf, what)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self, what: &str) -> CoffResult<i8>
    {
        Ok(self.read_u8(what)? as i8)
    }

    pub fn read_u16(&mut self, what: &str) -> CoffResult<u16>
    {
        let mut buf = [0u8; 2];
        self.read_bytes(&mut buf, what)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_i16(&mut self, what: &str) -> CoffResult<i16>
    {
        Ok(self.read_u16(what)? as i16)
    }

    pub fn read_u32(&mut self, what: &str) -> CoffResult<u32>
    {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf, what)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read an 8-byte packed name field.
    pub fn read_packed_name(&mut self, what: &str) -> CoffResult<PackedName>
    {
        let mut buf = [0u8; PACKED_NAME_SIZE];
        self.read_bytes(&mut buf, what)?;
        Ok(decode_packed_name(&buf))
    }
}

/// Decode an 8-byte packed name buffer.
pub fn decode_packed_name(buf: &[u8; PACKED_NAME_SIZE]) -> PackedName
{
    if buf[..4] == [0, 0, 0, 0] {
        let offset = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        PackedName::Indirect(offset)
    } else {
        let len = buf.iter().position(|&b| b == 0).unwrap_or(PACKED_NAME_SIZE);
        PackedName::Inline(String::from_utf8_lossy(&buf[..len]).into_owned())
    }
}
