//! # Error Types
//!
//! General error handling for the COFF decoder.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for COFF decoding operations
///
/// Every variant is fatal for the file being decoded: the loader builds a
/// complete model or none at all. A single malformed symbol invalidates the
/// whole table.
///
/// Lookup-style queries (string-by-offset, symbol-by-index) deliberately do
/// *not* use this type — an absent cross-reference is a legitimate state
/// during rendering and surfaces as an empty value instead.
#[derive(Error, Debug)]
pub enum CoffError
{
    /// The file is not a Microchip COFF object of the supported flavor
    ///
    /// Raised before any table is loaded when:
    /// - the file-header magic is not `0x1240`
    /// - the optional-header magic is not `0x5678`
    /// - the declared optional-header size is not the fixed 18 bytes
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A fixed-size record could not be decoded as declared
    ///
    /// Raised when the stream ends mid-record (truncated file), when a
    /// symbol declares an auxiliary-record count different from what its
    /// storage class requires, or when the type word carries derived-type
    /// bits outside the defined operator set.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A symbol's fields contradict its storage class's structural rules
    ///
    /// Examples: a block-boundary symbol whose name is not one of the
    /// `.bb`/`.eb` sentinels, an automatic variable outside the absolute
    /// section, or a struct tag outside the debug section.
    #[error("symbol {index}: {reason}")]
    InvalidSymbolContext
    {
        /// Table index of the offending symbol
        index: u32,
        /// What rule was violated
        reason: String,
    },

    /// A positive section number points past the end of the section table
    #[error("invalid section number {number} (file declares {count} sections)")]
    InvalidSectionNumber
    {
        /// The raw signed section number from the record
        number: i16,
        /// How many sections the file declares
        count: usize,
    },

    /// A symbol's storage-class tag is outside the defined set
    #[error("symbol {index}: unknown storage class {class}")]
    UnknownStorageClass
    {
        /// Table index of the offending symbol
        index: u32,
        /// The raw tag byte
        class: i8,
    },

    /// I/O error from the underlying stream
    ///
    /// Seek or read failures other than a clean end-of-stream. Running out
    /// of bytes mid-record is reported as [`CoffError::MalformedRecord`]
    /// instead, with the record named.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, CoffError>`
///
/// ```rust
/// use picoff_core::error::CoffResult;
/// fn foo() -> CoffResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type CoffResult<T> = std::result::Result<T, CoffError>;
