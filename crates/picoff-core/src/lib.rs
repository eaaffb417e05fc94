//! # picoff-core
//!
//! Decoder and object model for Microchip PIC18 COFF object files.
//!
//! This crate turns the binary object-file format emitted by the MPLAB C18
//! toolchain into a fully resolved, cross-referenced in-memory model:
//! - Fixed-size header records (file header, optional header)
//! - Section table with per-section relocation and line-number side tables
//! - String table for names too long for their 8-byte record fields
//! - A symbol table whose record shape is constant but whose meaning is
//!   selected at runtime by a storage-class tag, with per-class auxiliary
//!   records
//!
//! ## Load model
//!
//! Loading is eager, single-threaded and fail-fast: [`object::ObjectFile::load`]
//! either materializes every table or rejects the file with the first
//! structural error. The resulting model is immutable and cheap to share.
//!
//! ## Rendering
//!
//! [`render::render`] walks a loaded model and produces the human-readable
//! listing the `picoff` binary prints. Cross-references between tables stay
//! plain integer indices and resolve to optional lookups, so a dangling
//! reference degrades to its raw number instead of failing.

pub mod error;
pub mod header;
pub mod lineno;
pub mod object;
pub mod prelude;
pub mod processor;
pub mod reader;
pub mod reloc;
pub mod render;
pub mod section;
pub mod strings;
pub mod symbol;
pub mod typeinfo;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use error::{CoffError, CoffResult};
pub use object::ObjectFile;
pub use render::{render, RenderOptions};
