//! Symbol records and their storage-class variants.
//!
//! Every symbol record has the same 20-byte physical shape; its *meaning* is
//! selected by the storage-class tag. Decoding reads the raw record into an
//! immutable [`RawSymbol`], then dispatches on the tag to build exactly one
//! [`SymbolDetail`] case, each with its own structural validation rules.

use std::fmt;
use std::io::{Read, Seek};

use crate::error::{CoffError, CoffResult};
use crate::reader::RecordReader;
use crate::symbol::aux::{AuxRecord, BlockBounds, CallRef, FileRef, SectionSummary, TagInfo};
use crate::symbol::DecodeContext;
use crate::typeinfo::SymbolType;

/// Sentinel names of the block-boundary pair.
pub const BLOCK_BEGIN: &str = ".bb";
pub const BLOCK_END: &str = ".eb";
/// Sentinel names of the function-boundary pair.
pub const FUNCTION_BEGIN: &str = ".bf";
pub const FUNCTION_END: &str = ".ef";

/// The storage-class tags defined by this format.
///
/// The set is closed: a tag byte outside it is [`CoffError::UnknownStorageClass`],
/// checked at decode time so every later match over classes is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StorageClass
{
    Null,
    Auto,
    External,
    Static,
    Register,
    ExternalDef,
    Label,
    UndefinedLabel,
    StructMember,
    Argument,
    StructTag,
    UnionMember,
    UnionTag,
    Typedef,
    UndefinedStatic,
    EnumTag,
    EnumMember,
    RegisterParam,
    BitField,
    AutoArgument,
    LastEntry,
    Block,
    Function,
    EndOfStruct,
    File,
    Line,
    Alias,
    Hidden,
    EndOfFile,
    List,
    Section,
}

impl StorageClass
{
    /// Map a raw tag byte to its class, if defined.
    pub fn from_raw(raw: i8) -> Option<Self>
    {
        use StorageClass::*;
        Some(match raw {
            0 => Null,
            1 => Auto,
            2 => External,
            3 => Static,
            4 => Register,
            5 => ExternalDef,
            6 => Label,
            7 => UndefinedLabel,
            8 => StructMember,
            9 => Argument,
            10 => StructTag,
            11 => UnionMember,
            12 => UnionTag,
            13 => Typedef,
            14 => UndefinedStatic,
            15 => EnumTag,
            16 => EnumMember,
            17 => RegisterParam,
            18 => BitField,
            19 => AutoArgument,
            20 => LastEntry,
            100 => Block,
            101 => Function,
            102 => EndOfStruct,
            103 => File,
            104 => Line,
            105 => Alias,
            106 => Hidden,
            107 => EndOfFile,
            108 => List,
            109 => Section,
            _ => return None,
        })
    }

    /// The raw tag value of this class.
    pub fn raw(&self) -> i8
    {
        use StorageClass::*;
        match self {
            Null => 0,
            Auto => 1,
            External => 2,
            Static => 3,
            Register => 4,
            ExternalDef => 5,
            Label => 6,
            UndefinedLabel => 7,
            StructMember => 8,
            Argument => 9,
            StructTag => 10,
            UnionMember => 11,
            UnionTag => 12,
            Typedef => 13,
            UndefinedStatic => 14,
            EnumTag => 15,
            EnumMember => 16,
            RegisterParam => 17,
            BitField => 18,
            AutoArgument => 19,
            LastEntry => 20,
            Block => 100,
            Function => 101,
            EndOfStruct => 102,
            File => 103,
            Line => 104,
            Alias => 105,
            Hidden => 106,
            EndOfFile => 107,
            List => 108,
            Section => 109,
        }
    }

    /// The conventional COFF mnemonic.
    pub fn mnemonic(&self) -> &'static str
    {
        use StorageClass::*;
        match self {
            Null => "C_NULL",
            Auto => "C_AUTO",
            External => "C_EXT",
            Static => "C_STAT",
            Register => "C_REG",
            ExternalDef => "C_EXTDEF",
            Label => "C_LABEL",
            UndefinedLabel => "C_ULABEL",
            StructMember => "C_MOS",
            Argument => "C_ARG",
            StructTag => "C_STRTAG",
            UnionMember => "C_MOU",
            UnionTag => "C_UNTAG",
            Typedef => "C_TPDEF",
            UndefinedStatic => "C_USTATIC",
            EnumTag => "C_ENTAG",
            EnumMember => "C_MOE",
            RegisterParam => "C_REGPARM",
            BitField => "C_FIELD",
            AutoArgument => "C_AUTOARG",
            LastEntry => "C_LASTENT",
            Block => "C_BLOCK",
            Function => "C_FCN",
            EndOfStruct => "C_EOS",
            File => "C_FILE",
            Line => "C_LINE",
            Alias => "C_ALIAS",
            Hidden => "C_HIDDEN",
            EndOfFile => "C_EOF",
            List => "C_LIST",
            Section => "C_SECTION",
        }
    }

    /// How many auxiliary records this class requires for a symbol of the
    /// given type. The only legal counts in this format are 0 and 1.
    pub fn expected_aux(&self, symbol_type: Option<&SymbolType>) -> u8
    {
        use StorageClass::*;
        match self {
            // Always carry one aux record.
            StructTag | UnionTag | EnumTag | EndOfStruct | File | Alias | Block | Function
            | Section => 1,
            // Data symbols carry one exactly when the type needs detail:
            // functions, arrays, and tagged (struct/union/enum) types.
            Auto | External | Static | Register | StructMember | Argument | UnionMember
            | Typedef | UndefinedStatic | RegisterParam | BitField | AutoArgument => {
                u8::from(symbol_type.is_some_and(SymbolType::needs_aux))
            }
            // Never carry one.
            Null | ExternalDef | Label | UndefinedLabel | EnumMember | LastEntry | Line
            | Hidden | EndOfFile | List => 0,
        }
    }
}

impl fmt::Display for StorageClass
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.mnemonic())
    }
}

/// One symbol record exactly as read from the stream, name already resolved.
///
/// This value is handed to whichever variant constructor the dispatch
/// selects; nothing about the decode is staged in shared state.
#[derive(Debug, Clone)]
pub struct RawSymbol
{
    /// Table index of the record.
    pub index: u32,
    /// Resolved symbol name.
    pub name: String,
    /// The 32-bit value field; meaning varies by class.
    pub value: u32,
    /// Raw signed section number.
    pub section_number: i16,
    /// Raw 32-bit type word.
    pub type_word: u32,
    /// Raw storage-class tag.
    pub storage_class: i8,
    /// Declared number of trailing auxiliary records.
    pub aux_count: u8,
}

impl RawSymbol
{
    /// Read the fixed 20-byte record at the current stream position.
    pub fn read<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        index: u32,
        ctx: &DecodeContext<'_>,
    ) -> CoffResult<Self>
    {
        let name = reader.read_packed_name("symbol record")?;
        Ok(Self {
            index,
            name: ctx.strings.resolve(&name),
            value: reader.read_u32("symbol record")?,
            section_number: reader.read_i16("symbol record")?,
            type_word: reader.read_u32("symbol record")?,
            storage_class: reader.read_i8("symbol record")?,
            aux_count: reader.read_u8("symbol record")?,
        })
    }
}

/// Type-dependent payload of a data symbol's auxiliary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAux
{
    /// The type needs no auxiliary detail.
    None,
    /// Function symbol: call-graph reference.
    CallGraph(CallRef),
    /// Array or tagged-type variable: tag index, size, dimensions.
    TypeDetail(TagInfo),
}

/// Begin/end pairing decoded from a boundary symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryDetail
{
    /// True for the end form of the sentinel pair.
    pub is_end: bool,
    /// Source line of the boundary.
    pub line_number: u16,
    /// Forward link to the matching end symbol; zero in the end form.
    pub end_index: u32,
}

/// Tag declaration detail (struct/union/enum tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDetail
{
    /// Size of the aggregate in bytes.
    pub size: u16,
    /// Forward link to the entry past the member list.
    pub end_index: u32,
}

/// End-of-struct detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EosDetail
{
    /// Back-reference to the tag symbol.
    pub tag_index: u32,
    /// Size of the aggregate in bytes.
    pub size: u16,
}

/// Source-file marker detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDetail
{
    /// Resolved source file name.
    pub file_name: String,
    /// Line at which the file was included, zero for top level.
    pub include_line: u32,
    /// Flag byte.
    pub flags: u8,
}

/// The storage-class-keyed variant family.
///
/// One case per defined storage class; matching is exhaustive wherever the
/// distinction matters (validation, rendering).
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SymbolDetail
{
    Null,
    Auto(DataAux),
    External(DataAux),
    Static(DataAux),
    Register(DataAux),
    ExternalDef,
    Label,
    UndefinedLabel,
    StructMember(DataAux),
    Argument(DataAux),
    StructTag(TagDetail),
    UnionMember(DataAux),
    UnionTag(TagDetail),
    Typedef(DataAux),
    UndefinedStatic(DataAux),
    EnumTag(TagDetail),
    EnumMember,
    RegisterParam(DataAux),
    BitField(DataAux),
    AutoArgument(DataAux),
    LastEntry,
    Block(BoundaryDetail),
    Function(BoundaryDetail),
    EndOfStruct(EosDetail),
    File(FileDetail),
    Line,
    Alias(EosDetail),
    Hidden,
    EndOfFile,
    List,
    Section(SectionSummary),
}

/// A fully decoded symbol-table entry.
///
/// Immutable once constructed; the auxiliary record it declared is consumed
/// into the entry and not separately addressable afterwards.
#[derive(Debug, Clone)]
pub struct SymbolEntry
{
    /// Table index (non-contiguous across entries, see the loader).
    pub index: u32,
    /// Resolved name.
    pub name: String,
    /// The 32-bit value field; address or offset depending on the class.
    pub value: u32,
    /// Raw signed section number.
    pub section_number: i16,
    /// Decoded type word, absent when the word is zero.
    pub symbol_type: Option<SymbolType>,
    /// Declared auxiliary-record count.
    pub aux_count: u8,
    /// The raw auxiliary record, kept for dimension reads and hex fallback.
    pub aux: Option<AuxRecord>,
    /// The storage-class-specific decoded fields.
    pub detail: SymbolDetail,
}

impl SymbolEntry
{
    /// Dispatch a raw record (and its auxiliary record) into a typed entry.
    ///
    /// Validation per the format's structural rules:
    /// - the declared auxiliary count must equal the class's expectation;
    /// - the section number must resolve, and for several classes must
    ///   resolve to a specific reserved section;
    /// - boundary symbols must carry one of their two sentinel names.
    pub fn build(
        raw: RawSymbol,
        aux: Option<AuxRecord>,
        ctx: &DecodeContext<'_>,
    ) -> CoffResult<Self>
    {
        let class = StorageClass::from_raw(raw.storage_class).ok_or(CoffError::UnknownStorageClass {
            index: raw.index,
            class: raw.storage_class,
        })?;

        let symbol_type = if raw.type_word == 0 {
            None
        } else {
            Some(SymbolType::decode(raw.type_word)?)
        };

        let expected = class.expected_aux(symbol_type.as_ref());
        if raw.aux_count != expected {
            return Err(CoffError::MalformedRecord(format!(
                "symbol {} ({class}): {} auxiliary records declared, {expected} required",
                raw.index, raw.aux_count
            )));
        }

        // Every referenced section number must resolve, whatever the class.
        let section = ctx.sections.resolve(raw.section_number)?;

        use StorageClass::*;
        match class {
            Auto if !section.is_absolute() => {
                return Err(CoffError::InvalidSymbolContext {
                    index: raw.index,
                    reason: format!(
                        "automatic variable `{}` must live in the absolute section, found {section}",
                        raw.name
                    ),
                });
            }
            StructTag | UnionTag | EnumTag if !section.is_debug() => {
                return Err(CoffError::InvalidSymbolContext {
                    index: raw.index,
                    reason: format!(
                        "{class} tag `{}` must live in the debug section, found {section}",
                        raw.name
                    ),
                });
            }
            External | Static if section.is_debug() || section.is_synthetic_file() => {
                return Err(CoffError::InvalidSymbolContext {
                    index: raw.index,
                    reason: format!(
                        "{class} symbol `{}` cannot live in the {section} section",
                        raw.name
                    ),
                });
            }
            Block if raw.name != BLOCK_BEGIN && raw.name != BLOCK_END => {
                return Err(CoffError::InvalidSymbolContext {
                    index: raw.index,
                    reason: format!(
                        "block boundary must be named `{BLOCK_BEGIN}` or `{BLOCK_END}`, found `{}`",
                        raw.name
                    ),
                });
            }
            Function if raw.name != FUNCTION_BEGIN && raw.name != FUNCTION_END => {
                return Err(CoffError::InvalidSymbolContext {
                    index: raw.index,
                    reason: format!(
                        "function boundary must be named `{FUNCTION_BEGIN}` or `{FUNCTION_END}`, found `{}`",
                        raw.name
                    ),
                });
            }
            _ => {}
        }

        let data_aux = |aux: &Option<AuxRecord>| match (aux, symbol_type.as_ref()) {
            (Some(record), Some(ty)) if ty.is_function() => DataAux::CallGraph(CallRef::from_aux(record)),
            (Some(record), _) => DataAux::TypeDetail(TagInfo::from_aux(record)),
            (None, _) => DataAux::None,
        };
        let boundary = |aux: &Option<AuxRecord>, is_end: bool| {
            // Expected count 1 guarantees the record is present.
            let bounds = aux.as_ref().map(BlockBounds::from_aux).unwrap_or(BlockBounds {
                line_number: 0,
                end_index: 0,
            });
            BoundaryDetail {
                is_end,
                line_number: bounds.line_number,
                // Only the begin form carries a forward link.
                end_index: if is_end { 0 } else { bounds.end_index },
            }
        };
        let tag_detail = |aux: &Option<AuxRecord>| {
            let info = aux.as_ref().map(TagInfo::from_aux).unwrap_or(TagInfo {
                tag_index: 0,
                line_number: 0,
                size: 0,
                dimensions: [0; 4],
                end_index: 0,
            });
            TagDetail { size: info.size, end_index: info.end_index }
        };
        let eos_detail = |aux: &Option<AuxRecord>| {
            let info = aux.as_ref().map(TagInfo::from_aux).unwrap_or(TagInfo {
                tag_index: 0,
                line_number: 0,
                size: 0,
                dimensions: [0; 4],
                end_index: 0,
            });
            EosDetail { tag_index: info.tag_index, size: info.size }
        };

        let detail = match class {
            Null => SymbolDetail::Null,
            Auto => SymbolDetail::Auto(data_aux(&aux)),
            External => SymbolDetail::External(data_aux(&aux)),
            Static => SymbolDetail::Static(data_aux(&aux)),
            Register => SymbolDetail::Register(data_aux(&aux)),
            ExternalDef => SymbolDetail::ExternalDef,
            Label => SymbolDetail::Label,
            UndefinedLabel => SymbolDetail::UndefinedLabel,
            StructMember => SymbolDetail::StructMember(data_aux(&aux)),
            Argument => SymbolDetail::Argument(data_aux(&aux)),
            StructTag => SymbolDetail::StructTag(tag_detail(&aux)),
            UnionMember => SymbolDetail::UnionMember(data_aux(&aux)),
            UnionTag => SymbolDetail::UnionTag(tag_detail(&aux)),
            Typedef => SymbolDetail::Typedef(data_aux(&aux)),
            UndefinedStatic => SymbolDetail::UndefinedStatic(data_aux(&aux)),
            EnumTag => SymbolDetail::EnumTag(tag_detail(&aux)),
            EnumMember => SymbolDetail::EnumMember,
            RegisterParam => SymbolDetail::RegisterParam(data_aux(&aux)),
            BitField => SymbolDetail::BitField(data_aux(&aux)),
            AutoArgument => SymbolDetail::AutoArgument(data_aux(&aux)),
            LastEntry => SymbolDetail::LastEntry,
            Block => SymbolDetail::Block(boundary(&aux, raw.name == BLOCK_END)),
            Function => SymbolDetail::Function(boundary(&aux, raw.name == FUNCTION_END)),
            EndOfStruct => SymbolDetail::EndOfStruct(eos_detail(&aux)),
            File => {
                let file = aux.as_ref().map(FileRef::from_aux).unwrap_or(FileRef {
                    name_offset: 0,
                    include_line: 0,
                    flags: 0,
                });
                SymbolDetail::File(FileDetail {
                    file_name: ctx.strings.get(file.name_offset).to_string(),
                    include_line: file.include_line,
                    flags: file.flags,
                })
            }
            Line => SymbolDetail::Line,
            Alias => SymbolDetail::Alias(eos_detail(&aux)),
            Hidden => SymbolDetail::Hidden,
            EndOfFile => SymbolDetail::EndOfFile,
            List => SymbolDetail::List,
            Section => {
                let summary = aux.as_ref().map(SectionSummary::from_aux).unwrap_or(SectionSummary {
                    length: 0,
                    num_relocs: 0,
                    num_linenos: 0,
                });
                SymbolDetail::Section(summary)
            }
        };

        Ok(Self {
            index: raw.index,
            name: raw.name,
            value: raw.value,
            section_number: raw.section_number,
            symbol_type,
            aux_count: raw.aux_count,
            aux,
            detail,
        })
    }

    /// The storage class this entry was decoded under.
    pub fn storage_class(&self) -> StorageClass
    {
        use StorageClass::*;
        match self.detail {
            SymbolDetail::Null => Null,
            SymbolDetail::Auto(_) => Auto,
            SymbolDetail::External(_) => External,
            SymbolDetail::Static(_) => Static,
            SymbolDetail::Register(_) => Register,
            SymbolDetail::ExternalDef => ExternalDef,
            SymbolDetail::Label => Label,
            SymbolDetail::UndefinedLabel => UndefinedLabel,
            SymbolDetail::StructMember(_) => StructMember,
            SymbolDetail::Argument(_) => Argument,
            SymbolDetail::StructTag(_) => StructTag,
            SymbolDetail::UnionMember(_) => UnionMember,
            SymbolDetail::UnionTag(_) => UnionTag,
            SymbolDetail::Typedef(_) => Typedef,
            SymbolDetail::UndefinedStatic(_) => UndefinedStatic,
            SymbolDetail::EnumTag(_) => EnumTag,
            SymbolDetail::EnumMember => EnumMember,
            SymbolDetail::RegisterParam(_) => RegisterParam,
            SymbolDetail::BitField(_) => BitField,
            SymbolDetail::AutoArgument(_) => AutoArgument,
            SymbolDetail::LastEntry => LastEntry,
            SymbolDetail::Block(_) => Block,
            SymbolDetail::Function(_) => Function,
            SymbolDetail::EndOfStruct(_) => EndOfStruct,
            SymbolDetail::File(_) => File,
            SymbolDetail::Line => Line,
            SymbolDetail::Alias(_) => Alias,
            SymbolDetail::Hidden => Hidden,
            SymbolDetail::EndOfFile => EndOfFile,
            SymbolDetail::List => List,
            SymbolDetail::Section(_) => Section,
        }
    }

    /// The tag symbol index named by this entry's auxiliary record, for
    /// entries whose type references a tag.
    pub fn tag_index(&self) -> Option<u32>
    {
        match &self.detail {
            SymbolDetail::Auto(DataAux::TypeDetail(info))
            | SymbolDetail::External(DataAux::TypeDetail(info))
            | SymbolDetail::Static(DataAux::TypeDetail(info))
            | SymbolDetail::Register(DataAux::TypeDetail(info))
            | SymbolDetail::StructMember(DataAux::TypeDetail(info))
            | SymbolDetail::Argument(DataAux::TypeDetail(info))
            | SymbolDetail::UnionMember(DataAux::TypeDetail(info))
            | SymbolDetail::Typedef(DataAux::TypeDetail(info))
            | SymbolDetail::UndefinedStatic(DataAux::TypeDetail(info))
            | SymbolDetail::RegisterParam(DataAux::TypeDetail(info))
            | SymbolDetail::BitField(DataAux::TypeDetail(info))
            | SymbolDetail::AutoArgument(DataAux::TypeDetail(info)) => Some(info.tag_index),
            SymbolDetail::EndOfStruct(eos) | SymbolDetail::Alias(eos) => Some(eos.tag_index),
            _ => None,
        }
    }
}
