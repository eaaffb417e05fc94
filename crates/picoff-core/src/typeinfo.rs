//! Symbol type words.
//!
//! A 32-bit type word packs a base type in the low 5 bits and a stack of
//! derived-type operators in 3-bit groups above it. The group at bit 5 is
//! the *innermost* operator (the one binding closest to the name); display
//! composition therefore walks the stack in reverse.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{CoffError, CoffResult};
use crate::symbol::aux::AuxRecord;

/// Maximum number of array dimensions an auxiliary record can carry.
pub const MAX_ARRAY_DIMENSIONS: usize = 4;

/// The 19 base types of the C18 flavor, including the PIC-specific
/// 24-bit `short long` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BaseType
{
    Null,
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Struct,
    Union,
    Enum,
    MemberOfEnum,
    UnsignedChar,
    UnsignedShort,
    UnsignedInt,
    UnsignedLong,
    LongDouble,
    ShortLong,
    UnsignedShortLong,
}

impl BaseType
{
    fn from_bits(bits: u32) -> Option<Self>
    {
        use BaseType::*;
        Some(match bits {
            0 => Null,
            1 => Void,
            2 => Char,
            3 => Short,
            4 => Int,
            5 => Long,
            6 => Float,
            7 => Double,
            8 => Struct,
            9 => Union,
            10 => Enum,
            11 => MemberOfEnum,
            12 => UnsignedChar,
            13 => UnsignedShort,
            14 => UnsignedInt,
            15 => UnsignedLong,
            16 => LongDouble,
            17 => ShortLong,
            18 => UnsignedShortLong,
            _ => return None,
        })
    }

    /// True for struct, union and enum — the base types that name a tag
    /// symbol through their auxiliary record.
    pub fn is_tagged(&self) -> bool
    {
        matches!(self, BaseType::Struct | BaseType::Union | BaseType::Enum)
    }
}

impl fmt::Display for BaseType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        use BaseType::*;
        let text = match self {
            Null => "null",
            Void => "void",
            Char => "char",
            Short => "short",
            Int => "int",
            Long => "long",
            Float => "float",
            Double => "double",
            Struct => "struct",
            Union => "union",
            Enum => "enum",
            MemberOfEnum => "member of enum",
            UnsignedChar => "unsigned char",
            UnsignedShort => "unsigned short",
            UnsignedInt => "unsigned int",
            UnsignedLong => "unsigned long",
            LongDouble => "long double",
            ShortLong => "short long",
            UnsignedShortLong => "unsigned short long",
        };
        write!(f, "{text}")
    }
}

/// A type-construction operator layered onto the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedType
{
    /// Pointer into data memory, rendered `ram *`.
    RamPointer,
    /// Function returning the inner type.
    Function,
    /// Array of the inner type.
    Array,
    /// Pointer into program memory, rendered `rom *`.
    RomPointer,
    /// Far pointer into program memory, rendered `far rom *`.
    FarRomPointer,
}

impl DerivedType
{
    fn from_bits(bits: u32) -> Option<Self>
    {
        use DerivedType::*;
        Some(match bits {
            1 => RamPointer,
            2 => Function,
            3 => Array,
            4 => RomPointer,
            5 => FarRomPointer,
            _ => return None,
        })
    }

    fn pointer_prefix(&self) -> Option<&'static str>
    {
        match self {
            DerivedType::RamPointer => Some("ram * "),
            DerivedType::RomPointer => Some("rom * "),
            DerivedType::FarRomPointer => Some("far rom * "),
            DerivedType::Function | DerivedType::Array => None,
        }
    }
}

/// Decoded view of a 32-bit type word.
///
/// The derived stack is ordered innermost-first, exactly as stored in the
/// word; [`SymbolType::compose`] applies the operators outermost-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolType
{
    /// The base type from the low 5 bits.
    pub base: BaseType,
    /// Derived operators, innermost first.
    pub derived: SmallVec<[DerivedType; 6]>,
}

impl SymbolType
{
    /// Unpack a type word.
    ///
    /// ## Errors
    ///
    /// [`CoffError::MalformedRecord`] for base bits above 18 or a 3-bit
    /// derived group of 6 or 7 — neither is assigned in this format.
    pub fn decode(word: u32) -> CoffResult<Self>
    {
        let base = BaseType::from_bits(word & 0x1f).ok_or_else(|| {
            CoffError::MalformedRecord(format!("undefined base type {} in type word 0x{word:08x}", word & 0x1f))
        })?;

        let mut derived = SmallVec::new();
        let mut rest = word >> 5;
        while rest != 0 {
            let group = rest & 0x7;
            let op = DerivedType::from_bits(group).ok_or_else(|| {
                CoffError::MalformedRecord(format!(
                    "undefined derived type {group} in type word 0x{word:08x}"
                ))
            })?;
            derived.push(op);
            rest >>= 3;
        }
        Ok(Self { base, derived })
    }

    /// True when the outermost operator makes this a function symbol.
    pub fn is_function(&self) -> bool
    {
        self.derived.last() == Some(&DerivedType::Function)
    }

    /// True when the symbol's auxiliary record carries type detail:
    /// functions, arrays, and tagged (struct/union/enum) types all do.
    pub fn needs_aux(&self) -> bool
    {
        self.is_function() || self.derived.contains(&DerivedType::Array) || self.base.is_tagged()
    }

    /// Render the C-like declarator string for a symbol of this type.
    ///
    /// `tag_name` is the resolved name of the tag symbol for tagged base
    /// types (the caller looks it up from the aux record's tag index);
    /// `aux` supplies array dimensions (one 16-bit word per array operator,
    /// capped at [`MAX_ARRAY_DIMENSIONS`], empty brackets beyond) and the
    /// raw tag index fallback.
    ///
    /// The base-type prefix is omitted when the outermost operator is a
    /// pointer: `ram * flags` but `int table[5]`.
    pub fn compose(&self, name: &str, tag_name: Option<&str>, aux: Option<&AuxRecord>) -> String
    {
        let mut out = String::new();
        let mut name_used = false;
        let mut dims_consumed = 0usize;

        for op in self.derived.iter().rev() {
            match op {
                DerivedType::RamPointer | DerivedType::RomPointer | DerivedType::FarRomPointer => {
                    // Safe unwrap-free: prefix is defined for all pointers.
                    if let Some(prefix) = op.pointer_prefix() {
                        out.insert_str(0, prefix);
                    }
                }
                DerivedType::Function => {
                    if !name_used {
                        out.push_str(name);
                        name_used = true;
                    }
                    out.push_str("()");
                }
                DerivedType::Array => {
                    if !name_used {
                        out.push_str(name);
                        name_used = true;
                    }
                    if dims_consumed < MAX_ARRAY_DIMENSIONS {
                        match aux {
                            Some(aux) => {
                                let dim = aux.array_dimension(dims_consumed);
                                out.push_str(&format!("[{dim}]"));
                            }
                            None => out.push_str("[]"),
                        }
                        dims_consumed += 1;
                    } else {
                        out.push_str("[]");
                    }
                }
            }
        }
        if !name_used {
            out.push_str(name);
        }

        let outermost_is_pointer =
            self.derived.last().is_some_and(|op| op.pointer_prefix().is_some());
        if outermost_is_pointer {
            out
        } else {
            format!("{} {out}", self.base_display(tag_name, aux))
        }
    }

    /// Display form of the base type, tag name included for tagged types.
    pub fn base_display(&self, tag_name: Option<&str>, aux: Option<&AuxRecord>) -> String
    {
        if !self.base.is_tagged() {
            return self.base.to_string();
        }
        match tag_name {
            Some(tag) if !tag.is_empty() => format!("{} {tag}", self.base),
            _ => match aux {
                Some(aux) => format!("{} [{}]", self.base, aux.tag_index()),
                None => self.base.to_string(),
            },
        }
    }
}
