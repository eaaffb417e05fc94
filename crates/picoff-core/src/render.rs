//! Listing renderer.
//!
//! Walks a loaded [`ObjectFile`] and produces the human-readable listing.
//! Cross-references (tag names, callees, relocation targets) resolve through
//! the facade's optional lookups — a dangling index renders as the raw
//! number, never an error. Column layout here is presentation, not contract.

use std::fmt::{self, Write};

use crate::object::ObjectFile;
use crate::symbol::{DataAux, SymbolDetail, SymbolEntry};

/// Which parts of the listing to produce. Default is everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions
{
    pub headers: bool,
    pub sections: bool,
    pub relocations: bool,
    pub line_numbers: bool,
    pub symbols: bool,
}

impl Default for RenderOptions
{
    fn default() -> Self
    {
        Self {
            headers: true,
            sections: true,
            relocations: true,
            line_numbers: true,
            symbols: true,
        }
    }
}

/// Render the listing for a decoded object file.
pub fn render(object: &ObjectFile, options: &RenderOptions, out: &mut impl Write) -> fmt::Result
{
    if options.headers {
        render_headers(object, out)?;
    }
    if options.sections {
        render_sections(object, out)?;
    }
    if options.relocations {
        render_relocations(object, out)?;
    }
    if options.line_numbers {
        render_line_numbers(object, out)?;
    }
    if options.symbols {
        render_symbols(object, out)?;
    }
    Ok(())
}

fn render_headers(object: &ObjectFile, out: &mut impl Write) -> fmt::Result
{
    let header = object.file_header();
    writeln!(out, "File header:")?;
    writeln!(out, "  magic:           0x{:04x}", header.magic)?;
    writeln!(out, "  sections:        {}", header.num_sections)?;
    writeln!(out, "  symbol slots:    {}", header.num_symbols)?;
    writeln!(out, "  timestamp:       {}", header.timestamp)?;
    let flags = header.flag_names();
    if flags.is_empty() {
        writeln!(out, "  flags:           none")?;
    } else {
        writeln!(out, "  flags:           {}", flags.join(" "))?;
    }

    let opt = object.optional_header();
    let (major, minor, patch) = opt.version();
    writeln!(out, "Optional header:")?;
    writeln!(out, "  version:         v{major}.{minor}.{patch}")?;
    writeln!(out, "  processor:       {}", opt.processor())?;
    writeln!(out, "  ROM width:       {} bits", opt.rom_width_bits)?;
    writeln!(out, "  RAM width:       {} bits", opt.ram_width_bits)?;
    writeln!(out)
}

fn render_sections(object: &ObjectFile, out: &mut impl Write) -> fmt::Result
{
    writeln!(out, "Sections:")?;
    for (position, section) in object.sections().enumerate() {
        let header = &section.header;
        writeln!(
            out,
            "  [{:2}] {:<16} addr 0x{:06x} size {:6} relocs {:4} linenos {:4} {}",
            position + 1,
            header.name,
            header.physical_address,
            header.size,
            header.num_relocs,
            header.num_linenos,
            header.flag_names().join(" "),
        )?;
    }
    writeln!(out)
}

fn render_relocations(object: &ObjectFile, out: &mut impl Write) -> fmt::Result
{
    for section in object.sections() {
        if section.relocations.is_empty() {
            continue;
        }
        writeln!(out, "Relocations for {}:", section.header.name)?;
        for reloc in &section.relocations {
            let target = object
                .symbol_name(reloc.symbol_index)
                .map_or_else(|| format!("[{}]", reloc.symbol_index), ToString::to_string);
            writeln!(
                out,
                "  0x{:06x} {:<14} {:<20} offset {}",
                reloc.virtual_address,
                reloc.kind_name(),
                target,
                reloc.offset,
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_line_numbers(object: &ObjectFile, out: &mut impl Write) -> fmt::Result
{
    for section in object.sections() {
        if section.line_numbers.is_empty() {
            continue;
        }
        writeln!(out, "Line numbers for {}:", section.header.name)?;
        for entry in &section.line_numbers {
            write!(out, "  line {:5} at 0x{:06x}", entry.line_number, entry.address)?;
            if let Some(function) = entry.function_index() {
                let name = object
                    .symbol_name(function)
                    .map_or_else(|| format!("[{function}]"), ToString::to_string);
                write!(out, " in {name}")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_symbols(object: &ObjectFile, out: &mut impl Write) -> fmt::Result
{
    writeln!(out, "Symbols:")?;
    for entry in object.symbols() {
        let section = object
            .section(entry.section_number)
            .map_or_else(|_| "<invalid>".to_string(), |s| s.to_string());
        writeln!(
            out,
            "  [{:4}] {:<10} {:<16} value 0x{:08x} {}",
            entry.index,
            entry.storage_class().mnemonic(),
            section,
            entry.value,
            describe(object, entry),
        )?;
        if let Some(detail) = detail_line(object, entry) {
            writeln!(out, "         {detail}")?;
        } else if let Some(aux) = &entry.aux {
            // Untyped auxiliary payloads still show up in the listing.
            let (first, second) = aux.hex_rows();
            writeln!(out, "         aux {first}")?;
            writeln!(out, "             {second}")?;
        }
    }
    Ok(())
}

/// The symbol's display form: its composed C-like type when it has a type
/// word, otherwise the bare name.
fn describe(object: &ObjectFile, entry: &SymbolEntry) -> String
{
    match &entry.symbol_type {
        Some(ty) => {
            let tag_name = entry
                .tag_index()
                .and_then(|index| object.symbol_name(index))
                .map(ToString::to_string);
            ty.compose(&entry.name, tag_name.as_deref(), entry.aux.as_ref())
        }
        None => entry.name.clone(),
    }
}

fn detail_line(object: &ObjectFile, entry: &SymbolEntry) -> Option<String>
{
    match &entry.detail {
        SymbolDetail::Block(bounds) | SymbolDetail::Function(bounds) => {
            let which = if bounds.is_end { "end" } else { "begin" };
            if bounds.is_end {
                Some(format!("{which} at line {}", bounds.line_number))
            } else {
                Some(format!(
                    "{which} at line {}, ends at [{}]",
                    bounds.line_number, bounds.end_index
                ))
            }
        }
        SymbolDetail::File(file) => {
            if file.include_line > 0 {
                Some(format!("source {} (included at line {})", file.file_name, file.include_line))
            } else {
                Some(format!("source {}", file.file_name))
            }
        }
        SymbolDetail::StructTag(tag) | SymbolDetail::UnionTag(tag) | SymbolDetail::EnumTag(tag) => {
            Some(format!("size {} bytes, members end at [{}]", tag.size, tag.end_index))
        }
        SymbolDetail::EndOfStruct(eos) | SymbolDetail::Alias(eos) => {
            let tag = object
                .symbol_name(eos.tag_index)
                .map_or_else(|| format!("[{}]", eos.tag_index), ToString::to_string);
            Some(format!("tag {tag}, size {} bytes", eos.size))
        }
        SymbolDetail::Section(summary) => Some(format!(
            "length {}, {} relocs, {} line numbers",
            summary.length, summary.num_relocs, summary.num_linenos
        )),
        SymbolDetail::Auto(aux)
        | SymbolDetail::External(aux)
        | SymbolDetail::Static(aux)
        | SymbolDetail::Register(aux)
        | SymbolDetail::StructMember(aux)
        | SymbolDetail::Argument(aux)
        | SymbolDetail::UnionMember(aux)
        | SymbolDetail::Typedef(aux)
        | SymbolDetail::UndefinedStatic(aux)
        | SymbolDetail::RegisterParam(aux)
        | SymbolDetail::BitField(aux)
        | SymbolDetail::AutoArgument(aux) => match aux {
            DataAux::CallGraph(call) => {
                let priority = match call.interrupt_priority {
                    1 => ", low-priority interrupt",
                    2 => ", high-priority interrupt",
                    _ => "",
                };
                match call.callee() {
                    Some(index) => {
                        let callee = object
                            .symbol_name(index)
                            .map_or_else(|| format!("[{index}]"), ToString::to_string);
                        Some(format!("calls {callee}{priority}"))
                    }
                    None => Some(format!("calls through pointer{priority}")),
                }
            }
            DataAux::TypeDetail(_) | DataAux::None => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use std::io::Cursor;

    use super::*;
    use crate::section::{STYP_TEXT, N_DEBUG};
    use crate::symbol::entry::{FUNCTION_BEGIN, FUNCTION_END};
    use crate::symbol::StorageClass;
    use crate::testutil::{ImageBuilder, SectionSpec, SymbolSpec};

    fn render_all(image: crate::testutil::Image) -> String
    {
        let object = ObjectFile::load(Cursor::new(image.bytes)).unwrap();
        let mut out = String::new();
        render(&object, &RenderOptions::default(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_headers_and_processor()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_version_stamp(0x0203_0001)
                .with_processor(0x9452)
                .build(),
        );
        assert!(listing.contains("v2.3.1"));
        assert!(listing.contains("PIC18F452"));
    }

    #[test]
    fn test_unknown_processor_renders_placeholder()
    {
        let listing = render_all(ImageBuilder::new().with_processor(0xabcd).build());
        assert!(listing.contains("unknown processor (0xabcd)"));
    }

    #[test]
    fn test_section_row()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_section(SectionSpec::named(".code").at(0x100).sized(32).flags(STYP_TEXT))
                .build(),
        );
        assert!(listing.contains(".code"));
        assert!(listing.contains("TEXT"));
    }

    #[test]
    fn test_function_boundary_lines()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_section(SectionSpec::named(".code"))
                .with_symbol(SymbolSpec::block(FUNCTION_BEGIN, 3, 2).function_class())
                .with_symbol(SymbolSpec::block(FUNCTION_END, 9, 0).function_class())
                .build(),
        );
        assert!(listing.contains("begin at line 3, ends at [2]"));
        assert!(listing.contains("end at line 9"));
    }

    #[test]
    fn test_call_graph_resolves_callee_name()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_section(SectionSpec::named(".code"))
                .with_symbol(SymbolSpec::function("main", 1, 2, 0))
                .with_symbol(SymbolSpec::function("helper", 1, 0xffff_ffff, 2))
                .build(),
        );
        assert!(listing.contains("int main()"));
        assert!(listing.contains("calls helper"));
        assert!(listing.contains("calls through pointer, high-priority interrupt"));
    }

    #[test]
    fn test_reloc_row_resolves_symbol()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_section(SectionSpec::named(".code").reloc(0x20, 0, 0, 1))
                .with_symbol(SymbolSpec::plain("target", StorageClass::Label, 1))
                .build(),
        );
        assert!(listing.contains("Relocations for .code"));
        assert!(listing.contains("CALL"));
        assert!(listing.contains("target"));
    }

    #[test]
    fn test_file_symbol_row()
    {
        let listing = render_all(
            ImageBuilder::new()
                .with_symbol(SymbolSpec::file(".file", "blink.c"))
                .build(),
        );
        assert!(listing.contains("source blink.c"));
    }

    #[test]
    fn test_tag_row_shows_size()
    {
        let mut aux = [0u8; 20];
        aux[6..8].copy_from_slice(&24u16.to_le_bytes());
        aux[12..16].copy_from_slice(&9u32.to_le_bytes());
        let listing = render_all(
            ImageBuilder::new()
                .with_symbol(
                    SymbolSpec::tag("state", StorageClass::StructTag, N_DEBUG).with_aux_bytes(aux),
                )
                .build(),
        );
        assert!(listing.contains("size 24 bytes, members end at [9]"));
    }
}
