use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use picoff_core::{render, ObjectFile, RenderOptions};
use picoff_utils::{info, init_logging};

/// Inspect Microchip PIC18 COFF object files.
#[derive(Parser, Debug)]
#[command(name = "picoff")]
#[command(version)]
#[command(about = "Decode a PIC18 COFF object file and print its listing", long_about = None)]
struct Cli
{
    /// Path to the COFF object file
    file: PathBuf,

    /// Show the file and optional headers
    #[arg(long)]
    headers: bool,

    /// Show the section table
    #[arg(long)]
    sections: bool,

    /// Show per-section relocation tables
    #[arg(long)]
    relocations: bool,

    /// Show per-section line-number tables
    #[arg(long = "line-numbers")]
    line_numbers: bool,

    /// Show the symbol listing
    #[arg(long)]
    symbols: bool,
}

impl Cli
{
    /// Selected listing parts; no selection flags means everything.
    fn render_options(&self) -> RenderOptions
    {
        let any = self.headers || self.sections || self.relocations || self.line_numbers || self.symbols;
        if !any {
            return RenderOptions::default();
        }
        RenderOptions {
            headers: self.headers,
            sections: self.sections,
            relocations: self.relocations,
            line_numbers: self.line_numbers,
            symbols: self.symbols,
        }
    }
}

fn main()
{
    // Initialize logging (reads from RUST_LOG env var)
    // Defaults to INFO level and Pretty format if not set
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();

    if !cli.file.exists() {
        eprintln!("File not found");
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>>
{
    info!("decoding {}", cli.file.display());
    let stream = BufReader::new(File::open(&cli.file)?);
    let object = ObjectFile::load(stream)?;
    info!(
        sections = object.section_count(),
        symbols = object.symbol_count(),
        "decode complete"
    );

    let mut listing = String::new();
    render(&object, &cli.render_options(), &mut listing)?;
    print!("{listing}");
    Ok(())
}
