pub mod audio;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod interp;
pub mod isa;
pub mod wavegen;
pub mod wavetable;
pub mod writer;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

use cli::{Cli, Command};
use writer::ObjectFormat;

pub fn run() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Compile {
            input,
            output,
            listing,
            base_address,
            format,
        } => run_compile(&input, &output, listing.as_deref(), base_address, format),
        Command::Play {
            bytecode,
            wavetables,
            output,
            rate,
            jumps,
        } => run_play(&bytecode, &wavetables, &output, rate, jumps),
        Command::Wavegen { input, output } => run_wavegen(&input, &output),
    }
}

fn run_compile(
    input: &Path,
    output: &Path,
    listing: Option<&Path>,
    base_address: u16,
    format: ObjectFormat,
) -> anyhow::Result<()> {
    // 1. ── Compile ────────────────────────────────────────────────────
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Reading {}", input.display()))?;

    let opts = compiler::Options {
        base_address,
        listing: listing.is_some(),
        ..compiler::Options::default()
    };
    let result = compiler::compile(&source, opts);

    // 2. ── Listing ────────────────────────────────────────────────────
    if let (Some(path), Some(text)) = (listing, result.listing.as_deref()) {
        std::fs::write(path, text).with_context(|| format!("Writing {}", path.display()))?;
    }

    // 3. ── Diagnostics gate object emission ───────────────────────────
    if result.diagnostics.has_errors() {
        for diagnostic in result.diagnostics.iter() {
            eprintln!("{diagnostic}");
        }
        bail!("compilation failed with {} error(s)", result.diagnostics.len());
    }

    // 4. ── Write the object ───────────────────────────────────────────
    let file = File::create(output).with_context(|| format!("Creating {}", output.display()))?;
    let mut out = BufWriter::new(file);
    writer::write(format, &mut out, &result.code, base_address)
        .with_context(|| "Writing object file")?;

    println!("Compilation successful:");
    println!("  Code size: {} bytes", result.code.len());
    println!("  Symbols: {}", result.symbols.len());
    println!("  Base address: 0x{base_address:04X}");

    Ok(())
}

fn run_play(
    bytecode: &Path,
    wavetables: &Path,
    output: &Path,
    rate: u32,
    jumps: Option<u32>,
) -> anyhow::Result<()> {
    let code = std::fs::read(bytecode)
        .with_context(|| format!("Reading bytecode from {}", bytecode.display()))?;
    if code.is_empty() {
        bail!("bytecode file is empty");
    }

    let tables = wavetable::WavetableSet::load(wavetables)?;
    println!("Loaded {} wavetable(s)", tables.count());

    let opts = interp::Options {
        sample_rate: rate,
        max_jumps: jumps,
    };
    let mut interpreter = interp::Interpreter::new(code, tables, &opts);
    let mut sink = audio::WavSink::create(output, rate)?;

    let termination = interpreter
        .run(&mut sink)
        .with_context(|| "Interpreting bytecode")?;

    let samples = sink.samples_written();
    sink.finish()?;

    println!(
        "Interpretation complete ({termination:?}): {samples} samples ({:.2} seconds)",
        samples as f64 / rate as f64
    );
    Ok(())
}

fn run_wavegen(input: &Path, output: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Reading {}", input.display()))?;
    let specs = wavegen::parse_specs(&json).with_context(|| "Parsing waveform specifications")?;

    let data = wavegen::generate_all(&specs)?;
    std::fs::write(output, &data).with_context(|| format!("Writing {}", output.display()))?;

    for spec in &specs {
        println!("Generated: {} ({} harmonics)", spec.name, spec.harmonics.len() - 1);
    }
    Ok(())
}
