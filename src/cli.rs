use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::interp::DEFAULT_SAMPLE_RATE;
use crate::writer::ObjectFormat;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile NOTRAN source into bytecode
    Compile {
        /// Input .not source file
        input: PathBuf,
        /// Output object file
        #[arg(short, long)]
        output: PathBuf,
        /// Write a listing file
        #[arg(short, long)]
        listing: Option<PathBuf>,
        /// Load base address the object is assembled against
        #[arg(short = 'a', long, default_value_t = 0)]
        base_address: u16,
        /// Object container format
        #[arg(short, long, value_enum, default_value_t)]
        format: ObjectFormat,
    },
    /// Interpret bytecode and synthesize audio into a WAV file
    Play {
        /// Compiled bytecode
        bytecode: PathBuf,
        /// Concatenated 256-byte wavetables
        wavetables: PathBuf,
        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
        /// Sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        rate: u32,
        /// Maximum allowed jumps (unbounded if omitted)
        #[arg(short, long)]
        jumps: Option<u32>,
    },
    /// Generate wavetables from a JSON harmonic specification
    Wavegen {
        /// Input .json specification file
        input: PathBuf,
        /// Output wavetable file
        #[arg(short, long)]
        output: PathBuf,
    },
}
