//! Object file emission.
//!
//! The compiler produces a bare byte stream; this module wraps it in one
//! of three containers: raw binary, PAP records, or Intel HEX records.

pub mod bin;
pub mod hex;

use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ObjectFormat {
    /// Raw bytes.
    #[default]
    Bin,
    /// PAP hex records.
    Pap,
    /// Intel HEX records.
    Ihex,
}

impl std::fmt::Display for ObjectFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjectFormat::Bin => "bin",
            ObjectFormat::Pap => "pap",
            ObjectFormat::Ihex => "ihex",
        })
    }
}

/// Write `code` in the chosen container. `base_address` only matters for
/// the record formats, which carry addresses.
pub fn write(
    format: ObjectFormat,
    out: &mut dyn Write,
    code: &[u8],
    base_address: u16,
) -> Result<()> {
    if code.is_empty() {
        return Ok(());
    }

    match format {
        ObjectFormat::Bin => bin::write(out, code),
        ObjectFormat::Pap => hex::write_pap(out, code, base_address),
        ObjectFormat::Ihex => hex::write_ihex(out, code, base_address),
    }
}
