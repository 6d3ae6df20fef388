//! Raw binary output: the code buffer byte for byte.

use anyhow::Result;
use std::io::Write;

pub fn write(out: &mut dyn Write, code: &[u8]) -> Result<()> {
    out.write_all(code)?;
    Ok(())
}
