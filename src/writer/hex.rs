//! PAP and Intel HEX record output.
//!
//! Both formats break the code into lines of hex-encoded bytes prefixed
//! with a length and address, and both checksum the length, the address
//! bytes and the data. PAP writes the 16-bit checksum as-is and ends with
//! a line-count trailer; Intel HEX writes the low byte's two's complement
//! and ends with the fixed EOF record.

use anyhow::Result;
use std::io::Write;

const PAP_BYTES_PER_LINE: usize = 24;
const IHEX_BYTES_PER_LINE: usize = 32;

fn checksum(address: u16, data: &[u8]) -> u16 {
    let mut sum = data.len() as u16;
    sum = sum.wrapping_add(address >> 8);
    sum = sum.wrapping_add(address & 0xFF);
    for &byte in data {
        sum = sum.wrapping_add(byte as u16);
    }
    sum
}

fn write_hex_bytes(out: &mut dyn Write, data: &[u8]) -> Result<()> {
    for byte in data {
        write!(out, "{byte:02X}")?;
    }
    Ok(())
}

/// PAP record: `;LLAAAA<data>CCCC`, trailer `;00LLLLCCCC` with the line
/// count in place of the address.
pub fn write_pap(out: &mut dyn Write, code: &[u8], base_address: u16) -> Result<()> {
    let mut address = base_address;
    let mut line_count: u16 = 0;

    for chunk in code.chunks(PAP_BYTES_PER_LINE) {
        write!(out, ";{:02X}{:04X}", chunk.len(), address)?;
        write_hex_bytes(out, chunk)?;
        writeln!(out, "{:04X}", checksum(address, chunk))?;

        address = address.wrapping_add(chunk.len() as u16);
        line_count += 1;
    }

    let trailer_checksum = (line_count >> 8).wrapping_add(line_count & 0xFF);
    writeln!(out, ";00{line_count:04X}{trailer_checksum:04X}")?;
    Ok(())
}

/// Intel HEX record: `:LLAAAA00<data>CC` plus the EOF record.
pub fn write_ihex(out: &mut dyn Write, code: &[u8], base_address: u16) -> Result<()> {
    let mut address = base_address;

    for chunk in code.chunks(IHEX_BYTES_PER_LINE) {
        write!(out, ":{:02X}{:04X}00", chunk.len(), address)?;
        write_hex_bytes(out, chunk)?;
        let record_checksum = (checksum(address, chunk) as u8).wrapping_neg();
        writeln!(out, "{record_checksum:02X}")?;

        address = address.wrapping_add(chunk.len() as u16);
    }

    writeln!(out, ":00000001FF")?;
    Ok(())
}
