//! Wavetable storage.
//!
//! A wavetable file is a plain concatenation of 256-byte unsigned tables;
//! table 0 is the first 256 bytes. Tables are immutable once loaded and
//! shared read-only by every voice.

use anyhow::{bail, Context, Result};
use log::warn;
use std::path::Path;

use crate::isa::WAVETABLE_SIZE;

#[derive(Debug, Clone)]
pub struct WavetableSet {
    data: Vec<u8>,
}

impl WavetableSet {
    /// Wrap raw bytes. Trailing bytes that do not fill a whole table are
    /// dropped with a warning; an input shorter than one table is an error.
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self> {
        if data.len() < WAVETABLE_SIZE {
            bail!(
                "wavetable data is {} bytes, need at least {}",
                data.len(),
                WAVETABLE_SIZE
            );
        }
        let remainder = data.len() % WAVETABLE_SIZE;
        if remainder != 0 {
            warn!("wavetable data not a multiple of {WAVETABLE_SIZE} bytes, dropping {remainder}");
            data.truncate(data.len() - remainder);
        }
        Ok(Self { data })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Reading wavetables from {}", path.display()))?;
        Self::from_bytes(data)
    }

    pub fn count(&self) -> usize {
        self.data.len() / WAVETABLE_SIZE
    }

    /// One table as a fixed-size slice, or None when the index is out of
    /// range.
    pub fn table(&self, index: usize) -> Option<&[u8; WAVETABLE_SIZE]> {
        let start = index.checked_mul(WAVETABLE_SIZE)?;
        self.data
            .get(start..start + WAVETABLE_SIZE)
            .map(|s| s.try_into().expect("slice is table sized"))
    }
}
