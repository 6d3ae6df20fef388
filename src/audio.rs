//! Audio delivery.
//!
//! The synthesizer produces unsigned 8-bit mono samples and hands them to
//! an `AudioSink` in batches. The WAV sink is the reference sink; the
//! memory sink backs the tests.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Samples per flush from the synthesis loop.
pub const BUFFER_FRAMES: usize = 1024;

pub trait AudioSink {
    fn write(&mut self, samples: &[u8]) -> Result<()>;
}

/// WAV container sink: mono, 8-bit PCM.
pub struct WavSink {
    writer: hound::WavWriter<BufWriter<File>>,
}

impl WavSink {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Creating WAV file {}", path.display()))?;
        Ok(Self { writer })
    }

    pub fn samples_written(&self) -> u32 {
        self.writer.len()
    }

    pub fn finish(self) -> Result<()> {
        self.writer.finalize().context("Finalizing WAV file")?;
        Ok(())
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, samples: &[u8]) -> Result<()> {
        for &sample in samples {
            // hound stores 8-bit WAV with the usual 128 offset
            self.writer.write_sample((sample as i16 - 128) as i8)?;
        }
        Ok(())
    }
}

/// Collects samples in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub samples: Vec<u8>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, samples: &[u8]) -> Result<()> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }
}
