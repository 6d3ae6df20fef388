//! Wavetable generation from harmonic specifications.
//!
//! A specification document is a JSON array of waveforms. Each waveform
//! lists `harmonics` as 16-bit values, MSB = amplitude and LSB = phase,
//! with the first entry being the DC term. Evaluation keeps the original
//! 8-bit angle arithmetic: the angle index accumulator wraps at 256, so
//! harmonic n advances n times faster than the fundamental.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::isa::WAVETABLE_SIZE;

const MAX_HARMONICS: usize = 16;
const DEFAULT_PEAK: u8 = 0x3F;

fn default_peak() -> u8 {
    DEFAULT_PEAK
}

fn default_norm() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformSpec {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Target peak value after normalization.
    #[serde(default = "default_peak")]
    pub peak: u8,
    /// Scale the waveform span to `peak`; raw values otherwise.
    #[serde(default = "default_norm")]
    pub norm: bool,
    /// DC term followed by 1..=16 harmonics; MSB amplitude, LSB phase.
    pub harmonics: Vec<u16>,
}

impl WaveformSpec {
    fn harmonic_count(&self) -> usize {
        self.harmonics.len().saturating_sub(1)
    }

    fn validate(&self) -> Result<()> {
        let count = self.harmonic_count();
        if count < 1 || count > MAX_HARMONICS {
            bail!(
                "'{}' has {} harmonics (valid: 1-{})",
                self.name,
                count,
                MAX_HARMONICS
            );
        }
        Ok(())
    }
}

pub fn parse_specs(json: &str) -> Result<Vec<WaveformSpec>> {
    let specs: Vec<WaveformSpec> = serde_json::from_str(json)?;
    if specs.is_empty() {
        bail!("no waveform specifications in input");
    }
    for spec in &specs {
        spec.validate()?;
    }
    Ok(specs)
}

fn byte_to_radians(angle: u8) -> f64 {
    angle as f64 / 256.0 * 2.0 * std::f64::consts::PI
}

fn evaluate_harmonic(harmonic: u16, angle_offset: u8) -> f64 {
    let amplitude = (harmonic >> 8) as u8;
    let phase = harmonic as u8;

    let angle = phase.wrapping_add(angle_offset);
    amplitude as f64 / 255.0 * byte_to_radians(angle).cos()
}

/// One waveform point. The index accumulator advances by the point number
/// per harmonic, all in 8-bit arithmetic, replicating the original
/// phase-stepping evaluation.
fn evaluate_point(point: usize, spec: &WaveformSpec) -> f64 {
    let mut accumulator = 0.0;
    let mut index_accumulator: u8 = 0;

    for &harmonic in &spec.harmonics {
        accumulator += evaluate_harmonic(harmonic, index_accumulator);
        index_accumulator = index_accumulator.wrapping_add(point as u8);
    }

    accumulator
}

fn quantize(value: f64) -> u8 {
    if value < 0.0 {
        0
    } else if value > 255.0 {
        255
    } else {
        (value + 0.5) as u8
    }
}

/// Evaluate one specification into a 256-byte table.
pub fn generate(spec: &WaveformSpec) -> Result<[u8; WAVETABLE_SIZE]> {
    spec.validate()?;

    let mut raw = [0.0; WAVETABLE_SIZE];
    for (point, slot) in raw.iter_mut().enumerate() {
        *slot = evaluate_point(point, spec);
    }

    let mut scale = 1.0;
    let mut offset = 0.0;
    if spec.norm {
        let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        if span > 0.0 {
            scale = spec.peak as f64 / span;
            offset = -min;
        }
    }

    let mut table = [0u8; WAVETABLE_SIZE];
    for (slot, &value) in table.iter_mut().zip(raw.iter()) {
        let scaled = if spec.norm { (value + offset) * scale } else { value };
        *slot = quantize(scaled);
    }

    Ok(table)
}

/// Generate every waveform and concatenate the tables, ready for the
/// interpreter's wavetable input.
pub fn generate_all(specs: &[WaveformSpec]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(specs.len() * WAVETABLE_SIZE);
    for spec in specs {
        out.extend_from_slice(&generate(spec)?);
    }
    Ok(out)
}
