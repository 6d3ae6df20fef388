//! The synthesis inner loop.
//!
//! One sample per tick: every counted voice contributes one wavetable
//! byte indexed by the integer half of its phase accumulator, the sum
//! saturates at 255, then each contributing voice's phase advances by its
//! frequency increment mod 2^16. Silent voices and voices pointing at a
//! missing wavetable are skipped.

use super::{Interpreter, RuntimeError};
use crate::audio::AudioSink;

impl Interpreter {
    /// Mix one output sample and advance the phase accumulators.
    pub(crate) fn generate_sample(&mut self) -> u8 {
        let mut sum: u16 = 0;

        for voice in self.voices.iter_mut().take(self.num_active) {
            if voice.freq_increment == 0 {
                continue;
            }
            let Some(table) = self.wavetables.table(voice.wavetable as usize) else {
                continue;
            };

            sum += table[voice.phase_int as usize] as u16;
            voice.advance_phase();
        }

        sum.min(255) as u8
    }

    /// Play the current event: `tempo * duration` samples, flushed to the
    /// sink in buffer-sized batches. Cancellation drains what was already
    /// generated.
    pub(crate) fn render_event(
        &mut self,
        sink: &mut dyn AudioSink,
        buffer: &mut [u8],
    ) -> Result<(), RuntimeError> {
        let total = self.samples_this_event();
        let mut generated: u32 = 0;
        let mut filled = 0;

        while generated < total && !self.cancelled() {
            buffer[filled] = self.generate_sample();
            filled += 1;
            generated += 1;

            if filled == buffer.len() {
                sink.write(buffer).map_err(RuntimeError::Sink)?;
                filled = 0;
            }
        }

        if filled > 0 {
            sink.write(&buffer[..filled]).map_err(RuntimeError::Sink)?;
        }

        Ok(())
    }
}
