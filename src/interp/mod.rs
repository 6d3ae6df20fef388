//! The bytecode interpreter.
//!
//! Each round first drains pure control commands (zero duration nibble,
//! not a long-note opcode), then assigns notes to every active voice whose
//! remaining duration reached zero, then plays the event: the shortest
//! pending duration times the tempo gives the sample count. A control
//! command encountered in the middle of note assignment is pushed back and
//! handled by the next drain.

pub mod synth;
pub mod voice;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;
use thiserror::Error;

use crate::audio::AudioSink;
use crate::isa::{
    is_control_command, is_long_note, sign_extend_nibble, DURATION_MASK, NUM_VOICES,
    OP_ACTIVATE, OP_CALL, OP_DEACTIVATE, OP_END, OP_JUMP, OP_LONG_NOTE_ABS, OP_RETURN,
    OP_SET_VOICES, OP_TEMPO, PITCH_MASK, PITCH_SHIFT, VOICE_INACTIVE,
};
use crate::wavetable::WavetableSet;

use voice::Voice;

pub const DEFAULT_SAMPLE_RATE: u32 = 8772;
const DEFAULT_TEMPO: u8 = 32;
const STACK_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct Options {
    pub sample_rate: u32,
    /// Jump budget; None means unbounded.
    pub max_jumps: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_jumps: None,
        }
    }
}

/// Why interpretation stopped, when it stopped without a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The END opcode.
    End,
    /// The jump budget ran out.
    JumpBudget,
    /// Execution ran off the end of the code.
    CodeEnd,
    /// The stop flag was raised.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("tempo cannot be zero at offset {0:#06X}")]
    ZeroTempo(usize),
    #[error("call stack overflow at offset {0:#06X}")]
    StackOverflow(usize),
    #[error("return with empty call stack at offset {0:#06X}")]
    StackUnderflow(usize),
    #[error("transfer to {target:#06X} outside code at offset {at:#06X}")]
    TargetOutOfRange { target: u16, at: usize },
    #[error("undefined control command {0:#04X} at offset {1:#06X}")]
    UndefinedCommand(u8, usize),
    #[error("audio sink failed: {0}")]
    Sink(anyhow::Error),
}

pub struct Interpreter {
    pub(crate) voices: [Voice; NUM_VOICES],
    pub(crate) wavetables: WavetableSet,
    pub(crate) num_active: usize,
    code: Vec<u8>,
    pc: usize,
    tempo: u8,
    /// Playback duration of the current event, in time units.
    pub(crate) event_duration: u8,
    call_stack: Vec<u16>,
    jumps_left: u32,
    stop: Arc<AtomicBool>,
}

impl Interpreter {
    pub fn new(code: Vec<u8>, wavetables: WavetableSet, opts: &Options) -> Self {
        Self {
            voices: [Voice::new(); NUM_VOICES],
            wavetables,
            num_active: NUM_VOICES,
            code,
            pc: 0,
            tempo: 0,
            event_duration: 0,
            call_stack: Vec::with_capacity(STACK_SIZE),
            jumps_left: opts.max_jumps.unwrap_or(u32::MAX),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag that cancels interpretation when set; checked at every
    /// decode step and every sample.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run the program to completion, delivering samples to `sink`.
    pub fn run(&mut self, sink: &mut dyn AudioSink) -> Result<Termination, RuntimeError> {
        if self.tempo == 0 {
            warn!("tempo not set, using default of {DEFAULT_TEMPO}");
            self.tempo = DEFAULT_TEMPO;
        }

        let mut buffer = [0u8; crate::audio::BUFFER_FRAMES];

        while self.pc < self.code.len() {
            if self.cancelled() {
                return Ok(Termination::Cancelled);
            }

            let pc_before = self.pc;
            if let Some(termination) = self.drain_controls()? {
                return Ok(termination);
            }
            if self.pc >= self.code.len() {
                break;
            }

            self.assign_notes();

            self.event_duration = self.shortest_duration();
            if self.event_duration == VOICE_INACTIVE || self.event_duration == 0 {
                // no playable event and no decode progress means a
                // malformed stream; stop instead of spinning
                if self.pc == pc_before {
                    break;
                }
                continue;
            }

            self.render_event(sink, &mut buffer)?;
        }

        Ok(if self.cancelled() {
            Termination::Cancelled
        } else {
            Termination::CodeEnd
        })
    }

    pub(crate) fn samples_this_event(&self) -> u32 {
        self.tempo as u32 * self.event_duration as u32
    }

    /* ---------------------------------------------------------------- */
    /*  Code reading                                                    */
    /* ---------------------------------------------------------------- */

    /// Reads past the end of the code yield 0.
    fn read_byte(&mut self) -> u8 {
        let byte = self.code.get(self.pc).copied().unwrap_or(0);
        self.pc += 1;
        byte
    }

    fn read_address(&mut self) -> u16 {
        let low = self.read_byte();
        let high = self.read_byte();
        u16::from_le_bytes([low, high])
    }

    fn transfer_to(&mut self, target: u16, at: usize) -> Result<(), RuntimeError> {
        if (target as usize) >= self.code.len() {
            return Err(RuntimeError::TargetOutOfRange { target, at });
        }
        self.pc = target as usize;
        Ok(())
    }

    /* ---------------------------------------------------------------- */
    /*  Control commands                                                */
    /* ---------------------------------------------------------------- */

    /// Execute control commands until a note (or end of code) is reached.
    fn drain_controls(&mut self) -> Result<Option<Termination>, RuntimeError> {
        while self.pc < self.code.len() {
            if self.cancelled() {
                return Ok(Some(Termination::Cancelled));
            }

            let command = self.code[self.pc];
            if !is_control_command(command) || is_long_note(command) {
                break;
            }

            self.pc += 1;
            if let Some(termination) = self.execute_control(command)? {
                return Ok(Some(termination));
            }
        }
        Ok(None)
    }

    fn execute_control(&mut self, command: u8) -> Result<Option<Termination>, RuntimeError> {
        let at = self.pc - 1;

        match command & PITCH_MASK {
            OP_END => return Ok(Some(Termination::End)),
            OP_TEMPO => {
                let tempo = self.read_byte();
                if tempo == 0 {
                    return Err(RuntimeError::ZeroTempo(at));
                }
                self.tempo = tempo;
            }
            OP_CALL => {
                if self.call_stack.len() >= STACK_SIZE {
                    return Err(RuntimeError::StackOverflow(at));
                }
                self.call_stack.push(self.pc as u16 + 2);
                let target = self.read_address();
                self.transfer_to(target, at)?;
            }
            OP_RETURN => {
                let Some(address) = self.call_stack.pop() else {
                    return Err(RuntimeError::StackUnderflow(at));
                };
                self.pc = address as usize;
            }
            OP_JUMP => {
                if self.jumps_left == 0 {
                    return Ok(Some(Termination::JumpBudget));
                }
                self.jumps_left -= 1;
                let target = self.read_address();
                self.transfer_to(target, at)?;
            }
            OP_SET_VOICES => {
                let count = self.read_byte();
                if !(1..=NUM_VOICES as u8).contains(&count) {
                    warn!("invalid voice count {count} at offset {at:#06X}, clamping");
                }
                self.num_active = (count.max(1) as usize).min(NUM_VOICES);
            }
            OP_DEACTIVATE => {
                let index = (self.read_byte() & 0x03) as usize;
                self.voices[index].deactivate();
            }
            OP_ACTIVATE => {
                let index = (self.read_byte() & 0x03) as usize;
                self.voices[index].activate();
            }
            _ => return Err(RuntimeError::UndefinedCommand(command, at)),
        }

        Ok(None)
    }

    /* ---------------------------------------------------------------- */
    /*  Note assignment                                                 */
    /* ---------------------------------------------------------------- */

    /// Give each active voice whose duration expired its next note. The
    /// previous event's duration is subtracted from the others on the way.
    fn assign_notes(&mut self) {
        for index in 0..NUM_VOICES {
            if !self.voices[index].is_active() {
                continue;
            }

            let remaining = self.voices[index].duration;
            if remaining > 0 && self.event_duration > 0 {
                if remaining > self.event_duration {
                    self.voices[index].duration = remaining - self.event_duration;
                    continue;
                }
                self.voices[index].duration = 0;
            }

            if !self.voices[index].is_expired() {
                continue;
            }
            if self.pc >= self.code.len() {
                break;
            }

            let command = self.read_byte();
            let duration_code = command & DURATION_MASK;

            if duration_code == 0 {
                if is_long_note(command) {
                    self.assign_long_note(index, command);
                } else {
                    // a pure control interrupts the event; push it back
                    self.pc -= 1;
                    return;
                }
            } else {
                let nibble = sign_extend_nibble(command >> PITCH_SHIFT);
                self.voices[index].assign_short(nibble, duration_code);
            }
        }
    }

    fn assign_long_note(&mut self, index: usize, command: u8) {
        let at = self.pc - 1;
        let pitch_byte = self.read_byte();
        let wd_byte = self.read_byte();

        let mut waveform = wd_byte >> 4;
        let mut duration_code = wd_byte & DURATION_MASK;

        if duration_code == 0 {
            warn!("long note with duration code 0 at offset {at:#06X}");
            duration_code = 1;
        }
        if (waveform as usize) >= self.wavetables.count() {
            warn!("invalid wavetable {waveform} at offset {at:#06X}");
            waveform = (self.wavetables.count() - 1) as u8;
        }

        if command & PITCH_MASK == OP_LONG_NOTE_ABS {
            self.voices[index].assign_long_absolute(pitch_byte, waveform, duration_code);
        } else {
            self.voices[index].assign_long_relative(pitch_byte as i8, waveform, duration_code);
        }
    }

    /// Shortest remaining duration among active voices that still have
    /// one; 0xFF when no voice is playing.
    fn shortest_duration(&self) -> u8 {
        self.voices
            .iter()
            .filter(|v| v.is_active() && !v.is_expired())
            .map(|v| v.duration)
            .min()
            .unwrap_or(VOICE_INACTIVE)
    }
}
