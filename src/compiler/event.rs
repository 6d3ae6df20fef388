//! Compile-time voice state and the event tracker.
//!
//! An event groups the notes that start at the same instant, one per
//! active voice. It stays open while any active voice still has a
//! remaining duration of 0 and closes once every active voice has a
//! pending duration; closing subtracts the shortest duration from every
//! active voice, which models the next decision point.

use crate::isa::{NUM_VOICES, VOICE_INACTIVE};

/// Per-voice bookkeeping while compiling.
#[derive(Debug, Clone, Copy)]
pub struct VoiceTrack {
    /// Stored 0..=15; the WAV keyword's 1..=16 is stored minus one.
    pub waveform: u8,
    /// Time units left, with 0xFF = inactive and 0 = needs a note.
    pub remaining: u8,
    /// Last absolute pitch, 0 = no history.
    pub last_pitch: u8,
    /// Current octave, 0 = never set.
    pub octave: u8,
    /// The next note for this voice must use the long absolute form.
    pub use_absolute: bool,
}

impl Default for VoiceTrack {
    fn default() -> Self {
        Self {
            waveform: 0,
            remaining: VOICE_INACTIVE,
            last_pitch: 0,
            octave: 0,
            use_absolute: true,
        }
    }
}

/// The event state machine: closed, or open with a cursor into the voice
/// slots pointing at the first slot that may still need a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Closed,
    Open { cursor: usize },
}

#[derive(Debug)]
pub struct EventTracker {
    pub voices: [VoiceTrack; NUM_VOICES],
    pub event: Event,
}

impl Default for EventTracker {
    fn default() -> Self {
        Self {
            voices: [VoiceTrack::default(); NUM_VOICES],
            event: Event::Closed,
        }
    }
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.event, Event::Open { .. })
    }

    pub fn force_close(&mut self) {
        self.event = Event::Closed;
    }

    pub fn activate(&mut self, index: usize) {
        self.voices[index].remaining = 0;
    }

    pub fn deactivate(&mut self, index: usize) {
        self.voices[index].remaining = VOICE_INACTIVE;
    }

    pub fn any_active(&self) -> bool {
        self.voices.iter().any(|v| v.remaining != VOICE_INACTIVE)
    }

    /// First slot at or after `start` whose voice needs a note.
    pub fn next_needing_note(&self, start: usize) -> Option<usize> {
        (start..NUM_VOICES).find(|&i| self.voices[i].remaining == 0)
    }

    /// Shortest remaining duration among active voices.
    pub fn min_remaining(&self) -> u8 {
        self.voices
            .iter()
            .filter(|v| v.remaining != VOICE_INACTIVE)
            .map(|v| v.remaining)
            .min()
            .unwrap_or(VOICE_INACTIVE)
    }

    /// Close the event: advance time by the shortest pending duration.
    pub fn complete(&mut self) {
        let min = self.min_remaining();
        for voice in &mut self.voices {
            if voice.remaining != VOICE_INACTIVE {
                voice.remaining -= min;
            }
        }
        self.event = Event::Closed;
    }
}
