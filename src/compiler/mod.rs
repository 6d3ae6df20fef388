//! The NOTRAN compiler: source lines in, bytecode out.
//!
//! Each line is uppercased and walked left to right. A leading `*` makes
//! the line a comment, a leading digit defines a numeric label, anything
//! else must start with a blank. The rest of the line is a sequence of
//! three-letter keywords and notes separated by blanks or `;`.
//!
//! Diagnostics are line-local: a failed specification skips to the next
//! `;` or end of line and compilation carries on so one pass surfaces as
//! many problems as possible. The caller withholds object emission when
//! any diagnostic was produced.

pub mod event;
pub mod note;
pub mod scanner;
pub mod symbols;

use std::fmt::Write as _;

use crate::error::{Diagnostics, ErrorKind};
use crate::isa::{
    OP_CALL, OP_END, OP_JUMP, OP_LONG_NOTE_ABS, OP_REST_MASK, OP_RETURN, OP_SET_VOICES, OP_TEMPO,
    OP_ACTIVATE, OP_DEACTIVATE,
};

use event::{Event, EventTracker};
use note::NoteSpec;
use scanner::LineScanner;
use symbols::SymbolTable;

const MAX_PITCH: i32 = 61;
const DEFAULT_OCTAVE: u8 = 4;

#[derive(Debug, Clone)]
pub struct Options {
    /// Load base the object addresses are relative to.
    pub base_address: u16,
    pub listing: bool,
    pub max_symbols: usize,
    pub max_code_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_address: 0,
            listing: false,
            max_symbols: 100,
            max_code_size: 8192,
        }
    }
}

/// Result of one compilation pass. `code` is only worth emitting when
/// `diagnostics` is empty.
pub struct Output {
    pub code: Vec<u8>,
    pub symbols: SymbolTable,
    pub listing: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Compile a whole source text.
pub fn compile(source: &str, opts: Options) -> Output {
    let mut compiler = Compiler::new(opts);

    for line in source.lines() {
        compiler.line_number += 1;
        let line = line.trim_end_matches('\r').to_ascii_uppercase();
        compiler.process_line(&line);

        if compiler.finished || compiler.fatal {
            break;
        }
    }

    Output {
        code: compiler.code,
        symbols: compiler.symbols,
        listing: compiler.listing,
        diagnostics: compiler.diagnostics,
    }
}

struct Compiler {
    opts: Options,
    code: Vec<u8>,
    symbols: SymbolTable,
    tracker: EventTracker,
    /// Offset of the pending SUB placeholder word, if one is open.
    sub_patch: Option<usize>,
    diagnostics: Diagnostics,
    listing: Option<String>,
    line_number: usize,
    line_code_start: usize,
    finished: bool,
    fatal: bool,
}

type Handler = fn(&mut Compiler, &mut LineScanner) -> Result<(), ErrorKind>;

impl Compiler {
    fn new(opts: Options) -> Self {
        let symbols = SymbolTable::new(opts.max_symbols);
        let listing = opts.listing.then(String::new);
        Self {
            opts,
            code: Vec::new(),
            symbols,
            tracker: EventTracker::new(),
            sub_patch: None,
            diagnostics: Diagnostics::new(),
            listing,
            line_number: 0,
            line_code_start: 0,
            finished: false,
            fatal: false,
        }
    }

    fn report(&mut self, kind: ErrorKind) {
        self.diagnostics.push(self.line_number, kind);
    }

    /* ---------------------------------------------------------------- */
    /*  Line processing                                                 */
    /* ---------------------------------------------------------------- */

    fn process_line(&mut self, line: &str) {
        self.line_code_start = self.code.len();

        if line.starts_with('*') {
            self.list_line(line);
            return;
        }

        let mut scanner = LineScanner::new(line);
        match scanner.peek() {
            Some(ch) if ch.is_ascii_digit() => self.parse_label(&mut scanner),
            Some(b' ') | None => {}
            Some(_) => {
                self.report(ErrorKind::Incomprehensible);
                self.list_line(line);
                return;
            }
        }

        while !scanner.at_end() && !self.finished && !self.fatal {
            scanner.skip_whitespace();
            if scanner.at_end() {
                break;
            }

            if !self.try_keyword(&mut scanner) {
                self.parse_note_spec(&mut scanner);
            }

            scanner.skip_whitespace();
            scanner.eat(b';');
        }

        self.list_line(line);
    }

    fn parse_label(&mut self, scanner: &mut LineScanner) {
        let id = match scanner.parse_number() {
            Ok(id) => id,
            Err(kind) => {
                self.report(kind);
                return;
            }
        };

        if self.tracker.is_open() {
            self.report(ErrorKind::IdentifierInEvent);
            return;
        }
        if id == 0 {
            self.report(ErrorKind::Incomprehensible);
            return;
        }
        if self.symbols.contains(id) {
            self.report(ErrorKind::DuplicateIdentifier);
            return;
        }

        let address = self.opts.base_address.wrapping_add(self.code.len() as u16);
        if let Err(kind) = self.symbols.define(id, address) {
            self.report(kind);
        }
    }

    /* ---------------------------------------------------------------- */
    /*  Code emission                                                   */
    /* ---------------------------------------------------------------- */

    fn emit_byte(&mut self, byte: u8) {
        if self.code.len() >= self.opts.max_code_size {
            self.report(ErrorKind::CodeOverflow);
            return;
        }
        self.code.push(byte);
    }

    fn emit_word(&mut self, word: u16) {
        self.emit_byte(word as u8);
        self.emit_byte((word >> 8) as u8);
    }

    /* ---------------------------------------------------------------- */
    /*  Keywords                                                        */
    /* ---------------------------------------------------------------- */

    fn try_keyword(&mut self, scanner: &mut LineScanner) -> bool {
        let Some(word) = scanner.peek3() else {
            return false;
        };

        let handler: Handler = match &word {
            b"NVC" => Self::handle_nvc,
            b"ACT" => Self::handle_act,
            b"DCT" => Self::handle_dct,
            b"WAV" => Self::handle_wav,
            b"TPO" => Self::handle_tpo,
            b"ABS" => Self::handle_abs,
            b"JMP" => Self::handle_jmp,
            b"JSR" => Self::handle_jsr,
            b"RTS" => Self::handle_rts,
            b"SUB" => Self::handle_sub,
            b"ESB" => Self::handle_esb,
            b"END" => Self::handle_end,
            _ => return false,
        };

        scanner.advance(3);
        if let Err(kind) = handler(self, scanner) {
            self.report(kind);
            scanner.skip_to_separator();
        }
        true
    }

    /// A keyword that emits code cannot appear while an event is open;
    /// the event is forced closed so compilation can continue.
    fn check_event_conflict(&mut self) {
        if self.tracker.is_open() {
            self.report(ErrorKind::ControlInEvent);
            self.tracker.force_close();
        }
    }

    fn handle_nvc(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        let count = scanner.parse_number()?;
        if !(1..=4).contains(&count) {
            return Err(ErrorKind::ArgOutOfRange);
        }
        self.check_event_conflict();
        self.emit_byte(OP_SET_VOICES);
        self.emit_byte(count);
        Ok(())
    }

    fn handle_act(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.handle_voice_control(scanner, true)
    }

    fn handle_dct(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.handle_voice_control(scanner, false)
    }

    fn handle_voice_control(
        &mut self,
        scanner: &mut LineScanner,
        activate: bool,
    ) -> Result<(), ErrorKind> {
        let opcode = if activate { OP_ACTIVATE } else { OP_DEACTIVATE };

        loop {
            scanner.skip_whitespace();
            let voice = scanner.parse_number()?;

            if (1..=4).contains(&voice) {
                let index = (voice - 1) as usize;
                self.check_event_conflict();
                self.emit_byte(opcode);
                self.emit_byte(index as u8);
                if activate {
                    self.tracker.activate(index);
                } else {
                    self.tracker.deactivate(index);
                }
            } else {
                self.report(ErrorKind::ArgOutOfRange);
            }

            scanner.skip_whitespace();
            if !scanner.eat(b',') {
                break;
            }
        }
        Ok(())
    }

    /// WAV sets compile state only; the waveform reaches the bytecode in
    /// the next long note for the voice.
    fn handle_wav(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        let waveform = scanner.parse_number()?;
        if !(1..=16).contains(&waveform) {
            return Err(ErrorKind::ArgOutOfRange);
        }

        scanner.skip_whitespace();
        if !scanner.eat(b',') {
            return Err(ErrorKind::Incomprehensible);
        }

        let voice = scanner.parse_number()?;
        if !(1..=4).contains(&voice) {
            return Err(ErrorKind::ArgOutOfRange);
        }

        scanner.skip_whitespace();
        if !matches!(scanner.peek(), None | Some(b';')) {
            return Err(ErrorKind::Incomprehensible);
        }

        let track = &mut self.tracker.voices[(voice - 1) as usize];
        track.use_absolute = true;
        track.waveform = waveform - 1;
        Ok(())
    }

    fn handle_tpo(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        let tempo = scanner.parse_number()?;
        if tempo == 0 {
            return Err(ErrorKind::ArgOutOfRange);
        }
        self.check_event_conflict();
        self.emit_byte(OP_TEMPO);
        self.emit_byte(tempo);
        Ok(())
    }

    fn handle_abs(&mut self, _scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        for track in &mut self.tracker.voices {
            track.use_absolute = true;
        }
        Ok(())
    }

    fn handle_jmp(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.handle_transfer(scanner, OP_JUMP)
    }

    fn handle_jsr(&mut self, scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.handle_transfer(scanner, OP_CALL)
    }

    fn handle_transfer(&mut self, scanner: &mut LineScanner, opcode: u8) -> Result<(), ErrorKind> {
        let id = scanner.parse_number()?;
        if id == 0 {
            return Err(ErrorKind::ArgOutOfRange);
        }

        let Some(address) = self.symbols.lookup(id) else {
            self.check_event_conflict();
            return Err(ErrorKind::UndefinedIdentifier);
        };

        self.check_event_conflict();
        self.emit_byte(opcode);
        self.emit_word(address.wrapping_sub(self.opts.base_address));
        Ok(())
    }

    fn handle_rts(&mut self, _scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.check_event_conflict();
        self.emit_byte(OP_RETURN);
        Ok(())
    }

    /// SUB opens a subroutine body by jumping over it; the jump target is
    /// back-patched by the matching ESB.
    fn handle_sub(&mut self, _scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        if self.sub_patch.is_some() {
            self.report(ErrorKind::NestedSub);
            self.check_event_conflict();
            return Ok(());
        }

        self.check_event_conflict();
        self.emit_byte(OP_JUMP);
        self.sub_patch = Some(self.code.len());
        self.emit_word(0x0000);
        Ok(())
    }

    fn handle_esb(&mut self, _scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        let Some(slot) = self.sub_patch.take() else {
            self.report(ErrorKind::EsbWithoutSub);
            self.check_event_conflict();
            return Ok(());
        };

        self.check_event_conflict();
        let relative = self.code.len() as u16;
        self.code[slot] = relative as u8;
        self.code[slot + 1] = (relative >> 8) as u8;
        Ok(())
    }

    fn handle_end(&mut self, _scanner: &mut LineScanner) -> Result<(), ErrorKind> {
        self.emit_byte(OP_END);
        self.finished = true;

        if self.sub_patch.is_some() {
            self.report(ErrorKind::HangingSub);
        }
        Ok(())
    }

    /* ---------------------------------------------------------------- */
    /*  Notes and events                                                */
    /* ---------------------------------------------------------------- */

    fn parse_note_spec(&mut self, scanner: &mut LineScanner) {
        match note::parse_note(scanner) {
            Ok(spec) => self.process_note(&spec),
            Err(kind) => {
                self.report(kind);
                scanner.skip_to_separator();
            }
        }
    }

    fn process_note(&mut self, spec: &NoteSpec) {
        let cursor = match self.tracker.event {
            Event::Open { cursor } => cursor,
            Event::Closed => {
                self.tracker.event = Event::Open { cursor: 0 };
                if !self.tracker.any_active() {
                    self.report(ErrorKind::NoVoicesActive);
                    self.fatal = true;
                    return;
                }
                0
            }
        };

        let Some(slot) = self.tracker.next_needing_note(cursor) else {
            self.report(ErrorKind::NoVoicesActive);
            return;
        };

        if let Some(voice) = spec.voice {
            if slot != (voice - 1) as usize {
                self.report(ErrorKind::VoiceMismatch);
            }
        }

        if spec.is_rest() {
            self.emit_byte(OP_REST_MASK | spec.duration_code);
        } else {
            self.encode_note(slot, spec);
        }

        self.tracker.voices[slot].remaining = spec.duration_time;
        self.tracker.voices[slot].use_absolute = false;

        let next = slot + 1;
        if self.tracker.next_needing_note(next).is_none() {
            self.tracker.complete();
        } else {
            self.tracker.event = Event::Open { cursor: next };
        }
    }

    fn encode_note(&mut self, slot: usize, spec: &NoteSpec) {
        let octave = match spec.octave {
            Some(octave) => octave,
            None => {
                let inherited = self.tracker.voices[slot].octave;
                if inherited == 0 {
                    self.report(ErrorKind::PitchOutOfRange);
                    DEFAULT_OCTAVE
                } else {
                    inherited
                }
            }
        };
        self.tracker.voices[slot].octave = octave;

        let mut absolute = octave as i32 * 12 + spec.pitch as i32 - 12;
        if !(1..=MAX_PITCH).contains(&absolute) {
            self.report(ErrorKind::PitchOutOfRange);
            absolute = MAX_PITCH;
        }
        let absolute = absolute as u8;

        let track = self.tracker.voices[slot];
        let delta = absolute as i32 - track.last_pitch as i32;
        let use_short = !track.use_absolute && track.last_pitch != 0 && (-7..=7).contains(&delta);

        if use_short {
            self.emit_byte(((delta as u8) & 0x0F) << 4 | spec.duration_code);
        } else {
            self.emit_byte(OP_LONG_NOTE_ABS);
            self.emit_byte(absolute * 2);
            self.emit_byte(track.waveform << 4 | spec.duration_code);
        }

        self.tracker.voices[slot].last_pitch = absolute;
    }

    /* ---------------------------------------------------------------- */
    /*  Listing                                                         */
    /* ---------------------------------------------------------------- */

    fn list_line(&mut self, line: &str) {
        let base = self.opts.base_address;
        let start = self.line_code_start;
        let bytes = &self.code[start..];

        let Some(listing) = self.listing.as_mut() else {
            return;
        };

        if line.is_empty() {
            listing.push('\n');
            return;
        }

        listing.push_str(line);
        listing.push('\n');

        if line.starts_with('*') {
            return;
        }

        let _ = write!(listing, "{:04X}  ", base.wrapping_add(start as u16));
        for byte in bytes {
            let _ = write!(listing, "{byte:02X} ");
        }
        listing.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn compile_ok(source: &str) -> Vec<u8> {
        let output = compile(source, Options::default());
        assert!(
            output.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            output.diagnostics.iter().collect::<Vec<_>>()
        );
        output.code
    }

    fn kinds(source: &str) -> Vec<ErrorKind> {
        compile(source, Options::default())
            .diagnostics
            .iter()
            .map(|d| d.kind)
            .collect()
    }

    #[test]
    fn test_control_sequence() {
        let code = compile_ok(" NVC4; ACT1,2,3,4; WAV1,1; TPO 100; END\n");
        assert_eq!(
            code,
            vec![0x50, 0x04, 0x90, 0x00, 0x90, 0x01, 0x90, 0x02, 0x90, 0x03, 0x10, 0x64, 0x00]
        );
    }

    #[test]
    fn test_first_note_is_long_absolute() {
        let code = compile_ok(" ACT1\n C4Q\n END\n");
        // C4 = chromatic 37, pitch byte 74, waveform 0, duration code 6
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x00]);
    }

    #[test]
    fn test_second_note_uses_short_form() {
        let code = compile_ok(" ACT1\n C4Q; D4Q\n END\n");
        // D4 is two semitones above C4: delta +2 within range
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x26, 0x00]);
    }

    #[test]
    fn test_large_interval_falls_back_to_long() {
        let code = compile_ok(" ACT1\n C4Q; C5Q\n END\n");
        // +12 semitones exceeds the short range
        assert_eq!(
            code,
            vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x60, 0x62, 0x06, 0x00]
        );
    }

    #[test]
    fn test_downward_delta_wraps_into_nibble() {
        let code = compile_ok(" ACT1\n C4Q; B3Q\n END\n");
        // B3 is one semitone below C4: delta -1 encodes as 0xF
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0xF6, 0x00]);
    }

    #[test]
    fn test_wav_forces_absolute_encoding() {
        let code = compile_ok(" ACT1\n C4Q; WAV2,1; D4Q\n END\n");
        assert_eq!(
            code,
            vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x60, 0x4E, 0x16, 0x00]
        );
    }

    #[test]
    fn test_abs_forces_absolute_encoding() {
        let code = compile_ok(" ACT1\n C4Q; ABS; D4Q\n END\n");
        assert_eq!(
            code,
            vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x60, 0x4E, 0x06, 0x00]
        );
    }

    #[test]
    fn test_rest_ignores_history() {
        let code = compile_ok(" ACT1\n C4Q; R Q\n END\n");
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x86, 0x00]);
    }

    #[test]
    fn test_octave_inherited_from_voice() {
        let code = compile_ok(" ACT1\n C4Q; EQ\n END\n");
        // E without octave inherits 4: E4 = 41, delta +4
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x46, 0x00]);
    }

    #[test]
    fn test_label_and_jump() {
        let output = compile("1 JMP 1\n", Options::default());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.code, vec![0x40, 0x00, 0x00]);
        assert_eq!(output.symbols.lookup(1), Some(0));
    }

    #[test]
    fn test_jump_is_base_relative() {
        let opts = Options {
            base_address: 0x1000,
            ..Options::default()
        };
        let output = compile(" TPO 50\n2 JSR 2\n", opts);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.symbols.lookup(2), Some(0x1002));
        assert_eq!(output.code, vec![0x10, 0x32, 0x20, 0x02, 0x00]);
    }

    #[test]
    fn test_sub_esb_patches_forward() {
        let code = compile_ok(" SUB; ESB; END\n");
        assert_eq!(code, vec![0x40, 0x03, 0x00, 0x00]);
    }

    #[test]
    fn test_sub_skips_body() {
        let code = compile_ok(" SUB; RTS; ESB; END\n");
        assert_eq!(code, vec![0x40, 0x04, 0x00, 0x30, 0x00]);
    }

    #[test]
    fn test_event_groups_two_voices() {
        let code = compile_ok(" ACT1,2\n C4Q E4H\n D4Q\n END\n");
        // first event fills both voices; after it voice 1 expires first,
        // so the next note binds to voice 1 again
        assert_eq!(
            code,
            vec![
                0x90, 0x00, 0x90, 0x01, // ACT1,2
                0x60, 0x4A, 0x06, // C4Q on voice 1
                0x60, 0x52, 0x03, // E4H on voice 2
                0x26, // D4Q short on voice 1
                0x00,
            ]
        );
    }

    #[test]
    fn test_line_byte_counts_match_listing_offsets() {
        let opts = Options {
            listing: true,
            ..Options::default()
        };
        let output = compile(" NVC2; ACT1\n C4Q\n END\n", opts);
        assert!(output.diagnostics.is_empty());
        let listing = output.listing.unwrap();
        // every code line reports its start address
        assert!(listing.contains("0000  50 02 90 00"));
        assert!(listing.contains("0004  60 4A 06"));
        assert!(listing.contains("0007  00"));
    }

    #[test]
    fn test_duplicate_label() {
        assert_eq!(
            kinds("1 TPO 10\n1 TPO 20\n END\n"),
            vec![ErrorKind::DuplicateIdentifier]
        );
    }

    #[test]
    fn test_undefined_jump_target() {
        assert_eq!(kinds(" JMP 9\n END\n"), vec![ErrorKind::UndefinedIdentifier]);
    }

    #[test]
    fn test_voice_mismatch() {
        assert_eq!(
            kinds(" ACT1,2\n 2C4Q\n END\n"),
            vec![ErrorKind::VoiceMismatch]
        );
    }

    #[test]
    fn test_control_in_event_forces_close() {
        let output = compile(" ACT1,2\n C4Q; TPO 9\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::ControlInEvent]);
        // the tempo command is still emitted after the forced close
        assert_eq!(
            output.code,
            vec![0x90, 0x00, 0x90, 0x01, 0x60, 0x4A, 0x06, 0x10, 0x09, 0x00]
        );
    }

    #[test]
    fn test_label_inside_event() {
        // the label is rejected, then the tempo keyword trips over the
        // still-open event and force-closes it
        assert_eq!(
            kinds(" ACT1,2\n C4Q\n3 TPO 9\n END\n"),
            vec![ErrorKind::IdentifierInEvent, ErrorKind::ControlInEvent]
        );
    }

    #[test]
    fn test_nested_sub_and_hanging_sub() {
        assert_eq!(
            kinds(" SUB; SUB; END\n"),
            vec![ErrorKind::NestedSub, ErrorKind::HangingSub]
        );
        assert_eq!(kinds(" ESB; END\n"), vec![ErrorKind::EsbWithoutSub]);
    }

    #[test]
    fn test_no_voices_active_is_fatal() {
        let output = compile(" C4Q\n TPO 10\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::NoVoicesActive]);
        // compilation stopped before TPO and END
        assert!(output.code.is_empty());
    }

    #[test]
    fn test_missing_octave_without_history() {
        let output = compile(" ACT1\n CQ\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::PitchOutOfRange]);
        // continues with octave 4
        assert_eq!(output.code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x00]);
    }

    #[test]
    fn test_pitch_clamped_to_maximum() {
        let output = compile(" ACT1\n B6Q\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::PitchOutOfRange]);
        // B6 = 72 clamps to 61
        assert_eq!(output.code, vec![0x90, 0x00, 0x60, 0x7A, 0x06, 0x00]);
    }

    #[test]
    fn test_error_recovery_continues_past_bad_spec() {
        let output = compile(" XYZ; TPO 7\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Incomprehensible]);
        assert_eq!(output.code, vec![0x10, 0x07, 0x00]);
    }

    #[test]
    fn test_tempo_zero_rejected() {
        assert_eq!(kinds(" TPO 0\n END\n"), vec![ErrorKind::ArgOutOfRange]);
    }

    #[test]
    fn test_act_recovers_within_list() {
        let output = compile(" ACT1,5,2\n END\n", Options::default());
        let kinds: Vec<_> = output.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::ArgOutOfRange]);
        assert_eq!(output.code, vec![0x90, 0x00, 0x90, 0x01, 0x00]);
    }

    #[test]
    fn test_comment_and_blank_lines_emit_nothing() {
        let code = compile_ok("* a comment\n\n TPO 3; END\n");
        assert_eq!(code, vec![0x10, 0x03, 0x00]);
    }

    #[test]
    fn test_lowercase_source_is_normalized() {
        let code = compile_ok(" act1\n c4q\n end\n");
        assert_eq!(code, vec![0x90, 0x00, 0x60, 0x4A, 0x06, 0x00]);
    }

    #[test]
    fn test_code_overflow() {
        let opts = Options {
            max_code_size: 3,
            ..Options::default()
        };
        let output = compile(" TPO 1; TPO 2\n END\n", opts);
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::CodeOverflow));
    }
}
