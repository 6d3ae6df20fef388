//! End-to-end scenarios: source through the compiler, the produced
//! bytecode through the interpreter, samples into a memory sink.

use notran::audio::MemorySink;
use notran::compiler;
use notran::interp::{Interpreter, Options, Termination};
use notran::wavegen;
use notran::wavetable::WavetableSet;

fn compile(source: &str) -> Vec<u8> {
    let output = compiler::compile(source, compiler::Options::default());
    assert!(
        output.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        output.diagnostics.iter().collect::<Vec<_>>()
    );
    output.code
}

fn cosine_tables() -> WavetableSet {
    let specs = wavegen::parse_specs(r#"[{"name": "sine", "harmonics": [0, 65280]}]"#).unwrap();
    WavetableSet::from_bytes(wavegen::generate_all(&specs).unwrap()).unwrap()
}

#[test]
fn melody_produces_tempo_scaled_samples() {
    let code = compile(" NVC1; ACT1; TPO 10\n C4Q; D4E; R S\n END\n");
    assert_eq!(
        code,
        vec![0x50, 0x01, 0x90, 0x00, 0x10, 0x0A, 0x60, 0x4A, 0x06, 0x29, 0x8C, 0x00]
    );

    let mut interp = Interpreter::new(code, cosine_tables(), &Options::default());
    let mut sink = MemorySink::new();
    assert_eq!(interp.run(&mut sink).unwrap(), Termination::End);

    // quarter + eighth + sixteenth = 84 time units at tempo 10
    assert_eq!(sink.samples.len(), 840);

    // the generated cosine starts at its normalized peak
    assert_eq!(sink.samples[0], 0x3F);
    // the trailing rest is silence
    assert!(sink.samples[840 - 120..].iter().all(|&s| s == 0));
}

#[test]
fn self_jump_honors_the_jump_budget() {
    let code = compile("1 JMP 1\n");
    assert_eq!(code, vec![0x40, 0x00, 0x00]);

    let opts = Options {
        max_jumps: Some(5),
        ..Options::default()
    };
    let mut interp = Interpreter::new(code, cosine_tables(), &opts);
    let mut sink = MemorySink::new();
    assert_eq!(interp.run(&mut sink).unwrap(), Termination::JumpBudget);
    assert!(sink.samples.is_empty());
}

#[test]
fn subroutine_roundtrip_executes_after_definition() {
    let source = " SUB\n2 TPO 99; RTS\n ESB\n JSR 2\n END\n";
    let code = compile(source);
    assert_eq!(
        code,
        vec![0x40, 0x06, 0x00, 0x10, 0x63, 0x30, 0x20, 0x03, 0x00, 0x00]
    );

    let mut interp = Interpreter::new(code, cosine_tables(), &Options::default());
    let mut sink = MemorySink::new();
    assert_eq!(interp.run(&mut sink).unwrap(), Termination::End);
}

#[test]
fn two_voices_sound_together_and_mix() {
    // both voices on the same table; the mixed level doubles
    let source = " NVC2; ACT1,2; TPO 4\n C4Q C4Q\n END\n";
    let code = compile(source);

    let mut interp = Interpreter::new(code, cosine_tables(), &Options::default());
    let mut sink = MemorySink::new();
    assert_eq!(interp.run(&mut sink).unwrap(), Termination::End);

    assert_eq!(sink.samples.len(), 4 * 48);
    assert_eq!(sink.samples[0], 2 * 0x3F);
}

#[test]
fn relative_long_note_is_interpreted() {
    // hand-assembled: the compiler never emits 0x70 but the interpreter
    // accepts it
    let code = vec![
        0x50, 0x01, 0x90, 0x00, 0x10, 0x01, // setup, tempo 1
        0x60, 0x4A, 0x06, // absolute C4 quarter
        0x70, 0xE8, 0x03, // down 24 byte offsets, half note
        0x00,
    ];
    let mut interp = Interpreter::new(code, cosine_tables(), &Options::default());
    let mut sink = MemorySink::new();
    assert_eq!(interp.run(&mut sink).unwrap(), Termination::End);
    assert_eq!(sink.samples.len(), 48 + 96);
}

#[test]
fn compile_errors_leave_diagnostics_for_the_caller() {
    let output = compiler::compile(" JMP 3\n END\n", compiler::Options::default());
    assert!(output.diagnostics.has_errors());
}
