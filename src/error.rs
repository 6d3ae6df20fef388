//! Diagnostic kinds shared by the compiler plus the per-line collection
//! that a compilation pass accumulates into.

use thiserror::Error;

/// Everything the compiler can complain about. One variant per diagnostic;
/// the display strings are the user-facing wording.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("argument out of range")]
    ArgOutOfRange,
    #[error("undefined identifier")]
    UndefinedIdentifier,
    #[error("identifier already used")]
    DuplicateIdentifier,
    #[error("symbol table overflow")]
    SymbolTableOverflow,
    #[error("object code overflow")]
    CodeOverflow,
    #[error("incomprehensible specification")]
    Incomprehensible,
    #[error("voice number mismatch")]
    VoiceMismatch,
    #[error("note pitch out of range")]
    PitchOutOfRange,
    #[error("illegal duration")]
    IllegalDuration,
    #[error("executable control in event")]
    ControlInEvent,
    #[error("identifier in event")]
    IdentifierInEvent,
    #[error("nested SUB-ESB")]
    NestedSub,
    #[error("ESB without SUB")]
    EsbWithoutSub,
    #[error("hanging SUB")]
    HangingSub,
    #[error("no voices active")]
    NoVoicesActive,
}

/// A diagnostic pinned to the source line that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: ErrorKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error on line {}: {}", self.line, self.kind)
    }
}

/// Diagnostics collected over a whole compilation pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: usize, kind: ErrorKind) {
        self.items.push(Diagnostic { line, kind });
    }

    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
