/// Everything that can abort an assembly run. None of these are recoverable:
/// the first one stops the pass and no output is produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("malformed directive: {0}")]
    MalformedDirective(String),
    #[error("unresolved label `{0}`")]
    UnresolvedLabel(String),
    #[error("label `{0}` declared twice")]
    DuplicateLabel(String),
    #[error("empty label declaration")]
    EmptyLabel,
    #[error("org must be set before absolute references can be resolved (first use: `{label}`)")]
    MissingOrigin { label: String },
    #[error("relative jump to `{label}` is {offset} bytes away, outside [-128, 127]")]
    OffsetOutOfRange { label: String, offset: i64 },
    #[error("unrecognized instruction `{0}`")]
    UnrecognizedInstruction(String),
    #[error("invalid literal `{0}`")]
    InvalidLiteral(String),
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: i64, bits: u8 },
    #[error("unterminated string quote")]
    UnterminatedQuote,
    #[error("only one quoted string is allowed per line")]
    MultipleQuotes,
    #[error("misplaced label reference in `{0}`: only the last operand of call/jp/jr/djnz may name a label")]
    MisplacedLabel(String),
    #[error("patch at {at:#06x} is outside the {len}-byte code buffer")]
    PatchOutOfBounds { at: usize, len: usize },
}

/// An [`AsmError`] with the place it happened.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("line {line}: {kind}")]
    Line {
        line: usize,
        #[source]
        kind: AsmError,
    },
    #[error("label resolution failed: {0}")]
    Resolve(#[source] AsmError),
}

impl Error {
    pub fn kind(&self) -> &AsmError {
        match self {
            Error::Line { kind, .. } => kind,
            Error::Resolve(kind) => kind,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Line { line, .. } => Some(*line),
            Error::Resolve(_) => None,
        }
    }
}
