use thiserror::Error;

/// Error type for encoding operations.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Nesting exceeded the configured ceiling. Fatal: no bytes are
    /// returned, though a streaming sink keeps whatever was already flushed.
    #[error("recursion too deep ({depth}); consider sharing or a larger max_depth")]
    RecursionLimit { depth: usize },
    /// A custom or extension handler could not express the value.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
    /// Two-pass sharing discovery cannot run with a streaming sink, since
    /// the first pass's output must be discarded.
    #[error("sharing discovery is incompatible with a streaming sink")]
    StreamingWithSharing,
}

/// Error type for decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid utf-8 in text string")]
    InvalidUtf8,
    #[error("indefinite lengths not supported")]
    IndefiniteLength,
    #[error("unexpected minor value")]
    UnexpectedMinor,
    #[error("unknown simple value {0}")]
    UnknownSimple(u8),
    #[error("invalid payload for tag {tag}")]
    InvalidTagPayload { tag: u64 },
}
