/// Reasons the codec rejects a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text does not start with `"!!"` and end with `"##"`.
    #[error("missing frame sentinel (expected \"!!\" ... \"##\")")]
    MissingSentinel,

    /// Braces are unbalanced, reversed, nested, or followed by trailing text.
    #[error("malformed parameter block")]
    MalformedParameterBlock,

    /// The header lacks a non-empty kind and command.
    #[error("incomplete header (expected [label:]*kind:command)")]
    IncompleteHeader,
}

/// Errors that can occur while reading or writing frames on a link.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A complete frame arrived but could not be parsed.
    #[error("malformed frame {frame:?}: {reason}")]
    Malformed {
        frame: String,
        #[source]
        reason: ParseError,
    },

    /// The link accepted only part of an outgoing frame.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
