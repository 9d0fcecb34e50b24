//! Error types for the protocol layer.
//!
//! Each crate in Gridlink defines its own error enum. A `ProtocolError`
//! always means a line could not be translated to or from a typed
//! message — never a networking or policy problem.

/// Errors that can occur while decoding a protocol line.
///
/// Decoding is the only fallible direction: every typed [`Message`]
/// encodes to a valid line, but a line arriving off the wire can be
/// malformed in all the ways below. The session layer treats any of
/// these as "drop the line, log a warning, keep reading".
///
/// [`Message`]: crate::Message
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The line was empty or contained only whitespace.
    #[error("empty line")]
    EmptyLine,

    /// The leading tag did not name any known message type.
    #[error("unknown message tag: {0}")]
    UnknownTag(String),

    /// The line had the wrong number of `|`-separated fields for its tag.
    #[error("{tag}: expected {expected} fields, got {got}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        got: usize,
    },

    /// A numeric field failed to parse.
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
    },

    /// A boolean field was something other than `0` or `1`.
    #[error("invalid flag in {field}: {value:?}")]
    InvalidFlag {
        field: &'static str,
        value: String,
    },

    /// A resource code outside {0, 1, 2}. Well-formed syntax, invalid
    /// semantics — still dropped like any other malformed line.
    #[error("unknown resource code: {0}")]
    UnknownResource(String),

    /// A proposal entry left a mandatory field (id or seller) empty.
    #[error("empty {0} in proposal entry")]
    EmptyProposalField(&'static str),

    /// A percent-encoded field contained a truncated or non-hex escape.
    #[error("invalid percent escape in {0}")]
    BadEscape(&'static str),

    /// Decoded text was not valid UTF-8.
    #[error("field {0} is not valid UTF-8")]
    BadUtf8(&'static str),
}
