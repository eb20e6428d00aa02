use std::fmt;

/// Errors that can occur while streaming an HTTP/1.x message through [`crate::Parser`].
///
/// Every variant is terminal: once returned, the parser must not be fed further
/// bytes. Construct a fresh [`crate::Parser`] for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The start line (request-line or status-line) is malformed: a bare LF before
    /// any line, a missing SP, a non-digit version, or too many leading empty lines.
    BadRequest(String),
    /// The start line exceeded `max_line_length` before an LF was found.
    LineTooLong,
    /// A `Content-Length` value is not a decimal nonnegative integer, or two
    /// `Content-Length` headers disagree (RFC 7230 §3.3.3).
    InvalidContentLength(String),
    /// A chunk size line is not valid hexadecimal.
    PoorlyFormattedSize(String),
    /// A chunk's data was not terminated by CRLF.
    PoorlyFormattedChunkedSize,
    /// An injected [`crate::ContentDecoder`] failed; the message is its `Display`.
    ContentDecoder(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
            Self::LineTooLong => write!(f, "start line exceeds configured maximum length"),
            Self::InvalidContentLength(v) => write!(f, "invalid Content-Length: '{v}'"),
            Self::PoorlyFormattedSize(s) => write!(f, "poorly formatted chunk size: '{s}'"),
            Self::PoorlyFormattedChunkedSize => {
                write!(f, "chunk data not terminated by CRLF")
            }
            Self::ContentDecoder(msg) => write!(f, "content decoder error: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Error raised by the one-shot [`crate::collect_message`] convenience layer.
///
/// This is distinct from [`ParseError`]: "ran out of bytes before the message
/// finished" is a property of driving a streaming parser to completion in one
/// call, not of the streaming core itself (which treats `More` as a normal,
/// non-terminal event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// The core parser reported a terminal error.
    Parse(ParseError),
    /// The supplied bytes ended before a complete message was parsed.
    Incomplete,
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Incomplete => write!(f, "input ended before a complete message was parsed"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Incomplete => None,
        }
    }
}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// Error type returned by a caller-supplied [`crate::ContentDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDecoderError(pub String);

impl ContentDecoderError {
    /// Build a decoder error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for ContentDecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ContentDecoderError {}
