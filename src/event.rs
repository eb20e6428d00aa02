use crate::types::{Header, HttpVersion, Method};

/// One externally visible output of [`crate::Parser::feed`] / [`crate::Parser::resume`].
///
/// Parse errors are not a variant here — they are the `Err` arm of the
/// `Result<Event, ParseError>` the parser returns, which is the idiomatic Rust
/// reading of "an Error event": a ninth enum variant would force every match
/// on `Event` to also handle a case the type system already rules out for the
/// `Ok` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request-line was parsed.
    Request {
        method: Method,
        uri: String,
        version: HttpVersion,
    },
    /// A status-line was parsed.
    Response {
        status: u16,
        reason: String,
        version: HttpVersion,
    },
    /// One header field, in receipt order.
    Header(Header),
    /// The blank line ending the header section was seen; body framing (if any) follows.
    HeadersComplete,
    /// The next decoded body segment, already passed through the content decoder.
    BodyChunk(Vec<u8>),
    /// The parser needs more bytes before it can produce the next event.
    More,
    /// The message is fully parsed. The payload is the unconsumed buffer suffix,
    /// which may be empty or may hold the start of a pipelined next message.
    Done(Vec<u8>),
}
