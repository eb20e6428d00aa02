use crate::error::{ContentDecoderError, ParseError};

// ---------------------------------------------------------------------------
// Content decoder (caller-pluggable)
// ---------------------------------------------------------------------------

/// Post-transfer-decode filter applied to every `BodyChunk` payload.
///
/// The core only ships [`IdentityContentDecoder`]; callers inject gzip,
/// deflate, or brotli decompression by implementing this trait and handing an
/// instance to [`crate::Parser::with_options_and_content_decoder`]. This is the one
/// caller-extensible seam in an otherwise closed decoder set, per the design
/// note distinguishing the finite transfer-decoder variants from the open
/// content-decoder trait object.
pub trait ContentDecoder: std::fmt::Debug {
    /// Transform one chunk of already transfer-decoded body bytes.
    fn decode(&mut self, data: Vec<u8>) -> Result<Vec<u8>, ContentDecoderError>;
}

/// The default content decoder: returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityContentDecoder;

impl ContentDecoder for IdentityContentDecoder {
    fn decode(&mut self, data: Vec<u8>) -> Result<Vec<u8>, ContentDecoderError> {
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Transfer decoder (closed set: identity, chunked, connection-close)
// ---------------------------------------------------------------------------

/// Outcome of one [`TransferDecoder::step`] call against the parser's buffer.
pub(crate) enum DecoderStep {
    /// Body bytes fully consumed; more chunks may follow.
    Chunk(Vec<u8>),
    /// The last body bytes; the very next call must emit `Done` without
    /// requiring further input.
    FinalChunk(Vec<u8>),
    /// No more body bytes; emit `Done` now with whatever remains buffered.
    Done,
    /// Not enough buffered bytes to make progress.
    NeedMore,
    /// The buffered bytes do not form a valid chunk.
    Err(ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    AwaitingSize,
    InChunk { remaining: u64 },
}

#[derive(Debug)]
pub(crate) enum TransferDecoder {
    /// Exactly `total` bytes, `streamed` so far.
    Identity { streamed: u64, total: u64 },
    /// RFC 7230 §4.1 chunked transfer coding. Trailers are not parsed; any
    /// bytes after the zero-size chunk's CRLF are surfaced as residual.
    Chunked { state: ChunkState },
    /// No declared length; every fed byte is body until the caller calls
    /// `Parser::eof()`.
    UntilClose,
}

impl TransferDecoder {
    pub(crate) fn identity(total: u64) -> Self {
        Self::Identity { streamed: 0, total }
    }

    pub(crate) fn chunked() -> Self {
        Self::Chunked {
            state: ChunkState::AwaitingSize,
        }
    }

    pub(crate) fn until_close() -> Self {
        Self::UntilClose
    }

    /// Drive the decoder once against `buffer`, consuming from its front.
    pub(crate) fn step(&mut self, buffer: &mut Vec<u8>) -> DecoderStep {
        match self {
            Self::Identity { streamed, total } => step_identity(streamed, total, buffer),
            Self::Chunked { state } => step_chunked(state, buffer),
            Self::UntilClose => step_until_close(buffer),
        }
    }

    /// Called on `Parser::eof()`: only meaningful for connection-close bodies.
    pub(crate) fn eof(&mut self, buffer: &mut Vec<u8>) -> DecoderStep {
        match self {
            Self::UntilClose => {
                if buffer.is_empty() {
                    DecoderStep::Done
                } else {
                    DecoderStep::FinalChunk(std::mem::take(buffer))
                }
            }
            _ => DecoderStep::NeedMore,
        }
    }
}

fn step_identity(streamed: &mut u64, total: &mut u64, buffer: &mut Vec<u8>) -> DecoderStep {
    let remaining = total.saturating_sub(*streamed);
    if remaining == 0 {
        return DecoderStep::Done;
    }
    if buffer.is_empty() {
        return DecoderStep::NeedMore;
    }

    let available = buffer.len() as u64;
    if available < remaining {
        *streamed += available;
        DecoderStep::Chunk(std::mem::take(buffer))
    } else {
        let take = remaining as usize;
        let data: Vec<u8> = buffer.drain(0..take).collect();
        *streamed = *total;
        DecoderStep::FinalChunk(data)
    }
}

fn step_until_close(buffer: &mut Vec<u8>) -> DecoderStep {
    if buffer.is_empty() {
        DecoderStep::NeedMore
    } else {
        DecoderStep::Chunk(std::mem::take(buffer))
    }
}

fn step_chunked(state: &mut ChunkState, buffer: &mut Vec<u8>) -> DecoderStep {
    loop {
        match *state {
            ChunkState::AwaitingSize => {
                let Some(crlf) = find_crlf(buffer) else {
                    return DecoderStep::NeedMore;
                };
                let line = &buffer[0..crlf];
                let size_token = match line.iter().position(|&b| b == b';') {
                    Some(p) => &line[0..p],
                    None => line,
                };
                let size_str = match std::str::from_utf8(size_token) {
                    Ok(s) => s.trim(),
                    Err(_) => {
                        return DecoderStep::Err(ParseError::PoorlyFormattedSize(
                            String::from_utf8_lossy(size_token).into_owned(),
                        ));
                    }
                };
                let size = match u64::from_str_radix(size_str, 16) {
                    Ok(v) => v,
                    Err(_) => {
                        return DecoderStep::Err(ParseError::PoorlyFormattedSize(
                            size_str.to_string(),
                        ));
                    }
                };
                buffer.drain(0..crlf + 2);
                if size == 0 {
                    return DecoderStep::Done;
                }
                *state = ChunkState::InChunk { remaining: size };
            }
            ChunkState::InChunk { remaining } => {
                let size = remaining as usize;
                if buffer.len() < size + 2 {
                    return DecoderStep::NeedMore;
                }
                if &buffer[size..size + 2] != b"\r\n" {
                    return DecoderStep::Err(ParseError::PoorlyFormattedChunkedSize);
                }
                let data: Vec<u8> = buffer.drain(0..size).collect();
                buffer.drain(0..2);
                *state = ChunkState::AwaitingSize;
                return DecoderStep::Chunk(data);
            }
        }
    }
}

/// Position of the first `\r\n` in `buf`, if any.
pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_splits_across_feeds() {
        let mut buf = b"ab".to_vec();
        let mut dec = TransferDecoder::identity(5);
        match dec.step(&mut buf) {
            DecoderStep::Chunk(data) => assert_eq!(data, b"ab"),
            _ => panic!("expected Chunk"),
        }
        let mut buf = b"cde".to_vec();
        match dec.step(&mut buf) {
            DecoderStep::FinalChunk(data) => assert_eq!(data, b"cde"),
            _ => panic!("expected FinalChunk"),
        }
    }

    #[test]
    fn chunked_happy_path() {
        let mut buf = b"3\r\nabc\r\n0\r\n\r\n".to_vec();
        let mut dec = TransferDecoder::chunked();
        match dec.step(&mut buf) {
            DecoderStep::Chunk(data) => assert_eq!(data, b"abc"),
            _ => panic!("expected Chunk"),
        }
        match dec.step(&mut buf) {
            DecoderStep::Done => {}
            _ => panic!("expected Done"),
        }
        assert_eq!(buf, b"\r\n");
    }

    #[test]
    fn chunked_rejects_bad_terminator() {
        let mut buf = b"3\r\nabcXX".to_vec();
        let mut dec = TransferDecoder::chunked();
        match dec.step(&mut buf) {
            DecoderStep::Err(ParseError::PoorlyFormattedChunkedSize) => {}
            other => panic!("expected PoorlyFormattedChunkedSize, got {other:?}"),
        }
    }

    #[test]
    fn chunked_rejects_bad_hex() {
        let mut buf = b"zz\r\n".to_vec();
        let mut dec = TransferDecoder::chunked();
        match dec.step(&mut buf) {
            DecoderStep::Err(ParseError::PoorlyFormattedSize(_)) => {}
            other => panic!("expected PoorlyFormattedSize, got {other:?}"),
        }
    }
}

impl std::fmt::Debug for DecoderStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunk(d) => write!(f, "Chunk({} bytes)", d.len()),
            Self::FinalChunk(d) => write!(f, "FinalChunk({} bytes)", d.len()),
            Self::Done => write!(f, "Done"),
            Self::NeedMore => write!(f, "NeedMore"),
            Self::Err(e) => write!(f, "Err({e})"),
        }
    }
}
