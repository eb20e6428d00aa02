use tracing::{debug, trace};

use crate::decoder::{
    find_crlf, ContentDecoder, DecoderStep, IdentityContentDecoder, TransferDecoder,
};
use crate::error::ParseError;
use crate::event::Event;
use crate::types::{Direction, Header, HttpVersion, Method, Mode};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits and the start-line grammar a [`Parser`] accepts.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Which start-line grammar to attempt (default: [`Mode::Auto`]).
    pub mode: Mode,
    /// Bound on the start line, in bytes (default: 4096).
    pub max_line_length: u32,
    /// Bound on leading empty (CRLF) lines tolerated before the start line (default: 10).
    pub max_empty_lines: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            max_line_length: 4096,
            max_empty_lines: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    OnFirstLine,
    OnHeader,
    OnBody,
    Done,
}

enum BodyState {
    Waiting,
    Streaming(TransferDecoder),
    Done,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// An incremental, dual-mode HTTP/1.x message parser.
///
/// Feed it bytes as they arrive; each call to [`Parser::feed`] or
/// [`Parser::resume`] returns the next [`Event`] — a start line, a header, the
/// end of the header section, a body chunk, a request for more bytes, or the
/// end of the message (with any pipelined residual bytes).
///
/// ```
/// use httpwire::{Event, Parser};
///
/// let mut parser = Parser::new();
/// let event = parser.feed(b"GET /hello HTTP/1.1").unwrap();
/// assert_eq!(event, Event::More);
///
/// let event = parser.feed(b"\r\nHost: example.com\r\n\r\n").unwrap();
/// assert!(matches!(event, Event::Request { .. }));
/// ```
pub struct Parser {
    mode: Mode,
    max_line_length: u32,
    max_empty_lines: u32,
    empty_lines: u32,

    phase: Phase,
    buffer: Vec<u8>,
    direction: Option<Direction>,

    version: Option<HttpVersion>,
    method: Option<Method>,

    content_length: Option<u64>,
    transfer_encoding: Option<String>,
    connection: Option<Vec<String>>,
    content_type: Option<String>,
    location: Option<Vec<u8>>,

    body_state: BodyState,
    pending_done: bool,
    content_decoder: Box<dyn ContentDecoder>,
}

impl Parser {
    /// Create a new parser with default options (`Mode::Auto`, 4096-byte start
    /// line, 10 leading empty lines) and an identity content decoder.
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// Create a new parser with custom options.
    pub fn with_options(options: ParserOptions) -> Self {
        Self::with_options_and_content_decoder(options, Box::new(IdentityContentDecoder))
    }

    /// Create a new parser that passes body bytes through a custom content decoder.
    pub fn with_options_and_content_decoder(
        options: ParserOptions,
        content_decoder: Box<dyn ContentDecoder>,
    ) -> Self {
        Self {
            mode: options.mode,
            max_line_length: options.max_line_length,
            max_empty_lines: options.max_empty_lines,
            empty_lines: 0,
            phase: Phase::OnFirstLine,
            buffer: Vec::new(),
            direction: None,
            version: None,
            method: None,
            content_length: None,
            transfer_encoding: None,
            connection: None,
            content_type: None,
            location: None,
            body_state: BodyState::Waiting,
            pending_done: false,
            content_decoder,
        }
    }

    /// Append bytes to the internal buffer and advance until one [`Event`] is produced.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Event, ParseError> {
        self.buffer.extend_from_slice(bytes);
        self.advance()
    }

    /// Re-drive the state machine with no new bytes.
    ///
    /// Used to pull a second event out of a single `feed` call — e.g. after a
    /// `BodyChunk` that completed the body, the matching `Done` is only
    /// available on the next call.
    pub fn resume(&mut self) -> Result<Event, ParseError> {
        self.advance()
    }

    /// Signal end-of-input. Only meaningful while the body is framed as
    /// connection-close (no Content-Length or Transfer-Encoding was present);
    /// a no-op `More` in any other phase.
    pub fn eof(&mut self) -> Result<Event, ParseError> {
        if self.phase != Phase::OnBody {
            return Ok(Event::More);
        }
        if self.pending_done {
            return self.advance();
        }
        let BodyState::Streaming(decoder) = &mut self.body_state else {
            return Ok(Event::More);
        };
        match decoder.eof(&mut self.buffer) {
            DecoderStep::Done => self.finish_body_done(),
            DecoderStep::FinalChunk(data) => {
                self.pending_done = true;
                self.decode_content(data).map(Event::BodyChunk)
            }
            _ => Ok(Event::More),
        }
    }

    // ----- dispatch ---------------------------------------------------

    fn advance(&mut self) -> Result<Event, ParseError> {
        match self.phase {
            Phase::OnFirstLine => self.advance_first_line(),
            Phase::OnHeader => self.advance_header(),
            Phase::OnBody => self.advance_body(),
            Phase::Done => Ok(Event::Done(Vec::new())),
        }
    }

    // ----- 4.2 start-line recognizer -----------------------------------

    fn advance_first_line(&mut self) -> Result<Event, ParseError> {
        let line_end = loop {
            let Some(lf_pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > self.max_line_length as usize {
                    return Err(ParseError::LineTooLong);
                }
                return Ok(Event::More);
            };

            if lf_pos == 0 {
                return Err(ParseError::BadRequest(
                    "bare LF before start line".to_string(),
                ));
            }

            if self.buffer[lf_pos - 1] != b'\r' {
                return Err(ParseError::BadRequest(
                    "start line terminated by bare LF".to_string(),
                ));
            }

            if lf_pos == 1 {
                // An empty line (just CRLF) before the start line.
                if self.empty_lines == self.max_empty_lines {
                    return Err(ParseError::BadRequest(
                        "too many leading empty lines".to_string(),
                    ));
                }
                self.buffer.drain(0..2);
                self.empty_lines += 1;
                continue;
            }

            break lf_pos;
        };

        let line = self.buffer[0..line_end - 1].to_vec(); // exclude CR and LF

        match self.mode {
            Mode::Request => self.accept_request_line(&line, line_end),
            Mode::Response => self.accept_status_line(&line, line_end),
            Mode::Auto => match parse_request_line(&line) {
                Ok((method, uri, version)) => {
                    self.buffer.drain(0..=line_end);
                    self.start_request(method, uri, version)
                }
                Err(ParseError::BadRequest(_)) => self.accept_status_line(&line, line_end),
                Err(e) => Err(e),
            },
        }
    }

    fn accept_request_line(&mut self, line: &[u8], line_end: usize) -> Result<Event, ParseError> {
        let (method, uri, version) = parse_request_line(line)?;
        self.buffer.drain(0..=line_end);
        self.start_request(method, uri, version)
    }

    fn accept_status_line(&mut self, line: &[u8], line_end: usize) -> Result<Event, ParseError> {
        let (status, reason, version) = parse_status_line(line)?;
        self.buffer.drain(0..=line_end);
        self.start_response(status, reason, version)
    }

    fn start_request(
        &mut self,
        method: Method,
        uri: String,
        version: HttpVersion,
    ) -> Result<Event, ParseError> {
        debug!(method = %method, %uri, %version, "request line parsed");
        self.direction = Some(Direction::Request);
        self.version = Some(version);
        self.method = Some(method.clone());
        self.phase = Phase::OnHeader;
        Ok(Event::Request {
            method,
            uri,
            version,
        })
    }

    fn start_response(
        &mut self,
        status: u16,
        reason: String,
        version: HttpVersion,
    ) -> Result<Event, ParseError> {
        debug!(status, %reason, %version, "status line parsed");
        self.direction = Some(Direction::Response);
        self.version = Some(version);
        self.phase = Phase::OnHeader;
        Ok(Event::Response {
            status,
            reason,
            version,
        })
    }

    // ----- 4.3 header accumulator ---------------------------------------

    fn advance_header(&mut self) -> Result<Event, ParseError> {
        loop {
            let Some(crlf_pos) = find_crlf(&self.buffer) else {
                return Ok(Event::More);
            };

            if crlf_pos == 0 {
                self.buffer.drain(0..2);
                self.phase = Phase::OnBody;
                trace!("headers complete");
                return Ok(Event::HeadersComplete);
            }

            if self.buffer.len() == crlf_pos + 2 {
                // Not enough buffered to know whether a fold follows.
                return Ok(Event::More);
            }

            let next_byte = self.buffer[crlf_pos + 2];
            if next_byte == b' ' || next_byte == b'\t' {
                let Some(crlf2_rel) = find_crlf(&self.buffer[crlf_pos + 2..]) else {
                    return Ok(Event::More);
                };
                let crlf2_pos = crlf_pos + 2 + crlf2_rel;
                let fold_ws = self.buffer[crlf_pos + 2];
                let fold_content = self.buffer[crlf_pos + 3..crlf2_pos].to_vec();

                let mut replacement = Vec::with_capacity(1 + fold_content.len());
                replacement.push(fold_ws);
                replacement.extend_from_slice(&fold_content);
                self.buffer.splice(crlf_pos..crlf2_pos + 2, replacement);
                continue;
            }

            let line = self.buffer[0..crlf_pos].to_vec();
            self.buffer.drain(0..crlf_pos + 2);
            return self.emit_header(&line);
        }
    }

    fn emit_header(&mut self, line: &[u8]) -> Result<Event, ParseError> {
        let (name_bytes, value_bytes): (&[u8], &[u8]) = match find_subslice(line, b": ") {
            Some(pos) => (&line[0..pos], &line[pos + 2..]),
            None => (line, &line[0..0]),
        };
        let name = String::from_utf8_lossy(name_bytes).into_owned();
        let value = String::from_utf8_lossy(value_bytes).into_owned();

        self.apply_framing(&name, &value, value_bytes)?;

        trace!(%name, %value, "header parsed");
        Ok(Event::Header(Header::new(name, value)))
    }

    fn apply_framing(
        &mut self,
        name: &str,
        value: &str,
        value_bytes: &[u8],
    ) -> Result<(), ParseError> {
        if name.eq_ignore_ascii_case("content-length") {
            let trimmed = value.trim();
            let parsed: u64 = trimmed
                .parse()
                .map_err(|_| ParseError::InvalidContentLength(trimmed.to_string()))?;
            match self.content_length {
                Some(existing) if existing != parsed => {
                    return Err(ParseError::InvalidContentLength(format!(
                        "conflicting Content-Length values: {existing} and {parsed}"
                    )));
                }
                _ => self.content_length = Some(parsed),
            }
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            self.transfer_encoding = Some(value.to_ascii_lowercase());
        } else if name.eq_ignore_ascii_case("connection") {
            self.connection = Some(
                value
                    .split(',')
                    .map(|tok| tok.trim().to_ascii_lowercase())
                    .collect(),
            );
        } else if name.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.to_ascii_lowercase());
        } else if name.eq_ignore_ascii_case("location") {
            // Stored as the raw wire bytes, not `value`: obs-text (RFC 7230) is
            // legal here and `value` has already been through a lossy UTF-8
            // conversion that would replace it with U+FFFD.
            self.location = Some(value_bytes.to_vec());
        }
        Ok(())
    }

    // ----- 4.4 body framer -----------------------------------------------

    fn advance_body(&mut self) -> Result<Event, ParseError> {
        if self.pending_done {
            self.pending_done = false;
            return self.finish_body_done();
        }

        match self.body_state {
            BodyState::Waiting => self.install_decoder(),
            BodyState::Streaming(_) => self.drive_decoder(),
            BodyState::Done => self.finish_body_done(),
        }
    }

    fn install_decoder(&mut self) -> Result<Event, ParseError> {
        let is_chunked = self
            .transfer_encoding
            .as_deref()
            .is_some_and(|te| te.split(',').any(|tok| tok.trim() == "chunked"));
        let is_head = self.method.as_ref().is_some_and(Method::is_head);

        if is_chunked {
            debug!("body framed as chunked");
            self.body_state = BodyState::Streaming(TransferDecoder::chunked());
            return self.drive_decoder();
        }

        if is_head || self.content_length == Some(0) {
            return self.finish_body_done();
        }

        if let Some(len) = self.content_length {
            debug!(len, "body framed as identity");
            self.body_state = BodyState::Streaming(TransferDecoder::identity(len));
            return self.drive_decoder();
        }

        match self.direction {
            Some(Direction::Response) => {
                debug!("body framed as connection-close");
                self.body_state = BodyState::Streaming(TransferDecoder::until_close());
                self.drive_decoder()
            }
            _ => self.finish_body_done(),
        }
    }

    fn drive_decoder(&mut self) -> Result<Event, ParseError> {
        let BodyState::Streaming(decoder) = &mut self.body_state else {
            unreachable!("drive_decoder called outside Streaming state");
        };
        match decoder.step(&mut self.buffer) {
            DecoderStep::Chunk(data) => self.decode_content(data).map(Event::BodyChunk),
            DecoderStep::FinalChunk(data) => {
                self.pending_done = true;
                self.decode_content(data).map(Event::BodyChunk)
            }
            DecoderStep::Done => self.finish_body_done(),
            DecoderStep::NeedMore => Ok(Event::More),
            DecoderStep::Err(e) => Err(e),
        }
    }

    fn decode_content(&mut self, data: Vec<u8>) -> Result<Vec<u8>, ParseError> {
        self.content_decoder
            .decode(data)
            .map_err(|e| ParseError::ContentDecoder(e.to_string()))
    }

    fn finish_body_done(&mut self) -> Result<Event, ParseError> {
        self.body_state = BodyState::Done;
        self.phase = Phase::Done;
        let residual = std::mem::take(&mut self.buffer);
        trace!(residual_len = residual.len(), "message done");
        Ok(Event::Done(residual))
    }

    /// `true` once the message has been fully parsed.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The lowercased `Content-Type` header value, if one was seen.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The `Connection` header value, split on `,` and lowercased, if one was seen.
    pub fn connection(&self) -> Option<&[String]> {
        self.connection.as_deref()
    }

    /// The `Location` header value, as raw wire bytes (obs-text survives intact).
    pub fn location(&self) -> Option<&[u8]> {
        self.location.as_deref()
    }

    /// The declared `Content-Length`, if a (consistent) one was seen.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The lowercased `Transfer-Encoding` header value, if one was seen.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.transfer_encoding.as_deref()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Start-line grammars
// ---------------------------------------------------------------------------

/// Parse `METHOD SP URI SP HTTP/M.N` (no CRLF — already stripped by the caller).
fn parse_request_line(line: &[u8]) -> Result<(Method, String, HttpVersion), ParseError> {
    let method_end = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ParseError::BadRequest("missing SP after method".to_string()))?;
    if line[0..method_end].contains(&b'\r') {
        return Err(ParseError::BadRequest(
            "CR embedded in request method".to_string(),
        ));
    }
    if method_end == 0 {
        return Err(ParseError::BadRequest("empty request method".to_string()));
    }

    let rest = &line[method_end + 1..];
    let uri_end = rest
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ParseError::BadRequest("missing SP after URI".to_string()))?;
    if rest[0..uri_end].contains(&b'\r') {
        return Err(ParseError::BadRequest(
            "CR embedded in request URI".to_string(),
        ));
    }
    if uri_end == 0 {
        return Err(ParseError::BadRequest("empty request URI".to_string()));
    }

    let version_bytes = &rest[uri_end + 1..];
    let version = parse_http_version(version_bytes)?;

    let method = String::from_utf8_lossy(&line[0..method_end]).into_owned();
    let uri = String::from_utf8_lossy(&rest[0..uri_end]).into_owned();

    Ok((Method::new(method), uri, version))
}

/// Parse `HTTP/M.N SP CODE SP REASON` (no CRLF — already stripped by the caller).
fn parse_status_line(line: &[u8]) -> Result<(u16, String, HttpVersion), ParseError> {
    if line.len() < 9 || !line.starts_with(b"HTTP/") {
        return Err(ParseError::BadRequest(
            "status line missing HTTP/ prefix".to_string(),
        ));
    }
    let version = parse_http_version(&line[0..8])?;
    if line[8] != b' ' {
        return Err(ParseError::BadRequest(
            "missing SP after HTTP version".to_string(),
        ));
    }

    let remainder = &line[9..];
    let sp_pos = remainder
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ParseError::BadRequest("missing SP before reason phrase".to_string()))?;

    let status_str = std::str::from_utf8(&remainder[0..sp_pos])
        .map_err(|_| ParseError::BadRequest("non-UTF-8 status code".to_string()))?;
    let status: u16 = status_str
        .parse()
        .map_err(|_| ParseError::BadRequest(format!("invalid status code: '{status_str}'")))?;

    let reason = String::from_utf8_lossy(&remainder[sp_pos + 1..]).into_owned();

    Ok((status, reason, version))
}

/// Parse exactly `HTTP/` DIGIT `.` DIGIT (8 bytes).
fn parse_http_version(bytes: &[u8]) -> Result<HttpVersion, ParseError> {
    if bytes.len() != 8
        || &bytes[0..5] != b"HTTP/"
        || !bytes[5].is_ascii_digit()
        || bytes[6] != b'.'
        || !bytes[7].is_ascii_digit()
    {
        return Err(ParseError::BadRequest(format!(
            "invalid HTTP version: '{}'",
            String::from_utf8_lossy(bytes)
        )));
    }
    Ok(HttpVersion::new(bytes[5] - b'0', bytes[7] - b'0'))
}

/// Position of the first occurrence of `needle` in `haystack`.
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_request_line() {
        let (method, uri, version) = parse_request_line(b"GET /x HTTP/1.1").unwrap();
        assert_eq!(method.as_str(), "GET");
        assert_eq!(uri, "/x");
        assert_eq!(version, HttpVersion::HTTP_11);
    }

    #[test]
    fn accepts_asterisk_uri() {
        let (_, uri, _) = parse_request_line(b"OPTIONS * HTTP/1.1").unwrap();
        assert_eq!(uri, "*");
    }

    #[test]
    fn rejects_missing_sp() {
        assert!(matches!(
            parse_request_line(b"GET/x HTTP/1.1"),
            Err(ParseError::BadRequest(_))
        ));
    }

    #[test]
    fn parses_status_line() {
        let (status, reason, version) = parse_status_line(b"HTTP/1.1 200 OK").unwrap();
        assert_eq!(status, 200);
        assert_eq!(reason, "OK");
        assert_eq!(version, HttpVersion::HTTP_11);
    }

    #[test]
    fn parses_status_line_empty_reason() {
        let (status, reason, _) = parse_status_line(b"HTTP/1.1 204 ").unwrap();
        assert_eq!(status, 204);
        assert_eq!(reason, "");
    }

    #[test]
    fn rejects_bad_version_digits() {
        assert!(matches!(
            parse_http_version(b"HTTP/x.1"),
            Err(ParseError::BadRequest(_))
        ));
    }

    #[test]
    fn find_subslice_finds_colon_space() {
        assert_eq!(find_subslice(b"Host: a", b": "), Some(4));
        assert_eq!(find_subslice(b"NoSeparator", b": "), None);
    }
}
