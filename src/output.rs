use serde::Serialize;
use tracing::trace;

use crate::decoder::ContentDecoder;
use crate::error::CollectError;
use crate::event::Event;
use crate::parser::{Parser, ParserOptions};
use crate::types::Header;

// ---------------------------------------------------------------------------
// Collector: drive a Parser to completion and assemble a whole message
// ---------------------------------------------------------------------------

/// The recognized start line of a fully collected message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StartLine {
    Request {
        method: String,
        uri: String,
        version: String,
    },
    Response {
        status: u16,
        reason: String,
        version: String,
    },
}

/// A fully parsed HTTP/1.x message, assembled by driving a [`Parser`] to `Done`.
///
/// This is the convenience layer the CLI and one-shot callers use; the
/// streaming [`Parser`] itself never buffers a whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub start_line: StartLine,
    pub headers: Vec<Header>,
    #[serde(serialize_with = "serialize_body")]
    pub body: Option<Vec<u8>>,
    /// Unconsumed buffer suffix at `Done` — bytes of a pipelined next message.
    pub trailing: Vec<u8>,
}

fn serialize_body<S: serde::Serializer>(
    body: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match body {
        None => serializer.serialize_none(),
        Some(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
    }
}

impl ParsedMessage {
    /// Look up the first header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Parse a **complete** message from a byte slice in one call, using default options.
///
/// For incremental / streaming use, drive [`Parser`] directly.
///
/// # Errors
///
/// Returns [`CollectError`] if the data is malformed or ends before the
/// message is complete.
pub fn collect_message(data: &[u8]) -> Result<ParsedMessage, CollectError> {
    collect_message_with(ParserOptions::default(), data)
}

/// Parse a **complete** message using custom [`ParserOptions`].
///
/// # Errors
///
/// Returns [`CollectError`] if the data is malformed or ends before the
/// message is complete.
pub fn collect_message_with(
    options: ParserOptions,
    data: &[u8],
) -> Result<ParsedMessage, CollectError> {
    let mut parser = Parser::with_options(options);
    collect_from(&mut parser, data)
}

/// Like [`collect_message_with`], but passing body bytes through `content_decoder`.
pub fn collect_message_with_content_decoder(
    options: ParserOptions,
    content_decoder: Box<dyn ContentDecoder>,
    data: &[u8],
) -> Result<ParsedMessage, CollectError> {
    let mut parser = Parser::with_options_and_content_decoder(options, content_decoder);
    collect_from(&mut parser, data)
}

fn collect_from(parser: &mut Parser, data: &[u8]) -> Result<ParsedMessage, CollectError> {
    let mut start_line = None;
    let mut headers = Vec::new();
    let mut body = Vec::new();
    let mut fed = false;
    let mut asked_eof = false;

    loop {
        let mut event = if fed {
            parser.resume()?
        } else {
            fed = true;
            parser.feed(data)?
        };

        if event == Event::More {
            // All of `data` is already fed: by this function's own "complete
            // message in one call" contract, no further bytes are coming. A
            // connection-close body (no Content-Length / Transfer-Encoding)
            // only reaches `Done` once `eof()` is signaled, so try that once
            // before giving up as incomplete.
            if asked_eof {
                return Err(CollectError::Incomplete);
            }
            asked_eof = true;
            event = parser.eof()?;
        }

        match event {
            Event::Request {
                method,
                uri,
                version,
            } => {
                start_line = Some(StartLine::Request {
                    method: method.as_str().to_string(),
                    uri,
                    version: version.to_string(),
                });
            }
            Event::Response {
                status,
                reason,
                version,
            } => {
                start_line = Some(StartLine::Response {
                    status,
                    reason,
                    version: version.to_string(),
                });
            }
            Event::Header(h) => headers.push(h),
            Event::HeadersComplete => {}
            Event::BodyChunk(chunk) => body.extend_from_slice(&chunk),
            Event::More => return Err(CollectError::Incomplete),
            Event::Done(trailing) => {
                trace!(headers = headers.len(), body_len = body.len(), "message collected");
                return Ok(ParsedMessage {
                    start_line: start_line.ok_or(CollectError::Incomplete)?,
                    headers,
                    body: if body.is_empty() { None } else { Some(body) },
                    trailing,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Human-readable / machine-readable rendering
// ---------------------------------------------------------------------------

/// Serialize a [`ParsedMessage`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(message: &ParsedMessage, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(message).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(message).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`ParsedMessage`] in a human-readable debug format.
pub fn format_debug(message: &ParsedMessage) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("=== HTTP Message ===\n");
    match &message.start_line {
        StartLine::Request {
            method,
            uri,
            version,
        } => out.push_str(&format!("{method} {uri} {version}\n")),
        StartLine::Response {
            status,
            reason,
            version,
        } => out.push_str(&format!("{version} {status} {reason}\n")),
    }

    out.push_str(&format!("\n--- Headers ({}) ---\n", message.headers.len()));
    for header in &message.headers {
        out.push_str(&format!("  {}: {}\n", header.name, header.value));
    }

    match &message.body {
        Some(body) => {
            out.push_str(&format!("\n--- Body ({} bytes) ---\n", body.len()));
            match std::str::from_utf8(body) {
                Ok(s) => out.push_str(s),
                Err(_) => out.push_str(&format!("<binary data: {} bytes>", body.len())),
            }
            out.push('\n');
        }
        None => out.push_str("\n--- No Body ---\n"),
    }

    if !message.trailing.is_empty() {
        out.push_str(&format!(
            "\n--- Trailing bytes ({}) ---\n",
            message.trailing.len()
        ));
    }

    out.push_str("====================\n");
    out
}

/// Render only the start line and headers (no body).
pub fn format_headers_only(message: &ParsedMessage) -> String {
    let mut out = String::with_capacity(64 + message.headers.len() * 40);

    match &message.start_line {
        StartLine::Request {
            method,
            uri,
            version,
        } => out.push_str(&format!("{method} {uri} {version}\n")),
        StartLine::Response {
            status,
            reason,
            version,
        } => out.push_str(&format!("{version} {status} {reason}\n")),
    }

    for header in &message.headers {
        out.push_str(&format!("{}: {}\n", header.name, header.value));
    }

    out
}
