//! # httpwire
//!
//! A **strict, streaming HTTP/1.1 message parser** implemented as a
//! push-driven state machine, designed for use both as a Rust library and as
//! a CLI tool.
//!
//! httpwire processes a request or a response incrementally (byte-by-byte or
//! in arbitrarily-sized chunks), recognizing either direction automatically
//! by default. It follows RFC 7230/9112 framing rules, supports chunked and
//! identity transfer encodings plus a connection-close fallback, accepts
//! obs-folded headers, and preserves pipelined residual bytes at message
//! boundaries.
//!
//! ## Quick start — one-shot parsing
//!
//! ```rust
//! use httpwire::collect_message;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let message = collect_message(raw).expect("valid message");
//! assert_eq!(message.header_value("host"), Some("example.com"));
//! ```
//!
//! ## Quick start — incremental parsing
//!
//! ```rust
//! use httpwire::{Event, Parser};
//!
//! let mut parser = Parser::new();
//!
//! let event = parser.feed(b"GET / HTTP/1.1").unwrap();
//! assert_eq!(event, Event::More);
//!
//! let event = parser.feed(b"\r\nHost: example.com\r\n\r\n").unwrap();
//! assert!(matches!(event, Event::Request { .. }));
//!
//! let event = parser.resume().unwrap();
//! assert!(matches!(event, Event::Header(_)));
//!
//! let event = parser.resume().unwrap();
//! assert_eq!(event, Event::HeadersComplete);
//!
//! let event = parser.resume().unwrap();
//! assert_eq!(event, Event::Done(Vec::new()));
//! ```

mod decoder;
mod error;
mod event;
mod output;
mod parser;
mod types;

// Re-export public API.
pub use decoder::{ContentDecoder, IdentityContentDecoder};
pub use error::{CollectError, ContentDecoderError, ParseError};
pub use event::Event;
pub use output::{
    collect_message, collect_message_with, collect_message_with_content_decoder, format_debug,
    format_headers_only, format_json, ParsedMessage, StartLine,
};
pub use parser::{Parser, ParserOptions};
pub use types::{Direction, Header, HttpVersion, Method, Mode};
