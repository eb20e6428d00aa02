use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// An HTTP request method.
///
/// The grammar only requires a token up to the first SP with no embedded CR;
/// unlike a closed enum of well-known methods, any such token is accepted and
/// carried through verbatim (`PURGE`, `M-SEARCH`, vendor extensions, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Method(String);

impl Method {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    /// The method token as written on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if this method is `HEAD` (case-insensitively).
    pub fn is_head(&self) -> bool {
        self.0.eq_ignore_ascii_case("HEAD")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// HttpVersion
// ---------------------------------------------------------------------------

/// An HTTP version pair, e.g. `HTTP/1.1` is `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: Self = Self { major: 1, minor: 0 };
    pub const HTTP_11: Self = Self { major: 1, minor: 1 };

    pub(crate) fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A single HTTP header field, verbatim as it appeared on the wire.
///
/// `name` keeps its original casing; `value` has trailing obs-fold whitespace
/// bytes preserved (the parser splices folds rather than normalizing them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub(crate) fn new(name: String, value: String) -> Self {
        Self { name, value }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which kind of start line a [`crate::Parser`] recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which start-line grammar a [`crate::Parser`] should attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Try a request-line first; fall back to a status-line on failure.
    #[default]
    Auto,
    /// Only ever accept a request-line.
    Request,
    /// Only ever accept a status-line.
    Response,
}
