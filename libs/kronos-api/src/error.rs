use std::fmt;

/// Error kind for conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown or malformed zone identifier.
    Zone,
    /// Pattern or temporal text that cannot be parsed.
    Format,
    /// A node of the graph could not be borrowed or locked.
    Access,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Zone => f.write_str("zone"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Access => f.write_str("access"),
        }
    }
}

/// Conversion error: returned by zone resolution, pattern compilation
/// and shared-node access.
///
/// Inside a traversal these errors are recovered locally; only zone
/// resolution surfaces them to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KronosError {
    kind: ErrorKind,
    message: String,
}

impl KronosError {
    pub fn zone(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Zone, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn access(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Access, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for KronosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for KronosError {}

// ---------------------------------------------------------------------------
// From impls: parse errors → KronosError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<chrono::ParseError> for KronosError {
    fn from(e: chrono::ParseError) -> Self {
        Self::format(e.to_string())
    }
}
