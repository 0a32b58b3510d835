//! Error types for the parser.
//!
//! Uses the dual-error pattern: [`ParseError`] is the single diagnostic a
//! failed parse produces, and [`CompileError`] wraps it together with the
//! failures of the surrounding pipeline (tokenizing, IO, serialization).

use std::fmt;

use orkest_model::{ModelError, QName};
use thiserror::Error;

/// What went wrong while building the object model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// No state is registered for the element.
    #[error("no handler for element")]
    UnknownElement,

    /// A mandatory attribute is absent.
    #[error("missing mandatory attribute '{attribute}'")]
    MissingAttribute { attribute: String },

    /// An attribute is present but its value does not parse.
    #[error("malformed value for attribute '{attribute}': {detail}")]
    MalformedAttributeValue { attribute: String, detail: String },

    /// Mandatory/optional attribute combination violated.
    #[error("invalid attribute combination: {detail}")]
    InvalidAttributeCombination { detail: String },

    /// End-element does not close the open element.
    #[error("expected </{expected}> but found </{found}>")]
    StructuralMismatch { expected: QName, found: QName },

    /// A recognized element in a position its parent does not accept.
    #[error("not allowed inside <{parent}>")]
    UnexpectedChild { parent: QName },

    /// A single-activity container was closed without its activity.
    #[error("missing activity")]
    MissingActivity,

    /// A single-activity container received a second activity.
    #[error("more than one activity")]
    MultipleActivities,

    /// Two declarations of the same kind share a name within one container.
    #[error("duplicate {what} named '{name}'")]
    DuplicateName { what: &'static str, name: String },

    /// An ancestor constraint is violated.
    #[error("invalid nesting: {detail}")]
    InvalidNesting { detail: String },

    /// End-element with no open element.
    #[error("closing tag without an open element")]
    UnexpectedEnd,

    /// Start-element after the root element was closed.
    #[error("content after the root element")]
    MultipleRoots,

    /// The event stream ended with elements still open.
    #[error("unexpected end of input; element is still open")]
    Incomplete,

    /// The event stream contained no element.
    #[error("no root element")]
    NoRootElement,

    /// The root element is not a process definition.
    #[error("root element is not a process")]
    NotAProcess,
}

/// A location-tagged parse diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Element the failure is attributed to, if any.
    pub element: Option<QName>,
    /// 1-based source line.
    pub line: u32,
    /// Failure kind.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a diagnostic for an element.
    #[must_use]
    pub fn new(element: QName, line: u32, kind: ParseErrorKind) -> Self {
        Self {
            element: Some(element),
            line,
            kind,
        }
    }

    /// Create a diagnostic that is not tied to an element.
    #[must_use]
    pub fn document(line: u32, kind: ParseErrorKind) -> Self {
        Self {
            element: None,
            line,
            kind,
        }
    }

    /// Local name of the element, or `""`.
    #[must_use]
    pub fn element_name(&self) -> &str {
        self.element.as_ref().map(|e| e.local.as_str()).unwrap_or_default()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "line {}: <{}>: {}", self.line, element, self.kind),
            None => write!(f, "line {}: {}", self.line, self.kind),
        }
    }
}

impl std::error::Error for ParseError {}

/// Main error type for compiling process definitions.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input is not well-formed XML.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// The XML is well-formed but not a valid process definition.
    #[error("Invalid process definition: {0}")]
    Parse(#[from] ParseError),

    /// Envelope construction or serialization failed.
    #[error("Envelope error: {0}")]
    Model(#[from] ModelError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed `KEY=VALUE` header argument.
    #[error("Invalid header '{0}'. Expected KEY=VALUE")]
    InvalidHeader(String),

    /// One or more files failed a batch check.
    #[error("{failed} of {total} process definitions failed")]
    CheckFailed { failed: usize, total: usize },
}

/// Result type alias for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;
