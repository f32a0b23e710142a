//! Error types for the edgequake-md2pdf library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`Md2PdfError`]: **Fatal**: the caller asked for something that cannot
//!   be produced (no input at all in strict mode, an unwritable output path,
//!   an invalid configuration). Returned as `Err(Md2PdfError)`.
//!
//! * [`LineError`]: **Non-fatal**: a single markdown line was skipped
//!   (over-long, or could not be laid out) but every other line is fine.
//!   Stored inside [`crate::output::ConversionOutput`] so callers can report
//!   what was lost instead of losing the whole document to one bad line.
//!
//! * [`StreamError`]: a failure reported by the generation event source.
//!   The aggregator never propagates it: it is turned into a labelled
//!   error text (see [`crate::stream`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// Line-level failures use [`LineError`] and are stored in
/// [`crate::output::ConversionOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Validation errors (strict mode only) ──────────────────────────────
    /// No markdown value was supplied at all.
    #[error("Input markdown content cannot be missing")]
    MissingInput,

    /// The input was empty, or contained only whitespace.
    #[error("Input markdown content cannot be empty or whitespace-only")]
    EmptyInput,

    // ── Rendering errors ──────────────────────────────────────────────────
    /// Writing the finished canvas as PDF bytes failed.
    ///
    /// Never returned by the `convert*` entry points: they substitute a
    /// minimal fallback document instead.
    #[error("Failed to serialise PDF document: {0}")]
    SerializationFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the markdown input file.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// True for the two input-validation failures a strict caller may reject.
    pub fn is_validation(&self) -> bool {
        matches!(self, Md2PdfError::MissingInput | Md2PdfError::EmptyInput)
    }
}

/// A non-fatal error for a single markdown line.
///
/// Line numbers are 1-indexed, counted on the normalised input.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum LineError {
    /// Line exceeded the length guard and was not measured or wrapped.
    #[error("Line {line}: skipped, {chars} characters exceeds the {limit}-character limit")]
    TooLong {
        line: usize,
        chars: usize,
        limit: usize,
    },

    /// Line could not be placed on the canvas.
    #[error("Line {line}: layout failed: {detail}")]
    LayoutFailed { line: usize, detail: String },
}

impl LineError {
    /// The 1-indexed line this error refers to.
    pub fn line(&self) -> usize {
        match self {
            LineError::TooLong { line, .. } | LineError::LayoutFailed { line, .. } => *line,
        }
    }
}

/// A failure reported by the source of generation events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The remote generation service itself reported a structured failure.
    #[error("{message}")]
    Service { message: String },

    /// Anything else that went wrong while consuming the stream
    /// (malformed event, broken transport, unreadable recording).
    #[error("{message}")]
    Unexpected { message: String },
}

impl StreamError {
    pub fn service(message: impl Into<String>) -> Self {
        StreamError::Service {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        StreamError::Unexpected {
            message: message.into(),
        }
    }
}
