//! Result types returned by the conversion entry points.

use crate::error::LineError;
use serde::{Deserialize, Serialize};

/// Complete result of one Markdown → PDF conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The PDF document. Always starts with `%PDF-`.
    pub pdf: Vec<u8>,

    /// Counters describing what the pipeline did.
    pub stats: RenderStats,

    /// Lines that were skipped, in input order.
    pub warnings: Vec<LineError>,
}

impl ConversionOutput {
    /// True if every input line made it onto the canvas and the real
    /// serializer (not the fallback document) produced the bytes.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && !self.stats.fallback_used
    }
}

/// Statistics about a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Characters in the normalised input (placeholder included).
    pub input_chars: usize,

    /// Characters removed because the 8-bit encoding cannot represent them.
    pub dropped_chars: usize,

    /// Physical lines after splitting on `\n`, `\r\n` and `\r`.
    pub lines: usize,

    /// Lines that were classified into a block.
    pub blocks: usize,

    /// Lines skipped by the length guard.
    pub skipped_lines: usize,

    /// Lines skipped because they could not be laid out.
    pub failed_lines: usize,

    /// Pages in the produced document.
    pub pages: usize,

    /// True if input was missing or empty and the placeholder was rendered.
    pub placeholder_used: bool,

    /// True if serialization failed and the hard-coded document was returned.
    pub fallback_used: bool,

    /// Wall-clock time of the whole conversion.
    pub duration_ms: u64,
}
