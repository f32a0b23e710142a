//! Markdown → PDF entry points.
//!
//! ## Why one policy point?
//!
//! Every stage below reports problems as values: normalisation returns
//! [`Md2PdfError::MissingInput`] / [`Md2PdfError::EmptyInput`], classification
//! and layout return per-line [`crate::error::LineError`]s, serialisation
//! returns [`Md2PdfError::SerializationFailed`]. [`convert_with`] is the only
//! place that decides what each of those means for the caller:
//!
//! | Failure | Lenient | Strict |
//! |---------|---------|--------|
//! | missing / empty input | placeholder page | `Err` |
//! | over-long or unplaceable line | skipped, listed in `warnings` | same |
//! | characters outside Latin-1 | dropped, counted | same |
//! | serialisation failure | hard-coded one-page PDF | same |
//!
//! The other entry points ([`convert`], [`convert_strict`],
//! [`convert_to_file`], [`convert_path`], [`convert_async`]) are thin wrappers.

use crate::config::{RenderConfig, ValidationMode};
use crate::error::Md2PdfError;
use crate::output::{ConversionOutput, RenderStats};
use crate::pipeline::layout::Canvas;
use crate::pipeline::{classify, layout, normalize, serialize, transcode};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Markdown supplied by a caller: text, raw bytes, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownInput<'a> {
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Missing,
}

impl MarkdownInput<'_> {
    /// Detach from any borrowed buffer.
    pub fn into_owned(self) -> MarkdownInput<'static> {
        match self {
            MarkdownInput::Text(t) => MarkdownInput::Text(Cow::Owned(t.into_owned())),
            MarkdownInput::Bytes(b) => MarkdownInput::Bytes(Cow::Owned(b.into_owned())),
            MarkdownInput::Missing => MarkdownInput::Missing,
        }
    }

    fn normalize(&self) -> Result<Cow<'_, str>, Md2PdfError> {
        match self {
            MarkdownInput::Text(t) => normalize::normalize_text(Some(t.as_ref())),
            MarkdownInput::Bytes(b) => normalize::normalize_bytes(Some(b.as_ref())),
            MarkdownInput::Missing => normalize::normalize_text(None),
        }
    }
}

impl<'a> From<&'a str> for MarkdownInput<'a> {
    fn from(s: &'a str) -> Self {
        MarkdownInput::Text(Cow::Borrowed(s))
    }
}

impl From<String> for MarkdownInput<'static> {
    fn from(s: String) -> Self {
        MarkdownInput::Text(Cow::Owned(s))
    }
}

impl<'a> From<&'a String> for MarkdownInput<'a> {
    fn from(s: &'a String) -> Self {
        MarkdownInput::Text(Cow::Borrowed(s.as_str()))
    }
}

impl<'a> From<&'a [u8]> for MarkdownInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        MarkdownInput::Bytes(Cow::Borrowed(b))
    }
}

impl From<Vec<u8>> for MarkdownInput<'static> {
    fn from(b: Vec<u8>) -> Self {
        MarkdownInput::Bytes(Cow::Owned(b))
    }
}

impl<'a, T: Into<MarkdownInput<'a>>> From<Option<T>> for MarkdownInput<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(MarkdownInput::Missing, Into::into)
    }
}

/// Convert markdown to PDF bytes. Never fails.
///
/// Missing or empty input renders a placeholder page; see the module docs
/// for how every other problem degrades.
///
/// # Example
/// ```rust
/// let pdf = edgequake_md2pdf::convert("# Report\n\n- point one\n- point two");
/// assert!(pdf.starts_with(b"%PDF-"));
///
/// let blank = edgequake_md2pdf::convert(None::<&str>);
/// assert!(blank.starts_with(b"%PDF-"));
/// ```
pub fn convert<'a>(input: impl Into<MarkdownInput<'a>>) -> Vec<u8> {
    match convert_with(input, &RenderConfig::default()) {
        Ok(output) => output.pdf,
        Err(e) => {
            // Unreachable in lenient mode.
            warn!("Lenient conversion returned an error, using fallback: {}", e);
            serialize::fallback_document()
        }
    }
}

/// Convert markdown to PDF bytes, rejecting missing or empty input.
///
/// # Errors
/// Only [`Md2PdfError::MissingInput`] and [`Md2PdfError::EmptyInput`].
pub fn convert_strict<'a>(input: impl Into<MarkdownInput<'a>>) -> Result<Vec<u8>, Md2PdfError> {
    let config = RenderConfig {
        mode: ValidationMode::Strict,
        ..RenderConfig::default()
    };
    convert_with(input, &config).map(|output| output.pdf)
}

/// Convert markdown with an explicit configuration.
///
/// # Returns
/// `Ok(ConversionOutput)` whenever a document was produced, even if some
/// lines were skipped (check `output.warnings`) or the fallback document was
/// used (check `output.stats.fallback_used`).
///
/// # Errors
/// `MissingInput` / `EmptyInput` in [`ValidationMode::Strict`]; nothing in
/// lenient mode.
pub fn convert_with<'a>(
    input: impl Into<MarkdownInput<'a>>,
    config: &RenderConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    render(input.into(), config, serialize::to_pdf)
}

/// The pipeline behind [`convert_with`], with the final writer injected.
fn render<F>(
    input: MarkdownInput<'_>,
    config: &RenderConfig,
    write_pdf: F,
) -> Result<ConversionOutput, Md2PdfError>
where
    F: FnOnce(&Canvas, &RenderConfig) -> Result<Vec<u8>, Md2PdfError>,
{
    let start = Instant::now();
    let mut stats = RenderStats::default();

    // ── Step 1: Normalize ────────────────────────────────────────────────
    let text = match input.normalize() {
        Ok(text) => text,
        Err(e) if config.mode == ValidationMode::Strict => {
            debug!("Rejecting input in strict mode: {}", e);
            return Err(e);
        }
        Err(e) => {
            warn!("{}; rendering placeholder", e);
            stats.placeholder_used = true;
            Cow::Borrowed(config.placeholder.as_str())
        }
    };
    stats.input_chars = text.chars().count();

    // ── Step 2: Transcode ────────────────────────────────────────────────
    let (text, dropped) = transcode::to_latin1(&text);
    stats.dropped_chars = dropped;

    // ── Step 3: Classify ─────────────────────────────────────────────────
    let doc = classify::classify(&text, config.max_line_chars, config.max_title_chars);
    stats.lines = doc.total_lines;
    stats.blocks = doc.lines.len();
    stats.skipped_lines = doc.skipped.len();

    // ── Step 4: Layout ───────────────────────────────────────────────────
    let (canvas, failed) = layout::layout(&doc, config);
    stats.failed_lines = failed.len();

    // ── Step 5: Serialize ────────────────────────────────────────────────
    let pdf = match write_pdf(&canvas, config) {
        Ok(bytes) => {
            stats.pages = canvas.page_count();
            bytes
        }
        Err(e) => {
            warn!("{}; returning minimal document", e);
            stats.fallback_used = true;
            stats.pages = 1;
            serialize::fallback_document()
        }
    };

    let mut warnings = doc.skipped;
    warnings.extend(failed);
    warnings.sort_by_key(|w| w.line());

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} lines onto {} page(s) in {}ms ({} skipped, {} dropped chars)",
        stats.lines,
        stats.pages,
        stats.duration_ms,
        warnings.len(),
        stats.dropped_chars
    );

    Ok(ConversionOutput {
        pdf,
        stats,
        warnings,
    })
}

/// Convert and write the PDF to `output_path`.
///
/// The document is written to a temporary file in the target directory and
/// renamed into place, so readers never observe a partial file.
pub fn convert_to_file<'a>(
    input: impl Into<MarkdownInput<'a>>,
    output_path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderStats, Md2PdfError> {
    let output = convert_with(input, config)?;
    let path = output_path.as_ref();
    let write_err = |e: std::io::Error| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&output.pdf).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} bytes to {}", output.pdf.len(), path.display());
    Ok(output.stats)
}

/// Read a markdown file and write the PDF next to it (or wherever
/// `output_path` points). See [`convert_to_file`].
///
/// # Errors
/// [`Md2PdfError::InputReadFailed`] if the file cannot be read, plus
/// everything [`convert_to_file`] returns.
pub fn convert_path(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderStats, Md2PdfError> {
    let input_path = input_path.as_ref();
    let bytes = std::fs::read(input_path).map_err(|e| Md2PdfError::InputReadFailed {
        path: input_path.to_path_buf(),
        source: e,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), input_path.display());
    convert_to_file(MarkdownInput::from(bytes), output_path, config)
}

/// Run [`convert_with`] on tokio's blocking pool.
pub async fn convert_async(
    input: MarkdownInput<'static>,
    config: RenderConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::task::spawn_blocking(move || convert_with(input, &config))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("conversion task failed: {e}")))?
}
