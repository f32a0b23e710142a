//! # edgequake-md2pdf
//!
//! Turn a streamed research report into a paginated PDF.
//!
//! ## Why this crate?
//!
//! Deep-research models stream their report as dozens of events over many
//! minutes, and the person waiting for it wants a document they can file or
//! forward, not a transcript. This crate provides the two pieces between the
//! event stream and that document, each usable on its own:
//!
//! * **Aggregation**: fold generation events into the final report text,
//!   with optional live previews. Total: failures become a labelled error
//!   text instead of an `Err`.
//! * **Pagination**: render a deliberately small subset of Markdown
//!   (three heading sizes, bullets, paragraphs) onto A4 pages with the
//!   built-in Helvetica fonts. Total in lenient mode: any input, including
//!   none at all, yields a valid PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! events ──▶ aggregate ──▶ markdown
//!                             │
//!                             ├─ 1. Normalize  decode bytes, detect missing / empty
//!                             ├─ 2. Transcode  keep Latin-1, count dropped chars
//!                             ├─ 3. Classify   heading / bullet / paragraph / blank
//!                             ├─ 4. Layout     greedy wrap, page breaks
//!                             └─ 5. Serialize  lopdf objects, minimal fallback
//!                                                   │
//!                                                  PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_md2pdf::{aggregate, convert_with, GenerationEvent, RenderConfig};
//!
//! let events = vec![
//!     GenerationEvent::item_added("# Findings\n\n"),
//!     GenerationEvent::item_delta("- Strong brand loyalty\n"),
//!     GenerationEvent::item_delta("- Thin margins\n"),
//! ];
//! let report = aggregate(events.into_iter().map(Ok));
//!
//! let output = convert_with(report.as_str(), &RenderConfig::default()).unwrap();
//! assert!(output.pdf.starts_with(b"%PDF-"));
//! assert_eq!(output.stats.pages, 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GenerationConfig, GenerationConfigBuilder, PageSize, RenderConfig, RenderConfigBuilder,
    ResearchTool, ValidationMode,
};
pub use convert::{
    convert, convert_async, convert_path, convert_strict, convert_to_file, convert_with,
    MarkdownInput,
};
pub use error::{LineError, Md2PdfError, StreamError};
pub use event::{decode_event, read_events, GenerationEvent};
pub use output::{ConversionOutput, RenderStats};
pub use progress::{
    ElapsedProgress, NoopPreview, PreviewCallback, PreviewObserver, PreviewSnapshot,
    WatchPreview,
};
pub use stream::{aggregate, aggregate_stream, is_error_text, StreamAggregator};
