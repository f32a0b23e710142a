//! Configuration types for report generation and pagination.
//!
//! Two independent knobs live here, one per component:
//!
//! * [`RenderConfig`]: page geometry, typography and validation policy for
//!   the Markdown → PDF paginator, built via [`RenderConfigBuilder`].
//! * [`GenerationConfig`]: model, timeouts and instructions for the remote
//!   research call whose event stream feeds the aggregator, built via
//!   [`GenerationConfigBuilder`].
//!
//! Both are plain values constructed at a defined point and passed by
//! reference; nothing in the crate reads a process-wide client or config.

use crate::error::Md2PdfError;
use crate::prompts::DEFAULT_DEVELOPER_PROMPT;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Millimetres → PDF points.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
/// All lengths are millimetres; font sizes are points.
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{RenderConfig, ValidationMode};
///
/// let config = RenderConfig::builder()
///     .mode(ValidationMode::Strict)
///     .title("Due-diligence report")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Validation policy for missing / empty input. Default: lenient.
    pub mode: ValidationMode,

    /// Page dimensions. Default: A4 portrait.
    pub page_size: PageSize,

    /// Left, right and top margin. Default: 10 mm.
    pub margin_mm: f32,

    /// Distance from the bottom edge at which a page break is triggered.
    /// Default: 15 mm.
    pub bottom_margin_mm: f32,

    /// Body text size in points. Default: 11.
    pub body_font_size: f32,

    /// Heading sizes for levels 1, 2 and 3 in points. Default: 16 / 14 / 12.
    ///
    /// Markdown depths 4–6 are rendered with the level-3 size.
    pub heading_sizes: [f32; 3],

    /// Line height for body and bullet text. Default: 6 mm.
    pub body_line_height_mm: f32,

    /// Line height for heading titles. Default: 8 mm.
    pub heading_line_height_mm: f32,

    /// Extra vertical gap after a heading. Default: 1 mm.
    pub heading_gap_mm: f32,

    /// Vertical advance for a blank line. Default: 4 mm.
    pub blank_gap_mm: f32,

    /// Indent per nesting level; bullet text sits one level in. Default: 5 mm.
    pub bullet_indent_mm: f32,

    /// Lower bound on the wrapping column width. Default: 10 mm.
    pub min_column_mm: f32,

    /// Lines longer than this (in characters) are skipped. Default: 10 000.
    pub max_line_chars: usize,

    /// Heading titles are truncated to this many characters. Default: 200.
    pub max_title_chars: usize,

    /// Text substituted for missing or empty input in lenient mode.
    pub placeholder: String,

    /// Optional `/Title` for the PDF Info dictionary.
    pub title: Option<String>,

    /// Optional `/Author` for the PDF Info dictionary.
    pub author: Option<String>,

    /// Flate-compress page content streams. Default: true.
    pub compress: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            page_size: PageSize::default(),
            margin_mm: 10.0,
            bottom_margin_mm: 15.0,
            body_font_size: 11.0,
            heading_sizes: [16.0, 14.0, 12.0],
            body_line_height_mm: 6.0,
            heading_line_height_mm: 8.0,
            heading_gap_mm: 1.0,
            blank_gap_mm: 4.0,
            bullet_indent_mm: 5.0,
            min_column_mm: 10.0,
            max_line_chars: 10_000,
            max_title_chars: 200,
            placeholder: "No content.".to_string(),
            title: None,
            author: None,
            compress: true,
        }
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Heading size for a classified level (1–3); deeper levels share level 3.
    pub fn heading_size(&self, level: u8) -> f32 {
        let idx = usize::from(level.clamp(1, 3)) - 1;
        self.heading_sizes[idx]
    }

    /// Printable width between the left and right margins, in millimetres.
    pub fn printable_width_mm(&self) -> f32 {
        let (w, _) = self.page_size.dimensions_mm();
        w - 2.0 * self.margin_mm
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn strict(self) -> Self {
        self.mode(ValidationMode::Strict)
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_mm(mut self, mm: f32) -> Self {
        self.config.margin_mm = mm.max(0.0);
        self
    }

    pub fn bottom_margin_mm(mut self, mm: f32) -> Self {
        self.config.bottom_margin_mm = mm.max(0.0);
        self
    }

    pub fn body_font_size(mut self, pt: f32) -> Self {
        self.config.body_font_size = pt.clamp(4.0, 72.0);
        self
    }

    pub fn heading_sizes(mut self, sizes: [f32; 3]) -> Self {
        self.config.heading_sizes = sizes.map(|s| s.clamp(4.0, 72.0));
        self
    }

    pub fn body_line_height_mm(mut self, mm: f32) -> Self {
        self.config.body_line_height_mm = mm;
        self
    }

    pub fn heading_line_height_mm(mut self, mm: f32) -> Self {
        self.config.heading_line_height_mm = mm;
        self
    }

    pub fn blank_gap_mm(mut self, mm: f32) -> Self {
        self.config.blank_gap_mm = mm.max(0.0);
        self
    }

    pub fn bullet_indent_mm(mut self, mm: f32) -> Self {
        self.config.bullet_indent_mm = mm.max(0.0);
        self
    }

    pub fn max_line_chars(mut self, n: usize) -> Self {
        self.config.max_line_chars = n;
        self
    }

    pub fn max_title_chars(mut self, n: usize) -> Self {
        self.config.max_title_chars = n;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.config.placeholder = text.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = Some(author.into());
        self
    }

    pub fn compress(mut self, v: bool) -> Self {
        self.config.compress = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Md2PdfError> {
        let c = &self.config;
        let (w, h) = c.page_size.dimensions_mm();
        if !(w.is_finite() && h.is_finite()) || w < 50.0 || h < 50.0 {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Page must be at least 50×50 mm, got {w}×{h}"
            )));
        }
        if c.printable_width_mm() < c.min_column_mm {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Margins of {} mm leave less than {} mm of printable width",
                c.margin_mm, c.min_column_mm
            )));
        }
        if c.margin_mm + c.bottom_margin_mm >= h {
            return Err(Md2PdfError::InvalidConfig(
                "Top and bottom margins exceed the page height".into(),
            ));
        }
        for (name, v) in [
            ("body line height", c.body_line_height_mm),
            ("heading line height", c.heading_line_height_mm),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return Err(Md2PdfError::InvalidConfig(format!(
                    "{name} must be > 0 mm, got {v}"
                )));
            }
        }
        if c.max_line_chars == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "max_line_chars must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the paginator treats input that is missing or empty.
///
/// | Mode | Missing / empty input | Every other failure |
/// |------|-----------------------|---------------------|
/// | Lenient | placeholder page | degraded, never raised |
/// | Strict  | `Err(MissingInput / EmptyInput)` | degraded, never raised |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationMode {
    /// Always return a document. (default)
    #[default]
    Lenient,
    /// Reject missing or whitespace-only input.
    Strict,
}

/// Page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
    /// Width × height in millimetres.
    Custom { width_mm: f32, height_mm: f32 },
}

impl PageSize {
    /// `(width, height)` in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// `(width, height)` in PDF points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (w * PT_PER_MM, h * PT_PER_MM)
    }
}

// ── Generation (research call) configuration ────────────────────────────

/// Tools the research model may call while producing its report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResearchTool {
    /// Live web search.
    WebSearchPreview,
    /// Sandboxed code execution with an automatically provisioned container.
    CodeInterpreter,
}

impl ResearchTool {
    fn to_json(&self) -> Value {
        match self {
            ResearchTool::WebSearchPreview => json!({ "type": "web_search_preview" }),
            ResearchTool::CodeInterpreter => json!({
                "type": "code_interpreter",
                "container": { "type": "auto", "file_ids": [] }
            }),
        }
    }
}

/// Configuration for the remote research call whose events the
/// [`crate::stream::StreamAggregator`] consumes.
///
/// The transport is provided by the caller; this struct pins down the
/// request shape and timeouts so every caller builds the same request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier. Default: `o3-deep-research`.
    pub model: String,

    /// TCP connect timeout. Default: 60 s.
    pub connect_timeout: Duration,

    /// Read timeout. Deep research runs can be silent for many minutes
    /// between events. Default: 30 min.
    pub read_timeout: Duration,

    /// Write timeout. Default: 30 min.
    pub write_timeout: Duration,

    /// Transport-level retries. Default: 3.
    pub max_retries: u32,

    /// Developer-role instructions. Default: [`DEFAULT_DEVELOPER_PROMPT`].
    pub instructions: String,

    /// Reasoning summary mode sent with the request. Default: `auto`.
    pub reasoning_summary: String,

    /// Enabled tools. Default: web search + code interpreter.
    pub tools: Vec<ResearchTool>,

    /// Publish a live preview every N fragments; 0 disables. Default: 20.
    pub preview_every: usize,

    /// Wall-clock budget used for progress display. Default: 30 min.
    pub expected_duration: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "o3-deep-research".to_string(),
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(1800),
            write_timeout: Duration::from_secs(1800),
            max_retries: 3,
            instructions: DEFAULT_DEVELOPER_PROMPT.to_string(),
            reasoning_summary: "auto".to_string(),
            tools: vec![ResearchTool::WebSearchPreview, ResearchTool::CodeInterpreter],
            preview_every: 20,
            expected_duration: Duration::from_secs(30 * 60),
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// JSON body of a streaming research request for `query`.
    pub fn request_body(&self, query: &str) -> Value {
        json!({
            "model": self.model,
            "stream": true,
            "input": [
                {
                    "role": "developer",
                    "content": [{ "type": "input_text", "text": self.instructions }]
                },
                {
                    "role": "user",
                    "content": [{ "type": "input_text", "text": query }]
                }
            ],
            "reasoning": { "summary": self.reasoning_summary },
            "tools": self.tools.iter().map(ResearchTool::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.config.connect_timeout = d;
        self
    }

    pub fn read_timeout(mut self, d: Duration) -> Self {
        self.config.read_timeout = d;
        self
    }

    pub fn write_timeout(mut self, d: Duration) -> Self {
        self.config.write_timeout = d;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = text.into();
        self
    }

    pub fn reasoning_summary(mut self, mode: impl Into<String>) -> Self {
        self.config.reasoning_summary = mode.into();
        self
    }

    pub fn tools(mut self, tools: Vec<ResearchTool>) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn preview_every(mut self, n: usize) -> Self {
        self.config.preview_every = n;
        self
    }

    pub fn expected_duration(mut self, d: Duration) -> Self {
        self.config.expected_duration = d;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Md2PdfError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig("Model must not be empty".into()));
        }
        if c.instructions.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "Developer instructions must not be empty".into(),
            ));
        }
        if c.expected_duration.is_zero() {
            return Err(Md2PdfError::InvalidConfig(
                "Expected duration must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}
