//! Stage 4: place classified blocks on fixed-size pages.
//!
//! Geometry is tracked in millimetres with a running cursor, the way a
//! report printer works: a block asks for room, the canvas breaks the page
//! if the next line would cross the bottom margin, text is placed, and the
//! cursor advances by the line height. Emitted [`TextRun`]s are in points,
//! measured from the top-left corner of the page.
//!
//! ## Wrapping
//!
//! [`write_wrapped`] is a greedy word wrap over whitespace-separated tokens.
//! A token wider than the whole column is hard-split by [`split_long_word`]
//! so that layout always makes progress, even for a single glyph that does
//! not fit.

use crate::config::{RenderConfig, PT_PER_MM};
use crate::error::LineError;
use crate::pipeline::classify::{Block, Document};
use crate::pipeline::fonts::{self, FontStyle, BULLET};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Slack allowed when comparing measured widths against the column.
const WIDTH_EPSILON: f32 = 1e-3;

/// One piece of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Left edge, points from the left page edge.
    pub x: f32,
    /// Baseline, points from the top page edge.
    pub baseline: f32,
    pub style: FontStyle,
    /// Font size in points.
    pub size: f32,
    pub text: String,
}

/// A page's worth of text runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

/// Fixed-size pages plus the cursor that fills them.
#[derive(Debug, Clone)]
pub struct Canvas {
    page_w: f32,
    page_h: f32,
    margin: f32,
    bottom_margin: f32,
    pages: Vec<Page>,
    /// Cursor, millimetres from the top edge.
    y: f32,
    style: FontStyle,
    size: f32,
}

impl Canvas {
    /// A canvas with one empty page and the body font selected.
    pub fn new(config: &RenderConfig) -> Self {
        let (page_w, page_h) = config.page_size.dimensions_mm();
        Self {
            page_w,
            page_h,
            margin: config.margin_mm,
            bottom_margin: config.bottom_margin_mm,
            pages: vec![Page::default()],
            y: config.margin_mm,
            style: FontStyle::Regular,
            size: config.body_font_size,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page size in points.
    pub fn page_size_pt(&self) -> (f32, f32) {
        (self.page_w * PT_PER_MM, self.page_h * PT_PER_MM)
    }

    /// Cursor position in millimetres from the top edge.
    pub fn cursor_mm(&self) -> f32 {
        self.y
    }

    pub fn set_font(&mut self, style: FontStyle, size: f32) {
        self.style = style;
        self.size = size;
    }

    pub fn font(&self) -> (FontStyle, f32) {
        (self.style, self.size)
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.margin;
    }

    /// Break the page if a line of height `h` would cross the bottom margin.
    /// A fresh page is never broken again, so an oversized line cannot loop.
    pub fn ensure_room(&mut self, h: f32) {
        let at_top = (self.y - self.margin).abs() < WIDTH_EPSILON;
        if self.y + h > self.page_h - self.bottom_margin && !at_top {
            self.add_page();
        }
    }

    /// Advance the cursor by `h` millimetres.
    pub fn ln(&mut self, h: f32) {
        self.y += h;
    }

    /// Place `text` at `x_mm` on the current line of height `h`, vertically
    /// centred in the line like a report cell.
    pub fn put_text(&mut self, x_mm: f32, h: f32, text: &str) {
        let size_mm = self.size / PT_PER_MM;
        let baseline_mm = self.y + h / 2.0 + 0.3 * size_mm;
        let run = TextRun {
            x: x_mm * PT_PER_MM,
            baseline: baseline_mm * PT_PER_MM,
            style: self.style,
            size: self.size,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
    }

    fn check_column(&self, x_mm: f32, width_mm: f32, line: usize) -> Result<(), LineError> {
        if !(x_mm.is_finite() && width_mm.is_finite()) || width_mm <= 0.0 {
            return Err(LineError::LayoutFailed {
                line,
                detail: format!("invalid column at x={x_mm} mm, width {width_mm} mm"),
            });
        }
        if x_mm + width_mm > self.page_w + WIDTH_EPSILON {
            return Err(LineError::LayoutFailed {
                line,
                detail: format!(
                    "column {x_mm}+{width_mm} mm extends past the {} mm page",
                    self.page_w
                ),
            });
        }
        Ok(())
    }
}

/// Split `word` into pieces no wider than `max_width_pt`.
///
/// Pieces are cut between characters. A character that alone is wider than
/// the limit becomes its own piece.
pub fn split_long_word(word: &str, max_width_pt: f32, style: FontStyle, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0;
    for c in word.chars() {
        let w = fonts::char_width(c, style, size);
        if !current.is_empty() && current_w + w > max_width_pt + WIDTH_EPSILON {
            pieces.push(std::mem::take(&mut current));
            current_w = 0.0;
        }
        current.push(c);
        current_w += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Greedy-wrap `text` into a column at `x_mm` of `width_mm`, one line of
/// height `h` per row, in the canvas's current font.
pub fn write_wrapped(
    canvas: &mut Canvas,
    text: &str,
    x_mm: f32,
    width_mm: f32,
    h: f32,
    line: usize,
) -> Result<(), LineError> {
    canvas.check_column(x_mm, width_mm, line)?;

    let (style, size) = canvas.font();
    let max_w = width_mm * PT_PER_MM;
    let space_w = fonts::char_width(' ', style, size);
    let mut widths: HashMap<&str, f32> = HashMap::new();

    let mut rows: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0;

    for token in text.split_whitespace() {
        let w = *widths
            .entry(token)
            .or_insert_with(|| fonts::string_width(token, style, size));

        if w > max_w + WIDTH_EPSILON {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            let mut pieces = split_long_word(token, max_w, style, size);
            let last = pieces.pop().unwrap_or_default();
            rows.extend(pieces);
            current_w = fonts::string_width(&last, style, size);
            current = last;
        } else if current.is_empty() {
            current.push_str(token);
            current_w = w;
        } else if current_w + space_w + w <= max_w + WIDTH_EPSILON {
            current.push(' ');
            current.push_str(token);
            current_w += space_w + w;
        } else {
            rows.push(std::mem::replace(&mut current, token.to_string()));
            current_w = w;
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    for row in rows {
        canvas.ensure_room(h);
        canvas.put_text(x_mm, h, &row);
        canvas.ln(h);
    }
    Ok(())
}

/// Lay out every block of `doc`; returns the canvas and the lines that
/// could not be placed.
pub fn layout(doc: &Document, config: &RenderConfig) -> (Canvas, Vec<LineError>) {
    let mut canvas = Canvas::new(config);
    let mut failures = Vec::new();

    for classified in &doc.lines {
        if let Err(e) = layout_block(&mut canvas, &classified.block, classified.number, config) {
            warn!("{}", e);
            failures.push(e);
            canvas.set_font(FontStyle::Regular, config.body_font_size);
        }
    }

    debug!(
        "Laid out {} blocks on {} page(s), {} failed",
        doc.lines.len(),
        canvas.page_count(),
        failures.len()
    );
    (canvas, failures)
}

fn layout_block(
    canvas: &mut Canvas,
    block: &Block,
    line: usize,
    config: &RenderConfig,
) -> Result<(), LineError> {
    let margin = config.margin_mm;
    match block {
        Block::Heading { level, text } => {
            canvas.set_font(FontStyle::Bold, config.heading_size(*level));
            write_wrapped(
                canvas,
                text,
                margin,
                column_width(config, 0),
                config.heading_line_height_mm,
                line,
            )?;
            canvas.ln(config.heading_gap_mm);
            canvas.set_font(FontStyle::Regular, config.body_font_size);
        }
        Block::Bullet { text } => {
            let x = margin + config.bullet_indent_mm;
            let width = column_width(config, 1);
            canvas.check_column(x, width, line)?;
            let h = config.body_line_height_mm;
            canvas.ensure_room(h);
            canvas.put_text(margin, h, &BULLET.to_string());
            write_wrapped(canvas, text, x, width, h, line)?;
        }
        Block::Paragraph { text } => {
            write_wrapped(
                canvas,
                text,
                margin,
                column_width(config, 0),
                config.body_line_height_mm,
                line,
            )?;
        }
        Block::Blank => canvas.ln(config.blank_gap_mm),
    }
    Ok(())
}

/// Column width for text indented `level` bullet steps, floored at the
/// configured minimum.
fn column_width(config: &RenderConfig, level: u8) -> f32 {
    let w = config.printable_width_mm() - f32::from(level) * config.bullet_indent_mm;
    w.max(config.min_column_mm)
}
