//! Stage 5: write a laid-out canvas as a PDF document.
//!
//! The object graph is small and fixed:
//!
//! ```text
//! Catalog ──▶ Pages ──▶ Page × N ──▶ Contents (one stream per page)
//!                          └──────▶ Resources (shared) ──▶ F1 Helvetica
//!                                                      └─▶ F2 Helvetica-Bold
//! ```
//!
//! If building or writing the document fails, [`MINIMAL_PDF`] stands in:
//! a hand-assembled one-page document that needs no library to produce.

use crate::config::RenderConfig;
use crate::error::Md2PdfError;
use crate::pipeline::fonts::{self, FontStyle};
use crate::pipeline::layout::{Canvas, Page};
use crate::pipeline::transcode;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// Producer string written to the Info dictionary.
pub const PRODUCER: &str = concat!("edgequake-md2pdf ", env!("CARGO_PKG_VERSION"));

/// A valid, blank, one-page A4 document with a correct cross-reference table.
pub const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595.28 841.89] /Resources << >> >>\nendobj\n\
xref\n0 4\n\
0000000000 65535 f \n\
0000000009 00000 n \n\
0000000058 00000 n \n\
0000000115 00000 n \n\
trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n209\n%%EOF\n";

/// Serialize `canvas` to PDF bytes.
pub fn to_pdf(canvas: &Canvas, config: &RenderConfig) -> Result<Vec<u8>, Md2PdfError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut fonts_dict = Dictionary::new();
    for style in [FontStyle::Regular, FontStyle::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => style.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts_dict.set(style.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts_dict,
    });

    let (w_pt, h_pt) = canvas.page_size_pt();
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        w_pt.into(),
        h_pt.into(),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(canvas.page_count());
    for page in canvas.pages() {
        let content = page_content(page, h_pt);
        let encoded = content
            .encode()
            .map_err(|e| Md2PdfError::SerializationFailed(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = info_dictionary(&mut doc, config);
    doc.trailer.set("Info", info_id);

    if config.compress {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| Md2PdfError::SerializationFailed(e.to_string()))?;
    debug!(
        "Serialized {} page(s) into {} bytes",
        canvas.page_count(),
        bytes.len()
    );
    Ok(bytes)
}

/// The hard-coded stand-in document.
pub fn fallback_document() -> Vec<u8> {
    MINIMAL_PDF.to_vec()
}

fn page_content(page: &Page, page_h_pt: f32) -> Content {
    let mut operations = Vec::with_capacity(page.runs.len() * 4);
    for run in &page.runs {
        let bytes = fonts::encode_win_ansi(&run.text);
        if bytes.is_empty() {
            continue;
        }
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![run.style.resource_name().into(), run.size.into()],
        ));
        operations.push(Operation::new(
            "Td",
            vec![run.x.into(), (page_h_pt - run.baseline).into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(bytes)]));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn info_dictionary(doc: &mut Document, config: &RenderConfig) -> ObjectId {
    let mut info = dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
    };
    if let Some(ref title) = config.title {
        info.set("Title", Object::string_literal(latin1_bytes(title)));
    }
    if let Some(ref author) = config.author {
        info.set("Author", Object::string_literal(latin1_bytes(author)));
    }
    doc.add_object(info)
}

/// Metadata strings are written as 8-bit text; characters outside Latin-1
/// are dropped just like body text.
fn latin1_bytes(text: &str) -> Vec<u8> {
    let (kept, _) = transcode::to_latin1(text);
    kept.chars().map(|c| c as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::classify;
    use crate::pipeline::layout::layout;

    fn render(text: &str, config: &RenderConfig) -> Vec<u8> {
        let doc = classify(text, config.max_line_chars, config.max_title_chars);
        let (canvas, _) = layout(&doc, config);
        to_pdf(&canvas, config).unwrap()
    }

    fn uncompressed() -> RenderConfig {
        RenderConfig::builder().compress(false).build().unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn output_is_a_parseable_pdf() {
        let bytes = render("# Title\n\nBody text.", &RenderConfig::default());
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn page_count_matches_canvas() {
        let config = RenderConfig::default();
        let text = "row\n".repeat(300);
        let doc = classify(&text, 10_000, 200);
        let (canvas, _) = layout(&doc, &config);
        let bytes = to_pdf(&canvas, &config).unwrap();
        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), canvas.page_count());
        assert!(canvas.page_count() > 1);
    }

    #[test]
    fn uncompressed_stream_contains_text_and_fonts() {
        let bytes = render("# Heading\n- item", &uncompressed());
        assert!(contains(&bytes, b"(Heading) Tj"));
        assert!(contains(&bytes, b"(item) Tj"));
        assert!(contains(&bytes, b"/Helvetica-Bold"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
    }

    #[test]
    fn bullet_is_written_as_winansi_byte() {
        let bytes = render("- x", &uncompressed());
        assert!(contains(&bytes, b"\x95"));
    }

    #[test]
    fn info_dictionary_carries_metadata() {
        let config = RenderConfig::builder()
            .title("Quarterly report")
            .author("Research desk")
            .compress(false)
            .build()
            .unwrap();
        let bytes = render("body", &config);
        assert!(contains(&bytes, b"Quarterly report"));
        assert!(contains(&bytes, b"Research desk"));
        assert!(contains(&bytes, b"edgequake-md2pdf"));
    }

    #[test]
    fn minimal_pdf_xref_offsets_are_exact() {
        let find = |needle: &[u8]| {
            MINIMAL_PDF
                .windows(needle.len())
                .position(|w| w == needle)
                .unwrap()
        };
        assert_eq!(find(b"1 0 obj"), 9);
        assert_eq!(find(b"2 0 obj"), 58);
        assert_eq!(find(b"3 0 obj"), 115);
        assert_eq!(find(b"xref"), 209);
    }

    #[test]
    fn minimal_pdf_parses_as_one_page() {
        let doc = Document::load_mem(&fallback_document()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
