//! End-to-end tests for edgequake-md2pdf through the public API only.
//!
//! Every produced document is re-parsed with `lopdf` so the assertions are
//! about real PDFs, not about intermediate layout structures. Tests that
//! search for text in the output disable stream compression.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use edgequake_md2pdf::{
    aggregate, aggregate_stream, convert, convert_strict, convert_to_file, convert_with,
    decode_event, read_events, GenerationEvent, LineError, MarkdownInput, Md2PdfError,
    RenderConfig, StreamAggregator, StreamError, WatchPreview,
};
use lopdf::Document;
use std::io::Cursor;
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf)
        .expect("output must parse as PDF")
        .get_pages()
        .len()
}

fn uncompressed() -> RenderConfig {
    RenderConfig::builder().compress(false).build().unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Deterministic byte soup, no extra crates needed.
fn pseudo_random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect()
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[test]
fn any_bytes_yield_a_pdf() {
    for (seed, len) in [(1, 0), (2, 1), (3, 64), (4, 4096), (5, 70_000)] {
        let bytes = pseudo_random_bytes(seed, len);
        let pdf = convert(bytes);
        assert!(pdf.starts_with(b"%PDF-"), "seed {seed}");
        assert!(page_count(&pdf) >= 1, "seed {seed}");
    }
}

#[test]
fn input_entirely_outside_latin1_still_yields_a_document() {
    let out = convert_with("✓ 中文 😀 Ω", &RenderConfig::default()).unwrap();
    assert!(out.pdf.starts_with(b"%PDF-"));
    assert_eq!(page_count(&out.pdf), 1);
    assert_eq!(out.stats.dropped_chars, 5);
}

#[test]
fn missing_input_strict_vs_lenient() {
    assert!(matches!(
        convert_strict(MarkdownInput::Missing),
        Err(Md2PdfError::MissingInput)
    ));

    let out = convert_with(MarkdownInput::Missing, &uncompressed()).unwrap();
    assert!(out.stats.placeholder_used);
    assert!(contains(&out.pdf, b"(No content.) Tj"));
    assert_eq!(page_count(&out.pdf), 1);
}

#[test]
fn whitespace_only_input_strict_vs_lenient() {
    let err = convert_strict("  \n\r\n\t ").unwrap_err();
    assert!(err.is_validation());
    assert!(convert("  \n\r\n\t ").starts_with(b"%PDF-"));
}

#[test]
fn deep_headings_share_level_three_size() {
    let render = |line: &str| {
        let out = convert_with(line, &uncompressed()).unwrap();
        out.pdf
    };
    let h3 = render("### Title");
    for depth in 4..=6 {
        let line = format!("{} Title", "#".repeat(depth));
        let pdf = render(&line);
        assert!(contains(&pdf, b"/F2 12"), "depth {depth}");
        assert!(contains(&pdf, b"(Title) Tj"), "depth {depth}");
    }
    assert!(contains(&h3, b"/F2 12"));
    assert!(contains(&render("# Title"), b"/F2 16"));
    assert!(contains(&render("## Title"), b"/F2 14"));
}

#[test]
fn all_bullet_markers_render_the_same() {
    let outputs: Vec<Vec<u8>> = ["- item", "* item", "+ item"]
        .iter()
        .map(|l| convert_with(*l, &uncompressed()).unwrap().pdf)
        .collect();
    for pdf in &outputs {
        assert!(contains(pdf, b"(item) Tj"));
        assert!(contains(pdf, b"(\x95) Tj"));
    }
}

#[test]
fn overlong_token_wraps_across_lines() {
    let token = "A".repeat(600);
    let out = convert_with(token.as_str(), &uncompressed()).unwrap();
    assert!(out.warnings.is_empty());

    let doc = Document::load_mem(&out.pdf).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    let rows = content.windows(2).filter(|w| *w == b"Tj").count();
    assert!(rows >= 2, "expected the token to span rows, got {rows}");
    assert_eq!(content.iter().filter(|&&b| b == b'A').count(), 600);
}

#[test]
fn line_over_limit_is_dropped_and_processing_continues() {
    let text = format!("before\n{}\nafter", "Q".repeat(10_001));
    let out = convert_with(text.as_str(), &uncompressed()).unwrap();

    assert!(!contains(&out.pdf, b"QQQQQQQQQQ"));
    assert!(contains(&out.pdf, b"(before) Tj"));
    assert!(contains(&out.pdf, b"(after) Tj"));
    assert_eq!(
        out.warnings,
        vec![LineError::TooLong {
            line: 2,
            chars: 10_001,
            limit: 10_000
        }]
    );
}

#[test]
fn long_report_paginates() {
    init_tracing();
    let mut md = String::from("# Due diligence\n\n");
    for i in 0..40 {
        md.push_str(&format!("## Section {i}\n\n"));
        md.push_str("Customers praise the texture and protein content, while reviewers on forums flag price increases and inconsistent availability in regional grocery chains.\n");
        md.push_str("- Strong brand loyalty\n- Thin margins\n\n");
    }
    let out = convert_with(md.as_str(), &RenderConfig::default()).unwrap();
    assert!(out.stats.pages > 1);
    assert_eq!(page_count(&out.pdf), out.stats.pages);
    assert!(out.is_clean());
}

#[test]
fn convert_to_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    let config = RenderConfig::builder().title("Report").build().unwrap();
    let stats = convert_to_file("# Report\n\nBody", &path, &config).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(page_count(&bytes), stats.pages);
}

#[test]
fn trailing_newline_adds_no_line() {
    let with = convert_with("# Report\n\nBody.\n", &RenderConfig::default()).unwrap();
    let without = convert_with("# Report\n\nBody.", &RenderConfig::default()).unwrap();
    assert_eq!(with.stats.lines, 3);
    assert_eq!(with.stats.lines, without.stats.lines);
    assert_eq!(with.stats.blocks, without.stats.blocks);
}

#[test]
fn form_feed_separates_headings() {
    let out = convert_with("# A\x0c# B", &uncompressed()).unwrap();
    assert_eq!(out.stats.lines, 2);
    assert!(contains(&out.pdf, b"(A) Tj"));
    assert!(contains(&out.pdf, b"(B) Tj"));
    assert!(!contains(&out.pdf, b"(A # B) Tj"));
}

// ── Aggregation ──────────────────────────────────────────────────────────────

#[test]
fn aggregate_empty_is_empty() {
    assert_eq!(aggregate(Vec::new()), "");
}

#[test]
fn aggregate_skips_non_text_and_keeps_order() {
    let events = vec![
        GenerationEvent::item_added("A"),
        GenerationEvent::item_delta("B"),
        GenerationEvent::other("response.web_search_call.searching"),
        GenerationEvent::item_added("C"),
    ];
    assert_eq!(aggregate(events.into_iter().map(Ok)), "ABC");
}

#[test]
fn recorded_stream_to_pdf() {
    init_tracing();
    let recording = r##"
{"type":"response.created","response":{"output":[]}}
{"type":"response.output_item.added","item":{"content":[{"type":"output_text","text":"# Good Culture\n\n"}]}}
{"type":"response.reasoning_summary_text.delta","delta":"thinking"}
{"type":"response.content_part.delta","delta":{"content":[{"text":"- Loyal customers\n"}]}}
{"type":"response.content_part.delta","delta":{"content":[{"text":"- Premium pricing\n"}]}}
{"type":"response.completed"}
"##;
    let report = aggregate(read_events(Cursor::new(recording)));
    assert_eq!(
        report,
        "# Good Culture\n\n- Loyal customers\n- Premium pricing\n"
    );

    let out = convert_with(report.as_str(), &uncompressed()).unwrap();
    assert!(contains(&out.pdf, b"(Good Culture) Tj"));
    assert!(contains(&out.pdf, b"(Premium pricing) Tj"));
}

#[test]
fn service_error_event_becomes_labelled_text() {
    let recording = "data: {\"item\":{\"content\":[{\"text\":\"partial\"}]}}\n\
                     data: {\"type\":\"error\",\"message\":\"rate limited\"}\n";
    let report = aggregate(read_events(Cursor::new(recording)));
    assert!(report.starts_with("❌ **Service error:**"));
    assert!(report.contains("rate limited"));
    assert!(!report.contains("partial"));
}

#[test]
fn malformed_event_becomes_unexpected_error() {
    assert!(matches!(
        decode_event("not json"),
        Err(StreamError::Unexpected { .. })
    ));
    let report = aggregate([Ok(GenerationEvent::item_added("x")), decode_event("{")]);
    assert!(report.starts_with("⚠️ **Unexpected error:**"));
}

#[tokio::test]
async fn watch_preview_from_worker_thread() {
    let (preview, rx) = WatchPreview::channel();
    let aggregator = StreamAggregator::new().with_preview(Arc::new(preview), 20);
    let events: Vec<_> = (0..50)
        .map(|i| Ok(GenerationEvent::item_delta(format!("{i} "))))
        .collect();

    let report = tokio::task::spawn_blocking(move || aggregator.run(events))
        .await
        .unwrap();

    let snap = rx.borrow().clone();
    assert!(snap.done);
    assert_eq!(snap.fragments, 50);
    assert!(report.starts_with(&snap.text));
}

#[tokio::test]
async fn async_aggregation_over_a_stream() {
    let events = futures::stream::iter(vec![
        Ok(GenerationEvent::response_created(["Intro "])),
        Ok(GenerationEvent::item_delta("body")),
    ]);
    assert_eq!(aggregate_stream(events).await, "Intro body");
}
