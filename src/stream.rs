//! Report aggregation: fold a stream of generation events into one text.
//!
//! ## Always a string
//!
//! A deep-research call runs for up to half an hour and its result is shown
//! to a person, not parsed by a program. Whatever happens mid-stream, the
//! caller needs *something* to display. [`StreamAggregator::run`] therefore
//! always returns a `String`: the concatenated report on success, or a
//! labelled error text when the event source fails.
//!
//! Two labels keep the failure kinds distinguishable for a reader (and for
//! [`is_error_text`]): [`SERVICE_ERROR_PREFIX`] when the service itself
//! reported a failure, [`UNEXPECTED_ERROR_PREFIX`] for anything else.
//!
//! Both a blocking ([`aggregate`]) and an async ([`aggregate_stream`]) entry
//! point exist; they share the same fold so their results are identical.

use crate::error::StreamError;
use crate::event::GenerationEvent;
use crate::progress::PreviewCallback;
use futures::{FutureExt, StreamExt};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Label for failures reported by the generation service.
pub const SERVICE_ERROR_PREFIX: &str = "❌ **Service error:**";

/// Label for every other failure during consumption.
pub const UNEXPECTED_ERROR_PREFIX: &str = "⚠️ **Unexpected error:**";

/// Default live-preview interval, in fragments.
pub const DEFAULT_PREVIEW_EVERY: usize = 20;

/// A boxed stream of generation events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent, StreamError>> + Send>>;

/// Concatenate the text of every event, in arrival order.
///
/// Returns the empty string for an empty sequence and a labelled error text
/// (see [`error_text`]) if the sequence yields an error.
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{aggregate, GenerationEvent};
///
/// let events = vec![
///     GenerationEvent::item_added("A"),
///     GenerationEvent::item_delta("B"),
///     GenerationEvent::other("response.reasoning"),
///     GenerationEvent::item_added("C"),
/// ];
/// assert_eq!(aggregate(events.into_iter().map(Ok)), "ABC");
/// ```
pub fn aggregate<I>(events: I) -> String
where
    I: IntoIterator<Item = Result<GenerationEvent, StreamError>>,
{
    StreamAggregator::new().run(events)
}

/// Async counterpart of [`aggregate`].
pub async fn aggregate_stream<S>(events: S) -> String
where
    S: Stream<Item = Result<GenerationEvent, StreamError>>,
{
    StreamAggregator::new().run_stream(events).await
}

/// Format a stream failure as the text the aggregator returns.
pub fn error_text(err: &StreamError) -> String {
    match err {
        StreamError::Service { message } => format!("{SERVICE_ERROR_PREFIX} {message}"),
        StreamError::Unexpected { message } => format!("{UNEXPECTED_ERROR_PREFIX} {message}"),
    }
}

/// True if `text` is an error result produced by the aggregator.
pub fn is_error_text(text: &str) -> bool {
    text.starts_with(SERVICE_ERROR_PREFIX) || text.starts_with(UNEXPECTED_ERROR_PREFIX)
}

/// Incremental fold over generation events.
///
/// Holds the report accumulated so far and an optional preview observer.
/// `Send`, so it can be moved onto a worker thread with the event source.
pub struct StreamAggregator {
    text: String,
    fragments: usize,
    preview: Option<PreviewCallback>,
    preview_every: usize,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            fragments: 0,
            preview: None,
            preview_every: DEFAULT_PREVIEW_EVERY,
        }
    }

    /// Publish the partial report to `observer` every `every` fragments.
    /// `every = 0` keeps the observer but never sends previews.
    pub fn with_preview(mut self, observer: PreviewCallback, every: usize) -> Self {
        self.preview = Some(observer);
        self.preview_every = every;
        self
    }

    /// Report text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of non-empty fragments accumulated so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Fold one event; returns the fragment it contributed, if any.
    pub fn push(&mut self, event: &GenerationEvent) -> Option<&str> {
        let fragment = event.fragment()?;
        let start = self.text.len();
        self.text.push_str(fragment);
        self.fragments += 1;

        if self.preview_every > 0 && self.fragments % self.preview_every == 0 {
            if let Some(ref cb) = self.preview {
                debug!(
                    "Preview after {} fragments ({} bytes)",
                    self.fragments,
                    self.text.len()
                );
                cb.on_preview(&self.text, self.fragments);
            }
        }

        Some(&self.text[start..])
    }

    /// End of stream: return the report.
    pub fn finish(self) -> String {
        info!(
            "Aggregated {} fragments into {} bytes",
            self.fragments,
            self.text.len()
        );
        if let Some(ref cb) = self.preview {
            cb.on_complete(self.text.len(), self.fragments);
        }
        self.text
    }

    /// Stream failure: discard the partial report and return the error text.
    pub fn fail(self, err: &StreamError) -> String {
        let text = error_text(err);
        warn!(
            "Event stream failed after {} fragments ({} bytes discarded): {}",
            self.fragments,
            self.text.len(),
            err
        );
        if let Some(ref cb) = self.preview {
            cb.on_error(&text);
        }
        text
    }

    /// Consume a blocking event source to completion.
    ///
    /// A panic raised by the source while producing an event is reported
    /// as an unexpected error. Observer panics are not caught.
    pub fn run<I>(mut self, events: I) -> String
    where
        I: IntoIterator<Item = Result<GenerationEvent, StreamError>>,
    {
        let mut events = events.into_iter();
        loop {
            let next = match panic::catch_unwind(AssertUnwindSafe(|| events.next())) {
                Ok(next) => next,
                Err(payload) => return self.fail(&source_panic(&*payload)),
            };
            match next {
                Some(Ok(ev)) => {
                    self.push(&ev);
                }
                Some(Err(e)) => return self.fail(&e),
                None => break,
            }
        }
        self.finish()
    }

    /// Consume an async event source to completion.
    pub async fn run_stream<S>(mut self, events: S) -> String
    where
        S: Stream<Item = Result<GenerationEvent, StreamError>>,
    {
        let mut events = std::pin::pin!(events);
        loop {
            let next = match AssertUnwindSafe(events.next()).catch_unwind().await {
                Ok(next) => next,
                Err(payload) => return self.fail(&source_panic(&*payload)),
            };
            match next {
                Some(Ok(ev)) => {
                    self.push(&ev);
                }
                Some(Err(e)) => return self.fail(&e),
                None => break,
            }
        }
        self.finish()
    }
}

/// Turn a panic payload from the event source into a stream error.
fn source_panic(payload: &(dyn Any + Send)) -> StreamError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    StreamError::unexpected(format!("event source panicked: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{PreviewObserver, WatchPreview};
    use std::sync::{Arc, Mutex};

    fn ok_events(events: Vec<GenerationEvent>) -> Vec<Result<GenerationEvent, StreamError>> {
        events.into_iter().map(Ok).collect()
    }

    #[derive(Default)]
    struct Recorder {
        previews: Mutex<Vec<(String, usize)>>,
        errors: Mutex<Vec<String>>,
    }

    impl PreviewObserver for Recorder {
        fn on_preview(&self, partial: &str, fragments: usize) {
            self.previews
                .lock()
                .unwrap()
                .push((partial.to_string(), fragments));
        }

        fn on_error(&self, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn empty_stream_is_empty_string() {
        assert_eq!(aggregate(Vec::new()), "");
    }

    #[test]
    fn skips_non_text_and_preserves_order() {
        let events = ok_events(vec![
            GenerationEvent::item_added("A"),
            GenerationEvent::item_delta("B"),
            GenerationEvent::other("response.reasoning_summary.delta"),
            GenerationEvent::item_added("C"),
        ]);
        assert_eq!(aggregate(events), "ABC");
    }

    #[test]
    fn response_created_uses_last_item() {
        let events = ok_events(vec![
            GenerationEvent::response_created(["ignored", "Intro. "]),
            GenerationEvent::item_added("Body."),
        ]);
        assert_eq!(aggregate(events), "Intro. Body.");
    }

    #[test]
    fn push_reports_fragment() {
        let mut agg = StreamAggregator::new();
        assert_eq!(agg.push(&GenerationEvent::item_added("x")), Some("x"));
        assert_eq!(agg.push(&GenerationEvent::other("ping")), None);
        assert_eq!(agg.push(&GenerationEvent::item_added("")), None);
        assert_eq!(agg.fragment_count(), 1);
        assert_eq!(agg.text(), "x");
    }

    #[test]
    fn service_failure_is_labelled() {
        let events = vec![
            Ok(GenerationEvent::item_added("partial")),
            Err(StreamError::service("quota exceeded")),
            Ok(GenerationEvent::item_added("never seen")),
        ];
        let out = aggregate(events);
        assert_eq!(out, format!("{SERVICE_ERROR_PREFIX} quota exceeded"));
        assert!(is_error_text(&out));
    }

    #[test]
    fn unexpected_failure_is_labelled_differently() {
        let out = aggregate(vec![Err(StreamError::unexpected("malformed event"))]);
        assert!(out.starts_with(UNEXPECTED_ERROR_PREFIX));
        assert!(!out.starts_with(SERVICE_ERROR_PREFIX));
        assert!(out.ends_with("malformed event"));
    }

    #[test]
    fn report_text_is_not_error_text() {
        assert!(!is_error_text("# Report\n\nAll good."));
    }

    #[test]
    fn previews_every_n_fragments() {
        let recorder = Arc::new(Recorder::default());
        let events = (0..45).map(|i| Ok(GenerationEvent::item_delta(format!("{i},"))));
        let out = StreamAggregator::new()
            .with_preview(recorder.clone(), 20)
            .run(events);

        let previews = recorder.previews.lock().unwrap();
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].1, 20);
        assert_eq!(previews[1].1, 40);
        assert!(out.starts_with(&previews[1].0));
    }

    #[test]
    fn preview_every_zero_disables_previews() {
        let recorder = Arc::new(Recorder::default());
        let events = (0..50).map(|_| Ok(GenerationEvent::item_delta("x")));
        StreamAggregator::new()
            .with_preview(recorder.clone(), 0)
            .run(events);
        assert!(recorder.previews.lock().unwrap().is_empty());
    }

    #[test]
    fn failure_notifies_observer() {
        let recorder = Arc::new(Recorder::default());
        let out = StreamAggregator::new()
            .with_preview(recorder.clone(), 20)
            .run(vec![Err(StreamError::service("down"))]);
        assert_eq!(recorder.errors.lock().unwrap().as_slice(), [out]);
    }

    #[test]
    fn async_stream_matches_blocking() {
        let events = vec![
            GenerationEvent::item_added("A"),
            GenerationEvent::other("status"),
            GenerationEvent::item_delta("B"),
        ];
        let blocking = aggregate(ok_events(events.clone()));
        let streamed = tokio_test::block_on(aggregate_stream(futures::stream::iter(
            ok_events(events),
        )));
        assert_eq!(blocking, streamed);
    }

    #[tokio::test]
    async fn runs_on_blocking_worker_while_primary_polls() {
        let (preview, rx) = WatchPreview::channel();
        let events = (0..40).map(|_| Ok(GenerationEvent::item_delta("ab")));
        let agg = StreamAggregator::new().with_preview(Arc::new(preview), 20);

        let handle = tokio::task::spawn_blocking(move || agg.run(events));
        let report = handle.await.expect("worker panicked");

        assert_eq!(report.len(), 80);
        let snap = rx.borrow().clone();
        assert!(snap.done);
        assert_eq!(snap.fragments, 40);
    }

    #[tokio::test]
    async fn boxed_event_stream() {
        let s: EventStream = Box::pin(tokio_stream::iter(vec![
            Ok(GenerationEvent::item_added("x")),
            Err(StreamError::unexpected("socket closed")),
        ]));
        let out = aggregate_stream(s).await;
        assert!(out.starts_with(UNEXPECTED_ERROR_PREFIX));
    }

    #[test]
    fn panicking_source_becomes_unexpected_error() {
        let recorder = Arc::new(Recorder::default());
        let events = (0..3).map(|i| {
            if i == 2 {
                panic!("transport went away");
            }
            Ok::<_, StreamError>(GenerationEvent::item_delta("x"))
        });
        let out = StreamAggregator::new()
            .with_preview(recorder.clone(), 20)
            .run(events);
        assert!(out.starts_with(UNEXPECTED_ERROR_PREFIX));
        assert!(out.contains("transport went away"));
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn panicking_stream_becomes_unexpected_error() {
        let events = futures::stream::iter(0..3).map(|i| {
            if i == 1 {
                panic!("decoder bug {i}");
            }
            Ok::<_, StreamError>(GenerationEvent::item_delta("x"))
        });
        let out = aggregate_stream(events).await;
        assert!(out.starts_with(UNEXPECTED_ERROR_PREFIX));
        assert!(out.contains("decoder bug 1"));
    }
}
