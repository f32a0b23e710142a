//! Live-preview observer for report aggregation, plus elapsed-time progress.
//!
//! Inject an [`Arc<dyn PreviewObserver>`] via
//! [`crate::stream::StreamAggregator::with_preview`] to receive the partial
//! report every N fragments while a long research stream is consumed.
//!
//! # Callbacks and channels
//!
//! Callers can forward previews to a terminal, a WebSocket, or a channel
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because aggregation usually runs on a worker thread
//! (`spawn_blocking`) while the primary thread stays responsive.
//!
//! [`WatchPreview`] is the ready-made channel variant: it publishes into a
//! `tokio::sync::watch` channel, so the primary thread only ever reads the
//! latest value and never has to pump anything.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{aggregate, GenerationEvent, StreamAggregator, WatchPreview};
//! use std::sync::Arc;
//!
//! let (preview, rx) = WatchPreview::channel();
//! let aggregator = StreamAggregator::new().with_preview(Arc::new(preview), 2);
//! let events = ["a", "b", "c"].map(|t| Ok(GenerationEvent::item_delta(t)));
//! let report = aggregator.run(events);
//! assert_eq!(report, "abc");
//! assert_eq!(rx.borrow().text, "ab");
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Receives periodic snapshots of the report being aggregated.
///
/// Implementations must be `Send + Sync` and must not block: the call
/// happens inline in the consumption loop. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait PreviewObserver: Send + Sync {
    /// Called every N fragments with the concatenation so far.
    ///
    /// # Arguments
    /// * `partial`  : report text accumulated so far
    /// * `fragments`: number of fragments accumulated so far
    fn on_preview(&self, partial: &str, fragments: usize) {
        let _ = (partial, fragments);
    }

    /// Called once when the stream ends without failure.
    ///
    /// # Arguments
    /// * `text_len` : byte length of the final report
    /// * `fragments`: total fragments accumulated
    fn on_complete(&self, text_len: usize, fragments: usize) {
        let _ = (text_len, fragments);
    }

    /// Called once when the stream ends with a failure.
    ///
    /// # Arguments
    /// * `error`: the labelled error text the aggregator returns
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need previews.
pub struct NoopPreview;

impl PreviewObserver for NoopPreview {}

/// Convenience alias matching the type stored in the aggregator.
pub type PreviewCallback = Arc<dyn PreviewObserver>;

/// Latest state published by [`WatchPreview`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSnapshot {
    /// Partial (or final) report text.
    pub text: String,
    /// Fragments accumulated when the snapshot was taken.
    pub fragments: usize,
    /// True once the stream has ended, successfully or not.
    pub done: bool,
}

/// Publishes previews into a `tokio::sync::watch` channel.
pub struct WatchPreview {
    tx: watch::Sender<PreviewSnapshot>,
}

impl WatchPreview {
    /// Create the observer and the receiver a primary thread polls.
    pub fn channel() -> (Self, watch::Receiver<PreviewSnapshot>) {
        let (tx, rx) = watch::channel(PreviewSnapshot::default());
        (Self { tx }, rx)
    }
}

impl PreviewObserver for WatchPreview {
    fn on_preview(&self, partial: &str, fragments: usize) {
        // send_replace never fails, even with every receiver dropped.
        self.tx.send_replace(PreviewSnapshot {
            text: partial.to_string(),
            fragments,
            done: false,
        });
    }

    fn on_complete(&self, _text_len: usize, fragments: usize) {
        self.tx.send_modify(|s| {
            s.fragments = fragments;
            s.done = true;
        });
    }

    fn on_error(&self, _error: &str) {
        self.tx.send_modify(|s| s.done = true);
    }
}

// ── Elapsed-time progress ────────────────────────────────────────────────

/// Progress estimate for a call whose only observable signal is elapsed time.
///
/// Percent grows linearly with elapsed time against an expected budget and
/// stops at 95 % so the bar never claims completion before the call returns.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedProgress {
    budget: Duration,
}

impl ElapsedProgress {
    /// Largest percentage reported while the call is still running.
    pub const CAP_PERCENT: u8 = 95;

    pub fn new(budget: Duration) -> Self {
        Self {
            budget: if budget.is_zero() {
                Duration::from_secs(1)
            } else {
                budget
            },
        }
    }

    /// Estimated completion in percent, capped at [`Self::CAP_PERCENT`].
    pub fn percent(&self, elapsed: Duration) -> u8 {
        let pct = elapsed.as_secs_f64() / self.budget.as_secs_f64() * 100.0;
        pct.min(f64::from(Self::CAP_PERCENT)) as u8
    }

    /// Human-readable status, e.g. `Running (01:05 / 30:00)…`.
    pub fn label(&self, elapsed: Duration) -> String {
        format!(
            "Running ({} / {})…",
            mm_ss(elapsed),
            mm_ss(self.budget)
        )
    }
}

fn mm_ss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
