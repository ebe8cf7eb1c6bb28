//! Deferred form submissions replayed on background sync.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use sw_core::{FetchRequest, StatusCode};
use sw_fetch::{Fetcher, RetryPolicy};

/// A submission queued while offline.
#[derive(Debug, Clone)]
pub struct DeferredSubmission {
    pub id: u64,
    /// Sync tag the submission waits on, e.g. `booking-inquiry`.
    pub tag: String,
    pub request: FetchRequest,
    /// Failed replays so far.
    pub attempts: u32,
}

/// Failed replays after which a submission is dropped.
pub const DEFAULT_MAX_SYNC_ATTEMPTS: u32 = 5;

/// Queue of deferred submissions, in enqueue order.
#[derive(Debug)]
pub struct SyncOutbox {
    next_id: AtomicU64,
    queue: Mutex<VecDeque<DeferredSubmission>>,
    max_attempts: u32,
}

impl Default for SyncOutbox {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            queue: Mutex::new(VecDeque::new()),
            max_attempts: DEFAULT_MAX_SYNC_ATTEMPTS,
        }
    }
}

impl SyncOutbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a submission once it has failed this many replays.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DeferredSubmission>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a request under a sync tag. Returns the submission id.
    pub fn enqueue(&self, tag: impl Into<String>, request: FetchRequest) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tag = tag.into();
        tracing::debug!(id, tag = %tag, url = %request.url, "submission deferred");
        self.lock().push_back(DeferredSubmission {
            id,
            tag,
            request,
            attempts: 0,
        });
        id
    }

    /// Remove and return every submission for a tag.
    pub fn take(&self, tag: &str) -> Vec<DeferredSubmission> {
        let mut queue = self.lock();
        let (taken, kept): (Vec<_>, Vec<_>) = queue.drain(..).partition(|s| s.tag == tag);
        queue.extend(kept);
        taken
    }

    /// Put submissions back at the front of the queue, keeping their order.
    pub fn requeue(&self, submissions: Vec<DeferredSubmission>) {
        let mut queue = self.lock();
        for submission in submissions.into_iter().rev() {
            queue.push_front(submission);
        }
    }

    /// Number of queued submissions for a tag.
    pub fn pending(&self, tag: &str) -> usize {
        self.lock().iter().filter(|s| s.tag == tag).count()
    }

    /// Total queued submissions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the outbox is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Result of replaying one tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub delivered: usize,
    /// Put back for the next sync.
    pub failed: usize,
    /// Given up on: rejected by the origin or out of attempts.
    pub dropped: usize,
}

/// Whether a status means the origin will never accept the submission.
fn is_permanent_rejection(status: StatusCode) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
}

/// Replay every submission queued under `tag`.
///
/// A submission is delivered when its replay returns an ok response and
/// dropped when the origin rejects it with a 4xx other than 408 or 429.
/// Any other failure counts as an attempt; the submission goes back in
/// the outbox until it reaches the outbox's attempt limit.
pub async fn replay<F>(
    outbox: &SyncOutbox,
    tag: &str,
    fetcher: &F,
    retry: &RetryPolicy,
) -> SyncReport
where
    F: Fetcher + ?Sized,
{
    let submissions = outbox.take(tag);
    if submissions.is_empty() {
        tracing::info!(tag, "sync fired with nothing queued");
        return SyncReport::default();
    }

    let mut delivered = 0;
    let mut dropped = 0;
    let mut failed = Vec::new();
    for mut submission in submissions {
        match retry.fetch(fetcher, &submission.request).await {
            Ok(response) if response.is_ok() => {
                tracing::info!(tag, id = submission.id, "deferred submission delivered");
                delivered += 1;
                continue;
            }
            Ok(response) if is_permanent_rejection(response.status) => {
                tracing::warn!(tag, id = submission.id, status = %response.status, "deferred submission rejected, dropping");
                dropped += 1;
                continue;
            }
            Ok(response) => {
                tracing::warn!(tag, id = submission.id, status = %response.status, "deferred submission failed");
            }
            Err(e) => {
                tracing::warn!(tag, id = submission.id, error = %e, "deferred submission failed");
            }
        }

        submission.attempts += 1;
        if submission.attempts >= outbox.max_attempts() {
            tracing::warn!(tag, id = submission.id, attempts = submission.attempts, "deferred submission out of attempts, dropping");
            dropped += 1;
        } else {
            failed.push(submission);
        }
    }

    let report = SyncReport {
        delivered,
        failed: failed.len(),
        dropped,
    };
    outbox.requeue(failed);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use sw_core::{Method, ResponseSnapshot, Url};
    use sw_fetch::FetchError;

    /// Answers every submission with the same status.
    struct Relay {
        status: StatusCode,
        calls: AtomicUsize,
    }

    impl Relay {
        fn new(status: StatusCode) -> Self {
            Self {
                status,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for Relay {
        async fn fetch(&self, _request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResponseSnapshot::new(self.status, "relay"))
        }
    }

    fn post(path: &str) -> FetchRequest {
        let url = Url::parse("https://api.emailjs.com/").unwrap().join(path).unwrap();
        FetchRequest::new(Method::POST, url).with_body("{}")
    }

    #[test]
    fn test_take_only_matching_tag() {
        let outbox = SyncOutbox::new();
        outbox.enqueue("booking-inquiry", post("/a"));
        outbox.enqueue("contact-form", post("/b"));
        outbox.enqueue("booking-inquiry", post("/c"));

        let taken = outbox.take("booking-inquiry");
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].request.url.path(), "/a");
        assert_eq!(taken[1].request.url.path(), "/c");
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.pending("contact-form"), 1);
    }

    #[test]
    fn test_requeue_preserves_order() {
        let outbox = SyncOutbox::new();
        outbox.enqueue("contact-form", post("/a"));
        outbox.enqueue("contact-form", post("/b"));
        let taken = outbox.take("contact-form");
        outbox.enqueue("contact-form", post("/c"));
        outbox.requeue(taken);

        let order: Vec<_> = outbox
            .take("contact-form")
            .into_iter()
            .map(|s| s.request.url.path().to_string())
            .collect();
        assert_eq!(order, ["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_client_error_drops_submission() {
        let outbox = SyncOutbox::new();
        outbox.enqueue("booking-inquiry", post("/api/v1.0/email/send"));
        let relay = Relay::new(StatusCode::BAD_REQUEST);

        let report = replay(&outbox, "booking-inquiry", &relay, &RetryPolicy::none()).await;
        assert_eq!(
            report,
            SyncReport {
                delivered: 0,
                failed: 0,
                dropped: 1,
            }
        );
        assert!(outbox.is_empty());

        let report = replay(&outbox, "booking-inquiry", &relay, &RetryPolicy::none()).await;
        assert_eq!(report, SyncReport::default());
        assert_eq!(relay.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_submission_is_kept() {
        let outbox = SyncOutbox::new();
        outbox.enqueue("contact-form", post("/send"));
        let relay = Relay::new(StatusCode::TOO_MANY_REQUESTS);

        let report = replay(&outbox, "contact-form", &relay, &RetryPolicy::none()).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.dropped, 0);
        assert_eq!(outbox.pending("contact-form"), 1);
    }

    #[tokio::test]
    async fn test_submission_dropped_after_max_attempts() {
        let outbox = SyncOutbox::new().with_max_attempts(3);
        outbox.enqueue("booking-inquiry", post("/send"));
        let relay = Relay::new(StatusCode::SERVICE_UNAVAILABLE);

        for attempt in 1..3 {
            let report = replay(&outbox, "booking-inquiry", &relay, &RetryPolicy::none()).await;
            assert_eq!(report.failed, 1);
            let pending = outbox.take("booking-inquiry");
            assert_eq!(pending[0].attempts, attempt);
            outbox.requeue(pending);
        }

        let report = replay(&outbox, "booking-inquiry", &relay, &RetryPolicy::none()).await;
        assert_eq!(report.failed, 0);
        assert_eq!(report.dropped, 1);
        assert!(outbox.is_empty());
        assert_eq!(relay.calls(), 3);
    }
}
