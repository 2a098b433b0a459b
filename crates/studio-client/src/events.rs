//! Pipeline event channel.
//!
//! The backend pushes pipeline progress as server-sent events on
//! `GET /api/events`. One subscription follows exactly one job: events
//! for other jobs and unparseable payloads are dropped, and the stream is
//! closed once the job finishes (`render:done` or a pipeline failure).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use studio_models::{JobId, PipelineEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::record_event_discarded;

/// Buffered events between the reader task and the consumer.
const EVENT_BUFFER: usize = 64;

/// Longest SSE line kept in memory. Longer lines drop their whole event.
const MAX_LINE_BYTES: usize = 64 * 1024;

// =============================================================================
// SSE framing
// =============================================================================

/// Incremental `text/event-stream` decoder.
///
/// Feed it body chunks as they arrive; it returns the `data` payload of
/// every event completed by the chunk. Chunks may split lines and UTF-8
/// sequences anywhere. A line longer than 64 KiB is not buffered; the
/// event it belongs to is dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
    /// The current line overflowed and is being skipped
    overflow: bool,
    /// The current event lost a line and must not be dispatched
    truncated: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                if std::mem::take(&mut self.overflow) {
                    continue;
                }
                let line = std::mem::take(&mut self.line);
                if let Some(payload) = self.process_line(&line) {
                    events.push(payload);
                }
            } else if self.overflow {
                continue;
            } else if self.line.len() >= MAX_LINE_BYTES {
                warn!(limit = MAX_LINE_BYTES, "SSE line too long, dropping event");
                self.line = Vec::new();
                self.data.clear();
                self.overflow = true;
                self.truncated = true;
            } else {
                self.line.push(byte);
            }
        }
        events
    }

    /// Flush an event left open when the body ended without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        self.overflow = false;
        let line = std::mem::take(&mut self.line);
        if !line.is_empty() {
            self.process_line(&line);
        }
        self.dispatch()
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<String> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return self.dispatch();
        }
        let line = String::from_utf8_lossy(raw);
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };
        // `event`, `id` and `retry` carry nothing the studio uses.
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if std::mem::take(&mut self.truncated) {
            self.data.clear();
            record_event_discarded("oversized");
            return None;
        }
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Cloneable handle that can close a subscription from anywhere.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    job_id: JobId,
    cancel: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Stop the subscription. Safe to call any number of times.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            debug!(job_id = %self.job_id, "Closing event subscription");
        }
        self.cancel.cancel();
    }

    /// True once closed explicitly or after the stream ended.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.finished.load(Ordering::Acquire)
    }
}

/// Event stream for one pipeline job.
#[derive(Debug)]
pub struct EventSubscription {
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<PipelineEvent>,
}

impl EventSubscription {
    /// A subscription fed through a channel.
    ///
    /// Dropping the sender ends the subscription. Used by the HTTP reader
    /// task and by in-memory backends.
    pub fn channel(job_id: JobId) -> (EventSender, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = SubscriptionHandle {
            job_id,
            cancel: CancellationToken::new(),
            finished: Arc::new(AtomicBool::new(false)),
        };
        let sender = EventSender {
            handle: handle.clone(),
            tx,
        };
        (sender, Self { handle, rx })
    }

    pub fn job_id(&self) -> &JobId {
        &self.handle.job_id
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Next event for the job, or `None` once the subscription is over.
    pub async fn next(&mut self) -> Option<PipelineEvent> {
        if self.handle.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.handle.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    pub fn close(&self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.handle.cancel.cancel();
    }
}

/// Producer side of an [`EventSubscription`].
#[derive(Debug)]
pub struct EventSender {
    handle: SubscriptionHandle,
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSender {
    pub fn job_id(&self) -> &JobId {
        &self.handle.job_id
    }

    pub fn is_closed(&self) -> bool {
        self.handle.cancel.is_cancelled()
    }

    /// Resolves when the consumer closes the subscription.
    pub async fn closed(&self) {
        self.handle.cancel.cancelled().await
    }

    /// Deliver an event. Returns false once the consumer is gone.
    pub async fn send(&self, event: PipelineEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx.send(event).await.is_ok()
    }
}

impl Drop for EventSender {
    fn drop(&mut self) {
        self.handle.finished.store(true, Ordering::Release);
    }
}

/// Read an SSE body and forward the active job's events.
///
/// Returns when the job finishes, the body ends or the subscription is
/// closed. The body is dropped on return, which closes the connection.
pub async fn pump_events<S, B, E>(body: S, sender: EventSender)
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    futures_util::pin_mut!(body);
    let job_id = sender.job_id().clone();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = sender.closed() => {
                debug!(job_id = %job_id, "Event subscription closed by consumer");
                return;
            }
            chunk = body.next() => chunk,
        };

        let payloads = match chunk {
            Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
            Some(Err(e)) => {
                warn!(job_id = %job_id, error = %e, "Event stream interrupted");
                return;
            }
            None => {
                debug!(job_id = %job_id, "Event stream ended");
                if let Some(payload) = decoder.finish() {
                    forward(&sender, &job_id, &payload).await;
                }
                return;
            }
        };

        for payload in payloads {
            match forward(&sender, &job_id, &payload).await {
                Forwarded::Continue => {}
                Forwarded::Finished => {
                    info!(job_id = %job_id, "Pipeline finished, closing event stream");
                    return;
                }
                Forwarded::ConsumerGone => return,
            }
        }
    }
}

enum Forwarded {
    Continue,
    Finished,
    ConsumerGone,
}

async fn forward(sender: &EventSender, job_id: &JobId, payload: &str) -> Forwarded {
    let event = match PipelineEvent::parse(payload) {
        Ok(event) => event,
        Err(e) => {
            debug!(job_id = %job_id, error = %e, "Dropping malformed pipeline event");
            record_event_discarded("malformed");
            return Forwarded::Continue;
        }
    };

    if &event.job_id != job_id {
        debug!(
            job_id = %job_id,
            event_job_id = %event.job_id,
            "Dropping event for another job"
        );
        record_event_discarded("stale");
        return Forwarded::Continue;
    }

    let finished = event.is_job_completion() || event.is_pipeline_failure();
    if !sender.send(event).await {
        return Forwarded::ConsumerGone;
    }
    if finished {
        Forwarded::Finished
    } else {
        Forwarded::Continue
    }
}
