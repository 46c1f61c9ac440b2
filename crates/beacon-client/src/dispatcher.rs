//! Fire-and-forget dispatch of tracking calls.
//!
//! Callers hand records to a [`Tracker`] and proceed immediately; a bounded
//! queue consumed by a fixed pool of delivery workers performs the actual
//! collector calls. The bounded queue makes back-pressure explicit: when it
//! is full, the record is dropped with a warning rather than blocking the
//! caller's request path. Shutdown drains queued jobs and waits for
//! in-flight deliveries within a timeout.

use std::sync::Arc;

use serde_json::Value;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{DeliveryEngine, ServiceErrorReport};

/// Default bounded queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default number of delivery workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Configuration for the dispatch layer.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Capacity of the bounded job queue.
    pub queue_capacity: usize,
    /// Number of delivery workers consuming the queue.
    pub worker_count: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY, worker_count: DEFAULT_WORKER_COUNT }
    }
}

/// One queued tracking call.
#[derive(Debug)]
enum TrackJob {
    Event {
        event_type: String,
        user_id: Option<i64>,
        session_id: Option<String>,
        metadata: Option<Value>,
        category: String,
    },
    ServiceError(ServiceErrorReport),
}

struct TrackerInner {
    sender: mpsc::Sender<TrackJob>,
    engine: Arc<DeliveryEngine>,
    cancellation_token: CancellationToken,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Caller-facing handle for fire-and-forget tracking.
///
/// Cheap to clone; all clones share the queue, the worker pool and the
/// engine's health flag.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    /// Creates a tracker and spawns its delivery workers.
    pub fn new(engine: Arc<DeliveryEngine>, config: TrackerConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let cancellation_token = CancellationToken::new();

        let worker_count = config.worker_count.max(1);
        let mut worker_handles = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let receiver = receiver.clone();
            let engine = engine.clone();
            let token = cancellation_token.clone();

            worker_handles.push(tokio::spawn(async move {
                debug!(worker_id, "delivery worker starting");
                run_worker(&receiver, &engine, &token).await;
                debug!(worker_id, "delivery worker stopped");
            }));
        }

        Self {
            inner: Arc::new(TrackerInner {
                sender,
                engine,
                cancellation_token,
                worker_handles: Mutex::new(worker_handles),
            }),
        }
    }

    /// The engine behind this tracker, for callers that want to await an
    /// outcome directly instead of dispatching.
    pub fn engine(&self) -> Arc<DeliveryEngine> {
        self.inner.engine.clone()
    }

    /// Enqueues a user event without waiting for delivery.
    ///
    /// Returns whether the job was accepted; a full or closed queue drops
    /// the record.
    pub fn dispatch_event(
        &self,
        event_type: &str,
        user_id: Option<i64>,
        session_id: Option<String>,
        metadata: Option<Value>,
        category: &str,
    ) -> bool {
        self.enqueue(TrackJob::Event {
            event_type: event_type.to_string(),
            user_id,
            session_id,
            metadata,
            category: category.to_string(),
        })
    }

    /// Enqueues a service error without waiting for delivery.
    pub fn dispatch_service_error(&self, report: ServiceErrorReport) -> bool {
        self.enqueue(TrackJob::ServiceError(report))
    }

    /// Runs a fallible operation with best-effort error tracking.
    ///
    /// On `Err`, a service-error record is dispatched and the original error
    /// is returned unchanged — tracking never suppresses or alters the
    /// caller's failure.
    pub async fn observe<T, E, F>(&self, operation: &str, fut: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: std::future::Future<Output = Result<T, E>>,
    {
        match fut.await {
            Ok(value) => Ok(value),
            Err(error) => {
                self.dispatch_service_error(ServiceErrorReport {
                    error_type: std::any::type_name::<E>().to_string(),
                    error_message: error.to_string(),
                    metadata: Some(serde_json::json!({ "function": operation })),
                    ..Default::default()
                });
                Err(error)
            },
        }
    }

    /// Stops accepting new work and drains in-flight deliveries.
    ///
    /// Queued jobs are still processed; the wait is bounded by `timeout`.
    pub async fn shutdown(&self, timeout: std::time::Duration) {
        info!("shutting down tracker");
        self.inner.cancellation_token.cancel();

        let mut handles = self.inner.worker_handles.lock().await;
        let join_all = async {
            for handle in handles.drain(..) {
                if let Err(join_error) = handle.await {
                    error!(error = %join_error, "delivery worker panicked during shutdown");
                }
            }
        };

        if tokio::time::timeout(timeout, join_all).await.is_err() {
            warn!(
                timeout_seconds = timeout.as_secs(),
                "tracker shutdown timed out, some deliveries may be lost"
            );
        }
    }

    fn enqueue(&self, job: TrackJob) -> bool {
        match self.inner.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("tracking queue full, dropping record");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("tracker is shut down, dropping record");
                false
            },
        }
    }
}

/// Worker loop: claim a job, deliver it, repeat. After cancellation the
/// queue is drained without waiting so shutdown loses nothing already
/// accepted.
async fn run_worker(
    receiver: &Mutex<mpsc::Receiver<TrackJob>>,
    engine: &DeliveryEngine,
    token: &CancellationToken,
) {
    loop {
        let job = {
            let mut rx = receiver.lock().await;
            if token.is_cancelled() {
                match rx.try_recv() {
                    Ok(job) => Some(job),
                    Err(_) => None,
                }
            } else {
                tokio::select! {
                    job = rx.recv() => job,
                    () = token.cancelled() => match rx.try_recv() {
                        Ok(job) => Some(job),
                        Err(_) => None,
                    },
                }
            }
        };

        let Some(job) = job else { break };

        match job {
            TrackJob::Event { event_type, user_id, session_id, metadata, category } => {
                let outcome = engine
                    .track_event(&event_type, user_id, session_id, metadata, &category)
                    .await;
                debug!(event_type = %event_type, outcome = ?outcome, "event delivery finished");
            },
            TrackJob::ServiceError(report) => {
                let error_type = report.error_type.clone();
                let outcome = engine.track_service_error(report).await;
                debug!(error_type = %error_type, outcome = ?outcome, "error delivery finished");
            },
        }
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            // Workers hold no Tracker clone, so dropping the last handle must
            // still release them.
            self.cancellation_token.cancel();
        }
    }
}
