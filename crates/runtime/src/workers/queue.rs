//! Serial request queue.
//!
//! Every API call goes through a single [`QueueWorker`]. The worker takes one
//! request at a time, runs it to completion (transport call plus the
//! request's completion) and only then looks at the next one. Requests are
//! therefore executed in submission order with at most one in flight, and
//! state written by a completion is visible to every later request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use behave_core::ApiRequest;
use behave_transport::TransportError;

use super::QueueMetrics;
use crate::api::{Result, SdkError};

pub type CompletionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Executes a dequeued request against the outside world.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn execute(&self, request: ApiRequest) -> std::result::Result<Value, TransportError>;
}

/// Continuation invoked with the raw outcome of a request.
///
/// The worker awaits the returned future before dequeuing the next request.
pub trait Completion: Send + 'static {
    fn complete(
        self: Box<Self>,
        result: std::result::Result<Value, TransportError>,
    ) -> CompletionFuture;
}

impl Completion for oneshot::Sender<std::result::Result<Value, TransportError>> {
    fn complete(
        self: Box<Self>,
        result: std::result::Result<Value, TransportError>,
    ) -> CompletionFuture {
        Box::pin(async move {
            if (*self).send(result).is_err() {
                debug!(target: "behave::queue", "Request reply channel closed (caller dropped)");
            }
        })
    }
}

/// Messages accepted by the worker.
pub enum Command {
    Request {
        request: ApiRequest,
        completion: Option<Box<dyn Completion>>,
    },
    /// Stop after every request queued before this one has completed.
    Shutdown,
}

/// Cloneable producer side of the queue.
#[derive(Clone)]
pub struct RequestQueue {
    command_tx: mpsc::Sender<Command>,
    metrics: Arc<QueueMetrics>,
}

impl RequestQueue {
    /// Creates a queue and the worker that drains it.
    pub fn new<H: RequestHandler>(handler: H, buffer_size: usize) -> (Self, QueueWorker<H>) {
        let (command_tx, command_rx) = mpsc::channel(buffer_size.max(1));
        let metrics = Arc::new(QueueMetrics::new());

        let queue = Self {
            command_tx,
            metrics: Arc::clone(&metrics),
        };
        let worker = QueueWorker {
            handler,
            command_rx,
            metrics,
        };
        (queue, worker)
    }

    /// Appends a request. `completion` runs once the request has finished.
    pub async fn push(
        &self,
        request: ApiRequest,
        completion: Option<Box<dyn Completion>>,
    ) -> Result<()> {
        self.metrics.record_enqueued();
        if self
            .command_tx
            .send(Command::Request {
                request,
                completion,
            })
            .await
            .is_err()
        {
            self.metrics.record_dequeued();
            return Err(SdkError::QueueClosed);
        }
        Ok(())
    }

    /// Appends a request and waits for its raw outcome.
    pub async fn request(
        &self,
        request: ApiRequest,
    ) -> Result<std::result::Result<Value, TransportError>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.push(request, Some(Box::new(reply_tx))).await?;
        self.reply(reply_rx).await
    }

    /// Waits for a completion's reply.
    ///
    /// A reply lost because the worker shut down before reaching the request
    /// is reported as [`SdkError::QueueClosed`].
    pub(crate) async fn reply<T>(&self, reply_rx: oneshot::Receiver<T>) -> Result<T> {
        match reply_rx.await {
            Ok(value) => Ok(value),
            Err(_) if self.command_tx.is_closed() => Err(SdkError::QueueClosed),
            Err(e) => Err(SdkError::ReplyDropped(e)),
        }
    }

    /// Asks the worker to stop once the requests already queued are done.
    pub async fn close(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| SdkError::QueueClosed)
    }

    pub fn metrics(&self) -> &Arc<QueueMetrics> {
        &self.metrics
    }
}

/// Background task that executes queued requests one at a time.
pub struct QueueWorker<H> {
    handler: H,
    command_rx: mpsc::Receiver<Command>,
    metrics: Arc<QueueMetrics>,
}

impl<H: RequestHandler> QueueWorker<H> {
    /// Main worker loop.
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                Command::Request {
                    request,
                    completion,
                } => self.handle_request(request, completion).await,
                Command::Shutdown => {
                    debug!(target: "behave::queue", "Request queue shutting down");
                    break;
                }
            }
        }
        self.command_rx.close();

        // Requests that raced in behind the shutdown are never executed;
        // dropping their completions tells waiting callers the queue closed.
        let mut discarded = 0usize;
        while let Ok(command) = self.command_rx.try_recv() {
            if let Command::Request { .. } = command {
                self.metrics.record_dequeued();
                discarded += 1;
            }
        }
        if discarded > 0 {
            debug!(target: "behave::queue", "Discarded {} request(s) queued after shutdown", discarded);
        }
    }

    async fn handle_request(
        &mut self,
        request: ApiRequest,
        completion: Option<Box<dyn Completion>>,
    ) {
        self.metrics.record_dequeued();

        let label = format!("{} {}", request.method, request.path);
        debug!(target: "behave::queue", "Executing {}", label);

        let started = Instant::now();
        let result = self.handler.execute(request).await;
        match &result {
            Ok(_) => self.metrics.record_success(started.elapsed()),
            Err(error) => {
                self.metrics.record_failure();
                warn!(target: "behave::queue", "{} failed: {}", label, error);
            }
        }

        if let Some(completion) = completion {
            completion.complete(result).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RequestHandler for Recorder {
        async fn execute(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<Value, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let path = format!("{:?}", request.path);
            self.log.lock().unwrap().push(path.clone());
            if path.contains("fail") {
                Err(TransportError::Network("boom".into()))
            } else {
                Ok(json!({ "data": path }))
            }
        }
    }

    struct Marker {
        log: Arc<Mutex<Vec<String>>>,
        tag: &'static str,
    }

    impl Completion for Marker {
        fn complete(
            self: Box<Self>,
            result: std::result::Result<Value, TransportError>,
        ) -> CompletionFuture {
            Box::pin(async move {
                // Yield so a concurrent request would have a chance to start
                tokio::time::sleep(Duration::from_millis(5)).await;
                let outcome = if result.is_ok() { "ok" } else { "err" };
                self.log.lock().unwrap().push(format!("{}:{}", self.tag, outcome));
            })
        }
    }

    fn spawn(recorder: &Recorder) -> (RequestQueue, tokio::task::JoinHandle<()>) {
        let (queue, worker) = RequestQueue::new(recorder.clone(), 16);
        (queue, tokio::spawn(worker.run()))
    }

    #[tokio::test]
    async fn requests_run_in_order_one_at_a_time() {
        let recorder = Recorder::default();
        let (queue, worker) = spawn(&recorder);

        for tag in ["a", "b", "c"] {
            queue
                .push(
                    ApiRequest::get(format!("/{tag}")),
                    Some(Box::new(Marker {
                        log: Arc::clone(&recorder.log),
                        tag,
                    })),
                )
                .await
                .unwrap();
        }
        queue.close().await.unwrap();
        worker.await.unwrap();

        let log = recorder.log.lock().unwrap().clone();
        assert_eq!(log.len(), 6);
        assert!(log[0].contains("/a"));
        assert_eq!(log[1], "a:ok");
        assert!(log[2].contains("/b"));
        assert_eq!(log[3], "b:ok");
        assert!(log[4].contains("/c"));
        assert_eq!(log[5], "c:ok");
        assert_eq!(recorder.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_failed_request_does_not_stall_the_queue() {
        let recorder = Recorder::default();
        let (queue, worker) = spawn(&recorder);

        let failed = queue.request(ApiRequest::get("/fail")).await.unwrap();
        assert!(matches!(failed, Err(TransportError::Network(_))));

        let next = queue.request(ApiRequest::get("/next")).await.unwrap();
        assert!(next.is_ok());

        let snapshot = queue.metrics().snapshot();
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.queue_depth, 0);

        queue.close().await.unwrap();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn requests_queued_behind_shutdown_report_closed_queue() {
        let recorder = Recorder::default();
        let (queue, worker) = RequestQueue::new(recorder.clone(), 16);

        queue.close().await.unwrap();
        let late = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.request(ApiRequest::get("/late")).await })
        };
        while queue.metrics().snapshot().queue_depth == 0 {
            tokio::task::yield_now().await;
        }

        worker.run().await;

        let error = late.await.unwrap().unwrap_err();
        assert!(matches!(error, SdkError::QueueClosed));
        assert!(recorder.log.lock().unwrap().is_empty());
        assert_eq!(queue.metrics().snapshot().queue_depth, 0);
    }

    #[tokio::test]
    async fn push_after_shutdown_reports_closed_queue() {
        let recorder = Recorder::default();
        let (queue, worker) = spawn(&recorder);

        queue.close().await.unwrap();
        worker.await.unwrap();

        let error = queue.push(ApiRequest::get("/late"), None).await.unwrap_err();
        assert!(matches!(error, SdkError::QueueClosed));
    }
}
