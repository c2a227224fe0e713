use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use shotbook_application::{AnalyticsSink, ApplicationError};
use shotbook_domain::EngagementEvent;
use tracing::{debug, warn};

/// Where the dispatcher worker sends each event.
pub trait AnalyticsTransport: Send + Sync {
    fn deliver(&self, event: &EngagementEvent) -> Result<(), ApplicationError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub queued: u64,
    pub sent: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            queued: self.queued.load(Ordering::SeqCst),
            sent: self.sent.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Queues engagement events onto a worker thread so recording never waits
/// on the network. Dropping the sink drains whatever is still queued.
pub struct BackgroundAnalyticsSink {
    sender: Option<mpsc::Sender<EngagementEvent>>,
    worker: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl BackgroundAnalyticsSink {
    pub fn new(transport: Arc<dyn AnalyticsTransport>) -> Result<Self, ApplicationError> {
        let (sender, receiver) = mpsc::channel::<EngagementEvent>();
        let counters = Arc::new(Counters::default());
        let worker = spawn_worker(receiver, transport, Arc::clone(&counters))?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            counters,
        })
    }

    /// Stops accepting events, waits for the queue to drain and returns the
    /// final counts.
    pub fn shutdown(mut self) -> DispatchStats {
        self.stop();
        self.counters.snapshot()
    }

    fn stop(&mut self) {
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("analytics worker panicked");
            }
            let stats = self.counters.snapshot();
            debug!(sent = stats.sent, failed = stats.failed, "analytics dispatcher stopped");
        }
    }
}

impl Drop for BackgroundAnalyticsSink {
    fn drop(&mut self) {
        self.stop();
    }
}

impl AnalyticsSink for BackgroundAnalyticsSink {
    fn record(&self, event: EngagementEvent) -> Result<(), ApplicationError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ApplicationError::Io("analytics dispatcher stopped".to_string()))?;
        sender.send(event).map_err(|error| {
            ApplicationError::Io(format!("failed to queue analytics event: {error}"))
        })?;
        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn spawn_worker(
    receiver: mpsc::Receiver<EngagementEvent>,
    transport: Arc<dyn AnalyticsTransport>,
    counters: Arc<Counters>,
) -> Result<JoinHandle<()>, ApplicationError> {
    thread::Builder::new()
        .name("shotbook-analytics".to_string())
        .spawn(move || {
            while let Ok(event) = receiver.recv() {
                match transport.deliver(&event) {
                    Ok(()) => {
                        counters.sent.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(error) => {
                        counters.failed.fetch_add(1, Ordering::SeqCst);
                        warn!(kind = ?event.kind, %error, "analytics event not delivered");
                    }
                }
            }
        })
        .map_err(|error| ApplicationError::Io(format!("failed to start analytics worker: {error}")))
}
