use crate::entry::Entry;
use crate::error::{HookError, InitError};
use crate::side_channel::SideChannel;
use crate::sink::SinkError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};

tokio::task_local! {
    /// Name of the sink whose worker is running the current task.
    static DELIVERING: &'static str;
}

/// True while running inside a sink worker.
///
/// Anything logged from there (transport internals included) must not be
/// fed back into the sinks.
pub(crate) fn in_sink_worker() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

/// Work performed by a sink worker for every queued entry.
#[async_trait]
pub(crate) trait Deliver: Send + Sync {
    async fn deliver(&self, entry: &Entry) -> Result<(), SinkError>;
}

/// Counters kept by every queued sink.
#[derive(Debug, Default)]
struct QueueStats {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of a sink's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Accepted into the queue.
    pub enqueued: u64,
    /// Handed to the transport successfully.
    pub delivered: u64,
    /// Transport errors and timeouts.
    pub failed: u64,
    /// Rejected because the queue was full or closed.
    pub dropped: u64,
}

/// Worker settings shared by all queued sinks of one dispatcher.
#[derive(Clone, Debug)]
pub(crate) struct QueueOptions {
    pub capacity: usize,
    pub timeout: Duration,
    pub side_channel: SideChannel,
}

/// Bounded queue feeding a dedicated worker task.
///
/// `enqueue` never blocks: when the queue is full the newest entry is
/// dropped and counted. The worker delivers entries one at a time, holding
/// `gate` (if any) for the duration of each delivery.
pub(crate) struct SinkQueue {
    name: &'static str,
    sender: mpsc::Sender<Arc<Entry>>,
    stats: Arc<QueueStats>,
    handle: JoinHandle<()>,
}

impl SinkQueue {
    pub(crate) fn spawn(
        name: &'static str,
        deliver: Arc<dyn Deliver>,
        gate: Option<Arc<Mutex<()>>>,
        options: &QueueOptions,
    ) -> Result<Self, InitError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| InitError::NoRuntime)?;

        let (tx, mut rx) = mpsc::channel::<Arc<Entry>>(options.capacity);
        let stats = Arc::new(QueueStats::default());

        let stats_bg = Arc::clone(&stats);
        let side_channel = options.side_channel.clone();
        let limit = options.timeout;

        let worker = async move {
            while let Some(entry) = rx.recv().await {
                let _guard = match &gate {
                    Some(gate) => Some(gate.lock().await),
                    None => None,
                };

                match timeout(limit, deliver.deliver(&entry)).await {
                    Ok(Ok(())) => {
                        stats_bg.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Err(e)) => {
                        stats_bg.failed.fetch_add(1, Ordering::Relaxed);
                        side_channel.report(name, &*e);
                    }
                    Err(_) => {
                        stats_bg.failed.fetch_add(1, Ordering::Relaxed);
                        side_channel.report(name, &HookError::Timeout { sink: name, after: limit });
                    }
                }
            }
            tracing::debug!(target: "tracing_fanout", sink = name, "sink worker stopped");
        };
        let handle = runtime.spawn(DELIVERING.scope(name, worker));

        Ok(SinkQueue {
            name,
            sender: tx,
            stats,
            handle,
        })
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn enqueue(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        match self.sender.try_send(Arc::clone(entry)) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(HookError::QueueFull { sink: self.name })
            }
            Err(TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(HookError::QueueClosed { sink: self.name })
            }
        }
    }

    pub(crate) fn stats(&self) -> SinkStats {
        SinkStats {
            enqueued: self.stats.enqueued.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }

    /// Wait until every accepted entry has been delivered or has failed.
    ///
    /// Returns `false` if work was still pending after `wait`.
    pub(crate) async fn flush(&self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        loop {
            let stats = self.stats();
            if stats.delivered + stats.failed >= stats.enqueued {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// Close the queue and wait for the worker to drain it.
    pub(crate) async fn shutdown(self) {
        let SinkQueue { name, sender, handle, .. } = self;
        drop(sender);
        if let Err(e) = handle.await {
            eprintln!("{} worker ended abnormally: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Deliver for Counting {
        async fn deliver(&self, _entry: &Entry) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("transport down".into())
            } else {
                Ok(())
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl Deliver for Stalled {
        async fn deliver(&self, _entry: &Entry) -> Result<(), SinkError> {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn options(capacity: usize) -> QueueOptions {
        QueueOptions {
            capacity,
            timeout: Duration::from_millis(50),
            side_channel: SideChannel::silent(),
        }
    }

    fn entry() -> Arc<Entry> {
        Arc::new(Entry::new(Level::Info, "queued"))
    }

    #[tokio::test]
    async fn delivers_and_counts() {
        let deliver = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        let queue = SinkQueue::spawn("test", deliver.clone(), None, &options(16)).unwrap();

        for _ in 0..3 {
            queue.enqueue(&entry()).unwrap();
        }
        assert!(queue.flush(Duration::from_secs(1)).await);
        assert_eq!(deliver.calls.load(Ordering::SeqCst), 3);
        assert_eq!(queue.stats(), SinkStats { enqueued: 3, delivered: 3, failed: 0, dropped: 0 });
    }

    #[tokio::test]
    async fn failures_are_reported_not_returned() {
        let reports = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&reports);
        let mut opts = options(16);
        opts.side_channel = SideChannel::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let deliver = Arc::new(Counting { calls: AtomicUsize::new(0), fail: true });
        let queue = SinkQueue::spawn("test", deliver, None, &opts).unwrap();
        queue.enqueue(&entry()).unwrap();

        assert!(queue.flush(Duration::from_secs(1)).await);
        assert_eq!(queue.stats().failed, 1);
        assert_eq!(reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_newest() {
        let queue = SinkQueue::spawn("test", Arc::new(Stalled), None, &options(1)).unwrap();

        let mut dropped = 0;
        for _ in 0..10 {
            if let Err(HookError::QueueFull { sink }) = queue.enqueue(&entry()) {
                assert_eq!(sink, "test");
                dropped += 1;
            }
        }
        assert!(dropped >= 8);
        assert_eq!(queue.stats().dropped, dropped);
    }

    #[tokio::test]
    async fn slow_delivery_times_out() {
        let queue = SinkQueue::spawn("test", Arc::new(Stalled), None, &options(4)).unwrap();
        queue.enqueue(&entry()).unwrap();
        assert!(queue.flush(Duration::from_secs(2)).await);
        assert_eq!(queue.stats().failed, 1);
    }

    #[test]
    fn spawn_without_runtime_fails() {
        let result = SinkQueue::spawn("test", Arc::new(Stalled), None, &options(4));
        assert!(matches!(result, Err(InitError::NoRuntime)));
    }

    #[tokio::test]
    async fn shutdown_drains_queue() {
        let deliver = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        let queue = SinkQueue::spawn("test", deliver.clone(), None, &options(16)).unwrap();
        queue.enqueue(&entry()).unwrap();
        queue.enqueue(&entry()).unwrap();
        queue.shutdown().await;
        assert_eq!(deliver.calls.load(Ordering::SeqCst), 2);
    }

    struct ScopeCheck(AtomicUsize);

    #[async_trait]
    impl Deliver for ScopeCheck {
        async fn deliver(&self, _entry: &Entry) -> Result<(), SinkError> {
            if in_sink_worker() {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn deliveries_run_inside_worker_scope() {
        let deliver = Arc::new(ScopeCheck(AtomicUsize::new(0)));
        let queue = SinkQueue::spawn("test", deliver.clone(), None, &options(16)).unwrap();
        queue.enqueue(&entry()).unwrap();
        assert!(queue.flush(Duration::from_secs(1)).await);

        assert_eq!(deliver.0.load(Ordering::SeqCst), 1);
        assert!(!in_sink_worker());
    }
}
