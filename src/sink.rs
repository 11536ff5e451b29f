use crate::entry::Entry;
use crate::error::{HookError, InitError};
use crate::formatter::Format;
use crate::level::Level;
use crate::message::{resolve_message, FormatMessageArgs, FormatMessageFn};
use crate::notifier::{Notifier, NotifierKind};
use crate::queue::{Deliver, QueueOptions, SinkQueue, SinkStats};
use crate::store::{DocumentStore, ExpirationLevels, StoreRecord};
use async_trait::async_trait;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Error produced by a transport (notifier or document store).
pub type SinkError = Box<dyn Error + Send + Sync>;

/// Capability shared by everything that consumes entries.
///
/// `fire` is called on the emitting thread and must return quickly. Sinks
/// with slow transports hand the entry to a background worker and return.
pub trait Hook: Send + Sync {
    /// Levels this hook wants to see.
    fn levels(&self) -> &[Level];

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError>;
}

/// The closed set of sink variants.
pub enum Sink {
    /// Chat notification service.
    Notifier(NotifierHook),
    /// Persistent document store.
    Store(StoreHook),
    /// Formatted lines written to a stream such as stdout.
    Stream(StreamHook),
}

impl Sink {
    pub fn name(&self) -> &'static str {
        match self {
            Sink::Notifier(hook) => hook.kind.name(),
            Sink::Store(hook) => hook.queue.name(),
            Sink::Stream(_) => "stream",
        }
    }

    /// Queue counters, for sinks that have a queue.
    pub fn stats(&self) -> Option<SinkStats> {
        match self {
            Sink::Notifier(hook) => Some(hook.queue.stats()),
            Sink::Store(hook) => Some(hook.queue.stats()),
            Sink::Stream(_) => None,
        }
    }

    pub(crate) async fn flush(&self, wait: Duration) -> bool {
        match self {
            Sink::Notifier(hook) => hook.queue.flush(wait).await,
            Sink::Store(hook) => hook.queue.flush(wait).await,
            Sink::Stream(hook) => hook.flush().is_ok(),
        }
    }

    pub(crate) async fn shutdown(self) {
        match self {
            Sink::Notifier(hook) => hook.queue.shutdown().await,
            Sink::Store(hook) => hook.queue.shutdown().await,
            Sink::Stream(hook) => {
                let _ = hook.flush();
            }
        }
    }
}

impl Hook for Sink {
    fn levels(&self) -> &[Level] {
        match self {
            Sink::Notifier(hook) => hook.levels(),
            Sink::Store(hook) => hook.levels(),
            Sink::Stream(hook) => hook.levels(),
        }
    }

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        match self {
            Sink::Notifier(hook) => hook.fire(entry),
            Sink::Store(hook) => hook.fire(entry),
            Sink::Stream(hook) => hook.fire(entry),
        }
    }
}

/// Sends entries to a chat service through a [`Notifier`].
pub struct NotifierHook {
    kind: NotifierKind,
    queue: SinkQueue,
}

struct NotifierDelivery {
    transport: Arc<dyn Notifier>,
    destination: String,
    args: FormatMessageArgs,
    format: Option<FormatMessageFn>,
}

#[async_trait]
impl Deliver for NotifierDelivery {
    async fn deliver(&self, entry: &Entry) -> Result<(), SinkError> {
        let message = resolve_message(entry, &self.args, self.format.as_ref());
        self.transport.notify(&self.destination, &message).await
    }
}

impl NotifierHook {
    pub(crate) fn spawn(
        kind: NotifierKind,
        transport: Arc<dyn Notifier>,
        destination: String,
        args: FormatMessageArgs,
        format: Option<FormatMessageFn>,
        options: &QueueOptions,
    ) -> Result<Self, InitError> {
        let delivery = NotifierDelivery {
            transport,
            destination,
            args,
            format,
        };
        let queue = SinkQueue::spawn(kind.name(), Arc::new(delivery), None, options)?;
        Ok(NotifierHook { kind, queue })
    }

    pub fn kind(&self) -> NotifierKind {
        self.kind
    }
}

impl Hook for NotifierHook {
    fn levels(&self) -> &[Level] {
        &Level::ALL
    }

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        self.queue.enqueue(entry)
    }
}

/// Writes entries to a [`DocumentStore`].
///
/// Every write holds the shared `gate` so concurrent store writes never
/// pile up against the backend.
pub struct StoreHook {
    queue: SinkQueue,
}

struct StoreDelivery {
    store: Arc<dyn DocumentStore>,
    service: String,
    expiration: ExpirationLevels,
}

#[async_trait]
impl Deliver for StoreDelivery {
    async fn deliver(&self, entry: &Entry) -> Result<(), SinkError> {
        let record = StoreRecord::from_entry(entry, &self.service, &self.expiration);
        self.store.insert(&record).await
    }
}

impl StoreHook {
    pub(crate) fn spawn(
        store: Arc<dyn DocumentStore>,
        service: String,
        expiration: ExpirationLevels,
        gate: Arc<tokio::sync::Mutex<()>>,
        options: &QueueOptions,
    ) -> Result<Self, InitError> {
        let delivery = StoreDelivery {
            store,
            service,
            expiration,
        };
        let queue = SinkQueue::spawn("store", Arc::new(delivery), Some(gate), options)?;
        Ok(StoreHook { queue })
    }
}

impl Hook for StoreHook {
    fn levels(&self) -> &[Level] {
        &Level::ALL
    }

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        self.queue.enqueue(entry)
    }
}

/// Writes formatted lines for a set of levels to a stream.
pub struct StreamHook {
    writer: Mutex<Box<dyn Write + Send>>,
    levels: Vec<Level>,
    formatter: Arc<dyn Format>,
}

impl StreamHook {
    pub fn new(writer: Box<dyn Write + Send>, levels: &[Level], formatter: Arc<dyn Format>) -> Self {
        StreamHook {
            writer: Mutex::new(writer),
            levels: levels.to_vec(),
            formatter,
        }
    }

    pub fn stdout(formatter: Arc<dyn Format>) -> Self {
        StreamHook::new(Box::new(std::io::stdout()), &Level::STDOUT, formatter)
    }

    pub fn stderr(formatter: Arc<dyn Format>) -> Self {
        StreamHook::new(Box::new(std::io::stderr()), &Level::STDERR, formatter)
    }

    fn flush(&self) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.flush()
    }
}

impl Hook for StreamHook {
    fn levels(&self) -> &[Level] {
        &self.levels
    }

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        let line = self.formatter.format(entry);
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::LineFormatter;
    use std::io;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Fixed;

    impl Format for Fixed {
        fn format(&self, _entry: &Entry) -> Vec<u8> {
            b"test".to_vec()
        }
    }

    #[test]
    fn stream_writes_formatted_line() {
        let buf = SharedBuf::default();
        let hook = StreamHook::new(Box::new(buf.clone()), &Level::ALL, Arc::new(Fixed));
        hook.fire(&Arc::new(Entry::new(Level::Info, ""))).unwrap();
        assert_eq!(buf.0.lock().unwrap().as_slice(), b"test");
    }

    #[test]
    fn stream_write_errors_are_returned() {
        let hook = StreamHook::new(Box::new(Broken), &Level::ALL, Arc::new(Fixed));
        let err = hook.fire(&Arc::new(Entry::new(Level::Info, ""))).unwrap_err();
        assert!(err.to_string().contains("error writing entry"));
    }

    #[test]
    fn std_streams_split_levels() {
        let formatter: Arc<dyn Format> = Arc::new(LineFormatter::new("app", "log"));
        let out = Sink::Stream(StreamHook::stdout(formatter.clone()));
        let err = Sink::Stream(StreamHook::stderr(formatter));
        assert!(out.levels().contains(&Level::Info));
        assert!(!out.levels().contains(&Level::Warn));
        assert!(err.levels().contains(&Level::Panic));
        assert_eq!(out.name(), "stream");
        assert!(out.stats().is_none());
    }
}
