#![allow(dead_code)]

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_fanout::side_channel::SideChannel;
use tracing_fanout::{DocumentStore, Notifier, SinkError, StoreRecord};

/// Notifier that remembers every (destination, message) pair.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, destination: &str, message: &str) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

/// Notifier that always fails, counting its calls.
#[derive(Clone, Default)]
pub struct FailingNotifier {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _destination: &str, _message: &str) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("service unavailable".into())
    }
}

/// Notifier that takes `delay` per message.
#[derive(Clone)]
pub struct SlowNotifier {
    pub delay: Duration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    async fn notify(&self, _destination: &str, _message: &str) -> Result<(), SinkError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Store that records writes and the highest number seen in flight at once.
#[derive(Clone, Default)]
pub struct TrackingStore {
    pub records: Arc<Mutex<Vec<StoreRecord>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl DocumentStore for TrackingStore {
    async fn insert(&self, record: &StoreRecord) -> Result<(), SinkError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.records.lock().unwrap().push(record.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Side channel collecting `(sink, error text)` reports.
#[derive(Clone, Default)]
pub struct Reports(pub Arc<Mutex<Vec<(String, String)>>>);

impl Reports {
    pub fn channel(&self) -> SideChannel {
        let reports = Arc::clone(&self.0);
        SideChannel::new(move |sink, err| reports.lock().unwrap().push((sink.to_string(), err.to_string())))
    }

    pub fn all(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
