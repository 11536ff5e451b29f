use crate::notifier::Notifier;
use crate::sink::SinkError;
use crate::store::{DocumentStore, StoreRecord};
use async_trait::async_trait;

/// A notifier that discards every message.
///
/// Useful for measuring the overhead of dispatch without any external I/O,
/// and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _destination: &str, _message: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A document store that drops all records.
#[derive(Clone, Default)]
pub struct NoopStore;

#[async_trait]
impl DocumentStore for NoopStore {
    async fn insert(&self, _record: &StoreRecord) -> Result<(), SinkError> {
        Ok(())
    }
}
