use crate::entry::{Entry, ERROR_KEY};
use crate::level::Level;
use crate::sink::SinkError;
use crate::structured_error::StructuredError;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DAY: Duration = Duration::from_secs(60 * 60 * 24);

/// Persistent document store that receives one [`StoreRecord`] per entry.
///
/// Writes are issued from the store sink's worker task while it holds the
/// dispatch write gate, so at most one write is in flight at a time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, record: &StoreRecord) -> Result<(), SinkError>;
}

/// Retention period per level. Levels without an entry never expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationLevels(BTreeMap<Level, Duration>);

impl ExpirationLevels {
    pub fn empty() -> Self {
        ExpirationLevels(BTreeMap::new())
    }

    pub fn set(mut self, level: Level, ttl: Duration) -> Self {
        self.0.insert(level, ttl);
        self
    }

    pub fn get(&self, level: Level) -> Option<Duration> {
        self.0.get(&level).copied()
    }

    /// When a record at `level` written at `time` should expire.
    pub fn expires_at(&self, level: Level, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let ttl = ChronoDuration::from_std(self.get(level)?).ok()?;
        time.checked_add_signed(ttl)
    }
}

impl Default for ExpirationLevels {
    fn default() -> Self {
        ExpirationLevels::empty()
            .set(Level::Trace, DAY)
            .set(Level::Debug, DAY)
            .set(Level::Info, DAY * 7)
            .set(Level::Warn, DAY * 28)
            .set(Level::Error, DAY * 28)
            .set(Level::Fatal, DAY * 168)
            .set(Level::Panic, DAY * 168)
    }
}

/// Document written to the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreRecord {
    pub service: String,
    pub level: Level,
    pub time: DateTime<Utc>,
    pub message: String,
    pub data: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoreRecord {
    pub fn from_entry(entry: &Entry, service: &str, expiration: &ExpirationLevels) -> Self {
        let data = entry
            .data
            .iter()
            .filter(|(k, _)| k.as_str() != ERROR_KEY)
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        StoreRecord {
            service: service.to_string(),
            level: entry.level,
            time: entry.time,
            message: entry.message.clone(),
            data,
            error: entry.error(),
            expires_at: expiration.expires_at(entry.level, entry.time),
        }
    }
}
