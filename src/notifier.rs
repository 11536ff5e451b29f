use crate::sink::SinkError;
use async_trait::async_trait;
use std::fmt;

/// Chat transport that delivers a rendered message to a thread or channel.
///
/// Implementations are called from a sink worker task, never from the
/// thread that emitted the entry.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post `message` to `destination` (a channel id or thread key).
    async fn notify(&self, destination: &str, message: &str) -> Result<(), SinkError>;
}

/// The chat services a [`Config`](crate::config::Config) can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifierKind {
    Slack,
    Workplace,
}

impl NotifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            NotifierKind::Slack => "slack",
            NotifierKind::Workplace => "workplace",
        }
    }

    /// What the destination identifier is called for this service.
    pub fn destination_label(&self) -> &'static str {
        match self {
            NotifierKind::Slack => "channel",
            NotifierKind::Workplace => "thread",
        }
    }
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
