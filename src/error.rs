use crate::backend::BackendBuildError;
use crate::config::ConfigError;
use crate::level::ParseLevelError;
use crate::notifier::NotifierKind;
use std::io;
use std::time::Duration;

/// Failure returned by [`Hook::fire`](crate::sink::Hook::fire).
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    #[error("{sink} queue is full, entry dropped")]
    QueueFull { sink: &'static str },

    #[error("{sink} queue is closed, entry dropped")]
    QueueClosed { sink: &'static str },

    #[error("{sink} did not respond within {after:?}")]
    Timeout { sink: &'static str, after: Duration },

    #[error("error writing entry to stream: {0}")]
    Write(#[from] io::Error),
}

/// Failure while setting up a [`Logger`](crate::logger::Logger) or its sinks.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendBuildError),

    #[error(transparent)]
    Level(#[from] ParseLevelError),

    #[error("sink workers need a running Tokio runtime")]
    NoRuntime,

    #[error("no {0} transport configured and the transport feature is disabled")]
    TransportUnavailable(NotifierKind),

    #[error("global tracing subscriber already set")]
    SubscriberAlreadySet,
}
