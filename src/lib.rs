//! Structured logging that renders column-aligned console lines and fans
//! every entry out to chat notifiers (Slack, Workplace) and a document
//! store, each behind its own bounded queue.

pub mod level;
pub mod value;
pub mod structured_error;
pub mod entry;
pub mod formatter;
pub mod message;
pub mod side_channel;
pub mod error;

pub mod notifier;
pub mod store;
pub mod backend;
pub mod noop;

#[cfg(feature = "transport")]
pub mod slack;
#[cfg(feature = "transport")]
pub mod workplace;
#[cfg(feature = "transport")]
pub mod opensearch;

mod queue;
pub mod sink;
pub mod config;
pub mod dispatch;
pub mod logger;
pub mod http_event;
pub mod layer;
pub mod global;
pub mod env;
pub mod init;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use dispatch::DispatchHook;
pub use entry::Entry;
pub use error::{HookError, InitError};
pub use formatter::{Format, LineFormatter};
pub use http_event::HttpEvent;
pub use init::{init, init_tracing};
pub use layer::FanoutLayer;
pub use level::Level;
pub use logger::{Event, Logger};
pub use notifier::{Notifier, NotifierKind};
pub use queue::SinkStats;
pub use side_channel::SideChannel;
pub use sink::{Hook, Sink, SinkError};
pub use store::{DocumentStore, ExpirationLevels, StoreRecord};
pub use structured_error::StructuredError;
pub use value::{Fields, Value};
