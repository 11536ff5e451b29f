use crate::entry::Entry;
use crate::level::Level;
use crate::message::{FormatMessageArgs, FormatMessageFn};
use crate::notifier::{Notifier, NotifierKind};
use crate::side_channel::SideChannel;
use crate::store::{DocumentStore, ExpirationLevels};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Prefix used when none is set.
pub const DEFAULT_PREFIX: &str = "APP";
/// Status label used for entries without a status code when none is set.
pub const DEFAULT_STATUS: &str = "LOG";
/// Timestamp layout for lines written by a [`Logger`](crate::logger::Logger).
pub const DEFAULT_LOGGER_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

const MIN_QUEUE_CAPACITY: usize = 16;
const MIN_SINK_TIMEOUT: Duration = Duration::from_millis(10);

/// Decides whether an entry is forwarded to a sink.
pub type ShouldReportFn = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Predicate that forwards every entry.
pub fn report_always() -> ShouldReportFn {
    Arc::new(|_| true)
}

/// Error returned by [`ConfigBuilder::build`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("service name cannot be empty")]
    EmptyService,

    /// A notifier token was supplied without its channel or thread.
    #[error("{} {} cannot be nil", .0.name(), .0.destination_label())]
    MissingDestination(NotifierKind),

    #[error("{} token cannot be nil", .0.name())]
    MissingToken(NotifierKind),
}

/// Chat notifier settings.
#[derive(Clone)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub token: String,
    /// Channel id (Slack) or thread key (Workplace).
    pub destination: String,
    pub should_report: ShouldReportFn,
    pub format_message: Option<FormatMessageFn>,
    /// Transport to use instead of the built-in HTTP client.
    pub transport: Option<Arc<dyn Notifier>>,
}

/// Document store settings.
#[derive(Clone)]
pub struct StoreConfig {
    pub store: Arc<dyn DocumentStore>,
    pub should_report: ShouldReportFn,
    pub expiration: ExpirationLevels,
}

/// Validated, immutable logger configuration.
///
/// Built once through [`ConfigBuilder`]; a running logger is reconfigured by
/// building a new `Config` and a new logger, never by mutation.
#[derive(Clone)]
pub struct Config {
    service: String,
    version: String,
    prefix: String,
    default_status: String,
    timestamp_format: String,
    colours: bool,
    level: Level,
    queue_capacity: usize,
    sink_timeout: Duration,
    side_channel: SideChannel,
    slack: Option<NotifierConfig>,
    workplace: Option<NotifierConfig>,
    store: Option<StoreConfig>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_status(&self) -> &str {
        &self.default_status
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    pub fn colours(&self) -> bool {
        self.colours
    }

    /// Least severe level that is emitted.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn sink_timeout(&self) -> Duration {
        self.sink_timeout
    }

    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    pub fn slack(&self) -> Option<&NotifierConfig> {
        self.slack.as_ref()
    }

    pub fn workplace(&self) -> Option<&NotifierConfig> {
        self.workplace.as_ref()
    }

    pub fn store(&self) -> Option<&StoreConfig> {
        self.store.as_ref()
    }

    pub fn format_message_args(&self) -> FormatMessageArgs {
        FormatMessageArgs {
            service: self.service.clone(),
            version: self.version.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("service", &self.service)
            .field("version", &self.version)
            .field("prefix", &self.prefix)
            .field("default_status", &self.default_status)
            .field("level", &self.level)
            .field("slack", &self.slack.is_some())
            .field("workplace", &self.workplace.is_some())
            .field("store", &self.store.is_some())
            .finish()
    }
}

#[derive(Default, Clone)]
struct NotifierDraft {
    token: String,
    destination: String,
    should_report: Option<ShouldReportFn>,
    format_message: Option<FormatMessageFn>,
    transport: Option<Arc<dyn Notifier>>,
}

impl NotifierDraft {
    fn finish(self, kind: NotifierKind) -> Result<Option<NotifierConfig>, ConfigError> {
        match (self.token.is_empty(), self.destination.is_empty()) {
            (true, true) => Ok(None),
            (false, true) => Err(ConfigError::MissingDestination(kind)),
            (true, false) => Err(ConfigError::MissingToken(kind)),
            (false, false) => Ok(Some(NotifierConfig {
                kind,
                token: self.token,
                destination: self.destination,
                should_report: self.should_report.unwrap_or_else(report_always),
                format_message: self.format_message,
                transport: self.transport,
            })),
        }
    }
}

/// Fluent builder for [`Config`].
///
/// Setters only touch the builder's draft; nothing is checked until
/// [`build`](ConfigBuilder::build).
#[derive(Clone)]
pub struct ConfigBuilder {
    service: String,
    version: String,
    prefix: String,
    default_status: String,
    timestamp_format: String,
    colours: bool,
    level: Level,
    queue_capacity: usize,
    sink_timeout: Duration,
    side_channel: SideChannel,
    slack: NotifierDraft,
    workplace: NotifierDraft,
    store: Option<Arc<dyn DocumentStore>>,
    store_report: Option<ShouldReportFn>,
    expiration: ExpirationLevels,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            service: String::new(),
            version: String::new(),
            prefix: String::new(),
            default_status: String::new(),
            timestamp_format: DEFAULT_LOGGER_TIMESTAMP.to_string(),
            colours: true,
            level: Level::Trace,
            queue_capacity: 1024,
            sink_timeout: Duration::from_secs(10),
            side_channel: SideChannel::default(),
            slack: NotifierDraft::default(),
            workplace: NotifierDraft::default(),
            store: None,
            store_report: None,
            expiration: ExpirationLevels::default(),
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the service, required.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Bracketed token written at the start of every line.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Label shown in the status column when an entry has no status code.
    pub fn default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }

    /// `chrono` format string for the time column.
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    pub fn colours(mut self, colours: bool) -> Self {
        self.colours = colours;
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Upper bound for a single transport call.
    pub fn sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    pub fn side_channel(mut self, side_channel: SideChannel) -> Self {
        self.side_channel = side_channel;
        self
    }

    pub fn with_slack_notifier(mut self, token: impl Into<String>, channel: impl Into<String>) -> Self {
        self.slack.token = token.into();
        self.slack.destination = channel.into();
        self
    }

    pub fn slack_report<F>(mut self, report: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.slack.should_report = Some(Arc::new(report));
        self
    }

    pub fn slack_format_message<F>(mut self, format: F) -> Self
    where
        F: Fn(&Entry, &FormatMessageArgs) -> String + Send + Sync + 'static,
    {
        self.slack.format_message = Some(Arc::new(format));
        self
    }

    pub fn slack_transport(mut self, transport: Arc<dyn Notifier>) -> Self {
        self.slack.transport = Some(transport);
        self
    }

    pub fn with_workplace_notifier(mut self, token: impl Into<String>, thread: impl Into<String>) -> Self {
        self.workplace.token = token.into();
        self.workplace.destination = thread.into();
        self
    }

    pub fn workplace_report<F>(mut self, report: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.workplace.should_report = Some(Arc::new(report));
        self
    }

    pub fn workplace_format_message<F>(mut self, format: F) -> Self
    where
        F: Fn(&Entry, &FormatMessageArgs) -> String + Send + Sync + 'static,
    {
        self.workplace.format_message = Some(Arc::new(format));
        self
    }

    pub fn workplace_transport(mut self, transport: Arc<dyn Notifier>) -> Self {
        self.workplace.transport = Some(transport);
        self
    }

    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store_report<F>(mut self, report: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.store_report = Some(Arc::new(report));
        self
    }

    pub fn expiration_levels(mut self, expiration: ExpirationLevels) -> Self {
        self.expiration = expiration;
        self
    }

    /// Validate the draft and produce a [`Config`].
    ///
    /// Checks run in order: service name, then Workplace credentials, then
    /// Slack credentials. Empty prefix and status fall back to
    /// [`DEFAULT_PREFIX`] and [`DEFAULT_STATUS`].
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.service.is_empty() {
            return Err(ConfigError::EmptyService);
        }
        let workplace = self.workplace.finish(NotifierKind::Workplace)?;
        let slack = self.slack.finish(NotifierKind::Slack)?;

        let store = self.store.map(|store| StoreConfig {
            store,
            should_report: self.store_report.unwrap_or_else(report_always),
            expiration: self.expiration,
        });

        Ok(Config {
            service: self.service,
            version: self.version,
            prefix: non_empty_or(self.prefix, DEFAULT_PREFIX),
            default_status: non_empty_or(self.default_status, DEFAULT_STATUS),
            timestamp_format: self.timestamp_format,
            colours: self.colours,
            level: self.level,
            queue_capacity: self.queue_capacity.max(MIN_QUEUE_CAPACITY),
            sink_timeout: self.sink_timeout.max(MIN_SINK_TIMEOUT),
            side_channel: self.side_channel,
            slack,
            workplace,
            store,
        })
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
