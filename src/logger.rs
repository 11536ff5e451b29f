use crate::config::Config;
use crate::dispatch::DispatchHook;
use crate::entry::Entry;
use crate::error::{HookError, InitError};
use crate::formatter::{Format, LineFormatter};
use crate::level::Level;
use crate::queue::SinkStats;
use crate::sink::{Hook, Sink, StreamHook};
use crate::value::{Fields, Value};
use std::fmt::Display;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Owned logger instance.
///
/// Emitting builds one [`Entry`], writes its formatted line to the stream
/// hooks for that level (stdout for trace/debug/info, stderr otherwise) and
/// hands it to the [`DispatchHook`]. Everything up to enqueueing happens on
/// the caller's thread.
pub struct Logger {
    config: Arc<Config>,
    streams: Vec<Sink>,
    dispatch: DispatchHook,
}

impl Logger {
    /// Logger writing to stdout and stderr.
    ///
    /// Must be called from within a Tokio runtime when any sink is
    /// configured.
    pub fn new(config: Config) -> Result<Self, InitError> {
        let config = Arc::new(config);
        let formatter: Arc<dyn Format> = Arc::new(LineFormatter::from_config(&config));
        let streams = vec![
            Sink::Stream(StreamHook::stderr(Arc::clone(&formatter))),
            Sink::Stream(StreamHook::stdout(formatter)),
        ];
        Self::with_streams(config, streams)
    }

    /// Logger writing every level to `writer`.
    pub fn with_writer(config: Config, writer: Box<dyn Write + Send>) -> Result<Self, InitError> {
        let config = Arc::new(config);
        let formatter: Arc<dyn Format> = Arc::new(LineFormatter::from_config(&config));
        let streams = vec![Sink::Stream(StreamHook::new(writer, &Level::ALL, formatter))];
        Self::with_streams(config, streams)
    }

    fn with_streams(config: Arc<Config>, streams: Vec<Sink>) -> Result<Self, InitError> {
        let dispatch = DispatchHook::new(Arc::clone(&config))?;
        Ok(Logger {
            config,
            streams,
            dispatch,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatch_hook(&self) -> &DispatchHook {
        &self.dispatch
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.config.level()
    }

    /// Emit a fully built entry.
    ///
    /// Stream write failures are returned; the entry is still dispatched to
    /// the sinks. Entries below the configured level are ignored.
    pub fn log(&self, entry: Entry) -> Result<(), HookError> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        let entry = Arc::new(entry);

        let mut result = Ok(());
        for stream in &self.streams {
            if !stream.levels().contains(&entry.level) {
                continue;
            }
            if let Err(e) = stream.fire(&entry) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        self.dispatch.dispatch(Some(&entry))?;
        result
    }

    fn emit(&self, entry: Entry) {
        if let Err(e) = self.log(entry) {
            eprintln!("failed to fire hook: {}", e);
        }
    }

    fn emit_message(&self, level: Level, message: impl Display) {
        if self.enabled(level) {
            self.emit(Entry::new(level, message.to_string()));
        }
    }

    pub fn trace(&self, message: impl Display) {
        self.emit_message(Level::Trace, message);
    }

    pub fn debug(&self, message: impl Display) {
        self.emit_message(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit_message(Level::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit_message(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit_message(Level::Error, message);
    }

    /// Logs at fatal level. Terminating the process is left to the caller.
    pub fn fatal(&self, message: impl Display) {
        self.emit_message(Level::Fatal, message);
    }

    /// Logs at panic level. Unwinding is left to the caller.
    pub fn panic(&self, message: impl Display) {
        self.emit_message(Level::Panic, message);
    }

    /// Start an entry with one caller field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Event<'_> {
        Event::new(self).with_field(key, value)
    }

    /// Start an entry with caller fields.
    pub fn with_fields(&self, fields: Fields) -> Event<'_> {
        Event::new(self).with_fields(fields)
    }

    /// Start an entry with an attached error.
    pub fn with_error(&self, err: impl Into<Value>) -> Event<'_> {
        Event::new(self).with_error(err)
    }

    /// Start an entry with a top-level data key.
    pub fn with_data(&self, key: impl Into<String>, value: impl Into<Value>) -> Event<'_> {
        Event::new(self).with_data(key, value)
    }

    pub fn stats(&self) -> Vec<(&'static str, SinkStats)> {
        self.dispatch.stats()
    }

    /// Wait for sink queues to drain and flush the streams.
    pub async fn flush(&self, wait: Duration) -> bool {
        let mut drained = self.dispatch.flush(wait).await;
        for stream in &self.streams {
            drained &= stream.flush(wait).await;
        }
        drained
    }

    pub async fn shutdown(self) {
        self.dispatch.shutdown().await;
        for stream in self.streams {
            stream.shutdown().await;
        }
    }
}

/// Entry under construction, bound to the logger that will emit it.
#[must_use = "an event is only logged when a level method is called"]
pub struct Event<'a> {
    logger: &'a Logger,
    entry: Entry,
}

impl<'a> Event<'a> {
    fn new(logger: &'a Logger) -> Self {
        Event {
            logger,
            entry: Entry::new(Level::Info, String::new()),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry = self.entry.with_field(key, value);
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.entry = self.entry.with_fields(fields);
        self
    }

    pub fn with_error(mut self, err: impl Into<Value>) -> Self {
        self.entry = self.entry.with_error(err);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry = self.entry.with_data(key, value);
        self
    }

    pub fn log(self, level: Level, message: impl Display) {
        if !self.logger.enabled(level) {
            return;
        }
        let mut entry = self.entry;
        entry.level = level;
        entry.message = message.to_string();
        self.logger.emit(entry);
    }

    pub fn trace(self, message: impl Display) {
        self.log(Level::Trace, message);
    }

    pub fn debug(self, message: impl Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(self, message: impl Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(self, message: impl Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(self, message: impl Display) {
        self.log(Level::Error, message);
    }

    pub fn fatal(self, message: impl Display) {
        self.log(Level::Fatal, message);
    }

    pub fn panic(self, message: impl Display) {
        self.log(Level::Panic, message);
    }
}
