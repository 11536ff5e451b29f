use crate::entry::{Entry, CLIENT_IP_KEY, ERROR_KEY, REQUEST_METHOD_KEY, REQUEST_URL_KEY, STATUS_CODE_KEY};
use crate::level::Level;
use crate::logger::Logger;
use crate::queue;
use crate::structured_error::StructuredError;
use crate::value::{Fields, Value};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target used by this crate's own diagnostics; the layer never forwards it.
pub(crate) const SELF_TARGET: &str = "tracing_fanout";

/// Crates under the HTTP transports. Their connection tasks are spawned
/// outside the sink workers, so they are skipped by target.
const TRANSPORT_TARGETS: [&str; 4] = ["hyper", "h2", "reqwest", "rustls"];

fn is_transport_target(target: &str) -> bool {
    TRANSPORT_TARGETS.iter().any(|krate| {
        target
            .strip_prefix(*krate)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// `tracing_subscriber` layer that turns `tracing` events into entries and
/// emits them through a [`Logger`].
///
/// The event message becomes the entry message. `status_code`,
/// `client_ip`, `request_method` and `request_url` are kept at the top level
/// so request events render as HTTP lines, `error` becomes the attached
/// error, and every other field is nested under `fields`.
///
/// Events raised while a sink is delivering are dropped, so transport
/// traffic never loops back into the sinks.
pub struct FanoutLayer {
    logger: Arc<Logger>,
}

impl FanoutLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        FanoutLayer { logger }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl<S> Layer<S> for FanoutLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == SELF_TARGET || is_transport_target(meta.target()) || queue::in_sink_worker() {
            return;
        }
        let level = Level::from(*meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut entry = Entry::new(level, visitor.message.unwrap_or_default());
        for (key, value) in visitor.top {
            entry = entry.with_data(key, value);
        }
        if !visitor.fields.is_empty() {
            entry = entry.with_fields(visitor.fields);
        }

        if let Err(e) = self.logger.log(entry) {
            eprintln!("failed to fire hook: {}", e);
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    top: Vec<(&'static str, Value)>,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            name @ (STATUS_CODE_KEY | CLIENT_IP_KEY | REQUEST_METHOD_KEY | REQUEST_URL_KEY | ERROR_KEY) => {
                self.top.push((name, value))
            }
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::Error(StructuredError::from_dyn(value)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::Str(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

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

    fn capture(level: Level, emit: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let config = ConfigBuilder::new().service("api").prefix("t").colours(false).level(level).build().unwrap();
        let logger = Arc::new(Logger::with_writer(config, Box::new(buf.clone())).unwrap());
        let subscriber = Registry::default().with(FanoutLayer::new(logger));
        tracing::subscriber::with_default(subscriber, emit);
        let out = buf.0.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn events_become_lines() {
        let out = capture(Level::Trace, || {
            tracing::warn!(user = "bob", attempts = 3, "login slow");
        });
        assert!(out.contains("[WARNING] | [msg] login slow  attempts: 3 user: bob"));
    }

    #[test]
    fn request_fields_stay_top_level() {
        let out = capture(Level::Trace, || {
            tracing::info!(status_code = 200u64, client_ip = "10.0.0.1", request_method = "GET", request_url = "/x");
        });
        assert!(out.contains("| 200 | [INFO]  | 10.0.0.1 |   GET    \"/x\""));
    }

    #[test]
    fn error_field_is_attached() {
        let out = capture(Level::Trace, || {
            let err = io::Error::new(io::ErrorKind::Other, "disk full");
            tracing::error!(error = &err as &(dyn std::error::Error + 'static), "write failed");
        });
        assert!(out.contains("[error] disk full"));
        assert!(!out.contains("write failed"));
    }

    #[test]
    fn own_target_and_quiet_levels_are_skipped() {
        let out = capture(Level::Info, || {
            tracing::debug!("too quiet");
            tracing::error!(target: "tracing_fanout", "internal");
        });
        assert!(out.is_empty());
    }

    #[test]
    fn transport_targets_match_whole_crates() {
        assert!(is_transport_target("hyper"));
        assert!(is_transport_target("hyper::client::connect::http"));
        assert!(is_transport_target("reqwest::connect"));
        assert!(!is_transport_target("hyperdrive"));
        assert!(!is_transport_target("my_app::reqwest"));
    }

    #[derive(Clone, Default)]
    struct ChattyNotifier(Arc<std::sync::atomic::AtomicUsize>);

    #[async_trait::async_trait]
    impl crate::notifier::Notifier for ChattyNotifier {
        async fn notify(&self, destination: &str, _message: &str) -> Result<(), crate::sink::SinkError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tracing::trace!(target: "chat_client", destination, "posting message");
            tokio::spawn(async {
                tracing::trace!(target: "hyper::proto::h1::io", "flushed 512 bytes");
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_traffic_is_not_logged_again() {
        let chatty = ChattyNotifier::default();
        let config = ConfigBuilder::new()
            .service("api")
            .colours(false)
            .with_slack_notifier("xoxb", "#alerts")
            .slack_transport(Arc::new(chatty.clone()))
            .build()
            .unwrap();
        let logger = Arc::new(Logger::with_writer(config, Box::new(io::sink())).unwrap());
        let _guard = tracing::subscriber::set_default(Registry::default().with(FanoutLayer::new(Arc::clone(&logger))));

        tracing::error!("one real error");
        assert!(logger.flush(std::time::Duration::from_secs(1)).await);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(logger.flush(std::time::Duration::from_secs(1)).await);

        assert_eq!(chatty.0.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(logger.stats()[0].1.enqueued, 1);
    }
}
