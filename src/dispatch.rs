use crate::config::{Config, NotifierConfig, ShouldReportFn};
use crate::entry::Entry;
use crate::error::{HookError, InitError};
use crate::level::Level;
use crate::notifier::{Notifier, NotifierKind};
use crate::queue::{QueueOptions, SinkStats};
use crate::side_channel::SideChannel;
use crate::sink::{Hook, NotifierHook, Sink, StoreHook};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A configured sink together with its report predicate.
struct Route {
    sink: Sink,
    should_report: ShouldReportFn,
}

/// Fans every entry out to the configured sinks.
///
/// Sinks are considered independently: an unconfigured sink costs nothing,
/// a sink whose predicate rejects the entry is skipped, and a sink that fails
/// is reported on the side channel without affecting the others. Notifier
/// sinks only enqueue on the caller's thread. Document store writes run on
/// the store worker and serialize on `store_gate`.
pub struct DispatchHook {
    config: Arc<Config>,
    workplace: Option<Route>,
    slack: Option<Route>,
    store: Option<Route>,
    store_gate: Arc<Mutex<()>>,
    side_channel: SideChannel,
}

impl DispatchHook {
    /// Bind a sink for every sub-configuration present in `config`.
    ///
    /// Must be called from within a Tokio runtime, the sink workers are
    /// spawned on it.
    pub fn new(config: Arc<Config>) -> Result<Self, InitError> {
        let options = QueueOptions {
            capacity: config.queue_capacity(),
            timeout: config.sink_timeout(),
            side_channel: config.side_channel().clone(),
        };
        let store_gate = Arc::new(Mutex::new(()));

        let workplace = match config.workplace() {
            Some(notifier) => Some(notifier_route(&config, notifier, &options)?),
            None => None,
        };
        let slack = match config.slack() {
            Some(notifier) => Some(notifier_route(&config, notifier, &options)?),
            None => None,
        };
        let store = match config.store() {
            Some(store) => {
                let hook = StoreHook::spawn(
                    Arc::clone(&store.store),
                    config.service().to_string(),
                    store.expiration.clone(),
                    Arc::clone(&store_gate),
                    &options,
                )?;
                Some(Route {
                    sink: Sink::Store(hook),
                    should_report: Arc::clone(&store.should_report),
                })
            }
            None => None,
        };

        tracing::debug!(
            target: "tracing_fanout",
            service = config.service(),
            workplace = workplace.is_some(),
            slack = slack.is_some(),
            store = store.is_some(),
            "dispatch hook ready"
        );

        Ok(DispatchHook {
            side_channel: config.side_channel().clone(),
            config,
            workplace,
            slack,
            store,
            store_gate,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn routes(&self) -> impl Iterator<Item = &Route> {
        [&self.workplace, &self.slack, &self.store]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    /// True when no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.routes().next().is_none()
    }

    /// Offer `entry` to every sink. A `None` entry is ignored.
    ///
    /// Always returns `Ok`; sink failures go to the side channel.
    pub fn dispatch(&self, entry: Option<&Arc<Entry>>) -> Result<(), HookError> {
        let Some(entry) = entry else {
            return Ok(());
        };

        for route in self.routes() {
            if !(route.should_report)(entry) {
                continue;
            }
            if let Err(e) = route.sink.fire(entry) {
                self.side_channel.report(route.sink.name(), &e);
            }
        }
        Ok(())
    }

    /// Counters for every queued sink, keyed by sink name.
    pub fn stats(&self) -> Vec<(&'static str, SinkStats)> {
        self.routes()
            .filter_map(|route| route.sink.stats().map(|stats| (route.sink.name(), stats)))
            .collect()
    }

    /// Wait for queued work on every sink, up to `wait` per sink.
    ///
    /// Returns `false` if any sink still had pending work.
    pub async fn flush(&self, wait: Duration) -> bool {
        let mut drained = true;
        for route in self.routes() {
            drained &= route.sink.flush(wait).await;
        }
        drained
    }

    /// Close every sink queue and wait for the workers to finish.
    pub async fn shutdown(self) {
        for route in [self.workplace, self.slack, self.store].into_iter().flatten() {
            route.sink.shutdown().await;
        }
        // No store write is in flight past this point.
        let _idle = self.store_gate.lock().await;
    }
}

impl Hook for DispatchHook {
    fn levels(&self) -> &[Level] {
        &Level::ALL
    }

    fn fire(&self, entry: &Arc<Entry>) -> Result<(), HookError> {
        self.dispatch(Some(entry))
    }
}

fn notifier_route(config: &Config, notifier: &NotifierConfig, options: &QueueOptions) -> Result<Route, InitError> {
    let transport = match &notifier.transport {
        Some(transport) => Arc::clone(transport),
        None => default_transport(notifier.kind, &notifier.token)?,
    };
    let hook = NotifierHook::spawn(
        notifier.kind,
        transport,
        notifier.destination.clone(),
        config.format_message_args(),
        notifier.format_message.clone(),
        options,
    )?;
    Ok(Route {
        sink: Sink::Notifier(hook),
        should_report: Arc::clone(&notifier.should_report),
    })
}

#[cfg(feature = "transport")]
fn default_transport(kind: NotifierKind, token: &str) -> Result<Arc<dyn Notifier>, InitError> {
    use crate::slack::SlackNotifier;
    use crate::workplace::WorkplaceNotifier;

    let notifier: Arc<dyn Notifier> = match kind {
        NotifierKind::Slack => Arc::new(SlackNotifier::new(token)),
        NotifierKind::Workplace => Arc::new(WorkplaceNotifier::new(token)),
    };
    Ok(notifier)
}

#[cfg(not(feature = "transport"))]
fn default_transport(kind: NotifierKind, _token: &str) -> Result<Arc<dyn Notifier>, InitError> {
    Err(InitError::TransportUnavailable(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[tokio::test]
    async fn no_sinks_is_a_noop() {
        let config = ConfigBuilder::new().service("api").build().unwrap();
        let hook = DispatchHook::new(Arc::new(config)).unwrap();
        assert!(hook.is_empty());
        assert!(hook.fire(&Arc::new(Entry::new(Level::Error, "boom"))).is_ok());
        assert!(hook.stats().is_empty());
        assert!(hook.flush(Duration::from_millis(10)).await);
    }

    #[test]
    fn sinks_need_a_runtime() {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(crate::noop::NoopStore);
        let config = ConfigBuilder::new()
            .service("api")
            .with_document_store(store)
            .build()
            .unwrap();
        assert!(matches!(DispatchHook::new(Arc::new(config)), Err(InitError::NoRuntime)));
    }
}
