use crate::config::Config;
use crate::error::InitError;
use crate::global;
use crate::layer::FanoutLayer;
use crate::logger::Logger;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Build a [`Logger`] from `config` and make it the process default.
///
/// **Effects**
///
/// Replaces the default used by the [`global`] functions. `tracing` is left
/// untouched; use [`init_tracing`] to also capture `tracing` events.
///
/// Must be called from within a Tokio runtime when any sink is configured.
pub fn init(config: Config) -> Result<Arc<Logger>, InitError> {
    let logger = Arc::new(Logger::new(config)?);
    global::set_default(Arc::clone(&logger));
    Ok(logger)
}

/// Build a [`Logger`], make it the process default and install a global
/// `tracing` subscriber that feeds it.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`FanoutLayer`] as the global
/// default subscriber, so every `tracing` event in the process is rendered
/// and dispatched like an entry logged directly.
///
/// **Errors**
///
/// [`InitError::SubscriberAlreadySet`] when another global subscriber is
/// already installed; the default logger is left unchanged in that case.
pub fn init_tracing(config: Config) -> Result<Arc<Logger>, InitError> {
    let logger = Arc::new(Logger::new(config)?);
    let subscriber = Registry::default().with(FanoutLayer::new(Arc::clone(&logger)));
    tracing::subscriber::set_global_default(subscriber).map_err(|_| InitError::SubscriberAlreadySet)?;
    global::set_default(Arc::clone(&logger));
    Ok(logger)
}
