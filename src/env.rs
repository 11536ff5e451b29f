//! Environment variable names used to configure a logger from a
//! microservice's environment.
//!
//! These are purely helpers; [`ConfigBuilder`] itself never reads the
//! environment.

use crate::backend::make_store_from_dsn;
use crate::config::ConfigBuilder;
use crate::error::InitError;
use crate::level::Level;

/// Service name shown in notifications and stored records.
pub const FANOUT_SERVICE_ENV: &str = "FANOUT_SERVICE";

/// Service version shown in the notification banner.
pub const FANOUT_VERSION_ENV: &str = "FANOUT_VERSION";

/// Console line prefix.
pub const FANOUT_PREFIX_ENV: &str = "FANOUT_PREFIX";

/// Status label for entries without a status code.
pub const FANOUT_DEFAULT_STATUS_ENV: &str = "FANOUT_DEFAULT_STATUS";

/// Minimum level, e.g. `info` or `warning`.
pub const FANOUT_LEVEL_ENV: &str = "FANOUT_LEVEL";

pub const FANOUT_SLACK_TOKEN_ENV: &str = "FANOUT_SLACK_TOKEN";
pub const FANOUT_SLACK_CHANNEL_ENV: &str = "FANOUT_SLACK_CHANNEL";
pub const FANOUT_WORKPLACE_TOKEN_ENV: &str = "FANOUT_WORKPLACE_TOKEN";
pub const FANOUT_WORKPLACE_THREAD_ENV: &str = "FANOUT_WORKPLACE_THREAD";

/// Document store DSN, e.g. `opensearch://127.0.0.1:9200/logs`.
pub const FANOUT_STORE_DSN_ENV: &str = "FANOUT_STORE_DSN";

impl ConfigBuilder {
    /// Start a builder from the `FANOUT_*` environment variables.
    ///
    /// A notifier is configured when either of its variables is set, so a
    /// half-configured notifier is reported by [`ConfigBuilder::build`].
    pub fn from_env() -> Result<Self, InitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, InitError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut builder = ConfigBuilder::new()
            .service(var(FANOUT_SERVICE_ENV).unwrap_or_default())
            .version(var(FANOUT_VERSION_ENV).unwrap_or_default());
        if let Some(prefix) = var(FANOUT_PREFIX_ENV) {
            builder = builder.prefix(prefix);
        }
        if let Some(status) = var(FANOUT_DEFAULT_STATUS_ENV) {
            builder = builder.default_status(status);
        }
        if let Some(level) = var(FANOUT_LEVEL_ENV) {
            builder = builder.level(level.parse::<Level>()?);
        }

        let (token, channel) = (var(FANOUT_SLACK_TOKEN_ENV), var(FANOUT_SLACK_CHANNEL_ENV));
        if token.is_some() || channel.is_some() {
            builder = builder.with_slack_notifier(token.unwrap_or_default(), channel.unwrap_or_default());
        }
        let (token, thread) = (var(FANOUT_WORKPLACE_TOKEN_ENV), var(FANOUT_WORKPLACE_THREAD_ENV));
        if token.is_some() || thread.is_some() {
            builder = builder.with_workplace_notifier(token.unwrap_or_default(), thread.unwrap_or_default());
        }

        if let Some(dsn) = var(FANOUT_STORE_DSN_ENV) {
            builder = builder.with_document_store(make_store_from_dsn(&dsn)?);
        }
        Ok(builder)
    }
}
