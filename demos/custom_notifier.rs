use std::sync::Arc;

use async_trait::async_trait;
use tracing_fanout::{ConfigBuilder, Logger, Notifier, SinkError};

/// Prints notifications instead of calling a chat API.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, destination: &str, message: &str) -> Result<(), SinkError> {
        println!("--- to {} ---\n{}", destination, message);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let config = ConfigBuilder::new()
        .service("inventory")
        .version("1.0.0")
        .with_slack_notifier("unused-token", "#inventory")
        .slack_transport(Arc::new(ConsoleNotifier))
        .slack_format_message(|entry, args| format!(":rotating_light: {} {}: {}", args.service, entry.level, entry.message))
        .with_workplace_notifier("unused-token", "t_42")
        .workplace_transport(Arc::new(ConsoleNotifier))
        .build()
        .expect("valid config");

    let logger = Logger::new(config).expect("logger");
    logger.with_field("sku", "A-100").with_field("left", 0).error("out of stock");

    logger.shutdown().await;
}
