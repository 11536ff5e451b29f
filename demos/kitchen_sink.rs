use std::time::Duration;

use tracing_fanout::http_event::HttpEvent;
use tracing_fanout::{global, init_tracing, ConfigBuilder, ExpirationLevels, Level, StructuredError};

// Reads FANOUT_SLACK_*, FANOUT_WORKPLACE_* and FANOUT_STORE_DSN if set, e.g.
//   FANOUT_STORE_DSN=opensearch://127.0.0.1:9200/logs cargo run --example kitchen_sink
#[tokio::main]
async fn main() {
    let builder = ConfigBuilder::from_env().expect("environment");
    let config = builder
        .service("checkout")
        .version("2.0.0")
        .prefix("chk")
        .level(Level::Debug)
        .sink_timeout(Duration::from_secs(5))
        .slack_report(|entry| entry.level >= Level::Error)
        .workplace_report(|entry| entry.level >= Level::Fatal)
        .store_report(|entry| entry.level >= Level::Info)
        .expiration_levels(ExpirationLevels::default().set(Level::Info, Duration::from_secs(3 * 24 * 3600)))
        .build()
        .expect("valid config");

    let logger = init_tracing(config).expect("init");

    tracing::info!(cart = 17, items = 3u64, "cart loaded");
    tracing::warn!(cart = 17, "payment provider slow");
    global::info("through the process default");

    let req = http::Request::builder()
        .method("POST")
        .uri("/checkout/17")
        .header("user-agent", "kitchen-sink/1.0")
        .body(())
        .expect("request");
    let event = HttpEvent::from_request(&req, "192.168.1.20", 502)
        .with_message("upstream failed")
        .with_error(StructuredError::internal("connection refused", "charge failed", "payments.charge"));
    if let Err(e) = logger.fire_http(event) {
        eprintln!("console write failed: {}", e);
    }

    if !logger.flush(Duration::from_secs(10)).await {
        eprintln!("some sinks still had pending work");
    }
    for (sink, stats) in logger.stats() {
        println!("{}: {:?}", sink, stats);
    }
}
