use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use tracing_fanout::noop::{NoopNotifier, NoopStore};
use tracing_fanout::{ConfigBuilder, Logger, SideChannel};

#[tokio::main]
async fn main() {
    let config = ConfigBuilder::new()
        .service("load")
        .queue_capacity(4096)
        .side_channel(SideChannel::silent())
        .with_slack_notifier("token", "#load")
        .slack_transport(Arc::new(NoopNotifier))
        .with_workplace_notifier("token", "t_load")
        .workplace_transport(Arc::new(NoopNotifier))
        .with_document_store(Arc::new(NoopStore))
        .build()
        .expect("valid config");
    let logger = Logger::with_writer(config, Box::new(std::io::sink())).expect("logger");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.with_field("iteration", i).error("load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "sent {} entries in {:?} (~{:.0} entries/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    logger.flush(Duration::from_secs(5)).await;
    for (sink, stats) in logger.stats() {
        println!("{}: delivered {} dropped {}", sink, stats.delivered, stats.dropped);
    }
}
