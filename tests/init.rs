mod common;

use common::RecordingNotifier;
use std::sync::Arc;
use std::time::Duration;
use tracing_fanout::{global, init_tracing, ConfigBuilder, InitError, Level};

// One test per binary: the global subscriber can only be installed once.
#[tokio::test]
async fn tracing_events_reach_the_sinks() {
    let slack = RecordingNotifier::default();
    let config = || {
        ConfigBuilder::new()
            .service("worker")
            .colours(false)
            .level(Level::Info)
            .with_slack_notifier("xoxb", "#jobs")
            .slack_transport(Arc::new(slack.clone()))
            .slack_report(|entry| entry.level >= Level::Warn)
            .build()
            .unwrap()
    };

    let logger = init_tracing(config()).unwrap();
    assert!(global::default_logger().is_some_and(|l| Arc::ptr_eq(&l, &logger)));

    tracing::info!(job = "reindex", "started");
    tracing::warn!(job = "reindex", retries = 2u64, "slow shard");
    global::error("direct through the default");
    assert!(logger.flush(Duration::from_secs(2)).await);

    let sent = slack.messages();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("Level: WARNING"));
    assert!(sent[0].1.contains("Message: slow shard"));
    assert!(sent[0].1.contains("fields: map[job:reindex retries:2]"));
    assert!(sent[1].1.contains("Message: direct through the default"));

    assert!(matches!(init_tracing(config()), Err(InitError::SubscriberAlreadySet)));
    assert!(global::default_logger().is_some_and(|l| Arc::ptr_eq(&l, &logger)));
}
