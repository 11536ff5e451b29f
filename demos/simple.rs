use tracing_fanout::{ConfigBuilder, Logger, StructuredError};

fn main() {
    let config = ConfigBuilder::new()
        .service("billing")
        .version("0.3.1")
        .prefix("bill")
        .build()
        .expect("valid config");
    // No sinks configured, so no runtime is needed.
    let logger = Logger::new(config).expect("logger");

    logger.debug("loading price tables");
    logger.info("billing started");
    logger.with_field("invoice", 1042).with_field("customer", "acme").warn("invoice overdue");
    logger
        .with_error(StructuredError::invalid("amount must be positive", "rejected refund", "refund.create"))
        .error("refund rejected");
}
