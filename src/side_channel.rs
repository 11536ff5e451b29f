use std::error::Error;
use std::fmt;
use std::sync::Arc;

type ReportFn = dyn Fn(&str, &(dyn Error + 'static)) + Send + Sync;

/// Out-of-band destination for sink failures.
///
/// Failures are never logged through the [`Logger`](crate::logger::Logger)
/// that produced them, otherwise a broken sink would feed itself. The default
/// channel prints to stderr.
#[derive(Clone)]
pub struct SideChannel(Arc<ReportFn>);

impl SideChannel {
    pub fn new<F>(report: F) -> Self
    where
        F: Fn(&str, &(dyn Error + 'static)) + Send + Sync + 'static,
    {
        SideChannel(Arc::new(report))
    }

    pub fn stderr() -> Self {
        SideChannel::new(|sink, err| eprintln!("{} hook failed: {}", sink, err))
    }

    /// Drop every report.
    pub fn silent() -> Self {
        SideChannel::new(|_, _| {})
    }

    pub fn report(&self, sink: &str, err: &(dyn Error + 'static)) {
        (self.0)(sink, err)
    }
}

impl Default for SideChannel {
    fn default() -> Self {
        SideChannel::stderr()
    }
}

impl fmt::Debug for SideChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SideChannel")
    }
}
