use crate::entry::{Entry, ERROR_KEY};
use std::fmt::Write;
use std::sync::Arc;

/// Service details made available to notification formatters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatMessageArgs {
    pub service: String,
    pub version: String,
    pub prefix: String,
}

/// Custom renderer for outbound notification text.
pub type FormatMessageFn = Arc<dyn Fn(&Entry, &FormatMessageArgs) -> String + Send + Sync>;

/// Resolve the outbound message for `entry`, preferring `format` when set.
pub fn resolve_message(entry: &Entry, args: &FormatMessageArgs, format: Option<&FormatMessageFn>) -> String {
    match format {
        Some(format) => format(entry, args),
        None => default_format_message(entry, args),
    }
}

/// Built-in notification text.
///
/// A banner naming the service, the level and time, the message when there
/// is one, any error details that are set and finally every data pair except
/// the error itself.
pub fn default_format_message(entry: &Entry, args: &FormatMessageArgs) -> String {
    let mut buf = String::with_capacity(256);

    let _ = write!(buf, "{} | {}", args.prefix.to_uppercase(), args.service);
    if !args.version.is_empty() {
        let _ = write!(buf, " v{}", args.version);
    }
    buf.push_str("\n\n");

    let _ = writeln!(buf, "Level: {}", entry.level.as_str().to_uppercase());
    let _ = writeln!(buf, "Time: {}", entry.time.format("%Y-%m-%d %H:%M:%S%.3f %Z"));
    if !entry.message.is_empty() {
        let _ = writeln!(buf, "Message: {}", entry.message);
    }

    if let Some(err) = entry.error() {
        let details = [
            ("Code", err.code()),
            ("Error Message", err.message()),
            ("Operation", err.operation()),
            ("Error", err.err()),
            ("File Line", err.file_line()),
        ];
        for (label, value) in details {
            if let Some(value) = value {
                let _ = writeln!(buf, "{}: {}", label, value);
            }
        }
    }

    let data: Vec<_> = entry.data.iter().filter(|(k, _)| k.as_str() != ERROR_KEY).collect();
    if !data.is_empty() {
        buf.push_str("\nLog entries:\n");
        for (k, v) in data {
            let _ = writeln!(buf, "{}: {}", k, v);
        }
    }

    buf
}
