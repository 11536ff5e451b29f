use crate::config::Config;
use crate::entry::{Entry, CLIENT_IP_KEY, REQUEST_METHOD_KEY, REQUEST_URL_KEY, STATUS_CODE_KEY};
use crate::level::Level;
use crate::structured_error::StructuredError;
use std::fmt::Write;
use yansi::{Color, Paint, Style};

/// Timestamp layout used when none is configured, e.g. `Jan  2 15:04:05.000`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S%.3f";

const STATUS_OK: Style = Style::new().fg(Color::BrightWhite).bg(Color::Green).bold();
const STATUS_ERR: Style = Style::new().fg(Color::BrightWhite).bg(Color::Red).bold();
const STATUS_DEFAULT: Style = Style::new().fg(Color::BrightWhite).bg(Color::Black).bold();
const METHOD: Style = Style::new().fg(Color::BrightWhite).bg(Color::Blue).bold();
const ERROR_TAG: Style = Style::new().fg(Color::Red);

/// Renders entries into a single column-aligned line.
pub trait Format: Send + Sync {
    fn format(&self, entry: &Entry) -> Vec<u8>;
}

/// Console line formatter.
///
/// Columns are written in a fixed order: prefix, time, status code, level,
/// client IP, method, URL, message or error, fields. Optional columns are
/// skipped when the entry has no data for them and leftover separators are
/// trimmed at the end. With colours disabled the output is a pure function
/// of the entry.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    prefix: String,
    default_status: String,
    timestamp_format: String,
    colours: bool,
}

impl LineFormatter {
    pub fn new(prefix: impl Into<String>, default_status: impl Into<String>) -> Self {
        LineFormatter {
            prefix: prefix.into(),
            default_status: default_status.into(),
            timestamp_format: String::new(),
            colours: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        LineFormatter {
            prefix: config.prefix().to_string(),
            default_status: config.default_status().to_string(),
            timestamp_format: config.timestamp_format().to_string(),
            colours: config.colours(),
        }
    }

    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    pub fn colours(mut self, colours: bool) -> Self {
        self.colours = colours;
        self
    }

    fn colour(&self, style: Style, text: &str) -> String {
        if self.colours {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn time(&self, buf: &mut String, entry: &Entry) {
        let format = if self.timestamp_format.is_empty() {
            DEFAULT_TIMESTAMP_FORMAT
        } else {
            &self.timestamp_format
        };
        let _ = write!(buf, "{}", entry.time.format(format));
    }

    fn status_code(&self, buf: &mut String, entry: &Entry) {
        buf.push_str(" | ");
        match entry.data.get(STATUS_CODE_KEY) {
            None => {
                let status = self.default_status.to_uppercase();
                buf.push_str(&self.colour(STATUS_DEFAULT, &status));
            }
            Some(value) if value.is_null() => {}
            Some(value) => {
                let style = match value.as_i64() {
                    Some(code) if code < 400 => STATUS_OK,
                    _ => STATUS_ERR,
                };
                buf.push_str(&self.colour(style, &value.to_string()));
            }
        }
        buf.push_str(" | ");
    }

    fn level(&self, buf: &mut String, entry: &Entry) {
        let style = match entry.level {
            Level::Trace | Level::Debug => Style::new().fg(Color::BrightBlack).bold(),
            Level::Warn => Style::new().fg(Color::Yellow).bold(),
            Level::Error | Level::Fatal | Level::Panic => Style::new().fg(Color::Red).bold(),
            Level::Info => Style::new().fg(Color::Blue).bold(),
        };
        let name = entry.level.as_str().to_uppercase();
        // Pads INFO to line up with the five letter levels.
        if name.len() == 4 {
            buf.push_str(&self.colour(style, &format!("[{}] ", name)));
        } else {
            buf.push_str(&self.colour(style, &format!("[{}]", name)));
        }
    }

    fn ip(&self, buf: &mut String, entry: &Entry) {
        match entry.str_data(CLIENT_IP_KEY) {
            Some(ip) => {
                let _ = write!(buf, " | {} | ", ip);
            }
            None => buf.push(' '),
        }
    }

    fn method(&self, buf: &mut String, entry: &Entry) {
        if let Some(method) = entry.str_data(REQUEST_METHOD_KEY) {
            buf.push_str(&self.colour(METHOD, &format!("  {}   ", method)));
        }
    }

    fn url(&self, buf: &mut String, entry: &Entry) {
        if let Some(url) = entry.str_data(REQUEST_URL_KEY) {
            let _ = write!(buf, " \"{}\" ", url);
        }
    }

    fn message(&self, buf: &mut String, entry: &Entry) {
        let message = entry
            .data_message()
            .filter(|m| !m.is_empty())
            .or_else(|| Some(entry.message.as_str()).filter(|m| !m.is_empty()));
        if let Some(message) = message {
            let _ = write!(buf, "| [msg] {} |", message);
        }
    }

    fn error(&self, buf: &mut String, err: &StructuredError) {
        buf.push('|');
        let sections = [
            (" [code] ", err.code()),
            (" [msg] ", err.message()),
            (" [op] ", err.operation()),
            (" [error] ", err.err()),
        ];
        for (tag, value) in sections {
            if let Some(value) = value {
                buf.push_str(&self.colour(ERROR_TAG, tag));
                buf.push_str(value);
            }
        }
    }

    fn fields(&self, buf: &mut String, entry: &Entry) {
        let Some(fields) = entry.fields() else {
            return;
        };
        buf.push_str("| ");
        for (k, v) in fields {
            let _ = write!(buf, "{}: {} ", k, v);
        }
    }
}

impl Format for LineFormatter {
    fn format(&self, entry: &Entry) -> Vec<u8> {
        let mut buf = String::with_capacity(128);
        let _ = write!(buf, "[{}] ", self.prefix.to_uppercase());

        self.time(&mut buf, entry);
        self.status_code(&mut buf, entry);
        self.level(&mut buf, entry);
        self.ip(&mut buf, entry);
        self.method(&mut buf, entry);
        self.url(&mut buf, entry);

        // An attached error replaces the plain message column.
        match entry.error() {
            Some(err) => self.error(&mut buf, &err),
            None => self.message(&mut buf, entry),
        }

        self.fields(&mut buf, entry);

        let mut line = buf.as_str();
        line = line.strip_suffix('|').unwrap_or(line);
        line = line.strip_suffix('|').unwrap_or(line);
        line = line.strip_suffix(' ').unwrap_or(line);
        let mut line = line.replace("||", "");
        line.push('\n');
        line.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{FIELDS_KEY, MESSAGE_KEY};
    use crate::value::{Fields, Value};
    use chrono::{TimeZone, Utc};

    fn formatter() -> LineFormatter {
        LineFormatter::new("test", "test")
    }

    fn render(entry: Entry) -> String {
        let entry = entry.at(Utc.with_ymd_and_hms(2022, 1, 2, 15, 4, 5).unwrap());
        String::from_utf8(formatter().format(&entry)).unwrap()
    }

    const TIME: &str = "Jan  2 15:04:05.000";

    #[test]
    fn renders_each_level() {
        let cases = [
            (Level::Debug, "[DEBUG] | [msg] message"),
            (Level::Info, "[INFO]  | [msg] message"),
            (Level::Warn, "[WARNING] | [msg] message"),
            (Level::Error, "[ERROR] | [msg] message"),
            (Level::Fatal, "[FATAL] | [msg] message"),
            (Level::Panic, "[PANIC] | [msg] message"),
        ];
        for (level, tail) in cases {
            let want = format!("[TEST] {} | TEST | {}\n", TIME, tail);
            assert_eq!(render(Entry::new(level, "message")), want);
        }
    }

    #[test]
    fn renders_fields() {
        let mut fields = Fields::new();
        fields.insert("key1".into(), Value::from("test1"));
        let entry = Entry::new(Level::Info, "").with_data(FIELDS_KEY, fields);
        assert_eq!(render(entry), format!("[TEST] {} | TEST | [INFO]  | key1: test1\n", TIME));
    }

    #[test]
    fn renders_structured_error_without_message() {
        let err = StructuredError::new()
            .with_code("INTERNAL")
            .with_message("message")
            .with_operation("operation")
            .with_err("error");
        let entry = Entry::new(Level::Error, "plain").with_error(err);
        assert_eq!(
            render(entry),
            format!(
                "[TEST] {} | TEST | [ERROR] | [code] INTERNAL [msg] message [op] operation [error] error\n",
                TIME
            )
        );
    }

    #[test]
    fn uncoercible_error_renders_nothing() {
        let entry = Entry::new(Level::Error, "").with_error(1);
        assert_eq!(render(entry), format!("[TEST] {} | TEST | [ERROR]\n", TIME));
    }

    #[test]
    fn string_error_renders_error_section() {
        let entry = Entry::new(Level::Error, "").with_error("error");
        assert_eq!(render(entry), format!("[TEST] {} | TEST | [ERROR] | [error] error\n", TIME));
    }

    #[test]
    fn renders_http_requests() {
        for (code, text) in [(200, "200"), (404, "404")] {
            let entry = Entry::new(Level::Info, "")
                .with_data(STATUS_CODE_KEY, code)
                .with_data(CLIENT_IP_KEY, "127.0.0.1")
                .with_data(REQUEST_METHOD_KEY, "GET")
                .with_data(REQUEST_URL_KEY, "/page")
                .with_data("data_length", 0);
            assert_eq!(
                render(entry),
                format!("[TEST] {} | {} | [INFO]  | 127.0.0.1 |   GET    \"/page\"\n", TIME, text)
            );
        }
    }

    #[test]
    fn data_message_wins_over_entry_message() {
        let entry = Entry::new(Level::Info, "entry").with_data(MESSAGE_KEY, "data");
        assert_eq!(render(entry), format!("[TEST] {} | TEST | [INFO]  | [msg] data\n", TIME));

        let entry = Entry::new(Level::Info, "entry").with_data(MESSAGE_KEY, "");
        assert_eq!(render(entry), format!("[TEST] {} | TEST | [INFO]  | [msg] entry\n", TIME));
    }

    #[test]
    fn default_status_is_coloured_differently() {
        let f = formatter().colours(true);
        let plain = Entry::new(Level::Info, "");
        let http = plain.clone().with_data(STATUS_CODE_KEY, 200);

        let default_line = String::from_utf8(f.format(&plain)).unwrap();
        let status_line = String::from_utf8(f.format(&http)).unwrap();
        assert!(default_line.contains(&"TEST".paint(STATUS_DEFAULT).to_string()));
        assert!(status_line.contains(&"200".paint(STATUS_OK).to_string()));
        assert_ne!("X".paint(STATUS_DEFAULT).to_string(), "X".paint(STATUS_OK).to_string());
    }

    #[test]
    fn custom_timestamp_format() {
        let f = formatter().timestamp_format("%Y-%m-%d %H:%M:%S");
        let entry = Entry::new(Level::Info, "hi").at(Utc.with_ymd_and_hms(2022, 1, 2, 15, 4, 5).unwrap());
        let line = String::from_utf8(f.format(&entry)).unwrap();
        assert_eq!(line, "[TEST] 2022-01-02 15:04:05 | TEST | [INFO]  | [msg] hi\n");
    }
}
