use crate::level::Level;
use crate::structured_error::StructuredError;
use crate::value::{Fields, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Reserved data key holding caller-supplied [`Fields`].
pub const FIELDS_KEY: &str = "fields";
/// Reserved data key holding the attached error.
pub const ERROR_KEY: &str = "error";
/// Data key overriding the entry message in the formatted line.
pub const MESSAGE_KEY: &str = "message";

pub const STATUS_CODE_KEY: &str = "status_code";
pub const CLIENT_IP_KEY: &str = "client_ip";
pub const REQUEST_METHOD_KEY: &str = "request_method";
pub const REQUEST_URL_KEY: &str = "request_url";

/// Top-level entry data.
pub type Data = BTreeMap<String, Value>;

/// One emitted log event.
///
/// Entries are built once per emission and then shared read-only (usually
/// behind an `Arc`) between the formatter and every sink.
#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub time: DateTime<Utc>,
    pub message: String,
    pub data: Data,
}

impl Entry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Entry {
            level,
            time: Utc::now(),
            message: message.into(),
            data: Data::new(),
        }
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Set a top-level data key.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Add a single pair under the reserved `"fields"` key.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match self.data.get_mut(FIELDS_KEY) {
            Some(Value::Fields(fields)) => {
                fields.insert(key.into(), value.into());
            }
            _ => {
                let mut fields = Fields::new();
                fields.insert(key.into(), value.into());
                self.data.insert(FIELDS_KEY.to_string(), Value::Fields(fields));
            }
        }
        self
    }

    /// Merge `fields` into the reserved `"fields"` key.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        for (k, v) in fields {
            self = self.with_field(k, v);
        }
        self
    }

    pub fn with_error(self, err: impl Into<Value>) -> Self {
        self.with_data(ERROR_KEY, err)
    }

    /// True when the entry carries a status code, client IP and request URL.
    pub fn is_http(&self) -> bool {
        self.data.contains_key(STATUS_CODE_KEY)
            && self.data.contains_key(CLIENT_IP_KEY)
            && self.data.contains_key(REQUEST_URL_KEY)
    }

    /// The nested `"fields"` map, if present and of the right shape.
    pub fn fields(&self) -> Option<&Fields> {
        self.data.get(FIELDS_KEY).and_then(Value::as_fields)
    }

    pub fn has_error(&self) -> bool {
        matches!(self.data.get(ERROR_KEY), Some(v) if !v.is_null())
    }

    /// Coerce the `"error"` value into a [`StructuredError`].
    ///
    /// Structured errors are returned as-is, dynamic errors are downcast when
    /// possible and otherwise keep their text, plain strings become the
    /// underlying error text. Anything else yields `None`.
    pub fn error(&self) -> Option<StructuredError> {
        match self.data.get(ERROR_KEY)? {
            Value::Error(err) => Some(err.clone()),
            Value::DynError(err) => Some(StructuredError::from_dyn(&**err)),
            Value::Str(s) => Some(StructuredError::new().with_err(s)),
            Value::Json(serde_json::Value::String(s)) => Some(StructuredError::new().with_err(s)),
            _ => None,
        }
    }

    /// The `"message"` data string, if any.
    pub fn data_message(&self) -> Option<&str> {
        self.data.get(MESSAGE_KEY).and_then(Value::as_str)
    }

    pub fn status_code(&self) -> Option<i64> {
        self.data.get(STATUS_CODE_KEY).and_then(Value::as_i64)
    }

    pub fn str_data(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}
