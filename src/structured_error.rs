use serde::Serialize;
use std::error::Error;
use std::fmt;

/// Error code for failures the service itself is responsible for.
pub const INTERNAL: &str = "INTERNAL";
/// Error code for rejected input.
pub const INVALID: &str = "INVALID";

/// Error attached to an entry under the `"error"` key.
///
/// Every field is optional. Renderers skip fields that are absent or empty
/// instead of printing placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Text of the underlying error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_line: Option<String>,
}

impl StructuredError {
    pub fn new() -> Self {
        Self::default()
    }

    /// `INTERNAL` error wrapping `err`.
    pub fn internal(err: impl fmt::Display, message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new()
            .with_code(INTERNAL)
            .with_message(message)
            .with_operation(operation)
            .with_err(err)
    }

    /// `INVALID` error wrapping `err`.
    pub fn invalid(err: impl fmt::Display, message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new()
            .with_code(INVALID)
            .with_message(message)
            .with_operation(operation)
            .with_err(err)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_err(mut self, err: impl fmt::Display) -> Self {
        self.err = Some(err.to_string());
        self
    }

    pub fn with_file_line(mut self, file_line: impl Into<String>) -> Self {
        self.file_line = Some(file_line.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        non_empty(&self.code)
    }

    pub fn message(&self) -> Option<&str> {
        non_empty(&self.message)
    }

    pub fn operation(&self) -> Option<&str> {
        non_empty(&self.operation)
    }

    pub fn err(&self) -> Option<&str> {
        non_empty(&self.err)
    }

    pub fn file_line(&self) -> Option<&str> {
        non_empty(&self.file_line)
    }

    /// Best-effort conversion of an arbitrary error.
    ///
    /// A `StructuredError` behind the trait object is cloned as-is, anything
    /// else keeps only its display text.
    pub fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        match err.downcast_ref::<StructuredError>() {
            Some(structured) => structured.clone(),
            None => Self::new().with_err(err),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(4);
        if let Some(code) = self.code() {
            parts.push(format!("<{}>", code));
        }
        if let Some(operation) = self.operation() {
            parts.push(format!("{}:", operation));
        }
        if let Some(err) = self.err() {
            parts.push(err.to_string());
        }
        if let Some(message) = self.message() {
            parts.push(message.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}

impl Error for StructuredError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_read_as_absent() {
        let err = StructuredError::new().with_code("").with_message("boom");
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), Some("boom"));
    }

    #[test]
    fn downcasts_structured_errors() {
        let original = StructuredError::internal("db down", "could not save", "Users.Save");
        let boxed: Box<dyn Error + Send + Sync> = Box::new(original.clone());
        assert_eq!(StructuredError::from_dyn(boxed.as_ref()), original);
    }

    #[test]
    fn wraps_foreign_errors_by_text() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = StructuredError::from_dyn(&io);
        assert_eq!(err.err(), Some("disk full"));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn display_skips_missing_parts() {
        let err = StructuredError::new().with_code(INTERNAL).with_err("error");
        assert_eq!(err.to_string(), "<INTERNAL> error");
    }
}
