use crate::structured_error::StructuredError;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Free-form key/value pairs supplied by callers.
pub type Fields = BTreeMap<String, Value>;

/// Dynamically-typed value stored in an entry's data map.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Time(DateTime<Utc>),
    Duration(Duration),
    Fields(Fields),
    Error(StructuredError),
    DynError(Arc<dyn Error + Send + Sync>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            Value::U64(n) => i64::try_from(*n).ok(),
            Value::Json(json) => json.as_i64(),
            _ => None,
        }
    }

    pub fn as_fields(&self) -> Option<&Fields> {
        match self {
            Value::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    /// JSON form of the value, used by document stores.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Fields(fields) => {
                f.write_str("map[")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
            Value::Error(err) => write!(f, "{}", err),
            Value::DynError(err) => write!(f, "{}", err),
            Value::Json(serde_json::Value::String(s)) => f.write_str(s),
            Value::Json(json) => write!(f, "{}", json),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I64(n) => serializer.serialize_i64(*n),
            Value::U64(n) => serializer.serialize_u64(*n),
            Value::F64(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::Duration(d) => serializer.serialize_u64(d.as_micros() as u64),
            Value::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Error(err) => err.serialize(serializer),
            Value::DynError(err) => StructuredError::from_dyn(&**err).serialize(serializer),
            Value::Json(json) => json.serialize(serializer),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I64,
    i64 => I64,
    u16 => U64,
    u32 => U64,
    u64 => U64,
    f64 => F64,
    String => Str,
    &str => Str,
    DateTime<Utc> => Time,
    Duration => Duration,
    Fields => Fields,
    StructuredError => Error,
    serde_json::Value => Json,
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::U64(v as u64)
    }
}

impl From<Arc<dyn Error + Send + Sync>> for Value {
    fn from(err: Arc<dyn Error + Send + Sync>) -> Self {
        Value::DynError(err)
    }
}

impl From<Box<dyn Error + Send + Sync>> for Value {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        Value::DynError(Arc::from(err))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
