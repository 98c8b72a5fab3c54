use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

/// Ordered key/value pairs attached to a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. A value that cannot be serialized is recorded as
    /// `<key>Error` holding the serialization error.
    pub fn push<K: Into<String>, V: Serialize>(&mut self, key: K, value: V) {
        let key = key.into();
        match serde_json::to_value(&value) {
            Ok(value) => self.0.push((key, value)),
            Err(err) => self
                .0
                .push((format!("{key}Error"), Value::String(err.to_string()))),
        }
    }

    pub fn extend(&mut self, other: Fields) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Anything that can be turned into a list of fields.
///
/// Keys and values travel as pairs, so a dangling key without a value cannot
/// be expressed.
pub trait IntoFields {
    fn into_fields(self) -> Fields;
}

impl IntoFields for Fields {
    fn into_fields(self) -> Fields {
        self
    }
}

impl IntoFields for () {
    fn into_fields(self) -> Fields {
        Fields::new()
    }
}

impl<K: Into<String>, V: Serialize, const N: usize> IntoFields for [(K, V); N] {
    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        for (key, value) in self {
            fields.push(key, value);
        }
        fields
    }
}

impl<K: Into<String>, V: Serialize> IntoFields for Vec<(K, V)> {
    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        for (key, value) in self {
            fields.push(key, value);
        }
        fields
    }
}

impl<K: AsRef<str>, V: Serialize> IntoFields for &[(K, V)] {
    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        for (key, value) in self {
            fields.push(key.as_ref(), value);
        }
        fields
    }
}

/// A single log event on its way to a writer thread.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub name: Option<String>,
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(level: Level, message: String) -> Self {
        Self {
            time: Utc::now(),
            level,
            message,
            name: None,
            fields: Fields::new(),
        }
    }
}
