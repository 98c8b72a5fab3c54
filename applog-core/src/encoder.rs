use std::fmt::Write;

use colored::Colorize;
use serde_json::{Map, Value};

use crate::{config::OutputMode, record::LogRecord};

/// Keys owned by the JSON encoder. Fields using them are dropped in favour
/// of the encoder's own value.
pub const RESERVED_KEYS: [&str; 4] = ["level", "ts", "logger", "msg"];

/// Turns records into output lines (without the trailing newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Json,
    Console { color: bool },
}

impl Encoder {
    pub fn for_mode(mode: OutputMode, color: bool) -> Self {
        match mode {
            OutputMode::Structured => Encoder::Json,
            OutputMode::Unstructured => Encoder::Console { color },
        }
    }

    pub fn encode(&self, record: &LogRecord) -> String {
        match self {
            Encoder::Json => encode_json(record),
            Encoder::Console { color } => encode_console(record, *color),
        }
    }
}

fn encode_json(record: &LogRecord) -> String {
    let mut map = Map::new();
    map.insert("level".into(), record.level.as_str().into());
    map.insert(
        "ts".into(),
        record
            .time
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .into(),
    );
    if let Some(name) = &record.name {
        map.insert("logger".into(), name.as_str().into());
    }
    map.insert("msg".into(), record.message.as_str().into());
    for (key, value) in record.fields.iter() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }
        map.insert(key.to_owned(), value.clone());
    }
    Value::Object(map).to_string()
}

fn encode_console(record: &LogRecord, color: bool) -> String {
    let time = record.time.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
    let (time, level) = if color {
        (
            time.dimmed().to_string(),
            record.level.colored_abbrev().to_string(),
        )
    } else {
        (time, record.level.abbrev().to_string())
    };
    let mut line = match &record.name {
        Some(name) => format!("[{time} {name} {level}] {}", record.message),
        None => format!("[{time} {level}] {}", record.message),
    };
    for (key, value) in record.fields.iter() {
        let value = render_value(value);
        if color {
            let _ = write!(line, " {}={value}", key.cyan());
        } else {
            let _ = write!(line, " {key}={value}");
        }
    }
    line
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s)
            if !s.is_empty()
                && !s.contains(|c: char| c.is_whitespace() || c == '=' || c == '"') =>
        {
            s.clone()
        }
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
