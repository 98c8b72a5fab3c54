use std::fmt;

use colored::{ColoredString, Colorize};

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// Panics after emission when the logger runs in debug mode.
    DPanic,
    /// Always panics after emission.
    Panic,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::DPanic,
        Level::Panic,
    ];

    /// Lower-case name used by the JSON encoder.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::DPanic => "dpanic",
            Level::Panic => "panic",
        }
    }

    /// Three-letter marker used by the console encoder.
    pub fn abbrev(self) -> &'static str {
        match self {
            Level::Debug => "DBG",
            Level::Info => "INF",
            Level::Warn => "WRN",
            Level::Error => "ERR",
            Level::DPanic => "DPN",
            Level::Panic => "PNC",
        }
    }

    pub(crate) fn colored_abbrev(self) -> ColoredString {
        let abbrev = self.abbrev();
        match self {
            Level::Debug => abbrev.blue(),
            Level::Info => abbrev.green(),
            Level::Warn => abbrev.yellow(),
            Level::Error => abbrev.red(),
            Level::DPanic | Level::Panic => abbrev.red().bold(),
        }
    }

    /// Maps a `log` facade level; `Trace` has no counterpart and becomes `Debug`.
    pub fn from_log(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }

    /// Most verbose `log` facade filter that still reaches this level.
    pub fn to_log_filter(self) -> log::LevelFilter {
        match self {
            Level::Debug => log::LevelFilter::Debug,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error | Level::DPanic | Level::Panic => log::LevelFilter::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
