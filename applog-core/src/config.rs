use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Name of the environment flag selecting the output mode.
pub const UNSTRUCTURED_LOGS_ENV: &str = "UNSTRUCTURED_LOGS";

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 100;

#[derive(FromEnv)]
#[from_env(prefix = "APPLOG")]
#[allow(non_snake_case)]
pub struct AppLogConfig {
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
}

pub static APPLOG_CONFIG: LazyLock<AppLogConfig> = LazyLock::new(|| {
    AppLogConfig::from_env().unwrap_or(AppLogConfig {
        FLUSH_INTERVAL_MS: DEFAULT_FLUSH_INTERVAL_MS,
    })
});

/// Output encoding of a logger, fixed when the logger is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON object per line on stdout.
    Structured,
    /// Colorized single-line text on stderr.
    Unstructured,
}

impl OutputMode {
    /// Resolves the mode from `UNSTRUCTURED_LOGS`.
    pub fn from_env() -> Self {
        Self::from_flag(std::env::var(UNSTRUCTURED_LOGS_ENV).ok().as_deref())
    }

    /// Unset, empty and unparseable values all select `Unstructured`.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.and_then(parse_bool) {
            Some(false) => OutputMode::Structured,
            _ => OutputMode::Unstructured,
        }
    }
}

/// Accepts the same boolean literals as Go's `strconv.ParseBool`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
