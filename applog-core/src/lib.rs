//! # applog-core
//! Core utilities for applog - records, encoders and writer threads.

mod config;
mod encoder;
mod error;
mod level;
mod log_writer;
mod record;
mod utils;

pub use config::{APPLOG_CONFIG, OutputMode, UNSTRUCTURED_LOGS_ENV, parse_bool};
pub use encoder::{Encoder, RESERVED_KEYS};
pub use error::LogError;
pub use level::Level;
pub use log_writer::{LogBuffer, LogFile, LogStderr, LogStdout, LogWriter};
pub use record::{Fields, IntoFields, LogRecord};
pub use utils::{LogSender, LoggerGuard, SinkMessage, spawn_log_thread};
