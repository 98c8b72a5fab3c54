//! # applog
//! Process-wide logger emitting either JSON lines or colorized console lines,
//! plus a once-only configuration cell.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! applog = "0.1.0"
//! ```
//!
//! The output mode comes from `UNSTRUCTURED_LOGS`: `false` (or any other
//! false literal) selects JSON on stdout; unset, empty, true or unparseable
//! values select console output on stderr.
//!
//! ```rust
//! use applog::new_logger;
//!
//! let logger = new_logger(false).expect("Unable to create logger");
//! logger.info("Hello, world!");
//! logger.infow("request served", [("status", 200)]);
//! logger.warnf(format_args!("{} retries left", 3));
//! logger.debug("filtered out unless debug is on");
//! logger.sync().unwrap();
//! ```
//!
//! ## Named loggers
//! ```rust
//! use applog::{OutputMode, logger_builder};
//!
//! let logger = logger_builder()
//!     .with_mode(OutputMode::Structured)
//!     .build()
//!     .unwrap();
//! let db = logger.named("db");
//! db.info("connected"); // {"level":"info","ts":"...","logger":"db","msg":"connected"}
//! logger.info("no logger key here");
//! ```
//!
//! ## Routing the `log` facade
//! ```rust
//! use applog::new_logger;
//!
//! let logger = new_logger(true).unwrap();
//! let _guard = logger.init_global().unwrap();
//! log::info!("Hello from the log facade!");
//! // guard ensures logs are flushed when dropped
//! ```

mod builder;
mod global;
mod logger;
mod singleton;

pub use applog_core::{
    Fields, IntoFields, Level, LogBuffer, LogError, LogFile, LogWriter, LoggerGuard, OutputMode,
    UNSTRUCTURED_LOGS_ENV,
};
pub use builder::{LoggerBuilder, Sink, logger_builder, new_logger};
pub use logger::{Destination, Logger, PanicHook, PanicSignal};
pub use singleton::{ConfigCell, ConfigLoader};
