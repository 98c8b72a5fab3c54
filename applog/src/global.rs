use std::sync::Arc;

use applog_core::{Level, LogError, LoggerGuard};
use log::Log;

use crate::logger::Logger;

/// Routes `log` facade records into a [`Logger`].
struct LogBridge {
    logger: Logger,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(Level::from_log(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.logger
                .log(Level::from_log(record.level()), record.args(), ());
        }
    }

    fn flush(&self) {
        let _ = self.logger.sync();
    }
}

impl Logger {
    /// Installs this logger as the `log` facade backend for the process.
    /// Returns a guard that flushes the sink when dropped.
    #[must_use = "LoggerGuard must be kept alive to ensure logs are flushed. Do \"let _guard = logger.init_global()?;\""]
    pub fn init_global(&self) -> Result<LoggerGuard, LogError> {
        log::set_boxed_logger(Box::new(LogBridge {
            logger: self.clone(),
        }))
        .map_err(|_| LogError::GlobalAlreadySet)?;
        log::set_max_level(self.min_level.to_log_filter());
        Ok(LoggerGuard::new(vec![Arc::clone(&self.sender)]))
    }
}
