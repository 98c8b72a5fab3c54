use std::{path::Path, sync::Arc};

use applog_core::{
    Encoder, Fields, Level, LogError, LogFile, LogStderr, LogStdout, LogWriter, OutputMode,
    spawn_log_thread,
};

use crate::logger::{Destination, Logger, PanicHook, PanicSignal, default_panic_hook};

/// Where the built logger writes.
pub enum Sink {
    Stdout,
    Stderr,
    File(LogFile),
    Custom(Box<dyn LogWriter + Send>),
}

/// Builder for configuring and constructing a [`Logger`].
pub struct LoggerBuilder {
    debug: bool,
    mode: Option<OutputMode>,
    sink: Option<Sink>,
    color: bool,
    name: Option<String>,
    panic_hook: Option<PanicHook>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            debug: false,
            mode: None,
            sink: None,
            color: true,
            name: None,
            panic_hook: None,
        }
    }
}

impl LoggerBuilder {
    /// Debug mode lowers the minimum level to `Debug` and makes `DPanic` panic.
    pub fn with_debug(self, debug: bool) -> Self {
        Self { debug, ..self }
    }
    /// Overrides the mode otherwise read from `UNSTRUCTURED_LOGS`.
    pub fn with_mode(self, mode: OutputMode) -> Self {
        Self {
            mode: Some(mode),
            ..self
        }
    }
    /// Overrides the default sink (stdout when structured, stderr otherwise).
    pub fn with_sink(self, sink: Sink) -> Self {
        Self {
            sink: Some(sink),
            ..self
        }
    }
    /// Sends lines to a custom writer.
    pub fn with_writer<W: LogWriter + Send + 'static>(self, writer: W) -> Self {
        self.with_sink(Sink::Custom(Box::new(writer)))
    }
    /// Sets a log file. The file is created if it does not exist and appended to if it does.
    pub fn with_log_file<P: AsRef<Path>>(self, path: P) -> Result<Self, LogError> {
        Ok(self.with_sink(Sink::File(LogFile::new(path)?)))
    }
    /// Colorizes console output. Has no effect on JSON output.
    pub fn with_color(self, color: bool) -> Self {
        Self { color, ..self }
    }
    /// Sets a log name
    pub fn with_name(self, name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }
    /// Maybe sets a log name
    pub fn maybe_with_name(self, name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            ..self
        }
    }
    /// Replaces the hook run after `DPanic`/`Panic` records.
    pub fn with_panic_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&PanicSignal) + Send + Sync + 'static,
    {
        Self {
            panic_hook: Some(Arc::new(hook)),
            ..self
        }
    }

    /// Spawns the writer thread and returns the root handle.
    pub fn build(self) -> Result<Logger, LogError> {
        let Self {
            debug,
            mode,
            sink,
            color,
            name,
            panic_hook,
        } = self;
        let mode = mode.unwrap_or_else(OutputMode::from_env);
        let encoder = Encoder::for_mode(mode, color);
        let sink = sink.unwrap_or(match mode {
            OutputMode::Structured => Sink::Stdout,
            OutputMode::Unstructured => Sink::Stderr,
        });
        let (sender, destination) = match sink {
            Sink::Stdout => (spawn_log_thread(LogStdout, encoder)?, Destination::Stdout),
            Sink::Stderr => (spawn_log_thread(LogStderr, encoder)?, Destination::Stderr),
            Sink::File(file) => (spawn_log_thread(file, encoder)?, Destination::File),
            Sink::Custom(writer) => (spawn_log_thread(writer, encoder)?, Destination::Custom),
        };
        Ok(Logger {
            sender: Arc::new(sender),
            min_level: if debug { Level::Debug } else { Level::Info },
            development: debug,
            mode,
            destination,
            name: name.map(Into::into),
            fields: Arc::new(Fields::new()),
            panic_hook: panic_hook.unwrap_or_else(default_panic_hook),
        })
    }
}

/// Returns a default [`LoggerBuilder`].
pub fn logger_builder() -> LoggerBuilder {
    LoggerBuilder::default()
}

/// Builds a logger whose mode comes from `UNSTRUCTURED_LOGS` and whose
/// minimum level follows `debug`.
pub fn new_logger(debug: bool) -> Result<Logger, LogError> {
    logger_builder().with_debug(debug).build()
}
