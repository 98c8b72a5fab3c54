use std::{fmt, sync::Arc};

use applog_core::{
    Fields, IntoFields, Level, LogError, LogRecord, LogSender, OutputMode, SinkMessage,
};

/// Raised after a `DPanic` (debug mode only) or `Panic` record has been
/// written and flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicSignal {
    pub level: Level,
    pub message: String,
}

/// Called with every [`PanicSignal`]. The default hook panics with the
/// record's message.
pub type PanicHook = Arc<dyn Fn(&PanicSignal) + Send + Sync>;

pub(crate) fn default_panic_hook() -> PanicHook {
    Arc::new(|signal: &PanicSignal| panic!("{}", signal.message))
}

/// Where a logger's lines end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    Stderr,
    File,
    Custom,
}

/// Leveled logger handle.
///
/// Cloning is cheap: clones, [`Logger::named`] and [`Logger::with`] handles
/// all share one writer thread, and the thread stops once the last of them
/// is dropped.
#[derive(Clone)]
pub struct Logger {
    pub(crate) sender: Arc<LogSender>,
    pub(crate) min_level: Level,
    pub(crate) development: bool,
    pub(crate) mode: OutputMode,
    pub(crate) destination: Destination,
    pub(crate) name: Option<Arc<str>>,
    pub(crate) fields: Arc<Fields>,
    pub(crate) panic_hook: PanicHook,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("development", &self.development)
            .field("mode", &self.mode)
            .field("destination", &self.destination)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

macro_rules! leveled_methods {
    ($($level:ident => $plain:ident, $with:ident, $fmt:ident;)*) => {
        $(
            #[doc = concat!("Logs `message` at `", stringify!($level), "`.")]
            pub fn $plain(&self, message: impl fmt::Display) {
                self.log(Level::$level, message, ());
            }

            #[doc = concat!("Logs `message` with key/value `fields` at `", stringify!($level), "`.")]
            pub fn $with(&self, message: impl fmt::Display, fields: impl IntoFields) {
                self.log(Level::$level, message, fields);
            }

            #[doc = concat!("Logs pre-formatted `args` (see [`format_args!`]) at `", stringify!($level), "`.")]
            pub fn $fmt(&self, args: fmt::Arguments<'_>) {
                self.log(Level::$level, args, ());
            }
        )*
    };
}

impl Logger {
    leveled_methods! {
        Debug => debug, debugw, debugf;
        Info => info, infow, infof;
        Warn => warn, warnw, warnf;
        Error => error, errorw, errorf;
        DPanic => dpanic, dpanicw, dpanicf;
        Panic => panic, panicw, panicf;
    }

    /// Emits one record. Below the minimum level this is a no-op.
    ///
    /// `DPanic` is downgraded to `Error` outside debug mode. `DPanic` in
    /// debug mode and `Panic` always flush the sink and then call the
    /// panic hook.
    pub fn log(&self, level: Level, message: impl fmt::Display, fields: impl IntoFields) {
        let level = match level {
            Level::DPanic if !self.development => Level::Error,
            level => level,
        };
        if !self.enabled(level) {
            return;
        }
        let message = message.to_string();
        let signal = matches!(level, Level::DPanic | Level::Panic).then(|| PanicSignal {
            level,
            message: message.clone(),
        });

        let mut record = LogRecord::new(level, message);
        record.name = self.name.as_deref().map(String::from);
        let mut all = Fields::clone(&self.fields);
        all.extend(fields.into_fields());
        record.fields = all;
        // A closed writer means the logger is shutting down
        let _ = self.sender.send(SinkMessage::Record(record));

        if let Some(signal) = signal {
            let _ = self.sync();
            (self.panic_hook)(&signal);
        }
    }

    /// Returns a handle tagging every record with `logger = name`.
    /// Naming an already-named handle replaces the previous name.
    pub fn named(&self, name: &str) -> Logger {
        Logger {
            name: Some(name.into()),
            ..self.clone()
        }
    }

    /// Returns a handle attaching `fields` to every record, after any
    /// fields this handle already carries.
    pub fn with(&self, fields: impl IntoFields) -> Logger {
        let mut all = Fields::clone(&self.fields);
        all.extend(fields.into_fields());
        Logger {
            fields: Arc::new(all),
            ..self.clone()
        }
    }

    /// Blocks until everything logged so far is written and flushed.
    pub fn sync(&self) -> Result<(), LogError> {
        self.sender.sync()
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn is_debug(&self) -> bool {
        self.development
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
