use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use crate::logger::Logger;

/// Produces the process configuration. Implemented for any
/// `Fn(&Logger) -> Result<C, E>`.
pub trait ConfigLoader<C> {
    type Error: fmt::Display;

    fn load(&self, logger: &Logger) -> Result<C, Self::Error>;
}

impl<C, E, F> ConfigLoader<C> for F
where
    F: Fn(&Logger) -> Result<C, E>,
    E: fmt::Display,
{
    type Error = E;

    fn load(&self, logger: &Logger) -> Result<C, E> {
        self(logger)
    }
}

/// Holds a configuration value built at most once.
///
/// Meant to live in a `static`:
///
/// ```rust
/// use applog::{ConfigCell, Logger, OutputMode, logger_builder};
///
/// struct AppConfig {
///     port: u16,
/// }
///
/// static APP_CONFIG: ConfigCell<AppConfig> = ConfigCell::new();
///
/// let logger = logger_builder()
///     .with_mode(OutputMode::Unstructured)
///     .build()
///     .unwrap();
/// let config = APP_CONFIG.get_or_create(&logger, &|_: &Logger| {
///     Ok::<_, std::io::Error>(AppConfig { port: 8080 })
/// });
/// assert_eq!(config.port, 8080);
/// ```
pub struct ConfigCell<C> {
    slot: OnceLock<Arc<C>>,
    lock: Mutex<()>,
}

impl<C> Default for ConfigCell<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ConfigCell<C> {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
            lock: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<Arc<C>> {
        self.slot.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Empties the cell so the next call loads again.
    pub fn reset(&mut self) {
        self.slot.take();
    }

    /// Returns the stored configuration, loading it first if needed.
    ///
    /// Concurrent first callers serialize on the cell's lock; only the first
    /// of them runs `loader`, the rest see its result. On failure the cell
    /// stays empty and the error is returned.
    pub fn try_get_or_create<L>(&self, logger: &Logger, loader: &L) -> Result<Arc<C>, L::Error>
    where
        L: ConfigLoader<C> + ?Sized,
    {
        if let Some(config) = self.slot.get() {
            return Ok(Arc::clone(config));
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = self.slot.get() {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new(loader.load(logger)?);
        // Must land in the slot read by the fast path, before the lock is released.
        let config = Arc::clone(self.slot.get_or_init(|| config));
        logger.debug("configuration loaded");
        Ok(config)
    }

    /// Like [`ConfigCell::try_get_or_create`], but a load failure is logged
    /// at `Error` and terminates the process with status 1.
    pub fn get_or_create<L>(&self, logger: &Logger, loader: &L) -> Arc<C>
    where
        L: ConfigLoader<C> + ?Sized,
    {
        match self.try_get_or_create(logger, loader) {
            Ok(config) => config,
            Err(err) => {
                logger.errorf(format_args!("error loading configuration: {err}"));
                let _ = logger.sync();
                std::process::exit(1);
            }
        }
    }
}
