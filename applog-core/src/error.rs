use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while setting up or flushing a logger.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("unable to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to spawn log writer thread: {0}")]
    SpawnWriter(#[source] io::Error),

    #[error("log writer thread is no longer running")]
    WriterClosed,

    #[error("failed to flush log sink: {0}")]
    Flush(#[source] io::Error),

    #[error("a global logger is already installed")]
    GlobalAlreadySet,
}
