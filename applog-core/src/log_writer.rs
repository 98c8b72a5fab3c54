use std::{
    fs::File,
    io::{self, BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::error::LogError;

/// Destination of encoded lines. Implementations are driven by a single
/// writer thread, so they need not synchronize internally.
pub trait LogWriter {
    fn regular(&mut self, line: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

impl LogWriter for Box<dyn LogWriter + Send> {
    fn regular(&mut self, line: &str) -> io::Result<()> {
        (**self).regular(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Appends to a file, creating it if needed.
pub struct LogFile {
    path: PathBuf,
    file: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let open = || -> io::Result<File> {
            let mut file = File::options()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.seek(SeekFrom::End(0))?;
            Ok(file)
        };
        let file = open().map_err(|source| LogError::OpenFile {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogWriter for LogFile {
    fn regular(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn regular(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

#[derive(Default, Debug)]
pub struct LogStderr;

impl LogWriter for LogStderr {
    fn regular(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// In-memory sink shared between clones; handy for capturing output.
#[derive(Default, Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// All captured lines joined with newlines, each newline-terminated.
    pub fn contents(&self) -> String {
        self.lock().iter().map(|l| format!("{l}\n")).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A poisoned buffer still holds every line written before the panic.
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogWriter for LogBuffer {
    fn regular(&mut self, line: &str) -> io::Result<()> {
        self.lock().push(line.to_owned());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_log_file() {
    std::fs::remove_file("/tmp/applog_test_log_file.log").ok();
    let mut log_file = LogFile::new("/tmp/applog_test_log_file.log").unwrap();
    log_file.regular("Hello, world!").unwrap();
    log_file.regular("rust is awesome !").unwrap();
    log_file.flush().unwrap();
    drop(log_file);
    let mut log_file = LogFile::new("/tmp/applog_test_log_file.log").unwrap();
    log_file.regular("appended").unwrap();
    log_file.flush().unwrap();
    assert_eq!(
        std::fs::read_to_string("/tmp/applog_test_log_file.log").unwrap(),
        "Hello, world!\nrust is awesome !\nappended\n"
    );
}

#[test]
fn test_log_file_open_error() {
    let err = LogFile::new("/nonexistent-applog-dir/app.log").err().unwrap();
    assert!(matches!(err, LogError::OpenFile { .. }));
}

#[test]
fn test_log_buffer_shared_between_clones() {
    let buffer = LogBuffer::new();
    let mut writer = buffer.clone();
    writer.regular("one").unwrap();
    writer.regular("two").unwrap();
    assert_eq!(buffer.lines(), ["one", "two"]);
    assert_eq!(buffer.contents(), "one\ntwo\n");
}
