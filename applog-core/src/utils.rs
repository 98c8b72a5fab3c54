use std::{
    io,
    ops::Deref,
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded, unbounded};

use crate::{
    config::APPLOG_CONFIG, encoder::Encoder, error::LogError, log_writer::LogWriter,
    record::LogRecord,
};

const MAX_BATCH: usize = 32;

/// Guard that flushes every sink it holds when dropped.
/// Hold this guard for the lifetime of your logging session.
pub struct LoggerGuard {
    senders: Vec<Arc<LogSender>>,
}

impl LoggerGuard {
    pub fn new(senders: Vec<Arc<LogSender>>) -> Self {
        Self { senders }
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        for sender in &self.senders {
            let _ = sender.sync();
        }
    }
}

/// Message understood by a writer thread.
#[derive(Debug)]
pub enum SinkMessage {
    Record(LogRecord),
    /// Flush the writer and report the outcome on the enclosed channel.
    Flush(Sender<io::Result<()>>),
    Shutdown,
}

/// Sending half of a writer thread. Dropping the last handle shuts the
/// thread down after it has drained and flushed every queued record.
pub struct LogSender {
    sender: Sender<SinkMessage>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl Deref for LogSender {
    type Target = Sender<SinkMessage>;
    fn deref(&self) -> &Self::Target {
        &self.sender
    }
}

impl Drop for LogSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl LogSender {
    pub fn new(sender: Sender<SinkMessage>, handler: JoinHandle<()>) -> Self {
        Self {
            sender,
            handler: Mutex::new(Some(handler)),
        }
    }

    /// Blocks until every record queued before this call has been written
    /// and the writer flushed.
    pub fn sync(&self) -> Result<(), LogError> {
        let (ack, done) = bounded(1);
        self.send(SinkMessage::Flush(ack))
            .map_err(|_| LogError::WriterClosed)?;
        done.recv()
            .map_err(|_| LogError::WriterClosed)?
            .map_err(LogError::Flush)
    }

    /// Stops the writer thread and waits for it. Every record queued before
    /// the thread sees the request is still written and flushed.
    pub fn shutdown(&self) {
        let mut guard = self.handler.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.take() {
            // Ignore error if channel is already closed
            let _ = self.send(SinkMessage::Shutdown);
            let _ = handle.join();
        }
    }
}

fn report(result: io::Result<()>) {
    if let Err(err) = result {
        eprintln!("applog: failed to write log record: {err}");
    }
}

/// Applies one message to `writer`; returns `true` for a shutdown request.
fn apply<W: LogWriter>(
    message: SinkMessage,
    writer: &mut W,
    encoder: &Encoder,
    dirty: &mut bool,
    last_flush: &mut Instant,
) -> bool {
    match message {
        SinkMessage::Record(record) => {
            report(writer.regular(&encoder.encode(&record)));
            *dirty = true;
        }
        SinkMessage::Flush(ack) => {
            let _ = ack.send(writer.flush());
            *dirty = false;
            *last_flush = Instant::now();
        }
        SinkMessage::Shutdown => return true,
    }
    false
}

/// Spawns the thread owning `writer`; records are encoded with `encoder`
/// on that thread, in the order they were sent.
pub fn spawn_log_thread<W: LogWriter + Send + 'static>(
    mut writer: W,
    encoder: Encoder,
) -> Result<LogSender, LogError> {
    let (sender, receiver) = unbounded::<SinkMessage>();
    let handler = std::thread::Builder::new()
        .name("applog-writer".into())
        .spawn(move || {
            let mut batch = Vec::with_capacity(MAX_BATCH);
            let flush_interval = Duration::from_millis(APPLOG_CONFIG.FLUSH_INTERVAL_MS);
            let mut last_flush = Instant::now();
            let mut dirty = false;
            loop {
                let timeout = flush_interval
                    .saturating_sub(last_flush.elapsed())
                    .max(Duration::from_millis(1));

                match receiver.recv_timeout(timeout) {
                    Ok(msg) => {
                        batch.push(msg);
                        while batch.len() < MAX_BATCH {
                            match receiver.try_recv() {
                                Ok(msg) => batch.push(msg),
                                Err(_) => break,
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if dirty {
                            report(writer.flush());
                            dirty = false;
                        }
                        last_flush = Instant::now();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                let mut should_shutdown = false;
                for message in batch.drain(..) {
                    should_shutdown |=
                        apply(message, &mut writer, &encoder, &mut dirty, &mut last_flush);
                }

                if should_shutdown {
                    // Records queued behind the shutdown request are still written.
                    for message in receiver.try_iter() {
                        apply(message, &mut writer, &encoder, &mut dirty, &mut last_flush);
                    }
                    break;
                }
                if dirty && last_flush.elapsed() >= flush_interval {
                    report(writer.flush());
                    dirty = false;
                    last_flush = Instant::now();
                }
            }
            report(writer.flush());
        })
        .map_err(LogError::SpawnWriter)?;
    Ok(LogSender::new(sender, handler))
}
