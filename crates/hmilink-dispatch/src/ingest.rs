use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hmilink_frame::{FrameError, FrameReader, DEFAULT_READ_TIMEOUT};
use tracing::{debug, error, info};

use crate::error::{DispatchError, Result};
use crate::registry::HandlerRegistry;

/// Ingest thread configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Name given to the ingest thread. Default: `hmilink-ingest`.
    pub thread_name: String,
    /// End the loop when the link reports end of stream. When false, the
    /// loop backs off for one read timeout and reads again. Default: true.
    pub stop_on_close: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            thread_name: "hmilink-ingest".to_string(),
            stop_on_close: true,
        }
    }
}

/// Why the ingest loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestExit {
    /// Stop was requested.
    Stopped,
    /// The link reached end of stream.
    Closed,
    /// The link failed.
    Io(String),
    /// The registry could no longer be locked.
    RegistryPoisoned,
}

/// Counters from one ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Frames published.
    pub frames: u64,
    /// Overflow events recorded by the assembler during the run.
    pub overflows: u64,
    /// Reads that returned no complete frame.
    pub idle_reads: u64,
    pub exit: IngestExit,
}

/// Reads frames from a link and publishes each one to a registry.
pub struct IngestTask<T> {
    reader: FrameReader<T>,
    registry: Arc<HandlerRegistry>,
    config: IngestConfig,
}

impl<T: Read + Send + 'static> IngestTask<T> {
    pub fn new(reader: FrameReader<T>, registry: Arc<HandlerRegistry>) -> Self {
        Self::with_config(reader, registry, IngestConfig::default())
    }

    pub fn with_config(
        reader: FrameReader<T>,
        registry: Arc<HandlerRegistry>,
        config: IngestConfig,
    ) -> Self {
        Self {
            reader,
            registry,
            config,
        }
    }

    /// Start the loop on a dedicated thread.
    pub fn spawn(self) -> Result<IngestHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_loop = Arc::clone(&stop);
        let name = self.config.thread_name.clone();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run(&stop_loop))
            .map_err(DispatchError::Spawn)?;
        info!(thread = %name, "ingest started");

        Ok(IngestHandle {
            stop,
            thread: Some(thread),
        })
    }

    /// Run the loop on the calling thread until `stop` is set or the link
    /// ends.
    ///
    /// The flag is checked after every read, so stopping takes at most one
    /// read timeout.
    pub fn run(mut self, stop: &AtomicBool) -> IngestReport {
        let mut report = IngestReport {
            frames: 0,
            overflows: 0,
            idle_reads: 0,
            exit: IngestExit::Stopped,
        };
        let overflows_before = self.reader.stats().overflows;

        while !stop.load(Ordering::Acquire) {
            match self.reader.read_frame() {
                Ok(Some(frame)) => match self.registry.publish(&frame) {
                    Ok(_) => report.frames += 1,
                    Err(err) => {
                        error!(error = %err, "publish failed, ending ingest");
                        report.exit = IngestExit::RegistryPoisoned;
                        break;
                    }
                },
                Ok(None) => report.idle_reads += 1,
                Err(FrameError::Overflow {
                    discarded,
                    capacity,
                }) => {
                    debug!(discarded, capacity, "overflow reported by reader");
                }
                Err(FrameError::ConnectionClosed) if self.config.stop_on_close => {
                    report.exit = IngestExit::Closed;
                    break;
                }
                Err(FrameError::ConnectionClosed) => {
                    debug!("link closed, waiting for data");
                    thread::sleep(
                        self.reader
                            .config()
                            .read_timeout
                            .unwrap_or(DEFAULT_READ_TIMEOUT),
                    );
                }
                Err(err) => {
                    error!(error = %err, "link read failed, ending ingest");
                    report.exit = IngestExit::Io(err.to_string());
                    break;
                }
            }
        }
        // One read can carry several overflowed messages.
        report.overflows = self.reader.stats().overflows - overflows_before;

        info!(
            frames = report.frames,
            overflows = report.overflows,
            exit = ?report.exit,
            "ingest finished"
        );
        report
    }
}

/// Handle to a running ingest thread.
///
/// Dropping the handle requests a stop and waits for the thread.
pub struct IngestHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<IngestReport>>,
}

impl IngestHandle {
    /// Shared stop flag, e.g. for a signal handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Whether the loop has already ended on its own.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Request a stop and wait for the loop to finish.
    pub fn stop(mut self) -> Result<IngestReport> {
        self.stop.store(true, Ordering::Release);
        self.join_inner()
    }

    /// Wait for the loop to end without requesting a stop.
    pub fn join(mut self) -> Result<IngestReport> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<IngestReport> {
        let thread = self
            .thread
            .take()
            .ok_or(DispatchError::NotRunning)?;
        thread.join().map_err(|_| DispatchError::IngestPanicked)
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.stop.store(true, Ordering::Release);
            let _ = thread.join();
        }
    }
}
