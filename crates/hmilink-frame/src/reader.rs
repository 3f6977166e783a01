use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use hmilink_transport::LinkStream;
use tracing::trace;

use crate::assembler::{AssemblerStats, FrameAssembler};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameConfig};

/// Reads complete frames from any `Read` link.
///
/// Each call performs at most one link read, so a caller polling a shutdown
/// flag between calls never waits longer than one read timeout.
pub struct FrameReader<T> {
    inner: T,
    assembler: FrameAssembler,
    chunk: Vec<u8>,
    completed: Vec<Frame>,
    pending: VecDeque<Frame>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        let config = FrameConfig::default();
        let assembler = FrameAssembler::from_validated(&config);
        Self::from_parts(inner, assembler, config)
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Result<Self> {
        let assembler = FrameAssembler::new(&config)?;
        Ok(Self::from_parts(inner, assembler, config))
    }

    fn from_parts(inner: T, assembler: FrameAssembler, config: FrameConfig) -> Self {
        Self {
            inner,
            assembler,
            chunk: vec![0u8; config.read_chunk_size],
            completed: Vec::new(),
            pending: VecDeque::new(),
            config,
        }
    }

    /// Return the next complete frame, reading the link at most once.
    ///
    /// - `Ok(Some(frame))`: a frame, in receipt order
    /// - `Ok(None)`: the read timed out, or the bytes read did not complete
    ///   a frame yet
    /// - `Err(FrameError::Overflow)`: the chunk just read overflowed the
    ///   buffer; frames it completed are returned by the following calls
    /// - `Err(FrameError::ConnectionClosed)`: end of stream
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(Some(frame));
        }

        let read = loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(None),
                Err(err) => return Err(FrameError::Io(err)),
            }
        };
        trace!(bytes = read, "link chunk received");

        let fed = self
            .assembler
            .feed(&self.chunk[..read], &mut self.completed);
        self.pending.extend(self.completed.drain(..));
        fed?;

        Ok(self.pending.pop_front())
    }

    /// Frames already assembled but not yet returned.
    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    /// Assembler totals.
    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner link.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for a `LinkStream` and apply its read timeout.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Self::with_config(inner, config)
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

pub(crate) fn transport_to_frame_error(err: hmilink_transport::TransportError) -> FrameError {
    match err {
        hmilink_transport::TransportError::Io(io)
        | hmilink_transport::TransportError::Accept(io) => FrameError::Io(io),
        hmilink_transport::TransportError::Open { source, .. }
        | hmilink_transport::TransportError::Bind { source, .. }
        | hmilink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
