use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};

use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameConfig, DEFAULT_DELIMITER};

/// Running totals kept by a [`FrameAssembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Bytes passed to `feed`.
    pub bytes_in: u64,
    /// Frames emitted.
    pub frames: u64,
    /// Overflow events.
    pub overflows: u64,
    /// Bytes dropped by overflow resets, delimiters of lost frames included.
    pub discarded_bytes: u64,
}

/// Reassembles delimiter-terminated frames from arbitrarily split chunks.
///
/// The bytes after the last delimiter seen are kept in a buffer allocated
/// once at `buffer_capacity` bytes. That buffer never holds a delimiter and
/// never grows: a run of unterminated bytes longer than the capacity is
/// dropped as a whole and reported as [`FrameError::Overflow`]. The rest of
/// that message is skipped up to and including its delimiter, whichever call
/// it arrives in.
///
/// Owned by a single reader; it is never shared between threads.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    capacity: usize,
    delimiter: u8,
    discarding: bool,
    stats: AssemblerStats,
}

impl FrameAssembler {
    /// Create an assembler from a frame configuration.
    pub fn new(config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: &FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.buffer_capacity),
            capacity: config.buffer_capacity,
            delimiter: config.delimiter,
            discarding: false,
            stats: AssemblerStats::default(),
        }
    }

    /// Create an assembler with the default delimiter and the given capacity.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(&FrameConfig {
            buffer_capacity: capacity,
            delimiter: DEFAULT_DELIMITER,
            ..FrameConfig::default()
        })
    }

    /// Feed one chunk from the link.
    ///
    /// Every frame completed by this chunk is appended to `out` in delimiter
    /// order and the number appended is returned. If some unterminated run
    /// outgrew the buffer, the call still appends every frame it completed,
    /// before and after the overflow point, then returns
    /// [`FrameError::Overflow`] summing the bytes dropped.
    ///
    /// An overflowed message is lost whole: its remaining bytes are dropped
    /// up to and including the next delimiter, even when that delimiter
    /// arrives in a later call. Those bytes count towards
    /// `discarded_bytes` but not towards a new overflow.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<Frame>) -> Result<usize> {
        self.stats.bytes_in = self.stats.bytes_in.saturating_add(chunk.len() as u64);

        let mut emitted = 0usize;
        let mut discarded = 0usize;
        let mut rest = chunk;

        while !rest.is_empty() {
            let (segment, terminated) = match rest.iter().position(|&b| b == self.delimiter) {
                Some(pos) => {
                    let segment = &rest[..pos];
                    rest = &rest[pos + 1..];
                    (segment, true)
                }
                None => {
                    let segment = rest;
                    rest = &[];
                    (segment, false)
                }
            };

            if self.discarding {
                let dropped = segment.len() + usize::from(terminated);
                self.stats.discarded_bytes =
                    self.stats.discarded_bytes.saturating_add(dropped as u64);
                self.discarding = !terminated;
                continue;
            }

            if self.buf.len() + segment.len() > self.capacity {
                let dropped = self.buf.len() + segment.len() + usize::from(terminated);
                self.record_overflow(dropped);
                self.discarding = !terminated;
                discarded += dropped;
                continue;
            }

            if terminated {
                out.push(Frame::new(self.take_frame(segment)));
                emitted += 1;
            } else {
                self.buf.extend_from_slice(segment);
            }
        }

        self.stats.frames = self.stats.frames.saturating_add(emitted as u64);
        trace!(
            chunk = chunk.len(),
            frames = emitted,
            pending = self.buf.len(),
            "chunk assembled"
        );

        if discarded > 0 {
            return Err(FrameError::Overflow {
                discarded,
                capacity: self.capacity,
            });
        }
        Ok(emitted)
    }

    /// Feed a chunk and collect its frames, surfacing overflow alongside them.
    pub fn feed_collect(&mut self, chunk: &[u8]) -> (Vec<Frame>, Option<FrameError>) {
        let mut frames = Vec::new();
        let err = self.feed(chunk, &mut frames).err();
        (frames, err)
    }

    /// Bytes received after the last delimiter, not yet part of a frame.
    pub fn pending(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Drop any pending bytes without counting an overflow. Input after a
    /// reset starts a fresh frame, even in the middle of a lost message.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Whether the rest of an overflowed message is still being skipped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Fixed accumulation buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The byte that terminates frames.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Running totals.
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    fn take_frame(&mut self, tail: &[u8]) -> Bytes {
        if self.buf.is_empty() {
            return Bytes::copy_from_slice(tail);
        }
        // Copy out rather than split so the buffer keeps its one allocation.
        let mut payload = BytesMut::with_capacity(self.buf.len() + tail.len());
        payload.extend_from_slice(&self.buf);
        payload.extend_from_slice(tail);
        self.buf.clear();
        payload.freeze()
    }

    fn record_overflow(&mut self, dropped: usize) {
        self.buf.clear();
        self.stats.overflows = self.stats.overflows.saturating_add(1);
        self.stats.discarded_bytes = self.stats.discarded_bytes.saturating_add(dropped as u64);
        warn!(
            discarded = dropped,
            capacity = self.capacity,
            "frame buffer overflow; partial frame dropped"
        );
    }
}
