/// Errors that can occur while assembling, reading, or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Unterminated bytes outgrew the accumulation buffer and were dropped.
    ///
    /// Routine on a noisy link: the assembler is already reset and framing
    /// continues with the next byte.
    #[error("frame buffer overflow ({discarded} bytes discarded, capacity {capacity})")]
    Overflow { discarded: usize, capacity: usize },

    /// An I/O error occurred while reading or writing the link.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link reached end of stream.
    #[error("link closed")]
    ConnectionClosed,

    /// A frame configuration value is unusable.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),
}

impl FrameError {
    /// True for conditions the ingest loop recovers from without intervention.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::Overflow { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
