use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Line feed terminates every inbound message.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Default accumulation buffer capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Default number of bytes requested from the link per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 128;

/// Default link read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// One complete inbound message, delimiter stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The exact bytes between two delimiters.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Raw frame content.
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_ref()
    }

    /// Frame content as text, if it is valid UTF-8.
    pub fn as_str(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.payload.as_ref())
    }

    /// Frame content as text, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.payload.as_ref())
    }

    /// Content length in bytes, delimiter excluded.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for a frame that was only a delimiter.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<&'static str> for Frame {
    fn from(text: &'static str) -> Self {
        Self::new(Bytes::from_static(text.as_bytes()))
    }
}

/// Configuration for frame assembly and link I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum unterminated bytes held between reads. Default: 512.
    pub buffer_capacity: usize,
    /// Bytes requested from the link per read. Default: 128.
    pub read_chunk_size: usize,
    /// Byte that terminates a frame. Default: `\n`.
    pub delimiter: u8,
    /// Read timeout for blocking link reads. Default: 1 s.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking link writes.
    pub write_timeout: Option<Duration>,
}

impl FrameConfig {
    /// Reject values that would make the assembler or reader unusable.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(FrameError::InvalidConfig(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(FrameError::InvalidConfig(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(FrameError::InvalidConfig(
                "read_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            delimiter: DEFAULT_DELIMITER,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            write_timeout: None,
        }
    }
}
