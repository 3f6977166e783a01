//! Newline-delimited frame reassembly for the panel's serial link.
//!
//! The controller sends ASCII messages terminated by a line feed, but the
//! link hands them over in arbitrary chunks. This crate turns those chunks
//! back into whole frames:
//! - [`FrameAssembler`] keeps the unterminated tail in a fixed-capacity
//!   buffer and resets it when a message outgrows that capacity
//! - [`FrameReader`] drives an assembler from any `Read` with a bounded
//!   read timeout
//! - [`CommandWriter`] writes outbound command tokens, which are not framed
//!
//! Frame content is never interpreted here.

pub mod assembler;
pub mod error;
pub mod frame;
pub mod reader;
pub mod writer;

pub use assembler::{AssemblerStats, FrameAssembler};
pub use error::{FrameError, Result};
pub use frame::{
    Frame, FrameConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_DELIMITER, DEFAULT_READ_CHUNK_SIZE,
    DEFAULT_READ_TIMEOUT,
};
pub use reader::FrameReader;
pub use writer::CommandWriter;
