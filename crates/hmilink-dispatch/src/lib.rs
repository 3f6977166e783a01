//! Frame fan-out for panel screens.
//!
//! A [`HandlerRegistry`] holds a fixed number of consumer slots. The
//! [`IngestTask`] reads frames from the link on its own thread and publishes
//! each one to every registered consumer, in slot order, while other threads
//! register and unregister screens.

pub mod error;
pub mod ingest;
pub mod registry;

pub use error::{DispatchError, RegistryError, Result};
pub use ingest::{IngestConfig, IngestExit, IngestHandle, IngestReport, IngestTask};
pub use registry::{
    ConsumerId, DispatchStats, FrameConsumer, HandlerRegistry, RegistryConfig,
    DEFAULT_SLOT_COUNT,
};
