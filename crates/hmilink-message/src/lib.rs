//! Controller message grammar for panel screens.
//!
//! The transport delivers frames without looking inside them. Screens that
//! need the values use this crate: a frame such as
//! `DATA:T1=21.5;VOL=120;ERR=0x04;` parses into a [`Message`] with a kind
//! and ordered `key=value` fields, and a [`Snapshot`] keeps the latest value
//! of every field so stale values persist across lost frames.
//!
//! Outbound [`Command`] tokens live here as well.

pub mod command;
pub mod config;
pub mod error;
pub mod message;
pub mod snapshot;

pub use command::Command;
pub use config::ParseConfig;
pub use error::{MessageError, Result};
pub use message::{Message, MessageKind};
pub use snapshot::Snapshot;
