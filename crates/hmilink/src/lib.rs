//! Serial link framing and frame fan-out for touch-panel HMIs.
//!
//! A controller streams newline-terminated messages to the panel in
//! arbitrary chunks. hmilink reassembles them with bounded memory and hands
//! every complete frame to each screen that is currently listening.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial device and Unix-socket links
//! - [`frame`]: frame reassembly, frame reader and command writer
//! - [`dispatch`]: consumer registry and ingest thread (behind `dispatch` feature)
//! - [`message`]: `DATA:`/`SETTINGS:`/`PARAM` grammar and command tokens
//!   (behind `message` feature)

/// Re-export transport types.
pub mod transport {
    pub use hmilink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use hmilink_frame::*;
}

/// Re-export dispatch types (requires `dispatch` feature).
#[cfg(feature = "dispatch")]
pub mod dispatch {
    pub use hmilink_dispatch::*;
}

/// Re-export message types (requires `message` feature).
#[cfg(feature = "message")]
pub mod message {
    pub use hmilink_message::*;
}
