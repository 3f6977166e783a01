//! Serial link abstraction for the panel transport.
//!
//! The panel talks to its controller over a single byte stream. On the target
//! that stream is a serial device node configured ahead of time (speed and
//! pins are not managed here). On a host it can be a Unix domain socket,
//! which lets a simulated controller stand in for the real one.
//!
//! This is the lowest layer of hmilink. Framing and dispatch build on the
//! [`LinkStream`] type provided here.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use traits::{LinkKind, LinkStream};

#[cfg(unix)]
pub use uds::LinkListener;
