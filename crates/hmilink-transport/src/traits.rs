use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// What kind of endpoint a [`LinkStream`] is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A serial device node (e.g. `/dev/ttyUSB0`).
    Device,
    /// A Unix domain socket standing in for the serial line.
    Unix,
}

impl LinkKind {
    /// Short name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Device => "device",
            LinkKind::Unix => "unix",
        }
    }
}

/// A connected link to the controller, implementing `Read` and `Write`.
///
/// Reads honour the configured read timeout on both link kinds. A read that
/// times out fails with `ErrorKind::TimedOut` (device) or
/// `ErrorKind::WouldBlock` (socket); neither means the link is broken.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    #[cfg(unix)]
    Device(crate::device::DeviceLink),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(device) => device.read(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(device) => device.write(buf),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(device) => device.flush(),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    /// Open a serial device node for reading and writing.
    ///
    /// The line discipline (speed, parity, raw mode) must already be set up.
    #[cfg(unix)]
    pub fn open_device(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let device = crate::device::DeviceLink::open(path)?;
        Ok(Self {
            inner: LinkStreamInner::Device(device),
        })
    }

    /// Connect to a simulated link listening on a Unix domain socket.
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Self> {
        crate::uds::connect(path)
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// The kind of endpoint this link is attached to.
    pub fn kind(&self) -> LinkKind {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(_) => LinkKind::Device,
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => LinkKind::Unix,
        }
    }

    /// Set the read timeout. `None` blocks until data arrives.
    ///
    /// A zero duration is rejected with `ErrorKind::InvalidInput`.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(device) => device.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set the write timeout. Device links write blocking and ignore it.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(_) => Ok(()),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this link (creates a new file descriptor).
    ///
    /// Used to split one link into an ingest half and a command half.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Device(device) => Ok(Self {
                inner: LinkStreamInner::Device(device.try_clone()?),
            }),
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("kind", &self.kind().as_str())
            .finish()
    }
}
