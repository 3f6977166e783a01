//! Serial device node access with bounded reads.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

const NO_TIMEOUT: u64 = u64::MAX;

/// An open serial device node.
///
/// `std::fs::File` has no read timeout, so reads wait on `poll(2)` first and
/// fail with `ErrorKind::TimedOut` when nothing arrives in time.
pub(crate) struct DeviceLink {
    file: File,
    /// Read timeout in milliseconds, `NO_TIMEOUT` when unset.
    read_timeout_ms: AtomicU64,
}

impl DeviceLink {
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, "opened serial device");
        Ok(Self {
            file,
            read_timeout_ms: AtomicU64::new(NO_TIMEOUT),
        })
    }

    pub(crate) fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        let millis = match timeout {
            Some(timeout) if timeout.is_zero() => {
                return Err(std::io::Error::new(
                    ErrorKind::InvalidInput,
                    "cannot set a 0 duration timeout",
                ));
            }
            // Sub-millisecond timeouts round up so they never mean "forever".
            Some(timeout) => u64::try_from(timeout.as_millis())
                .unwrap_or(NO_TIMEOUT - 1)
                .clamp(1, NO_TIMEOUT - 1),
            None => NO_TIMEOUT,
        };
        self.read_timeout_ms.store(millis, Ordering::Relaxed);
        Ok(())
    }

    pub(crate) fn try_clone(&self) -> std::io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            read_timeout_ms: AtomicU64::new(self.read_timeout_ms.load(Ordering::Relaxed)),
        })
    }

    fn wait_readable(&self) -> std::io::Result<bool> {
        let millis = self.read_timeout_ms.load(Ordering::Relaxed);
        let timeout: libc::c_int = if millis == NO_TIMEOUT {
            -1
        } else {
            libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
        };

        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // SAFETY: `pfd` is a valid, writable pollfd for the duration of the
        // call and the count passed is exactly one. The descriptor is owned
        // by `self.file` and stays open while we borrow it.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(rc > 0)
    }
}

impl Read for DeviceLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.wait_readable()? {
            return Err(std::io::Error::from(ErrorKind::TimedOut));
        }
        self.file.read(buf)
    }
}

impl Write for DeviceLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo_path(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hmilink-dev-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("link.fifo");
        let _ = std::fs::remove_file(&path);
        let c_path = std::ffi::CString::new(path.as_os_str().as_encoded_bytes()).unwrap();
        // SAFETY: `c_path` is a valid NUL-terminated path string.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo failed");
        path
    }

    #[test]
    fn open_missing_device_reports_path() {
        let err = DeviceLink::open("/nonexistent/hmilink/ttyFAKE").err().unwrap();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/hmilink/ttyFAKE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_times_out_without_data() {
        let path = fifo_path("timeout");
        // Opening a FIFO read/write never blocks and keeps a writer attached,
        // so poll sees no data rather than a hangup.
        let mut link = DeviceLink::open(&path).unwrap();
        link.set_read_timeout(Some(Duration::from_millis(20))).unwrap();

        let mut buf = [0u8; 16];
        let err = link.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_returns_written_bytes() {
        let path = fifo_path("loop");
        let mut link = DeviceLink::open(&path).unwrap();
        link.set_read_timeout(Some(Duration::from_millis(500))).unwrap();

        link.write_all(b"DATA:T1=1;\n").unwrap();
        let mut buf = [0u8; 32];
        let n = link.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"DATA:T1=1;\n");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn zero_timeout_rejected() {
        let path = fifo_path("zero");
        let link = DeviceLink::open(&path).unwrap();
        let err = link.set_read_timeout(Some(Duration::ZERO)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn clone_keeps_timeout() {
        let path = fifo_path("clone");
        let link = DeviceLink::open(&path).unwrap();
        link.set_read_timeout(Some(Duration::from_millis(15))).unwrap();
        let mut clone = link.try_clone().unwrap();

        let mut buf = [0u8; 4];
        let err = clone.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        let _ = std::fs::remove_file(&path);
    }
}
