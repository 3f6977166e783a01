use std::io::{ErrorKind, Write};

use hmilink_transport::LinkStream;
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::frame::FrameConfig;
use crate::reader::transport_to_frame_error;

/// Writes outbound command tokens to the link.
///
/// Outbound traffic is not framed: tokens such as `STA*` carry their own
/// terminator and are written exactly as given.
pub struct CommandWriter<T> {
    inner: T,
}

impl<T: Write> CommandWriter<T> {
    /// Wrap a link for writing.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write a command token in full, then flush.
    pub fn send(&mut self, command: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < command.len() {
            match self.inner.write(&command[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        debug!(command = %String::from_utf8_lossy(command).escape_debug(), "command sent");

        self.flush()
    }

    /// Flush the underlying link.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner link.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl CommandWriter<LinkStream> {
    /// Create a command writer for a `LinkStream` and apply its write timeout.
    pub fn with_config_link(inner: LinkStream, config: &FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_token_verbatim() {
        let mut writer = CommandWriter::new(Vec::new());
        writer.send(b"STA*").unwrap();
        writer.send(b"ATE0\r\n").unwrap();
        assert_eq!(writer.into_inner(), b"STA*ATE0\r\n");
    }

    #[test]
    fn partial_writes_are_completed() {
        let mut writer = CommandWriter::new(TrickleWriter {
            written: Vec::new(),
            interrupted_once: false,
        });
        writer.send(b"GET_SETTINGS*").unwrap();
        assert_eq!(writer.get_ref().written, b"GET_SETTINGS*");
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut writer = CommandWriter::new(ClosedWriter);
        assert!(matches!(
            writer.send(b"STO*"),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn sends_over_link_stream() {
        use std::io::Read;

        let dir = std::env::temp_dir().join(format!("hmilink-writer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sock_path = dir.join("link.sock");
        let listener = hmilink_transport::LinkListener::bind(&sock_path).unwrap();

        let path_clone = sock_path.clone();
        let panel = std::thread::spawn(move || {
            let link = LinkStream::connect_unix(path_clone).unwrap();
            let mut writer = CommandWriter::with_config_link(link, &FrameConfig::default()).unwrap();
            writer.send(b"RES*").unwrap();
        });

        let mut controller = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        controller.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"RES*");

        panel.join().unwrap();
        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    struct TrickleWriter {
        written: Vec<u8>,
        interrupted_once: bool,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted_once {
                self.interrupted_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(3);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
