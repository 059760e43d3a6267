use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use serialport::TTYPort;

use crate::error::{Result, TransportError};

/// A connected sensor byte stream, implementing Read + Write.
///
/// Wraps a serial port, a read-only capture file, or one end of a Unix
/// socket pair. The socket form carries the same bytes a tty would and is
/// what tests and loopback tooling use in place of real hardware.
pub struct SerialStream {
    inner: SerialStreamInner,
}

enum SerialStreamInner {
    Port(TTYPort),
    Capture(File),
    Socket(UnixStream),
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Port(port) => port.read(buf),
            SerialStreamInner::Capture(file) => file.read(buf),
            SerialStreamInner::Socket(stream) => stream.read(buf),
        }
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Port(port) => port.write(buf),
            SerialStreamInner::Capture(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "capture files are read-only",
            )),
            SerialStreamInner::Socket(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            SerialStreamInner::Port(port) => port.flush(),
            SerialStreamInner::Capture(_) => Ok(()),
            SerialStreamInner::Socket(stream) => stream.flush(),
        }
    }
}

impl SerialStream {
    pub(crate) fn from_port(port: TTYPort) -> Self {
        Self {
            inner: SerialStreamInner::Port(port),
        }
    }

    pub(crate) fn from_capture(file: File) -> Self {
        Self {
            inner: SerialStreamInner::Capture(file),
        }
    }

    /// Wrap one end of a Unix socket.
    pub fn from_unix(stream: UnixStream) -> Self {
        Self {
            inner: SerialStreamInner::Socket(stream),
        }
    }

    /// Create a connected pair of streams.
    ///
    /// Bytes written to one end are read from the other, which makes the pair
    /// a stand-in for a sensor on the far side of a serial line.
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Self::from_unix(a), Self::from_unix(b)))
    }

    /// Read a single byte.
    ///
    /// Returns `Ok(None)` when the inter-byte timeout elapsed without data and
    /// `Err(TransportError::Closed)` when the other end is gone or a capture
    /// is exhausted.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.read(&mut byte) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Set how long a read waits for the next byte before reporting silence.
    ///
    /// `None` blocks until data arrives. Captures never time out.
    pub fn set_inter_byte_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            SerialStreamInner::Port(port) => crate::serial::set_port_timeout(port, timeout),
            SerialStreamInner::Capture(_) => Ok(()),
            SerialStreamInner::Socket(stream) => {
                stream.set_read_timeout(timeout).map_err(Into::into)
            }
        }
    }

    /// Set write timeout. Ignored on a serial port, where writes drain at
    /// line rate.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            SerialStreamInner::Port(_) | SerialStreamInner::Capture(_) => Ok(()),
            SerialStreamInner::Socket(stream) => {
                stream.set_write_timeout(timeout).map_err(Into::into)
            }
        }
    }

    /// Whether setup commands can be sent on this stream. Captures are
    /// replayed, not driven.
    pub fn accepts_commands(&self) -> bool {
        !matches!(self.inner, SerialStreamInner::Capture(_))
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The receive thread owns one handle while setup commands go out on a
    /// clone.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            SerialStreamInner::Port(port) => Ok(Self::from_port(
                port.try_clone_native()
                    .map_err(|err| TransportError::Io(err.into()))?,
            )),
            SerialStreamInner::Capture(file) => Ok(Self::from_capture(file.try_clone()?)),
            SerialStreamInner::Socket(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Transport name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            SerialStreamInner::Port(_) => "tty",
            SerialStreamInner::Capture(_) => "capture",
            SerialStreamInner::Socket(_) => "socket",
        }
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("type", &self.kind())
            .finish()
    }
}
