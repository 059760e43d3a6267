use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::debug;

use crate::command::{encode_frame, Command, MAX_FRAME_LEN, OVERHEAD};
use crate::error::{DatagramError, Result};

/// Writes framed commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> CommandWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_LEN + OVERHEAD),
        }
    }

    /// Encode and send one command (blocking).
    pub fn send(&mut self, command: Command) -> Result<()> {
        self.buf.clear();
        command.encode(&mut self.buf)?;
        debug!(command = command.name(), "sending command");
        self.write_buf()
    }

    /// Frame and send a raw packet frame (frame id followed by payload).
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &mut self.buf)?;
        self.write_buf()
    }

    /// Request the heading/pitch/roll/status component set and start
    /// continuous output.
    pub fn start_continuous(&mut self) -> Result<()> {
        self.send(Command::SetDataComponents)?;
        self.send(Command::StartContinuousMode)
    }

    fn write_buf(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(DatagramError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DatagramError::Io(err)),
            }
        }

        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DatagramError::Io(err)),
            }
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}
