use std::io::{ErrorKind, Read};

use crate::component::AttitudeSample;
use crate::error::{DatagramError, Result};
use crate::parser::{DatagramParser, ParserConfig, ParserStats};
use crate::store::Latest;

const READ_CHUNK_SIZE: usize = 512;

/// Reads validated samples from any `Read` stream.
///
/// Blocking counterpart of the receive thread: bytes are pulled in chunks and
/// fed to a parser until a datagram completes. Garbage and corrupted
/// datagrams are skipped.
pub struct SampleReader<T> {
    inner: T,
    parser: DatagramParser<Latest>,
    chunk: [u8; READ_CHUNK_SIZE],
    pos: usize,
    len: usize,
}

impl<T: Read> SampleReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ParserConfig::default())
    }

    pub fn with_config(inner: T, config: ParserConfig) -> Self {
        Self {
            inner,
            parser: DatagramParser::with_config(Latest::new(), config),
            chunk: [0; READ_CHUNK_SIZE],
            pos: 0,
            len: 0,
        }
    }

    /// Read the next valid sample (blocking).
    ///
    /// Returns `Err(DatagramError::ConnectionClosed)` when EOF is reached.
    pub fn read_sample(&mut self) -> Result<AttitudeSample> {
        loop {
            while self.pos < self.len {
                let byte = self.chunk[self.pos];
                self.pos += 1;
                if self.parser.feed(byte) {
                    if let Some(sample) = self.parser.sink_mut().take() {
                        return Ok(sample);
                    }
                }
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(DatagramError::Io(err)),
            };

            if read == 0 {
                return Err(DatagramError::ConnectionClosed);
            }

            self.pos = 0;
            self.len = read;
        }
    }

    /// Parser counters so far.
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
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

impl<T: Read> Iterator for SampleReader<T> {
    type Item = Result<AttitudeSample>;

    /// Ends cleanly at EOF; other errors are yielded once.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_sample() {
            Err(DatagramError::ConnectionClosed) => None,
            other => Some(other),
        }
    }
}
