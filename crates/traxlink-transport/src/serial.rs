use std::fs::File;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::SerialStream;

/// Baud rates the sensor can be switched to.
pub const SUPPORTED_BAUDS: [u32; 7] = [2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Factory default line rate of the sensor.
pub const DEFAULT_BAUD: u32 = 38_400;

/// Quiet period after which a partial datagram is abandoned.
pub const DEFAULT_INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(100);

// serialport has no "wait forever"; a day of silence stands in for it.
pub(crate) const BLOCKING_READ_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Line settings applied when a serial device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line rate in bits per second. Must be one of [`SUPPORTED_BAUDS`].
    pub baud: u32,
    /// Read timeout between bytes. `None` blocks indefinitely.
    pub inter_byte_timeout: Option<Duration>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            inter_byte_timeout: Some(DEFAULT_INTER_BYTE_TIMEOUT),
        }
    }
}

impl SerialConfig {
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    pub fn with_inter_byte_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inter_byte_timeout = timeout;
        self
    }
}

/// Open a serial device in raw 8N1 mode without flow control.
///
/// Anything that is not a character device (a capture file or a FIFO, say)
/// is opened read-only as a capture: reads block and end-of-file reports
/// [`TransportError::Closed`], and writes are refused.
pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<SerialStream> {
    let path = path.as_ref();
    check_baud(config.baud)?;

    let open_error = |source| TransportError::Open {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(open_error)?;
    if !metadata.file_type().is_char_device() {
        debug!(?path, "not a character device; opening as a read-only capture");
        let file = File::open(path).map_err(open_error)?;
        return Ok(SerialStream::from_capture(file));
    }

    let mut port = serialport::new(path.to_string_lossy(), config.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(read_timeout(config.inter_byte_timeout))
        .open_native()
        .map_err(|err| open_error(err.into()))?;

    // Drop whatever arrived before the line was configured.
    port.clear(ClearBuffer::Input)
        .map_err(|err| TransportError::Configure {
            path: path.to_path_buf(),
            source: err.into(),
        })?;

    info!(?path, baud = config.baud, "opened serial device");
    Ok(SerialStream::from_port(port))
}

fn check_baud(baud: u32) -> Result<()> {
    if SUPPORTED_BAUDS.contains(&baud) {
        Ok(())
    } else {
        Err(TransportError::UnsupportedBaud(baud))
    }
}

pub(crate) fn read_timeout(timeout: Option<Duration>) -> Duration {
    timeout.unwrap_or(BLOCKING_READ_TIMEOUT)
}

pub(crate) fn set_port_timeout(port: &mut TTYPort, timeout: Option<Duration>) -> Result<()> {
    port.set_timeout(read_timeout(timeout))
        .map_err(|err| TransportError::Io(err.into()))
}
