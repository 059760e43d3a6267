use std::path::PathBuf;

/// Errors that can occur while opening or reading a sensor byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The device opened but its line settings could not be applied.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested baud rate is not one the sensor supports.
    #[error("unsupported baud rate {0} (expected one of 2400, 4800, 9600, 19200, 38400, 57600, 115200)")]
    UnsupportedBaud(u32),

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer hung up or the device went away.
    #[error("byte source closed")]
    Closed,

    /// `start` was called while a receive thread is already attached.
    #[error("receive thread already running")]
    AlreadyRunning,

    /// The receive thread could not be spawned.
    #[error("failed to spawn receive thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
