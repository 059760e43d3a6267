use std::fmt;
use std::io;

use traxlink_datagram::DatagramError;
use traxlink_transport::TransportError;

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. } | TransportError::Configure { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedBaud(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn datagram_error(context: &str, err: DatagramError) -> CliError {
    match err {
        DatagramError::Io(source) => io_error(context, source),
        DatagramError::EmptyFrame | DatagramError::FrameTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        DatagramError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_on_open_maps_to_50() {
        let err = TransportError::Open {
            path: "/dev/ttyS0".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open failed", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn missing_device_maps_to_transport_error() {
        let err = TransportError::Open {
            path: "/dev/ttyNOPE".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let cli = transport_error("open failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("open failed: "));
    }

    #[test]
    fn bad_baud_is_usage() {
        let cli = transport_error("open failed", TransportError::UnsupportedBaud(1));
        assert_eq!(cli.code, USAGE);
    }

    #[test]
    fn closed_capture_is_failure() {
        let cli = datagram_error("read failed", DatagramError::ConnectionClosed);
        assert_eq!(cli.code, FAILURE);
    }

    #[test]
    fn oversized_frame_is_data_invalid() {
        let err = DatagramError::FrameTooLarge {
            size: 5000,
            max: 4092,
        };
        assert_eq!(datagram_error("frame failed", err).code, DATA_INVALID);
    }
}
