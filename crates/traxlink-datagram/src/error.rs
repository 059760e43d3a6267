use crate::component::{Axis, Component};
use crate::float::FloatReject;

/// Errors from the command and capture paths around the parser.
#[derive(Debug, thiserror::Error)]
pub enum DatagramError {
    /// A packet frame must contain at least its frame id.
    #[error("empty packet frame")]
    EmptyFrame,

    /// The packet frame exceeds what the 16-bit length field may describe.
    #[error("packet frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing datagrams.
    #[error("datagram I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source ended before another valid datagram arrived.
    #[error("connection closed (no further datagram)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, DatagramError>;

/// Why the parser discarded a datagram in progress.
///
/// Never returned from `feed`; surfaced through `tracing` and the parser
/// counters.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("unrecognized component id {0:#04x}")]
    UnknownComponent(u8),

    #[error("{0} component repeated")]
    DuplicateComponent(Component),

    #[error("component missing (seen mask {seen:#06b})")]
    MissingComponent { seen: u8 },

    #[error("{axis} angle rejected: {reason}")]
    InvalidAngle { axis: Axis, reason: FloatReject },

    #[error("{axis} angle {degrees} out of range")]
    OutOfRange { axis: Axis, degrees: f32 },

    #[error("checksum mismatch (residue {0:#06x})")]
    ChecksumMismatch(u16),
}
