//! Byte source for a TRAX attitude sensor.
//!
//! Provides the pieces a datagram parser needs from the outside world:
//! - [`SerialStream`]: a blocking read/write stream over a serial port, a
//!   read-only capture file, or a socket pair for loopback use
//! - [`serial::open`]: port opener that applies raw 8N1 line settings
//! - [`Receiver`]: a dedicated thread that pulls bytes and hands them to a
//!   [`ByteHandler`] one at a time
//!
//! Nothing here knows the datagram format. The parser lives in
//! `traxlink-datagram` and plugs in through [`ByteHandler`].

pub mod error;
#[cfg(unix)]
pub mod receiver;
#[cfg(unix)]
pub mod serial;
#[cfg(unix)]
pub mod stream;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use receiver::{ByteHandler, ReceiveStats, Receiver, Stopped};
#[cfg(unix)]
pub use serial::{SerialConfig, DEFAULT_BAUD, DEFAULT_INTER_BYTE_TIMEOUT, SUPPORTED_BAUDS};
#[cfg(unix)]
pub use stream::SerialStream;
