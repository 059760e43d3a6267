//! Attitude link for PNI TRAX class AHRS sensors.
//!
//! traxlink reads the sensor's continuous-mode datagram stream from a serial
//! line, validates each datagram, and hands the newest attitude reading to a
//! consumer on another thread (or, on a microcontroller, outside the receive
//! interrupt) without blocking the producer.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial byte source and receive thread
//! - [`datagram`]: CRC engine, parser, triple buffer, attitude store and
//!   setup commands
//!
//! # Example
//!
//! ```no_run
//! use traxlink::datagram::{AttitudeStore, Axis, CommandWriter, DatagramParser};
//! use traxlink::transport::{serial, Receiver, SerialConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = serial::open("/dev/ttyUSB0", &SerialConfig::default())?;
//! CommandWriter::new(stream.try_clone()?).start_continuous()?;
//!
//! let (publisher, mut reader) = AttitudeStore::with_lock().split();
//! let mut receiver = Receiver::new(stream);
//! receiver.start(DatagramParser::new(publisher))?;
//!
//! loop {
//!     if reader.update() {
//!         println!("heading {:.1}", reader.attitude(Axis::Yaw));
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use traxlink_transport::*;
}

/// Re-export datagram types.
pub mod datagram {
    pub use traxlink_datagram::*;
}
