//! Datagram layer for TRAX attitude sensors.
//!
//! The sensor streams kGetDataResp datagrams carrying heading, pitch, roll
//! and heading status. This crate:
//! - parses them one byte at a time with resynchronization and
//!   CRC-16/XMODEM validation ([`DatagramParser`])
//! - hands the newest validated sample from the parser to a consumer through
//!   a lock-free-for-the-producer triple buffer ([`AttitudeStore`])
//! - frames the setup commands that put the sensor in continuous mode
//!   ([`Command`], [`CommandWriter`])
//!
//! ```no_run
//! use traxlink_datagram::{AttitudeStore, Axis, DatagramParser};
//!
//! let (publisher, mut reader) = AttitudeStore::with_lock().split();
//! let mut parser = DatagramParser::new(publisher);
//! # let bytes: &[u8] = &[];
//! parser.feed_all(bytes);
//! if reader.update() {
//!     println!("heading {}", reader.attitude(Axis::Yaw));
//! }
//! ```

pub mod command;
pub mod component;
pub mod crc;
pub mod error;
pub mod float;
pub mod parser;
pub mod reader;
pub mod store;
pub mod triple;
pub mod writer;

#[cfg(feature = "async")]
pub mod codec;

pub use command::{encode_datagram, encode_frame, encode_response, Command, MAX_FRAME_LEN};
pub use component::{AttitudeSample, Axis, Component};
pub use error::{DatagramError, Rejection, Result};
pub use float::{FloatDecode, FloatReject};
pub use parser::{DatagramParser, ParserConfig, ParserStats, RangeCheck, PREAMBLE};
pub use reader::SampleReader;
pub use store::{AttitudeStore, Latest, Publisher, Reader, SampleSink};
pub use triple::{Exclusion, InterruptExclusion, InterruptSource, LockExclusion, TripleBuffer};
pub use writer::CommandWriter;

#[cfg(feature = "async")]
pub use codec::AttitudeCodec;
