//! Incremental parser for kGetDataResp datagrams.
//!
//! ```text
//! ┌──────────┬──────────┬─────────┬──────────────────────────────┬──────────┐
//! │ Length   │ Frame ID │ Count   │ 4 × (id, f32 BE │ status u8) │ CRC-16   │
//! │ 2B BE =23│ 0x05     │ 0x04    │ heading/pitch/roll/status    │ 2B BE    │
//! └──────────┴──────────┴─────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! The first four bytes never change, so they double as a sync word: the
//! parser slides a four-byte window over the stream until it sees them, then
//! decodes components in whatever order they arrive. Any violation drops the
//! datagram and goes back to searching, starting with the next byte.

use tracing::{debug, trace};

use crate::command::GET_DATA_RESP;
use crate::component::{Axis, Component, ALL_COMPONENTS};
use crate::crc;
use crate::error::Rejection;
use crate::float::{AngleAssembler, FloatDecode};
use crate::store::SampleSink;

/// Number of components in an accepted datagram.
pub const COMPONENT_COUNT: u8 = 4;

/// Total length of an accepted datagram, CRC included.
pub const DATAGRAM_LEN: u16 = 23;

/// Fixed leading bytes: length, frame id, component count.
pub const PREAMBLE: [u8; 4] = [
    DATAGRAM_LEN.to_be_bytes()[0],
    DATAGRAM_LEN.to_be_bytes()[1],
    GET_DATA_RESP,
    COMPONENT_COUNT,
];

const PREAMBLE_WORD: u32 = u32::from_be_bytes(PREAMBLE);
const PREAMBLE_CRC: u16 = crc::checksum(&PREAMBLE);

// Cannot match PREAMBLE, whose first byte is zero.
const WINDOW_CLEAR: u32 = u32::MAX;

/// Optional plausibility check on decoded angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeCheck {
    /// Accept any finite normal value.
    #[default]
    Off,
    /// Drop datagrams with an angle outside its axis range.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    pub float_decode: FloatDecode,
    pub range_check: RangeCheck,
}

/// Running counters, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserStats {
    /// Datagrams that passed every check and were committed.
    pub accepted: u64,
    /// Datagrams dropped on a nonzero CRC residue.
    pub checksum_errors: u64,
    /// Datagrams dropped for a grammar or value violation.
    pub protocol_errors: u64,
    /// Bytes consumed while searching for a preamble.
    pub sync_bytes: u64,
    /// Calls to `reset`.
    pub resets: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sync,
    ComponentId,
    Angle { axis: Axis, index: u8 },
    HeadingStatus,
    CrcHigh,
    CrcLow,
}

/// Byte-at-a-time datagram parser writing into a [`SampleSink`].
///
/// `feed` never blocks and does constant work per byte. The sink's slot may
/// hold a partially overwritten sample after a dropped datagram; only
/// `commit` marks it complete.
pub struct DatagramParser<K> {
    sink: K,
    config: ParserConfig,
    state: State,
    window: u32,
    crc: u16,
    seen: u8,
    decoded: u8,
    angle: AngleAssembler,
    stats: ParserStats,
}

impl<K: SampleSink> DatagramParser<K> {
    pub fn new(sink: K) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    pub fn with_config(sink: K, config: ParserConfig) -> Self {
        Self {
            sink,
            config,
            state: State::Sync,
            window: WINDOW_CLEAR,
            crc: crc::INIT,
            seen: 0,
            decoded: 0,
            angle: AngleAssembler::new(config.float_decode),
            stats: ParserStats::default(),
        }
    }

    /// Consume one byte. Returns `true` exactly when this byte completed a
    /// valid datagram, which has then been committed to the sink.
    pub fn feed(&mut self, byte: u8) -> bool {
        match self.step(byte) {
            Ok(completed) => completed,
            Err(rejection) => {
                self.reject(rejection);
                false
            }
        }
    }

    /// Feed a run of bytes. Returns how many datagrams completed.
    pub fn feed_all(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&byte| self.feed(byte)).count()
    }

    /// Abandon any datagram in progress and search for the next preamble.
    pub fn reset(&mut self) {
        self.stats.resets += 1;
        self.enter_sync();
    }

    /// Whether a preamble has been matched and a datagram is in progress.
    pub fn in_datagram(&self) -> bool {
        self.state != State::Sync
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    fn step(&mut self, byte: u8) -> Result<bool, Rejection> {
        match self.state {
            State::Sync => {
                self.stats.sync_bytes += 1;
                self.window = (self.window << 8) | u32::from(byte);
                if self.window == PREAMBLE_WORD {
                    self.begin_datagram();
                }
            }
            State::ComponentId => {
                let component =
                    Component::from_id(byte).ok_or(Rejection::UnknownComponent(byte))?;
                if self.seen & component.mask() != 0 {
                    return Err(Rejection::DuplicateComponent(component));
                }
                self.seen |= component.mask();
                self.crc = crc::update(self.crc, byte);
                self.state = match component.axis() {
                    Some(axis) => {
                        self.angle = AngleAssembler::new(self.config.float_decode);
                        State::Angle { axis, index: 0 }
                    }
                    None => State::HeadingStatus,
                };
            }
            State::Angle { axis, index } => {
                self.crc = crc::update(self.crc, byte);
                let decoded = self
                    .angle
                    .push(index, byte)
                    .map_err(|reason| Rejection::InvalidAngle { axis, reason })?;
                match decoded {
                    None => self.state = State::Angle { axis, index: index + 1 },
                    Some(degrees) => {
                        if self.config.range_check == RangeCheck::Reject && !axis.in_range(degrees)
                        {
                            return Err(Rejection::OutOfRange { axis, degrees });
                        }
                        self.sink.slot().set_attitude(axis, degrees);
                        self.component_done()?;
                    }
                }
            }
            State::HeadingStatus => {
                self.crc = crc::update(self.crc, byte);
                self.sink.slot().heading_status = byte;
                self.component_done()?;
            }
            State::CrcHigh => {
                self.crc = crc::update(self.crc, byte);
                self.state = State::CrcLow;
            }
            State::CrcLow => {
                let residue = crc::update(self.crc, byte);
                if residue != 0 {
                    return Err(Rejection::ChecksumMismatch(residue));
                }
                self.sink.commit();
                self.stats.accepted += 1;
                trace!(accepted = self.stats.accepted, "datagram accepted");
                self.enter_sync();
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn component_done(&mut self) -> Result<(), Rejection> {
        self.decoded += 1;
        if self.decoded < COMPONENT_COUNT {
            self.state = State::ComponentId;
            return Ok(());
        }
        if self.seen != ALL_COMPONENTS {
            return Err(Rejection::MissingComponent { seen: self.seen });
        }
        self.state = State::CrcHigh;
        Ok(())
    }

    fn begin_datagram(&mut self) {
        self.state = State::ComponentId;
        self.crc = PREAMBLE_CRC;
        self.seen = 0;
        self.decoded = 0;
    }

    fn enter_sync(&mut self) {
        self.state = State::Sync;
        self.window = WINDOW_CLEAR;
    }

    fn reject(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::ChecksumMismatch(_) => self.stats.checksum_errors += 1,
            _ => self.stats.protocol_errors += 1,
        }
        debug!(reason = %rejection, "datagram discarded");
        self.enter_sync();
    }
}

#[cfg(unix)]
impl<K> traxlink_transport::ByteHandler for DatagramParser<K>
where
    K: SampleSink + Send + 'static,
{
    fn on_byte(&mut self, byte: u8) -> bool {
        self.feed(byte)
    }

    fn on_silence(&mut self) {
        if self.in_datagram() {
            debug!("inter-byte silence; abandoning partial datagram");
            self.reset();
        } else {
            // A partial preamble in the window is as stale as a partial datagram.
            self.enter_sync();
        }
    }

    fn on_error(&mut self, error: &traxlink_transport::TransportError) {
        debug!(%error, "transport error; resetting parser");
        self.reset();
    }
}
