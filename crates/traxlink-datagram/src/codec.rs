use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::component::AttitudeSample;
use crate::error::DatagramError;
use crate::parser::{DatagramParser, ParserConfig, ParserStats};
use crate::store::Latest;

/// `tokio_util` codec: decodes attitude samples, encodes setup commands.
///
/// Parser state carries across `decode` calls, so a datagram split over
/// several reads is still found. Bytes are consumed as they are parsed.
pub struct AttitudeCodec {
    parser: DatagramParser<Latest>,
}

impl AttitudeCodec {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            parser: DatagramParser::with_config(Latest::new(), config),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }
}

impl Default for AttitudeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AttitudeCodec {
    type Item = AttitudeSample;
    type Error = DatagramError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<AttitudeSample>, DatagramError> {
        let mut consumed = 0;
        let mut sample = None;
        for &byte in src.iter() {
            consumed += 1;
            if self.parser.feed(byte) {
                sample = self.parser.sink_mut().take();
                break;
            }
        }
        src.advance(consumed);
        Ok(sample)
    }
}

impl Encoder<Command> for AttitudeCodec {
    type Error = DatagramError;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), DatagramError> {
        command.encode(dst)
    }
}
