use bytes::{BufMut, BytesMut};

use crate::component::{AttitudeSample, Component};
use crate::crc;
use crate::error::{DatagramError, Result};
use crate::parser::{COMPONENT_COUNT, DATAGRAM_LEN};

/// Length field (2) + CRC trailer (2).
pub const OVERHEAD: usize = 4;

/// Largest packet frame (frame id + payload) the 16-bit length may carry.
pub const MAX_FRAME_LEN: usize = 4092;

/// kGetData: poll a single data response.
pub const GET_DATA: u8 = 0x04;
/// kGetDataResp: the response carrying the configured components.
pub const GET_DATA_RESP: u8 = 0x05;
/// kSetDataComponents: choose which components responses carry.
pub const SET_DATA_COMPONENTS: u8 = 0x03;
/// kStartContinuousMode: emit responses at the configured interval.
pub const START_CONTINUOUS_MODE: u8 = 0x15;
/// kStopContinuousMode.
pub const STOP_CONTINUOUS_MODE: u8 = 0x16;

/// Setup and polling commands sent to the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request heading, pitch, roll and heading status in every response.
    SetDataComponents,
    StartContinuousMode,
    StopContinuousMode,
    /// Ask for one response (polled mode).
    GetData,
}

impl Command {
    pub fn frame_id(self) -> u8 {
        match self {
            Command::SetDataComponents => SET_DATA_COMPONENTS,
            Command::StartContinuousMode => START_CONTINUOUS_MODE,
            Command::StopContinuousMode => STOP_CONTINUOUS_MODE,
            Command::GetData => GET_DATA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::SetDataComponents => "set-data-components",
            Command::StartContinuousMode => "start-continuous-mode",
            Command::StopContinuousMode => "stop-continuous-mode",
            Command::GetData => "get-data",
        }
    }

    /// Append the framed command to `dst`.
    pub fn encode(self, dst: &mut BytesMut) -> Result<()> {
        match self {
            Command::SetDataComponents => {
                let mut payload = [0u8; 1 + Component::ALL.len()];
                payload[0] = COMPONENT_COUNT;
                for (slot, component) in payload[1..].iter_mut().zip(Component::ALL) {
                    *slot = component.id();
                }
                encode_datagram(self.frame_id(), &payload, dst)
            }
            _ => encode_datagram(self.frame_id(), &[], dst),
        }
    }
}

/// Frame a command for the sensor.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬─────────────────┬──────────────┐
/// │ Length (2B)  │ Frame ID │ Payload         │ CRC-16/XMODEM │
/// │ BE, total    │ (1B)     │ (0..4091 bytes) │ (2B BE)       │
/// └──────────────┴──────────┴─────────────────┴──────────────┘
/// ```
///
/// The length counts every byte, itself and the CRC included.
pub fn encode_datagram(frame_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let frame_len = 1 + payload.len();
    if frame_len > MAX_FRAME_LEN {
        return Err(DatagramError::FrameTooLarge {
            size: frame_len,
            max: MAX_FRAME_LEN,
        });
    }
    let total = frame_len + OVERHEAD;

    let start = dst.len();
    dst.reserve(total);
    dst.put_u16(total as u16);
    dst.put_u8(frame_id);
    dst.put_slice(payload);
    let crc = crc::checksum(&dst[start..]);
    dst.put_u16(crc);
    Ok(())
}

/// Frame `sample` as the kGetDataResp datagram a sensor would send, with
/// components in heading, pitch, roll, status order.
pub fn encode_response(sample: &AttitudeSample, dst: &mut BytesMut) -> Result<()> {
    let mut payload = Vec::with_capacity(usize::from(DATAGRAM_LEN) - OVERHEAD - 1);
    payload.push(COMPONENT_COUNT);
    for component in Component::ALL {
        payload.push(component.id());
        match component.axis() {
            Some(axis) => payload.extend_from_slice(&sample.attitude(axis).to_be_bytes()),
            None => payload.push(sample.heading_status),
        }
    }
    encode_datagram(GET_DATA_RESP, &payload, dst)
}

/// Frame a raw packet frame whose first byte is the frame id.
pub fn encode_frame(frame: &[u8], dst: &mut BytesMut) -> Result<()> {
    let Some((&frame_id, payload)) = frame.split_first() else {
        return Err(DatagramError::EmptyFrame);
    };
    encode_datagram(frame_id, payload, dst)
}
