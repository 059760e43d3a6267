//! Decoding of the big-endian IEEE754 binary32 angles on the wire.
//!
//! Two strategies produce identical results:
//! - [`FloatDecode::Native`] reinterprets the bytes with `f32::from_be_bytes`
//!   and classifies the value.
//! - [`FloatDecode::Portable`] rebuilds the value from sign, exponent and
//!   mantissa fields without trusting the host float layout, and can reject
//!   an infinity or NaN as soon as the exponent is known.
//!
//! Both reject infinities, NaNs and subnormals; signed zero is accepted.

use std::num::FpCategory;

/// Which float decoding strategy the parser uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatDecode {
    Native,
    #[default]
    Portable,
}

/// Why an angle value was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FloatReject {
    #[error("infinity or NaN")]
    NonFinite,
    #[error("subnormal value")]
    Subnormal,
}

const EXPONENT_BIAS: i32 = 127;
const MANTISSA_BITS: i32 = 23;
const HIDDEN_BIT: u32 = 1 << 23;
const EXPONENT_SPECIAL: u8 = 0xFF;

/// Decode through the host `f32`.
pub fn decode_native(bytes: [u8; 4]) -> Result<f32, FloatReject> {
    let value = f32::from_be_bytes(bytes);
    match value.classify() {
        FpCategory::Nan | FpCategory::Infinite => Err(FloatReject::NonFinite),
        FpCategory::Subnormal => Err(FloatReject::Subnormal),
        FpCategory::Zero | FpCategory::Normal => Ok(value),
    }
}

/// Decode from the bit fields.
pub fn decode_portable(bytes: [u8; 4]) -> Result<f32, FloatReject> {
    let negative = bytes[0] & 0x80 != 0;
    let exponent = (bytes[0] << 1) | (bytes[1] >> 7);
    let mantissa =
        (u32::from(bytes[1] & 0x7F) << 16) | (u32::from(bytes[2]) << 8) | u32::from(bytes[3]);
    compose(negative, exponent, mantissa)
}

fn compose(negative: bool, exponent: u8, mantissa: u32) -> Result<f32, FloatReject> {
    let magnitude = match exponent {
        EXPONENT_SPECIAL => return Err(FloatReject::NonFinite),
        0 if mantissa != 0 => return Err(FloatReject::Subnormal),
        0 => 0.0,
        _ => {
            // (mantissa | 1<<23) * 2^(exponent - 150). The product is exact in
            // f64 and representable as a normal f32.
            let significand = f64::from(mantissa | HIDDEN_BIT);
            let scale = 2f64.powi(i32::from(exponent) - EXPONENT_BIAS - MANTISSA_BITS);
            (significand * scale) as f32
        }
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Field-wise accumulator for the portable strategy.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PortableFloat {
    negative: bool,
    exponent: u8,
    mantissa: u32,
}

impl PortableFloat {
    fn push(&mut self, index: u8, byte: u8) -> Result<Option<f32>, FloatReject> {
        match index {
            0 => {
                self.negative = byte & 0x80 != 0;
                self.exponent = byte << 1;
                self.mantissa = 0;
            }
            1 => {
                self.exponent |= byte >> 7;
                if self.exponent == EXPONENT_SPECIAL {
                    return Err(FloatReject::NonFinite);
                }
                self.mantissa = u32::from(byte & 0x7F) << 16;
            }
            2 => self.mantissa |= u32::from(byte) << 8,
            _ => {
                self.mantissa |= u32::from(byte);
                return compose(self.negative, self.exponent, self.mantissa).map(Some);
            }
        }
        Ok(None)
    }
}

/// Accumulates the four bytes of one angle, most significant first.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AngleAssembler {
    Native([u8; 4]),
    Portable(PortableFloat),
}

impl AngleAssembler {
    pub(crate) fn new(strategy: FloatDecode) -> Self {
        match strategy {
            FloatDecode::Native => AngleAssembler::Native([0; 4]),
            FloatDecode::Portable => AngleAssembler::Portable(PortableFloat::default()),
        }
    }

    /// Add byte `index` (0..=3). Yields the value on the last byte; may
    /// reject early.
    pub(crate) fn push(&mut self, index: u8, byte: u8) -> Result<Option<f32>, FloatReject> {
        match self {
            AngleAssembler::Native(bytes) => {
                bytes[usize::from(index & 3)] = byte;
                if index >= 3 {
                    decode_native(*bytes).map(Some)
                } else {
                    Ok(None)
                }
            }
            AngleAssembler::Portable(float) => float.push(index, byte),
        }
    }
}
