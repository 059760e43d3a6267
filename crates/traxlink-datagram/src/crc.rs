//! CRC-16/XMODEM (polynomial 0x1021, initial value 0, unreflected, no final
//! XOR), the checksum trailing every TRAX datagram.
//!
//! Folding a whole datagram, trailer included, leaves a zero residue when
//! nothing was corrupted.

/// Initial accumulator value.
pub const INIT: u16 = 0x0000;

const POLY: u16 = 0x1021;

/// Fold one byte into a running CRC.
pub const fn update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ ((byte as u16) << 8);
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ POLY
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

/// CRC of a whole slice, starting from [`INIT`].
pub const fn checksum(bytes: &[u8]) -> u16 {
    let mut crc = INIT;
    let mut i = 0;
    while i < bytes.len() {
        crc = update(crc, bytes[i]);
        i += 1;
    }
    crc
}
