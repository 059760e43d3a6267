use std::io::{BufRead, BufReader};

use bytes::BytesMut;
use traxlink_datagram::{encode_frame, MAX_FRAME_LEN};

use crate::cmd::{open_input, FrameArgs};
use crate::exit::{datagram_error, io_error, CliResult, SUCCESS};
use crate::output::{print_datagram, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = BufReader::new(open_input(args.file.as_deref())?);
    let mut line = Vec::new();
    let mut out = BytesMut::new();

    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .map_err(|err| io_error("read failed", err))?;
        if read == 0 {
            break;
        }
        for frame in frames_from_hex_line(&line) {
            out.clear();
            encode_frame(&frame, &mut out).map_err(|err| datagram_error("frame failed", err))?;
            print_datagram(&out, format);
        }
    }

    Ok(SUCCESS)
}

/// Collect the packet frames spelled by one line of hex.
///
/// Non-hex characters are skipped and a trailing odd nibble is dropped. A
/// line longer than [`MAX_FRAME_LEN`] bytes is split into several frames.
fn frames_from_hex_line(line: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut frame = Vec::new();
    let mut high: Option<u8> = None;

    for nibble in line.iter().filter_map(|&c| (c as char).to_digit(16)) {
        let nibble = nibble as u8;
        match high.take() {
            None => high = Some(nibble),
            Some(h) => {
                frame.push((h << 4) | nibble);
                if frame.len() == MAX_FRAME_LEN {
                    frames.push(std::mem::take(&mut frame));
                }
            }
        }
    }

    if !frame.is_empty() {
        frames.push(frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line() {
        assert_eq!(frames_from_hex_line(b"15\n"), vec![vec![0x15]]);
        assert_eq!(
            frames_from_hex_line(b"03 04 05 18 19 4f\n"),
            vec![vec![0x03, 0x04, 0x05, 0x18, 0x19, 0x4F]]
        );
    }

    #[test]
    fn ignores_non_hex_and_odd_nibble() {
        assert_eq!(frames_from_hex_line(b"0x1g6:A\r\n"), vec![vec![0x01, 0x6A]]);
        assert_eq!(frames_from_hex_line(b"abc"), vec![vec![0xAB]]);
    }

    #[test]
    fn empty_and_blank_lines_yield_nothing() {
        assert!(frames_from_hex_line(b"\n").is_empty());
        assert!(frames_from_hex_line(b"zz q\n").is_empty());
        assert!(frames_from_hex_line(b"7").is_empty());
    }

    #[test]
    fn long_line_splits_at_max_frame() {
        let line = "ab".repeat(MAX_FRAME_LEN + 3);
        let frames = frames_from_hex_line(line.as_bytes());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), MAX_FRAME_LEN);
        assert_eq!(frames[1], vec![0xAB; 3]);
    }
}
