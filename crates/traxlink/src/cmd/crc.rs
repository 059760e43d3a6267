use std::io::{ErrorKind, Read};

use traxlink_datagram::crc;

use crate::cmd::{open_input, CrcArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_crc, OutputFormat};

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = open_input(args.file.as_deref())?;

    let mut value = crc::INIT;
    let mut chunk = [0u8; 4096];
    loop {
        let read = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("read failed", err)),
        };
        value = chunk[..read]
            .iter()
            .fold(value, |acc, &byte| crc::update(acc, byte));
    }

    print_crc(value, format);
    Ok(SUCCESS)
}
