use traxlink_datagram::{DatagramError, SampleReader};

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{datagram_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_sample, print_stats, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(args.file.as_deref())?;
    let mut reader = SampleReader::with_config(input, args.parser.config());

    let mut decoded = 0u64;
    loop {
        match reader.read_sample() {
            Ok(sample) => {
                decoded += 1;
                print_sample(decoded, &sample, format);
            }
            Err(DatagramError::ConnectionClosed) => break,
            Err(err) => return Err(datagram_error("read failed", err)),
        }
    }

    if args.stats {
        print_stats(&reader.stats(), format);
    }

    if decoded == 0 {
        return Err(CliError::new(DATA_INVALID, "no valid datagram in input"));
    }
    Ok(SUCCESS)
}
