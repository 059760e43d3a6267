use clap::{Args, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use traxlink_datagram::{FloatDecode, ParserConfig, RangeCheck};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod crc;
pub mod decode;
pub mod frame;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configure a sensor and print attitude samples as they arrive.
    Monitor(MonitorArgs),
    /// Decode a raw capture and print every valid sample.
    Decode(DecodeArgs),
    /// Print the CRC-16/XMODEM of the input.
    Crc(CrcArgs),
    /// Frame hex packet frames (one per line) as datagrams.
    Frame(FrameArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: Option<OutputFormat>) -> CliResult<i32> {
    let stdout_default = || format.unwrap_or_else(OutputFormat::default_for_stdout);
    match command {
        Command::Monitor(args) => monitor::run(args, stdout_default()),
        Command::Decode(args) => decode::run(args, stdout_default()),
        Command::Crc(args) => crc::run(args, format.unwrap_or(OutputFormat::Pretty)),
        Command::Frame(args) => frame::run(args, format.unwrap_or(OutputFormat::Raw)),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum FloatDecodeArg {
    Native,
    #[default]
    Portable,
}

/// Parser options shared by `monitor` and `decode`.
#[derive(Args, Debug)]
pub struct ParserArgs {
    /// Float decoding strategy for angle values.
    #[arg(long, value_name = "STRATEGY", default_value = "portable")]
    pub float_decode: FloatDecodeArg,
    /// Drop datagrams whose angles fall outside the sensor's output range.
    #[arg(long)]
    pub range_check: bool,
}

impl ParserArgs {
    pub fn config(&self) -> ParserConfig {
        ParserConfig {
            float_decode: match self.float_decode {
                FloatDecodeArg::Native => FloatDecode::Native,
                FloatDecodeArg::Portable => FloatDecode::Portable,
            },
            range_check: if self.range_check {
                RangeCheck::Reject
            } else {
                RangeCheck::Off
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device the sensor is attached to.
    pub device: PathBuf,
    /// Line rate in bits per second.
    #[arg(long, default_value_t = traxlink_transport::DEFAULT_BAUD)]
    pub baud: u32,
    /// Inter-byte silence after which a partial datagram is dropped (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
    /// Do not send the component selection and start/stop commands.
    #[arg(long)]
    pub no_setup: bool,
    /// Wait this long after opening before sending setup (e.g. 8s).
    #[arg(long, value_name = "DURATION")]
    pub settle: Option<String>,
    /// Exit after printing N samples.
    #[arg(long)]
    pub count: Option<u64>,
    /// How often to poll for a new sample (e.g. 1ms, 100ms).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Give up when no valid datagram arrives for this long.
    #[arg(long, default_value = "5s")]
    pub idle_timeout: String,
    #[command(flatten)]
    pub parser: ParserArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
    /// Print parser counters after the samples.
    #[arg(long)]
    pub stats: bool,
    #[command(flatten)]
    pub parser: ParserArgs,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Input file. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// File of hex packet frames. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open a file argument, treating `None` and `-` as stdin.
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(std::io::stdin().lock())),
        Some(path) if path == Path::new("-") => Ok(Box::new(std::io::stdin().lock())),
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;
            Ok(Box::new(std::io::BufReader::new(file)))
        }
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
