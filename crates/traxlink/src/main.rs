mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "traxlink", version, about = "TRAX AHRS attitude link CLI")]
struct Cli {
    /// Output format. Defaults depend on the subcommand.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command, cli.format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_monitor_subcommand() {
        let cli = Cli::try_parse_from([
            "traxlink",
            "monitor",
            "/dev/ttyUSB0",
            "--baud",
            "9600",
            "--count",
            "3",
            "--float-decode",
            "native",
        ])
        .expect("monitor args should parse");

        match cli.command {
            Command::Monitor(args) => {
                assert_eq!(args.baud, 9600);
                assert_eq!(args.count, Some(3));
                assert!(!args.no_setup);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn monitor_defaults_to_38400_baud() {
        let cli = Cli::try_parse_from(["traxlink", "monitor", "/dev/ttyS0"])
            .expect("monitor args should parse");
        match cli.command {
            Command::Monitor(args) => {
                assert_eq!(args.baud, 38_400);
                assert_eq!(args.timeout, "100ms");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["traxlink", "crc", "-", "--format", "json"])
            .expect("crc args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Crc(_)));
    }

    #[test]
    fn rejects_unknown_float_strategy() {
        let err = Cli::try_parse_from(["traxlink", "decode", "--float-decode", "fast"])
            .expect_err("unknown strategy should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn monitor_requires_device() {
        let err = Cli::try_parse_from(["traxlink", "monitor"])
            .expect_err("missing device should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
