use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use traxlink_datagram::{AttitudeStore, Command, CommandWriter, DatagramParser};
use traxlink_transport::{serial, Receiver, SerialConfig};

use crate::cmd::{parse_duration, MonitorArgs};
use crate::exit::{
    datagram_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT,
    TRANSPORT_ERROR,
};
use crate::output::{print_sample, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let inter_byte = parse_duration(&args.timeout)?;
    let interval = parse_duration(&args.interval)?;
    let idle_timeout = parse_duration(&args.idle_timeout)?;
    let settle = args.settle.as_deref().map(parse_duration).transpose()?;

    let config = SerialConfig::default()
        .with_baud(args.baud)
        .with_inter_byte_timeout(Some(inter_byte));
    let stream =
        serial::open(&args.device, &config).map_err(|err| transport_error("open failed", err))?;
    let command_stream = stream
        .try_clone()
        .map_err(|err| transport_error("open failed", err))?;
    let mut commands = CommandWriter::new(command_stream);

    let send_setup = !args.no_setup && stream.accepts_commands();
    if !args.no_setup && !send_setup {
        warn!(kind = stream.kind(), "byte source is a capture; skipping setup");
    }

    if let Some(settle) = settle {
        debug!(?settle, "waiting for the link to settle");
        std::thread::sleep(settle);
    }
    if send_setup {
        commands
            .start_continuous()
            .map_err(|err| datagram_error("setup failed", err))?;
        info!("continuous mode requested");
    }

    let (publisher, mut reader) = AttitudeStore::with_lock().split();
    let parser = DatagramParser::with_config(publisher, args.parser.config());
    let mut receiver = Receiver::new(stream);
    receiver
        .start(parser)
        .map_err(|err| transport_error("receive start failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0u64;
    let mut last_sample = Instant::now();
    let outcome = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(SUCCESS);
        }

        // Sampled before polling so a final publish is not missed.
        let source_closed = !receiver.is_running();
        if reader.update() {
            printed += 1;
            last_sample = Instant::now();
            print_sample(printed, reader.sample(), format);
            if args.count.is_some_and(|count| printed >= count) {
                break Ok(SUCCESS);
            }
            continue;
        }

        if source_closed {
            if printed > 0 {
                info!("byte source closed");
                break Ok(SUCCESS);
            }
            break Err(CliError::new(
                TRANSPORT_ERROR,
                "byte source closed before any valid datagram",
            ));
        }
        if last_sample.elapsed() >= idle_timeout {
            break Err(CliError::new(
                TIMEOUT,
                format!("no valid datagram within {}", args.idle_timeout),
            ));
        }

        std::thread::sleep(interval);
    };

    if send_setup {
        if let Err(err) = commands.send(Command::StopContinuousMode) {
            warn!(%err, "failed to stop continuous mode");
        }
    }

    match receiver.stop() {
        Ok(Some(stopped)) => {
            let stats = stopped.handler.stats();
            debug!(
                accepted = stats.accepted,
                checksum_errors = stats.checksum_errors,
                protocol_errors = stats.protocol_errors,
                bytes = stopped.stats.bytes,
                "parser counters"
            );
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "receive thread did not stop cleanly"),
    }

    outcome
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
