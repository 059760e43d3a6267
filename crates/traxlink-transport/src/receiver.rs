use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::stream::SerialStream;

/// Consumer of a byte stream, driven from the receive thread.
pub trait ByteHandler: Send + 'static {
    /// Handle one received byte. Returns `true` when the byte completed a
    /// unit of work (a valid datagram, for the parser).
    fn on_byte(&mut self, byte: u8) -> bool;

    /// The inter-byte timeout elapsed with no data.
    fn on_silence(&mut self) {}

    /// The stream reported an error. The receive thread exits afterwards.
    fn on_error(&mut self, _error: &TransportError) {}
}

/// Counters gathered by one run of the receive thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub bytes: u64,
    pub completions: u64,
    pub silences: u64,
}

/// What a receive thread hands back when it is stopped.
#[derive(Debug)]
pub struct Stopped<H> {
    pub handler: H,
    pub stats: ReceiveStats,
}

struct Finished<H> {
    stream: SerialStream,
    handler: H,
    stats: ReceiveStats,
}

struct Running<H> {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Finished<H>>,
}

/// Owns a [`SerialStream`] and, while started, a thread feeding its bytes to
/// a [`ByteHandler`].
///
/// The thread checks its stop flag between reads, so `stop` returns within
/// one inter-byte timeout. Without a timeout it waits for the next byte.
pub struct Receiver<H> {
    stream: Option<SerialStream>,
    running: Option<Running<H>>,
}

impl<H: ByteHandler> Receiver<H> {
    pub fn new(stream: SerialStream) -> Self {
        Self {
            stream: Some(stream),
            running: None,
        }
    }

    /// Spawn the receive thread and attach `handler` to it.
    pub fn start(&mut self, handler: H) -> Result<()> {
        if self.running.is_some() {
            return Err(TransportError::AlreadyRunning);
        }
        let Some(stream) = self.stream.take() else {
            // Only reachable if a previous thread panicked and lost the stream.
            return Err(TransportError::Closed);
        };

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("traxlink-rx".into())
            .spawn(move || receive_loop(stream, handler, &flag))
            .map_err(TransportError::Spawn)?;

        info!("receive thread started");
        self.running = Some(Running { stop, handle });
        Ok(())
    }

    /// Signal the receive thread to exit, wait for it, and take the handler
    /// back. Returns `Ok(None)` when nothing was running.
    pub fn stop(&mut self) -> Result<Option<Stopped<H>>> {
        self.finish(true)
    }

    /// Wait for the receive thread to exit on its own (end of stream or a
    /// transport error) and take the handler back.
    pub fn wait(&mut self) -> Result<Option<Stopped<H>>> {
        self.finish(false)
    }

    /// Whether a receive thread is attached and still running.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Borrow the stream while no thread is attached.
    pub fn stream(&self) -> Option<&SerialStream> {
        self.stream.as_ref()
    }

    /// Give the stream back. Stops a running thread first.
    pub fn into_stream(mut self) -> Result<Option<SerialStream>> {
        self.finish(true)?;
        Ok(self.stream.take())
    }

    fn finish(&mut self, signal: bool) -> Result<Option<Stopped<H>>> {
        let Some(running) = self.running.take() else {
            return Ok(None);
        };
        if signal {
            running.stop.store(true, Ordering::Release);
        }
        let finished = running.handle.join().map_err(|_| {
            TransportError::Io(std::io::Error::other("receive thread panicked"))
        })?;

        info!(
            bytes = finished.stats.bytes,
            completions = finished.stats.completions,
            "receive thread stopped"
        );
        self.stream = Some(finished.stream);
        Ok(Some(Stopped {
            handler: finished.handler,
            stats: finished.stats,
        }))
    }
}

impl<H> Drop for Receiver<H> {
    fn drop(&mut self) {
        // Detach rather than join; the thread exits at its next read.
        if let Some(running) = &self.running {
            running.stop.store(true, Ordering::Release);
        }
    }
}

fn receive_loop<H: ByteHandler>(
    mut stream: SerialStream,
    mut handler: H,
    stop: &AtomicBool,
) -> Finished<H> {
    let mut stats = ReceiveStats::default();
    while !stop.load(Ordering::Acquire) {
        match stream.read_byte() {
            Ok(Some(byte)) => {
                stats.bytes += 1;
                if handler.on_byte(byte) {
                    stats.completions += 1;
                }
            }
            Ok(None) => {
                stats.silences += 1;
                handler.on_silence();
            }
            Err(TransportError::Closed) => {
                debug!("byte source closed");
                break;
            }
            Err(err) => {
                warn!(%err, "receive thread stopping on transport error");
                handler.on_error(&err);
                break;
            }
        }
    }
    Finished {
        stream,
        handler,
        stats,
    }
}
