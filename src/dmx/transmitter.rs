use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use serialport::{DataBits, Parity, StopBits};
use tracing::{debug, error, info, trace, warn};

use super::{Frame, Transport, BAUD_RATE, BREAK_LEN, MARK_AFTER_BREAK, START_CODE};
use crate::error::{PipelineError, TransportError};

#[derive(Debug, Clone)]
pub(crate) struct TransmitterConfig {
    /// Longest the link stays quiet while waiting for a new frame.
    pub(crate) poll_timeout: Duration,
    pub(crate) break_duration: Duration,
    /// Attempts after the first failed packet before giving up.
    pub(crate) max_retries: u32,
    /// Multiplied by the attempt number between retries.
    pub(crate) retry_backoff: Duration,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(500),
            break_duration: BREAK_LEN,
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

/// Owns the serial line and keeps refreshing it with the latest frame.
pub(crate) struct FrameTransmitter {
    transport: Option<Box<dyn Transport>>,
    frames: Receiver<Frame>,
    config: TransmitterConfig,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<Result<(), TransportError>>>,
}

impl FrameTransmitter {
    pub(crate) fn new(transport: Box<dyn Transport>, frames: Receiver<Frame>, config: TransmitterConfig) -> Self {
        Self {
            transport: Some(transport),
            frames,
            config,
            shutdown: None,
            thread: None,
        }
    }

    pub(crate) fn start(&mut self) -> Result<(), PipelineError> {
        let Some(transport) = self.transport.take() else {
            warn!("transmitter already started");
            return Ok(());
        };

        let (shutdown_tx, shutdown_rx) = bounded(0);
        let link = Link {
            transport,
            config: self.config.clone(),
            frame: Frame::blank(),
            packets: 0,
        };
        let frames = self.frames.clone();

        let thread = thread::Builder::new()
            .name("dmx-transmitter".to_string())
            .spawn(move || link.run(frames, shutdown_rx))
            .map_err(|source| PipelineError::Spawn {
                name: "transmitter",
                source,
            })?;

        self.shutdown = Some(shutdown_tx);
        self.thread = Some(thread);
        Ok(())
    }

    /// True once the transmit loop has exited, either stopped or faulted.
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| t.is_finished())
    }

    /// Signal the loop and wait for it. The packet in progress completes first.
    pub(crate) fn stop(&mut self) -> Result<(), PipelineError> {
        drop(self.shutdown.take());
        match self.thread.take() {
            Some(thread) => match thread.join() {
                Ok(result) => result.map_err(PipelineError::from),
                Err(_) => Err(PipelineError::Panicked("transmitter")),
            },
            None => Ok(()),
        }
    }
}

impl Drop for FrameTransmitter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "transmitter stopped with error");
        }
    }
}

enum Wake {
    Frame(Frame),
    Idle,
    Closed,
    Stop,
}

struct Link {
    transport: Box<dyn Transport>,
    config: TransmitterConfig,
    frame: Frame,
    packets: u64,
}

impl Link {
    fn run(mut self, frames: Receiver<Frame>, shutdown: Receiver<()>) -> Result<(), TransportError> {
        self.transport
            .configure(BAUD_RATE, DataBits::Eight, Parity::None, StopBits::Two)?;
        info!(baud = BAUD_RATE, "transmitter started");

        loop {
            let wake = select! {
                recv(shutdown) -> _ => Wake::Stop,
                recv(frames) -> msg => msg.map_or(Wake::Closed, Wake::Frame),
                default(self.config.poll_timeout) => Wake::Idle,
            };
            match wake {
                Wake::Frame(frame) => {
                    trace!(?frame, "new frame");
                    self.frame = frame;
                }
                Wake::Idle => trace!("no new frame, retransmitting"),
                Wake::Closed => {
                    debug!("frame channel closed");
                    break;
                }
                Wake::Stop => break,
            }
            self.transmit()?;
        }

        info!(packets = self.packets, "transmitter stopped");
        Ok(())
    }

    fn transmit(&mut self) -> Result<(), TransportError> {
        let mut attempt = 0;
        loop {
            match self.send_packet() {
                Ok(()) => {
                    self.packets += 1;
                    return Ok(());
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "transmission failed, retrying");
                    thread::sleep(self.config.retry_backoff * attempt);
                }
                Err(e) => {
                    error!(error = %e, "transmission failed, giving up");
                    return Err(e);
                }
            }
        }
    }

    /// Break, mark-after-break, start code, 512 channels, flush.
    fn send_packet(&mut self) -> Result<(), TransportError> {
        self.transport.send_break(self.config.break_duration)?;
        self.transport.write(&[MARK_AFTER_BREAK, START_CODE])?;
        self.transport.write(self.frame.as_bytes())?;
        self.transport.flush()
    }
}
