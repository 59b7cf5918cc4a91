//! Beat-driven frame pipeline.
//!
//! Three threads cooperate:
//! - the [`Clock`] pulses once per beat,
//! - the orchestrator renders the next frame of the active chase on every pulse,
//! - the [`FrameTransmitter`] keeps the serial line refreshed with the latest frame.
//!
//! Chase swaps and rendered frames travel through small bounded queues,
//! the tempo through a shared cell read by the clock. A swap or a retune
//! therefore lands on the next beat and never restarts the other axis.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::chase::ChaseSequence;
use crate::clock::Clock;
use crate::dmx::{Frame, FrameTransmitter, TransmitterConfig, Transport};
use crate::error::PipelineError;
use crate::tempo::{Tempo, TempoCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineState {
    Starting,
    Running,
    Stopping,
    Stopped,
    /// The transmitter gave up; the pipeline shut itself down.
    Faulted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PipelineStats {
    pub(crate) beats: u64,
    pub(crate) frames_queued: u64,
    pub(crate) frames_dropped: u64,
    pub(crate) chase_swaps: u64,
    pub(crate) pulse_timeouts: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct PipelineConfig {
    /// Capacity of both the chase-swap and the ready-frame queue.
    pub(crate) queue_capacity: usize,
    /// Upper bound on waiting for a clock pulse, well above the slowest beat.
    pub(crate) pulse_timeout: Duration,
    /// How long a rendered frame may wait for room in the ready-frame queue.
    pub(crate) push_timeout: Duration,
    pub(crate) transmitter: TransmitterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 2,
            pulse_timeout: Duration::from_secs(5),
            push_timeout: Duration::from_secs(1),
            transmitter: TransmitterConfig::default(),
        }
    }
}

/// Cheap, cloneable control surface for the running pipeline.
#[derive(Debug, Clone)]
pub(crate) struct PipelineHandle {
    chases: Sender<ChaseSequence>,
    tempo: TempoCell,
    state: Arc<RwLock<PipelineState>>,
}

impl PipelineHandle {
    pub(crate) fn new(
        chases: Sender<ChaseSequence>,
        tempo: TempoCell,
        state: Arc<RwLock<PipelineState>>,
    ) -> Self {
        Self {
            chases,
            tempo,
            state,
        }
    }

    /// Queue `chase` to replace the active one on the next beat.
    ///
    /// Fails with [`PipelineError::Backpressure`] when swaps come in faster
    /// than beats.
    pub(crate) fn request_chase(&self, chase: ChaseSequence) -> Result<(), PipelineError> {
        let name = chase.name().to_string();
        match self.chases.try_send(chase) {
            Ok(()) => {
                debug!(chase = %name, "chase requested");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!(chase = %name, "chase request rejected");
                Err(PipelineError::Backpressure("chase swap"))
            }
            Err(TrySendError::Disconnected(_)) => Err(PipelineError::Disconnected("chase swap")),
        }
    }

    pub(crate) fn set_tempo(&self, tempo: Tempo) {
        info!(%tempo, "tempo changed");
        self.tempo.set(tempo);
    }

    pub(crate) fn tempo(&self) -> Tempo {
        self.tempo.get()
    }

    /// [`PipelineState::Faulted`] once the transmitter has given up.
    pub(crate) fn state(&self) -> PipelineState {
        *self.state.read()
    }
}

pub(crate) struct FramePipeline {
    handle: PipelineHandle,
    stats: Arc<RwLock<PipelineStats>>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<Result<(), PipelineError>>>,
}

impl FramePipeline {
    /// Launch clock, transmitter and orchestrator, showing `default_chase` first.
    pub(crate) fn start(
        transport: Box<dyn Transport>,
        default_chase: ChaseSequence,
        tempo: Tempo,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let state = Arc::new(RwLock::new(PipelineState::Starting));
        let stats = Arc::new(RwLock::new(PipelineStats::default()));
        let tempo = TempoCell::new(tempo);

        let (chase_tx, chase_rx) = bounded(config.queue_capacity);
        let (frame_tx, frame_rx) = bounded(config.queue_capacity);

        let mut transmitter = FrameTransmitter::new(transport, frame_rx, config.transmitter.clone());
        transmitter.start()?;
        let mut clock = Clock::new(tempo.clone());
        clock.start()?;

        let mut chase = default_chase;
        if frame_tx.try_send(chase.next_frame()).is_ok() {
            stats.write().frames_queued += 1;
        }
        info!(chase = chase.name(), tempo = %tempo.get(), "pipeline starting");

        let orchestrator = Orchestrator {
            clock,
            transmitter,
            chase,
            chases: chase_rx,
            frames: frame_tx,
            config,
            state: state.clone(),
            stats: stats.clone(),
        };

        let (shutdown_tx, shutdown_rx) = bounded(0);
        let thread = thread::Builder::new()
            .name("dmx-pipeline".to_string())
            .spawn(move || orchestrator.run(shutdown_rx))
            .map_err(|source| PipelineError::Spawn {
                name: "pipeline",
                source,
            })?;

        Ok(Self {
            handle: PipelineHandle::new(chase_tx, tempo, state),
            stats,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub(crate) fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    pub(crate) fn state(&self) -> PipelineState {
        self.handle.state()
    }

    pub(crate) fn stats(&self) -> PipelineStats {
        *self.stats.read()
    }

    /// Stop all three threads and wait for them.
    ///
    /// Nothing is written to the transport once this returns. A transport
    /// fault that ended the pipeline early is reported here.
    pub(crate) fn stop(&mut self) -> Result<(), PipelineError> {
        drop(self.shutdown.take());
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| PipelineError::Panicked("pipeline"))?,
            None => Ok(()),
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "pipeline stopped with error");
        }
    }
}

struct Orchestrator {
    clock: Clock,
    transmitter: FrameTransmitter,
    chase: ChaseSequence,
    chases: Receiver<ChaseSequence>,
    frames: Sender<Frame>,
    config: PipelineConfig,
    state: Arc<RwLock<PipelineState>>,
    stats: Arc<RwLock<PipelineStats>>,
}

impl Orchestrator {
    fn run(mut self, shutdown: Receiver<()>) -> Result<(), PipelineError> {
        self.set_state(PipelineState::Running);
        let pulse = self.clock.pulse().clone();

        let faulted = loop {
            let pulsed = select! {
                recv(shutdown) -> _ => None,
                recv(pulse) -> _ => Some(true),
                default(self.config.pulse_timeout) => Some(false),
            };
            let Some(pulsed) = pulsed else {
                break false;
            };
            if !pulsed {
                self.stats.write().pulse_timeouts += 1;
                warn!(timeout = ?self.config.pulse_timeout, "no clock pulse");
            }
            if self.transmitter.is_finished() {
                break true;
            }
            self.beat();
        };

        self.set_state(PipelineState::Stopping);
        let clock = self.clock.stop();
        let transmitter = self.transmitter.stop();
        let result = match (transmitter, faulted) {
            (Err(e), _) => Err(e),
            (Ok(()), true) => Err(PipelineError::Disconnected("ready frame")),
            (Ok(()), false) => clock,
        };

        match &result {
            Ok(()) => {
                self.set_state(PipelineState::Stopped);
                let stats = *self.stats.read();
                info!(?stats, "pipeline stopped");
            }
            Err(e) => {
                self.set_state(PipelineState::Faulted);
                error!(error = %e, "pipeline faulted");
            }
        }
        result
    }

    /// Adopt a pending chase, if any, then queue the next frame.
    fn beat(&mut self) {
        if let Ok(chase) = self.chases.try_recv() {
            info!(
                from = self.chase.name(),
                at = self.chase.position(),
                to = chase.name(),
                scenes = chase.len(),
                "chase swapped"
            );
            self.chase = chase;
            self.stats.write().chase_swaps += 1;
        }

        let frame = self.chase.next_frame();
        self.stats.write().beats += 1;
        debug!(chase = self.chase.name(), ?frame, "beat");

        match self.frames.send_timeout(frame, self.config.push_timeout) {
            Ok(()) => self.stats.write().frames_queued += 1,
            Err(SendTimeoutError::Timeout(_)) => {
                // the transmitter keeps showing the previous frame
                self.stats.write().frames_dropped += 1;
                warn!("ready-frame queue full, beat dropped");
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                warn!("transmitter gone, beat dropped");
            }
        }
    }

    fn set_state(&self, state: PipelineState) {
        debug!(?state, "pipeline state");
        *self.state.write() = state;
    }
}
