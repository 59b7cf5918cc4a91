use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{error, info, trace};

use crate::error::PipelineError;
use crate::tempo::TempoCell;

/// Beat timer running on its own thread.
///
/// Pulses go through a zero-capacity channel: a pulse is delivered only
/// if someone is blocked on [`Clock::pulse`] at that moment, otherwise
/// it is lost. There is never a backlog.
pub(crate) struct Clock {
    tempo: TempoCell,
    pulse_tx: Sender<()>,
    pulse_rx: Receiver<()>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Clock {
    pub(crate) fn new(tempo: TempoCell) -> Self {
        let (pulse_tx, pulse_rx) = bounded(0);
        Self {
            tempo,
            pulse_tx,
            pulse_rx,
            shutdown: None,
            thread: None,
        }
    }

    pub(crate) fn start(&mut self) -> Result<(), PipelineError> {
        if self.thread.is_some() {
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let tempo = self.tempo.clone();
        let pulse_tx = self.pulse_tx.clone();

        let thread = thread::Builder::new()
            .name("dmx-clock".to_string())
            .spawn(move || {
                info!(bpm = tempo.get().bpm(), "clock started");
                let mut beats = 0u64;
                loop {
                    // re-read every beat so a retune lands within one period
                    let period = tempo.get().period();
                    match shutdown_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break,
                    }
                    beats += 1;
                    if pulse_tx.try_send(()).is_err() {
                        trace!(beats, "pulse missed");
                    }
                }
                info!(beats, "clock stopped");
            })
            .map_err(|source| PipelineError::Spawn {
                name: "clock",
                source,
            })?;

        self.shutdown = Some(shutdown_tx);
        self.thread = Some(thread);
        Ok(())
    }

    /// Receives one `()` per beat while someone waits on it.
    pub(crate) fn pulse(&self) -> &Receiver<()> {
        &self.pulse_rx
    }

    /// Stops the timer without a final pulse and waits for its thread.
    pub(crate) fn stop(&mut self) -> Result<(), PipelineError> {
        drop(self.shutdown.take());
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| PipelineError::Panicked("clock")),
            None => Ok(()),
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "clock stopped with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::Tempo;
    use std::time::{Duration, Instant};

    fn wait_pulse(clock: &Clock) -> Instant {
        clock.pulse().recv_timeout(Duration::from_secs(3)).unwrap();
        Instant::now()
    }

    #[test]
    fn test_pulse_interval_matches_tempo() {
        let mut clock = Clock::new(TempoCell::new(Tempo::new(600).unwrap()));
        clock.start().unwrap();
        let first = wait_pulse(&clock);
        let second = wait_pulse(&clock);
        clock.stop().unwrap();

        let interval = second - first;
        assert!(interval >= Duration::from_millis(80), "{:?}", interval);
        assert!(interval <= Duration::from_millis(160), "{:?}", interval);
    }

    #[test]
    fn test_retune_applies_next_beat() {
        let tempo = TempoCell::new(Tempo::new(2400).unwrap());
        let mut clock = Clock::new(tempo.clone());
        clock.start().unwrap();
        wait_pulse(&clock);
        tempo.set(Tempo::new(300).unwrap());
        // one beat may still be at the old period
        wait_pulse(&clock);
        let a = wait_pulse(&clock);
        let b = wait_pulse(&clock);
        clock.stop().unwrap();

        assert!(b - a >= Duration::from_millis(150), "{:?}", b - a);
    }

    #[test]
    fn test_unobserved_pulses_are_lost() {
        let mut clock = Clock::new(TempoCell::new(Tempo::new(2400).unwrap()));
        clock.start().unwrap();
        thread::sleep(Duration::from_millis(150));
        assert!(clock.pulse().try_recv().is_err());
        clock.stop().unwrap();
    }

    #[test]
    fn test_stop_is_prompt_and_silent() {
        let mut clock = Clock::new(TempoCell::new(Tempo::new(30).unwrap()));
        clock.start().unwrap();
        let started = Instant::now();
        clock.stop().unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(clock
            .pulse()
            .recv_timeout(Duration::from_millis(50))
            .is_err());
    }
}
