use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{millis, CycleConfig};
use crate::error::LightError;
use crate::light::{LightId, LightState};

/// Draws the length of the next cycle, uniform over `[min_cycle, max_cycle]`.
pub fn compute_cycle_duration<R: Rng>(rng: &mut R, config: &CycleConfig) -> Duration {
    let min = millis(config.min_cycle);
    let max = millis(config.max_cycle).max(min);
    Duration::from_millis(rng.random_range(min..=max))
}

/// Background loop that toggles a light and republishes its phase every poll.
///
/// Owns the light's generator while it runs and hands it back when dropped,
/// whether the loop stopped, panicked, or never got a thread.
pub(crate) struct PhaseCycler {
    id: LightId,
    state: Arc<LightState>,
    config: CycleConfig,
    rng: Option<StdRng>,
    stop: Arc<AtomicBool>,
}

impl PhaseCycler {
    pub(crate) fn new(
        id: LightId,
        state: Arc<LightState>,
        config: CycleConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            state,
            config,
            rng: Some(rng),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn spawn(self) -> Result<CyclerHandle, LightError> {
        let id = self.id;
        let stop = Arc::clone(&self.stop);

        let thread = thread::Builder::new()
            .name(format!("light-{id}"))
            .spawn(move || self.run())
            .map_err(|source| LightError::Spawn { id, source })?;

        Ok(CyclerHandle {
            id,
            stop,
            thread: Some(thread),
        })
    }

    fn run(mut self) {
        info!(light = %self.id, "cycler started");

        let mut cycle = self.next_cycle_duration();
        let mut started = Instant::now();

        while !self.stop.load(Acquire) {
            thread::sleep(self.config.poll_interval);

            if started.elapsed() >= cycle {
                let phase = self.state.phase.toggle();
                debug!(light = %self.id, %phase, cycle_ms = millis(cycle), "phase toggled");
                started = Instant::now();
                cycle = self.next_cycle_duration();
            }

            self.state.channel.send(self.state.phase.load());
        }

        info!(light = %self.id, cycles = self.state.phase.generation(), "cycler stopped");
    }

    fn next_cycle_duration(&mut self) -> Duration {
        match self.rng.as_mut() {
            Some(rng) => compute_cycle_duration(rng, &self.config),
            None => self.config.max_cycle,
        }
    }
}

impl Drop for PhaseCycler {
    fn drop(&mut self) {
        if let Some(rng) = self.rng.take() {
            self.state.return_rng(rng);
        }
    }
}

/// Owning handle to a running cycler thread.
///
/// Dropping the handle stops the cycler and joins its thread.
#[derive(Debug)]
pub struct CyclerHandle {
    id: LightId,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CyclerHandle {
    pub fn light_id(&self) -> LightId {
        self.id
    }

    /// Asks the cycler to exit after its current poll. Does not wait.
    pub fn stop(&self) {
        self.stop.store(true, Release);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stops the cycler and waits for its thread to exit.
    pub fn join(mut self) -> Result<(), LightError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), LightError> {
        self.stop();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| {
                warn!(light = %self.id, "cycler thread panicked");
                LightError::CyclerPanicked { id: self.id }
            }),
            None => Ok(()),
        }
    }
}

impl Drop for CyclerHandle {
    fn drop(&mut self) {
        // a panicked cycler is logged by shutdown; drop has nowhere to return it
        let _ = self.shutdown();
    }
}
