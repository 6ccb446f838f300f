use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::channel::PhaseChannel;
use crate::config::CycleConfig;
use crate::cycler::{CyclerHandle, PhaseCycler};
use crate::error::LightError;
use crate::phase::{AtomicPhase, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(Uuid);

impl LightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// State shared between a light and its cycler thread.
pub(crate) struct LightState {
    pub(crate) phase: AtomicPhase,
    pub(crate) channel: PhaseChannel<Phase>,
    // Some while idle, None while a cycler owns the generator.
    rng: Mutex<Option<StdRng>>,
}

impl LightState {
    pub(crate) fn new(rng: StdRng) -> Self {
        Self {
            phase: AtomicPhase::new(),
            channel: PhaseChannel::new(),
            rng: Mutex::new(Some(rng)),
        }
    }

    fn rng_slot(&self) -> MutexGuard<'_, Option<StdRng>> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn take_rng(&self) -> Option<StdRng> {
        self.rng_slot().take()
    }

    pub(crate) fn return_rng(&self, rng: StdRng) {
        *self.rng_slot() = Some(rng);
    }

    fn is_running(&self) -> bool {
        self.rng_slot().is_none()
    }
}

/// A single traffic light that cycles red/green on its own thread.
///
/// Share it behind an `Arc` to wait for green from other threads. The light
/// starts red and does nothing until [`TrafficLight::simulate`] is called.
///
/// # Blocking
///
/// [`TrafficLight::wait_for_green`] only returns once the cycler has
/// published green. Calling it on a light that was never simulated, or that
/// has been stopped while red, blocks forever. Use
/// [`TrafficLight::wait_for_green_timeout`] when that is not acceptable.
///
/// Each phase is delivered through a one-slot overwrite channel. Several
/// threads may wait on the same light: they compete for each published
/// value, and since the cycler republishes every poll all of them are served
/// while the light stays green, but a green phase shorter than the number of
/// waiters times the poll interval can be missed by some of them.
pub struct TrafficLight {
    id: LightId,
    config: CycleConfig,
    state: Arc<LightState>,
    cycler: Mutex<Option<CyclerHandle>>,
}

impl TrafficLight {
    /// Light with the default 4-6s cycle, seeded from OS entropy.
    pub fn new() -> Self {
        Self::build(CycleConfig::default(), StdRng::from_os_rng())
    }

    pub fn with_config(config: CycleConfig) -> Result<Self, LightError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self::build(config, rng))
    }

    /// Uses `rng` for every cycle duration instead of seeding a new one.
    pub fn with_rng(config: CycleConfig, rng: StdRng) -> Result<Self, LightError> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: CycleConfig, rng: StdRng) -> Self {
        Self {
            id: LightId::new(),
            config,
            state: Arc::new(LightState::new(rng)),
            cycler: Mutex::new(None),
        }
    }

    pub fn id(&self) -> LightId {
        self.id
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn current_phase(&self) -> Phase {
        self.state.phase.load()
    }

    /// Forces the phase. Meant for the cycler; exposed for orchestration and tests.
    pub fn set_current_phase(&self, phase: Phase) {
        self.state.phase.store(phase);
    }

    pub fn toggle_phase(&self) -> Phase {
        self.state.phase.toggle()
    }

    /// Number of phase changes since the light was created.
    pub fn cycles_completed(&self) -> u64 {
        self.state.phase.generation()
    }

    fn lock_cycler(&self) -> MutexGuard<'_, Option<CyclerHandle>> {
        self.cycler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts cycling on a background thread and returns immediately.
    ///
    /// Fails with [`LightError::AlreadyRunning`] while a cycler for this
    /// light is alive, including one whose handle was taken with
    /// [`TrafficLight::take_handle`]. A stopped light can be simulated again
    /// and keeps drawing from the same generator.
    pub fn simulate(&self) -> Result<(), LightError> {
        let mut cycler = self.lock_cycler();
        let rng = self
            .state
            .take_rng()
            .ok_or(LightError::AlreadyRunning { id: self.id })?;

        let handle =
            PhaseCycler::new(self.id, Arc::clone(&self.state), self.config, rng).spawn()?;
        // any previous handle belongs to a finished thread; dropping it joins
        *cycler = Some(handle);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Hands the running cycler over to the caller.
    ///
    /// The caller then owns shutdown: dropping or joining the handle stops
    /// the cycler. Returns `None` if the light is not simulating or the
    /// handle was already taken.
    pub fn take_handle(&self) -> Option<CyclerHandle> {
        self.lock_cycler().take()
    }

    /// Stops the cycler this light still owns and waits for it to exit.
    ///
    /// No-op if the light is idle or its handle has been taken.
    pub fn stop(&self) -> Result<(), LightError> {
        let handle = self.lock_cycler().take();
        match handle {
            Some(handle) => {
                handle.join()?;
                info!(light = %self.id, phase = %self.current_phase(), "light stopped");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Blocks until the light publishes green.
    ///
    /// Call [`TrafficLight::simulate`] first: on an idle light this never
    /// returns.
    pub fn wait_for_green(&self) {
        loop {
            thread::sleep(self.config.poll_interval);
            if self.state.channel.receive() == Phase::Green {
                debug!(light = %self.id, "green observed");
                return;
            }
        }
    }

    pub fn wait_for_green_timeout(&self, timeout: Duration) -> Result<(), LightError> {
        let deadline = Instant::now() + timeout;
        loop {
            thread::sleep(self.config.poll_interval);
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.state.channel.receive_timeout(remaining) {
                Some(Phase::Green) => return Ok(()),
                Some(Phase::Red) => continue,
                None => {
                    return Err(LightError::Timeout {
                        id: self.id,
                        waited: timeout,
                    })
                }
            }
        }
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficLight")
            .field("id", &self.id)
            .field("phase", &self.current_phase())
            .field("running", &self.is_running())
            .finish()
    }
}
