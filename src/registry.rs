//! Keeps many lights and the cycler handles taken from them.
//!
//! Lights are registered by id. Starting a light through the registry moves
//! its cycler handle here, so shutting the registry down (or dropping it)
//! stops and joins every cycler it started.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{info, warn};

use crate::cycler::CyclerHandle;
use crate::error::LightError;
use crate::light::{LightId, TrafficLight};
use crate::phase::Phase;

#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: HashMap<LightId, Arc<TrafficLight>>,
    tasks: HashMap<LightId, CyclerHandle>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, light: Arc<TrafficLight>) -> LightId {
        let id = light.id();
        self.lights.insert(id, light);
        id
    }

    pub fn get(&self, id: LightId) -> Option<&Arc<TrafficLight>> {
        self.lights.get(&id)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    fn light(&self, id: LightId) -> Result<&Arc<TrafficLight>, LightError> {
        self.lights.get(&id).ok_or(LightError::UnknownLight { id })
    }

    /// Starts one light and keeps its cycler handle.
    pub fn simulate(&mut self, id: LightId) -> Result<(), LightError> {
        let light = Arc::clone(self.light(id)?);
        light.simulate()?;
        if let Some(handle) = light.take_handle() {
            self.tasks.insert(id, handle);
        }
        Ok(())
    }

    /// Starts every registered light that is not already running.
    pub fn simulate_all(&mut self) -> Result<(), LightError> {
        let idle = self
            .lights
            .values()
            .filter(|light| !light.is_running())
            .map(|light| light.id())
            .sorted()
            .collect_vec();

        for id in idle {
            self.simulate(id)?;
        }
        info!(running = self.tasks.len(), "lights started");
        Ok(())
    }

    pub fn running(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }

    /// Stops and joins one light's cycler. No-op if the registry holds no handle for it.
    pub fn stop(&mut self, id: LightId) -> Result<(), LightError> {
        self.light(id)?;
        match self.tasks.remove(&id) {
            Some(task) => task.join(),
            None => Ok(()),
        }
    }

    /// Stops every cycler, then joins them all. Returns the first failure.
    pub fn shutdown(&mut self) -> Result<(), LightError> {
        for task in self.tasks.values() {
            task.stop();
        }

        let mut first_err = None;
        for (id, task) in self.tasks.drain() {
            if let Err(e) = task.join() {
                warn!(light = %id, error = %e, "cycler did not shut down cleanly");
                first_err.get_or_insert(e);
            }
        }
        info!(lights = self.lights.len(), "registry shut down");

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current phase of every light, ordered by id.
    pub fn phases(&self) -> Vec<(LightId, Phase)> {
        self.lights
            .iter()
            .map(|(id, light)| (*id, light.current_phase()))
            .sorted_by_key(|(id, _)| *id)
            .collect()
    }

    pub fn lights_by_phase(&self) -> HashMap<Phase, Vec<LightId>> {
        self.phases()
            .into_iter()
            .map(|(id, phase)| (phase, id))
            .into_group_map()
    }
}
