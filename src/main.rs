use std::sync::Arc;
use std::thread;
use std::time::Instant;

use traffic_light::logging::init_logging;
use traffic_light::{CycleConfig, LightError, LightRegistry, TrafficLight};

const DEFAULT_LIGHTS: usize = 2;

fn main() -> Result<(), LightError> {
    init_logging(1);

    let count = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_LIGHTS);
    let config = CycleConfig::from_env()?;

    let mut registry = LightRegistry::new();
    let mut lights = Vec::with_capacity(count);
    for _ in 0..count {
        let light = Arc::new(TrafficLight::with_config(config)?);
        registry.register(Arc::clone(&light));
        lights.push(light);
    }

    let start = Instant::now();
    registry.simulate_all()?;

    thread::scope(|s| {
        for light in &lights {
            s.spawn(move || {
                light.wait_for_green();
                println!("light {} green after {:?}", light.id(), start.elapsed());
            });
        }
    });

    for (id, phase) in registry.phases() {
        println!("{id}: {phase}");
    }
    registry.shutdown()
}
