//! A traffic light that cycles red/green on its own thread.
//!
//! [`TrafficLight::simulate`] starts a background cycler that toggles the
//! phase every 4-6 seconds (see [`CycleConfig`]) and publishes the current
//! phase into a one-slot overwrite channel every millisecond. Other threads
//! block on [`TrafficLight::wait_for_green`] until green comes through.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::thread;
//! use traffic_light::{Phase, TrafficLight};
//!
//! let light = Arc::new(TrafficLight::new());
//! assert_eq!(light.current_phase(), Phase::Red);
//! light.simulate()?;
//!
//! let waiter = {
//!     let light = Arc::clone(&light);
//!     thread::spawn(move || light.wait_for_green())
//! };
//! waiter.join().unwrap();
//! light.stop()?;
//! # Ok::<(), traffic_light::LightError>(())
//! ```

pub mod channel;
pub mod config;
pub mod cycler;
pub mod error;
pub mod light;
pub mod logging;
pub mod phase;
pub mod registry;

pub use channel::PhaseChannel;
pub use config::CycleConfig;
pub use cycler::{compute_cycle_duration, CyclerHandle};
pub use error::{ConfigError, LightError};
pub use light::{LightId, TrafficLight};
pub use phase::{AtomicPhase, Phase};
pub use registry::LightRegistry;
