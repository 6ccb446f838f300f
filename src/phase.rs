use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{AcqRel, Acquire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    pub fn toggled(self) -> Phase {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    fn from_generation(generation: u64) -> Phase {
        if generation % 2 == 0 {
            Phase::Red
        } else {
            Phase::Green
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => f.write_str("red"),
            Phase::Green => f.write_str("green"),
        }
    }
}

/// Phase shared between the cycler thread and any number of readers.
///
/// Stored as a generation counter: even is red, odd is green. A toggle is a
/// single `fetch_add`, so readers only ever see alternating phases and the
/// counter doubles as the number of completed cycles.
#[derive(Debug, Default)]
pub struct AtomicPhase {
    generation: AtomicU64,
}

impl AtomicPhase {
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    pub fn load(&self) -> Phase {
        Phase::from_generation(self.generation.load(Acquire))
    }

    /// Flips the phase and returns the new one.
    pub fn toggle(&self) -> Phase {
        Phase::from_generation(self.generation.fetch_add(1, AcqRel) + 1)
    }

    /// Moves to `phase`; no-op when already there.
    pub fn store(&self, phase: Phase) {
        let mut current = self.generation.load(Acquire);
        loop {
            if Phase::from_generation(current) == phase {
                return;
            }
            match self
                .generation
                .compare_exchange_weak(current, current + 1, AcqRel, Acquire)
            {
                Ok(_) => return,
                Err(e) => current = e,
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Acquire)
    }
}
