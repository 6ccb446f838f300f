use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use traffic_light::{compute_cycle_duration, CycleConfig, LightError, Phase, TrafficLight};

fn fast_config(seed: u64) -> CycleConfig {
    CycleConfig::default()
        .with_cycle_range(Duration::from_millis(10), Duration::from_millis(30))
        .with_seed(seed)
}

#[test]
fn red_then_simulate_then_green() {
    let light = TrafficLight::new();
    assert_eq!(light.current_phase(), Phase::Red);

    light.simulate().unwrap();
    let start = Instant::now();
    light.wait_for_green();

    // default cycles last at least 4s, so green still holds here
    assert_eq!(light.current_phase(), Phase::Green);
    assert!(start.elapsed() <= Duration::from_millis(6500));
    light.stop().unwrap();
}

#[test]
fn two_lights_reach_green_independently() {
    let a = Arc::new(TrafficLight::with_config(fast_config(1)).unwrap());
    let b = Arc::new(
        TrafficLight::with_config(
            CycleConfig::default()
                .with_cycle_range(Duration::from_millis(40), Duration::from_millis(80))
                .with_seed(2),
        )
        .unwrap(),
    );
    a.simulate().unwrap();
    b.simulate().unwrap();

    thread::scope(|s| {
        for light in [&a, &b] {
            s.spawn(move || {
                light.wait_for_green_timeout(Duration::from_secs(5)).unwrap();
            });
        }
    });

    // stopping one light leaves the other cycling
    a.stop().unwrap();
    let a_frozen = a.cycles_completed();
    let before = b.cycles_completed();

    let deadline = Instant::now() + Duration::from_secs(5);
    while b.cycles_completed() <= before && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(b.cycles_completed() > before);
    b.wait_for_green_timeout(Duration::from_secs(5)).unwrap();

    assert!(!a.is_running());
    assert_eq!(a.cycles_completed(), a_frozen);
    b.stop().unwrap();
}

#[test]
fn wait_for_green_returns_soon_after_green() {
    // cycle long enough that only the forced change below happens
    let light = Arc::new(
        TrafficLight::with_config(
            CycleConfig::default()
                .with_cycle_range(Duration::from_secs(30), Duration::from_secs(30))
                .with_seed(6),
        )
        .unwrap(),
    );
    light.simulate().unwrap();
    assert_eq!(light.current_phase(), Phase::Red);

    let waiter = {
        let light = Arc::clone(&light);
        thread::spawn(move || {
            light.wait_for_green();
            Instant::now()
        })
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!waiter.is_finished());

    let turned_green = Instant::now();
    light.set_current_phase(Phase::Green);
    let returned = waiter.join().unwrap();

    assert!(returned >= turned_green);
    assert!(returned - turned_green <= Duration::from_millis(50));
    light.stop().unwrap();
}

#[test]
fn observed_phases_alternate() {
    let light = TrafficLight::with_config(
        CycleConfig::default()
            .with_cycle_range(Duration::from_millis(20), Duration::from_millis(40))
            .with_seed(3),
    )
    .unwrap();
    light.simulate().unwrap();

    let mut last_cycles = light.cycles_completed();
    let mut last_phase = light.current_phase();
    let mut flips = 0;
    let deadline = Instant::now() + Duration::from_millis(400);
    while Instant::now() < deadline {
        let cycles = light.cycles_completed();
        let phase = light.current_phase();
        // skip samples torn by a toggle between the two reads
        if light.cycles_completed() != cycles {
            continue;
        }

        assert!(cycles == last_cycles || cycles == last_cycles + 1, "{last_cycles} -> {cycles}");
        if cycles == last_cycles {
            assert_eq!(phase, last_phase);
        } else {
            assert_eq!(phase, last_phase.toggled());
            flips += 1;
        }
        last_cycles = cycles;
        last_phase = phase;
        thread::sleep(Duration::from_millis(1));
    }
    light.stop().unwrap();
    assert!(flips >= 3);

    // frozen after stop: parity of completed cycles decides the phase
    let expected = if light.cycles_completed() % 2 == 0 {
        Phase::Red
    } else {
        Phase::Green
    };
    assert_eq!(light.current_phase(), expected);
    assert!(light.cycles_completed() >= 5);
}

#[test]
fn waiters_on_one_light_all_return() {
    let light = Arc::new(
        TrafficLight::with_config(
            CycleConfig::default()
                .with_cycle_range(Duration::from_millis(50), Duration::from_millis(60))
                .with_seed(4),
        )
        .unwrap(),
    );
    light.simulate().unwrap();

    let waiters = (0..3)
        .map(|_| {
            let light = Arc::clone(&light);
            thread::spawn(move || light.wait_for_green_timeout(Duration::from_secs(5)))
        })
        .collect::<Vec<_>>();

    for waiter in waiters {
        waiter.join().unwrap().unwrap();
    }
    light.stop().unwrap();
}

#[test]
fn wait_on_idle_light_times_out() {
    let light = TrafficLight::with_config(fast_config(5)).unwrap();
    let err = light
        .wait_for_green_timeout(Duration::from_millis(20))
        .unwrap_err();
    assert!(matches!(err, LightError::Timeout { .. }));
    assert_eq!(light.current_phase(), Phase::Red);
}

#[test]
fn injected_rng_gives_reproducible_first_cycle() {
    let config = CycleConfig::default();
    let expected = compute_cycle_duration(&mut StdRng::seed_from_u64(99), &config);
    assert!(expected >= Duration::from_millis(4000) && expected <= Duration::from_millis(6000));

    let light = TrafficLight::with_rng(config, StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(light.current_phase(), Phase::Red);
}

#[test]
fn thousand_draws_stay_in_range() {
    let config = CycleConfig::default();
    let mut rng = StdRng::from_os_rng();
    let draws = (0..1000)
        .map(|_| compute_cycle_duration(&mut rng, &config))
        .collect::<Vec<_>>();

    assert!(draws.iter().all(|d| {
        *d >= Duration::from_millis(4000) && *d <= Duration::from_millis(6000)
    }));
    // not stuck on one value
    assert!(draws.iter().any(|d| *d != draws[0]));
}

proptest! {
    #[test]
    fn cycle_duration_within_configured_range(
        seed in any::<u64>(),
        min_ms in 0u64..10_000,
        span_ms in 0u64..10_000,
    ) {
        let config = CycleConfig::default().with_cycle_range(
            Duration::from_millis(min_ms),
            Duration::from_millis(min_ms + span_ms),
        );
        let mut rng = StdRng::seed_from_u64(seed);
        let d = compute_cycle_duration(&mut rng, &config);
        prop_assert!(d >= config.min_cycle);
        prop_assert!(d <= config.max_cycle);
    }
}
