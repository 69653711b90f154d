//! Stress test: pause storm.
//!
//! Verifies that no controller misses a wakeup when many threads race
//! to halt the same worker.
//!
//! **Workload:** a `WorkerLoop` over a `CountingScene` at a 100 µs
//! frame period.
//!
//! **Injection:** N controller threads, each looping with seeded random
//! jitter: `request_pause(true)`, hold the worker briefly if the pause
//! is theirs, then `resume()`.
//!
//! **Pass criterion:** every controller finishes all of its rounds
//! within the watchdog timeout, and the worker both halts and advances
//! during the storm.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tandem_core::{RunState, RunStateMachine, SimulationStateMachine};
use tandem_engine::{FrameCounters, WorkerLoop};
use tandem_test_utils::CountingScene;

const WATCHDOG: Duration = Duration::from_secs(60);

struct Shared {
    run_state: RunStateMachine,
    sim_state: SimulationStateMachine,
    scene: Mutex<CountingScene>,
    counters: FrameCounters,
}

fn storm(controllers: u64, rounds: u64, seed: u64) {
    let (scene, probe) = CountingScene::new();
    let shared = Arc::new(Shared {
        run_state: RunStateMachine::new(),
        sim_state: SimulationStateMachine::new(),
        scene: Mutex::new(scene),
        counters: FrameCounters::default(),
    });
    shared.run_state.boot().unwrap();
    shared.sim_state.resume().unwrap();

    let worker = {
        let shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("storm-worker".into())
            .spawn(move || {
                WorkerLoop::new(
                    &shared.run_state,
                    &shared.sim_state,
                    &shared.scene,
                    Duration::from_micros(100),
                    &shared.counters,
                )
                .run()
            })
            .unwrap()
    };

    let owned = Arc::new(AtomicU64::new(0));
    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    for id in 0..controllers {
        let shared = Arc::clone(&shared);
        let owned = Arc::clone(&owned);
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(id));
            for _ in 0..rounds {
                thread::sleep(Duration::from_micros(rng.random_range(0..300)));
                let mine = shared.run_state.request_pause(true).unwrap();
                if mine {
                    // Nobody else can lift a pause we own.
                    assert_eq!(shared.run_state.state(), RunState::Paused);
                    owned.fetch_add(1, Ordering::Relaxed);
                    if rng.random_bool(0.5) {
                        thread::sleep(Duration::from_micros(rng.random_range(0..200)));
                    }
                    shared.run_state.resume().unwrap();
                }
            }
            done_tx.send(id).unwrap();
        });
    }
    drop(done_tx);

    for _ in 0..controllers {
        done_rx
            .recv_timeout(WATCHDOG)
            .expect("a controller never returned from request_pause(true)");
    }

    let frames_before_stop = probe.renders();
    shared.run_state.request_stop().unwrap();
    worker.join().unwrap().unwrap();
    shared.run_state.finalize_stop().unwrap();

    assert!(owned.load(Ordering::Relaxed) > 0, "no controller ever paused");
    assert!(frames_before_stop > 0, "worker never iterated");
    assert_eq!(
        shared.counters.snapshot().worker_pauses,
        owned.load(Ordering::Relaxed),
        "each owned pause is acknowledged exactly once"
    );
}

#[test]
fn pause_storm_two_controllers() {
    storm(2, 200, 0x5eed);
}

#[test]
fn pause_storm_eight_controllers() {
    storm(8, 100, 42);
}

#[test]
#[ignore]
fn pause_storm_sixty_four_controllers() {
    storm(64, 500, 7);
}
