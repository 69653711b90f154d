//! Criterion micro-benchmarks for the pause handshake.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion};
use tandem_core::{RunStateMachine, SimulationStateMachine};

/// Spawn a thread that polls `run_state` until it is stopped.
fn spawn_poller(run_state: &Arc<RunStateMachine>) -> thread::JoinHandle<u64> {
    let run_state = Arc::clone(run_state);
    thread::spawn(move || {
        let mut iterations = 0u64;
        while run_state.poll_and_advance() {
            iterations += 1;
            std::hint::spin_loop();
        }
        iterations
    })
}

fn bench_worker_pause_round_trip(c: &mut Criterion) {
    let run_state = Arc::new(RunStateMachine::new());
    run_state.boot().unwrap();
    let poller = spawn_poller(&run_state);

    c.bench_function("worker_pause_round_trip", |b| {
        b.iter(|| {
            let owned = run_state.request_pause(true).unwrap();
            black_box(owned);
            run_state.resume().unwrap();
        });
    });

    run_state.request_stop().unwrap();
    black_box(poller.join().unwrap());
    run_state.finalize_stop().unwrap();
}

fn bench_uncontended_poll(c: &mut Criterion) {
    let run_state = RunStateMachine::new();
    run_state.boot().unwrap();

    c.bench_function("poll_while_running", |b| {
        b.iter(|| black_box(run_state.poll_and_advance()));
    });
}

fn bench_simulation_pause_round_trip(c: &mut Criterion) {
    let sim_state = Arc::new(SimulationStateMachine::new());
    sim_state.resume().unwrap();
    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let stepper = {
        let sim_state = Arc::clone(&sim_state);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                black_box(sim_state.is_running());
            }
        })
    };

    c.bench_function("simulation_pause_round_trip", |b| {
        b.iter(|| {
            black_box(sim_state.pause(true).unwrap());
            sim_state.resume().unwrap();
        });
    });

    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    stepper.join().unwrap();
}

criterion_group!(
    benches,
    bench_worker_pause_round_trip,
    bench_uncontended_poll,
    bench_simulation_pause_round_trip
);
criterion_main!(benches);
