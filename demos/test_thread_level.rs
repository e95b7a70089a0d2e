//! Integration test for thread-level initialization.
//!
//! Requests `MPI_THREAD_FUNNELED`: worker threads compute, only the main
//! thread talks to MPI.
//!
//! Run with: mpiexec -n 2 ./target/debug/examples/test_thread_level

use minimpi::{Mpi, ReduceOp, ThreadLevel};
use std::thread;

const WORKERS: i64 = 4;

fn main() {
    env_logger::init();

    let mpi = Mpi::init_thread(ThreadLevel::Funneled).expect("MPI init_thread failed");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let level = mpi.thread_level();
    assert!(
        (ThreadLevel::Single..=ThreadLevel::Multiple).contains(&level),
        "thread_level out of range: {level:?}"
    );
    if level < ThreadLevel::Funneled {
        eprintln!("Warning: MPI only provided {level:?}, expected Funneled");
    }
    let queried = mpi.query_thread().expect("query_thread failed");
    assert_eq!(queried, level, "MPI_Query_thread disagrees with init_thread");
    println!("PASS: thread_level = {level:?}");

    let world = mpi.world();
    let rank = world.rank().expect("rank failed");
    let size = world.size().expect("size failed");
    assert!(size >= 1);
    assert!((0..size).contains(&rank));
    println!("PASS: rank {rank} of {size} under init_thread");

    // Local work on plain threads, no MPI calls off the main thread.
    let local: i64 = (0..WORKERS)
        .map(|w| thread::spawn(move || i64::from(rank) * WORKERS + w))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .sum();

    let total = world
        .allreduce_scalar(local, ReduceOp::Sum)
        .expect("allreduce failed");
    let n = i64::from(size) * WORKERS;
    assert_eq!(total, n * (n - 1) / 2, "rank {rank}: funneled sum is {total}");
    println!("PASS: funneled allreduce");

    mpi.finalize().expect("MPI finalize failed");
    if rank == 0 {
        println!("\nAll thread level tests passed!");
    }
}
