//! Integration test for barrier ordering.
//!
//! Every rank enters the barrier at a different time and leaves a marker file
//! just before entering. After the barrier each rank must see every marker:
//! nobody may get past before the last rank has arrived.
//!
//! All ranks must share a filesystem (run on a single node).
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_barrier

use minimpi::{Mpi, ReduceOp};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank().expect("rank failed");
    let size = world.size().expect("size failed");

    // Agree on a directory name: rank 0 contributes its pid, the rest zero.
    let pid = if rank == 0 { i64::from(std::process::id()) } else { 0 };
    let job = world
        .allreduce_scalar(pid, ReduceOp::Sum)
        .expect("allreduce failed");
    let dir = std::env::temp_dir().join(format!("minimpi-barrier-{job}"));
    fs::create_dir_all(&dir).expect("failed to create rendezvous dir");

    for round in 0..3 {
        // Reverse the arrival order every other round.
        let delay = if round % 2 == 0 { rank } else { size - 1 - rank };
        thread::sleep(Duration::from_millis(50 * delay as u64));

        fs::write(marker(&dir, round, rank), b"entered").expect("failed to write marker");
        world.barrier().expect("barrier failed");

        let arrived = (0..size)
            .filter(|&r| marker(&dir, round, r).exists())
            .count();
        assert_eq!(
            arrived, size as usize,
            "rank {rank}: left barrier round {round} after only {arrived}/{size} arrivals"
        );
        if rank == 0 {
            println!("PASS: barrier round {round}");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        let _ = fs::remove_dir_all(&dir);
        println!("\nAll barrier tests passed!");
    }

    mpi.finalize().expect("MPI finalize failed");
}

fn marker(dir: &Path, round: i32, rank: i32) -> PathBuf {
    dir.join(format!("round{round}-rank{rank}"))
}
