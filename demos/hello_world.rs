//! Hello World example - initialization, rank/size queries and a barrier.
//!
//! Run with: mpiexec -n 4 cargo run --example hello_world

use minimpi::{Mpi, Result};

fn main() -> Result<()> {
    env_logger::init();

    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank()?;
    let size = world.size()?;
    let version = Mpi::version()?;
    let first_line = version.lines().next().unwrap_or_default();

    println!("Hello from rank {rank} of {size} ({first_line})");
    println!("Rank {rank}: arguments after init = {:?}", mpi.args());

    world.barrier()?;

    if rank == 0 {
        println!("\nAll processes reported in. Test passed!");
    }

    mpi.finalize()
}
