//! All-reduce example - every reduction operator over a few datatypes.
//!
//! Run with: mpiexec -n 4 cargo run --example allreduce

use minimpi::{Mpi, ReduceOp, Result};

fn main() -> Result<()> {
    env_logger::init();

    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank()?;
    let size = world.size()?;

    println!("Rank {rank}/{size}: starting all-reduce tests");

    // ============================================================
    // Sum of ranks as i64
    // ============================================================
    {
        let send = [rank as i64];
        let mut recv = [0i64];
        world.allreduce_i64(&send, &mut recv, ReduceOp::Sum)?;

        let expected = i64::from(size) * i64::from(size - 1) / 2;
        assert_eq!(recv[0], expected, "Sum failed on rank {rank}");
        if rank == 0 {
            println!("✓ Sum of ranks = {}", recv[0]);
        }
    }

    // ============================================================
    // Max / Min of ranks
    // ============================================================
    {
        let max = world.allreduce_scalar(rank, ReduceOp::Max)?;
        let min = world.allreduce_scalar(rank, ReduceOp::Min)?;
        assert_eq!(max, size - 1, "Max failed on rank {rank}");
        assert_eq!(min, 0, "Min failed on rank {rank}");
        if rank == 0 {
            println!("✓ Max = {max}, Min = {min}");
        }
    }

    // ============================================================
    // Product of f64
    // ============================================================
    {
        let prod = world.allreduce_scalar(2.0f64, ReduceOp::Prod)?;
        let expected = 2.0f64.powi(size);
        assert!(
            (prod - expected).abs() < 1e-9,
            "Prod failed on rank {rank}: {prod} != {expected}"
        );
        if rank == 0 {
            println!("✓ Prod = {prod}");
        }
    }

    // ============================================================
    // In-place vector sum
    // ============================================================
    {
        let mut data = vec![1u64; 8];
        world.allreduce_inplace(&mut data, ReduceOp::Sum)?;
        assert!(data.iter().all(|&x| x == size as u64));
        if rank == 0 {
            println!("✓ In-place sum = {:?}", data);
        }
    }

    world.barrier()?;
    if rank == 0 {
        println!("\nAll all-reduce tests passed!");
    }

    mpi.finalize()
}
