//! Integration test for barrier and all-reduce.
//!
//! A panic hook aborts the process so a failing rank does not leave its peers
//! blocked in a collective.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_collectives

use minimpi::{Error, Mpi, ReduceOp};

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    // Installed after init: some MPI implementations install their own handlers.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank().expect("rank failed");
    let size = world.size().expect("size failed");

    // ========================================================================
    // Test 1: sum of ranks
    // ========================================================================
    {
        let send = [i64::from(rank)];
        let mut recv = [0i64];
        world
            .allreduce_i64(&send, &mut recv, ReduceOp::Sum)
            .expect("allreduce failed");
        let n = i64::from(size);
        assert_eq!(
            recv[0],
            n * (n - 1) / 2,
            "rank {rank}: sum of ranks is {}",
            recv[0]
        );
        if rank == 0 {
            println!("PASS: allreduce sum of ranks");
        }
    }

    // ========================================================================
    // Test 2: identity on a single-process communicator
    // ========================================================================
    {
        let me = mpi.self_comm();
        let send: Vec<i64> = (0..16).map(|i| i * 7 - 40 + i64::from(rank)).collect();
        let mut recv = vec![0i64; send.len()];
        me.allreduce_i64(&send, &mut recv, ReduceOp::Sum)
            .expect("self allreduce failed");
        assert_eq!(recv, send, "rank {rank}: single-process sum is not identity");
        if rank == 0 {
            println!("PASS: allreduce identity on MPI_COMM_SELF");
        }
    }

    // ========================================================================
    // Test 3: element-wise vector sum
    // ========================================================================
    {
        let send: Vec<i64> = (0..10).map(|i| i * i64::from(rank + 1)).collect();
        let mut recv = vec![0i64; 10];
        world
            .allreduce_i64(&send, &mut recv, ReduceOp::Sum)
            .expect("allreduce failed");
        let n = i64::from(size);
        let rank_sum = n * (n + 1) / 2;
        for (i, &v) in recv.iter().enumerate() {
            assert_eq!(v, i as i64 * rank_sum, "rank {rank}: recv[{i}] = {v}");
        }
        if rank == 0 {
            println!("PASS: allreduce vector sum");
        }
    }

    // ========================================================================
    // Test 4: max/min on mixed types
    // ========================================================================
    {
        let max = world
            .allreduce_scalar(rank as f32, ReduceOp::Max)
            .expect("allreduce max failed");
        assert!((max - (size - 1) as f32).abs() < f32::EPSILON);
        let min = world
            .allreduce_scalar(u8::try_from(rank % 200).unwrap_or(0) + 1, ReduceOp::Min)
            .expect("allreduce min failed");
        assert_eq!(min, 1);
        if rank == 0 {
            println!("PASS: allreduce max/min");
        }
    }

    // ========================================================================
    // Test 5: length mismatch is rejected before dispatch
    // ========================================================================
    {
        let send = [1i64, 2, 3];
        let mut recv = [0i64; 2];
        match world.allreduce_i64(&send, &mut recv, ReduceOp::Sum) {
            Err(Error::BufferLengthMismatch { send: 3, recv: 2 }) => {}
            other => panic!("rank {rank}: expected length mismatch, got {other:?}"),
        }
        assert_eq!(recv, [0, 0], "recv must be untouched");
        if rank == 0 {
            println!("PASS: allreduce length mismatch");
        }
    }

    // ========================================================================
    // Test 6: codes resolve through the closed sets
    // ========================================================================
    {
        let op = ReduceOp::try_from(0).expect("code 0 is sum");
        assert_eq!(op, ReduceOp::Sum);
        assert!(matches!(ReduceOp::try_from(17), Err(Error::UnsupportedOp(17))));
        let sum = world.allreduce_scalar(1i64, op).expect("allreduce failed");
        assert_eq!(sum, i64::from(size));
        if rank == 0 {
            println!("PASS: operator code lookup");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All collective tests passed!");
        println!("========================================");
    }

    mpi.finalize().expect("MPI finalize failed");
}
