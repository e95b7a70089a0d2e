//! Single-process lifecycle test.
//!
//! MPI can be initialized once per process, so everything lives in one test
//! function and this file must stay its own test binary. It runs as an MPI
//! singleton, without a launcher.

use minimpi::{Error, Mpi, ReduceOp};

#[test]
fn singleton_lifecycle() {
    let mpi = Mpi::init().expect("MPI init failed");
    assert!(matches!(Mpi::init(), Err(Error::AlreadyInitialized)));

    assert_eq!(mpi.query_thread().unwrap(), mpi.thread_level());

    let world = mpi.world();
    assert_eq!(world.size().unwrap(), 1);
    assert_eq!(world.rank().unwrap(), 0);

    // The test harness name is always first, and no launcher flags are added.
    let args = minimpi::args().expect("args adopted after init");
    let expected: Vec<_> = std::env::args_os().collect();
    assert_eq!(args, expected.as_slice());

    // Sum over one process is the identity.
    let send = [3i64, -1, 0, i64::MAX, i64::MIN];
    let mut recv = [0i64; 5];
    world.allreduce_i64(&send, &mut recv, ReduceOp::Sum).unwrap();
    assert_eq!(recv, send);

    let mut data = [2.5f64, -4.0];
    world.allreduce_inplace(&mut data, ReduceOp::Prod).unwrap();
    assert_eq!(data, [2.5, -4.0]);

    let err = world
        .allreduce_i64(&send, &mut recv[..2], ReduceOp::Sum)
        .unwrap_err();
    assert!(matches!(err, Error::BufferLengthMismatch { send: 5, recv: 2 }));

    let empty: [i64; 0] = [];
    world.allreduce_i64(&empty, &mut [], ReduceOp::Max).unwrap();

    world.barrier().unwrap();

    mpi.finalize().expect("MPI finalize failed");
    assert!(matches!(world.size(), Err(Error::Finalized)));
    assert!(matches!(world.barrier(), Err(Error::Finalized)));
    assert!(matches!(Mpi::init(), Err(Error::Finalized)));
}
