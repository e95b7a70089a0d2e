//! Integration test for the MPI lifecycle.
//!
//! Exercises Mpi::init, the double-init guard, rank/size, thread_level,
//! version, wtime, explicit finalize and the post-finalize guard.
//!
//! Run with: mpiexec -n 2 ./target/debug/examples/test_lifecycle

use minimpi::{Error, Mpi, ThreadLevel};

fn main() {
    env_logger::init();

    let mpi = Mpi::init().expect("MPI init failed");

    assert!(
        Mpi::is_initialized(),
        "is_initialized should be true after init"
    );
    assert!(
        !Mpi::is_finalized(),
        "is_finalized should be false before finalize"
    );
    println!("PASS: is_initialized / is_finalized");

    match Mpi::init() {
        Err(Error::AlreadyInitialized) => println!("PASS: second init rejected"),
        Err(e) => panic!("second init returned the wrong error: {e}"),
        Ok(_) => panic!("second init should fail"),
    }

    let level = mpi.thread_level();
    assert!(level >= ThreadLevel::Single);
    assert_eq!(
        mpi.query_thread().expect("query_thread failed"),
        level,
        "init should report the runtime's provided level"
    );
    println!("PASS: thread_level = {level:?}");

    let version = Mpi::version().expect("version() failed");
    assert!(!version.is_empty(), "version string should not be empty");
    println!("PASS: version");

    let t1 = mpi.wtime();
    let t2 = mpi.wtime();
    assert!(t2 >= t1, "wtime should be monotonic");
    println!("PASS: wtime = {t1}");

    let world = mpi.world();
    let rank = world.rank().expect("rank failed");
    let size = world.size().expect("size failed");
    assert!(size >= 1, "size should be >= 1");
    assert!((0..size).contains(&rank), "rank should be in [0, size)");
    println!("PASS: world rank={rank} size={size}");

    let me = mpi.self_comm();
    assert_eq!(me.size().expect("self size failed"), 1);
    assert_eq!(me.rank().expect("self rank failed"), 0);
    println!("PASS: self communicator");

    assert!(!mpi.args().is_empty(), "program name should survive init");
    assert_eq!(minimpi::args().map(<[_]>::len), Some(mpi.args().len()));
    println!("PASS: args = {:?}", mpi.args());

    mpi.finalize().expect("MPI finalize failed");
    println!("PASS: finalize");

    assert!(Mpi::is_finalized(), "is_finalized should be true after finalize");
    assert!(matches!(world.rank(), Err(Error::Finalized)));
    assert!(matches!(world.barrier(), Err(Error::Finalized)));
    let mut recv = [0i64];
    assert!(matches!(
        world.allreduce_i64(&[1], &mut recv, minimpi::ReduceOp::Sum),
        Err(Error::Finalized)
    ));
    println!("PASS: operations rejected after finalize");

    assert!(matches!(Mpi::init(), Err(Error::Finalized)));
    println!("PASS: re-init rejected after finalize");

    if rank == 0 {
        println!("\n========================================");
        println!("All lifecycle tests passed!");
        println!("========================================");
    }
}
