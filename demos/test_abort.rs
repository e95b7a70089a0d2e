//! Integration test for the abort paths.
//!
//! Each case runs in a child process (this same binary re-executed with
//! `MINIMPI_ABORT_CASE` set) that initializes MPI as a singleton and is
//! expected to die. The parent only checks how the child exited.
//!
//! Run without a launcher: ./target/debug/examples/test_abort

use minimpi::{DatatypeTag, Mpi, ReduceOp};
use std::env;
use std::process::{Command, ExitStatus};

const CASE_VAR: &str = "MINIMPI_ABORT_CASE";

/// Launcher variables that would make the child join a job instead of
/// starting as a singleton.
const LAUNCHER_PREFIXES: [&str; 5] = ["PMI_", "PMIX_", "OMPI_", "MPI_LOCALRANKID", "HYDRA_"];

fn main() {
    env_logger::init();

    match env::var(CASE_VAR) {
        Ok(case) => run_child(&case),
        Err(_) => run_parent(),
    }
}

fn run_child(case: &str) {
    let mpi = Mpi::init().expect("MPI init failed in child");
    let world = mpi.world();
    match case {
        "abort" => {
            let err = world.abort(7);
            eprintln!("abort returned: {err}");
        }
        "bad-op" => {
            let op = ReduceOp::from_code_or_abort(99);
            eprintln!("unknown operator code resolved to {op:?}");
        }
        "bad-datatype" => {
            let tag = DatatypeTag::from_code_or_abort(-3);
            eprintln!("unknown datatype code resolved to {tag:?}");
        }
        other => eprintln!("unknown case {other}"),
    }
    // Reaching this point means the process survived.
    std::process::exit(0);
}

fn spawn_case(case: &str) -> ExitStatus {
    let exe = env::current_exe().expect("cannot locate own executable");
    let mut cmd = Command::new(exe);
    cmd.env(CASE_VAR, case);
    for (key, _) in env::vars_os() {
        let key_str = key.to_string_lossy();
        if LAUNCHER_PREFIXES.iter().any(|p| key_str.starts_with(p)) {
            cmd.env_remove(&key);
        }
    }
    cmd.status().expect("failed to spawn child")
}

fn run_parent() {
    let status = spawn_case("abort");
    assert_eq!(
        status.code(),
        Some(7),
        "abort(7) should terminate with exit code 7, got {status}"
    );
    println!("PASS: abort terminates with the given code");

    for case in ["bad-op", "bad-datatype"] {
        let status = spawn_case(case);
        assert!(
            !status.success(),
            "{case}: unknown code should terminate the process, got {status}"
        );
        println!("PASS: {case} terminates the process ({status})");
    }

    println!("\nAll abort tests passed!");
}
