//! Raw FFI bindings to the C shim in `csrc/minimpi.c`.
//!
//! These are low-level unsafe functions. Use the safe wrappers in the parent module.

use std::os::raw::{c_char, c_double, c_int, c_void};

extern "C" {
    // ============================================================
    // Lifecycle
    // ============================================================

    pub fn minimpi_init(argc: *mut c_int, argv: *mut *mut *mut c_char) -> c_int;
    pub fn minimpi_init_thread(
        argc: *mut c_int,
        argv: *mut *mut *mut c_char,
        required: c_int,
        provided: *mut c_int,
    ) -> c_int;
    pub fn minimpi_finalize() -> c_int;
    pub fn minimpi_initialized(flag: *mut c_int) -> c_int;
    pub fn minimpi_finalized(flag: *mut c_int) -> c_int;
    pub fn minimpi_query_thread(provided: *mut c_int) -> c_int;

    // ============================================================
    // Communicators
    // ============================================================

    pub fn minimpi_comm_world() -> i32;
    pub fn minimpi_comm_self() -> i32;
    pub fn minimpi_comm_rank(comm: i32, rank: *mut i32) -> c_int;
    pub fn minimpi_comm_size(comm: i32, size: *mut i32) -> c_int;

    // ============================================================
    // Synchronization and collectives
    // ============================================================

    pub fn minimpi_barrier(comm: i32) -> c_int;

    pub fn minimpi_allreduce(
        sendbuf: *const c_void,
        recvbuf: *mut c_void,
        count: i64,
        datatype: i32,
        op: i32,
        comm: i32,
    ) -> c_int;

    pub fn minimpi_allreduce_inplace(
        buf: *mut c_void,
        count: i64,
        datatype: i32,
        op: i32,
        comm: i32,
    ) -> c_int;

    pub fn minimpi_require_op(op: i32);
    pub fn minimpi_require_datatype(datatype: i32);

    // ============================================================
    // Utilities
    // ============================================================

    pub fn minimpi_abort(comm: i32, errorcode: i32) -> c_int;
    pub fn minimpi_wtime() -> c_double;
    pub fn minimpi_get_version(version: *mut c_char, len: *mut i32) -> c_int;
    pub fn minimpi_error_string(code: c_int, message: *mut c_char, len: *mut i32) -> c_int;
}
