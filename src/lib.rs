//! # minimpi
//!
//! Minimal safe Rust bindings for MPI (Message Passing Interface).
//!
//! The crate forwards a small set of primitives to the native MPI library
//! through a thin C shim, translating arguments and status codes at the
//! boundary:
//! - initialization and finalization, including argument vector adoption
//! - rank and size queries
//! - barrier synchronization
//! - all-reduce over [`MpiDatatype`] buffers
//! - abort
//!
//! Collective algorithms, process management and transport belong to the MPI
//! implementation selected at link time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use minimpi::{Mpi, ReduceOp};
//!
//! fn main() -> Result<(), minimpi::Error> {
//!     let mpi = Mpi::init()?;
//!     let world = mpi.world();
//!
//!     let rank = world.rank()?;
//!     let size = world.size()?;
//!     println!("Hello from rank {rank} of {size}");
//!
//!     let send = [rank as i64];
//!     let mut recv = [0i64];
//!     world.allreduce_i64(&send, &mut recv, ReduceOp::Sum)?;
//!     assert_eq!(recv[0], (size * (size - 1) / 2) as i64);
//!
//!     world.barrier()?;
//!     mpi.finalize()
//! }
//! ```
//!
//! ## Lifecycle
//!
//! MPI is a single process-wide runtime. [`Mpi::init`] acquires it and
//! [`Mpi::finalize`] (or dropping the handle) releases it. Operations outside
//! that window return [`Error::NotInitialized`] or [`Error::Finalized`]
//! instead of calling into the native library. MPI cannot be re-initialized
//! after finalization.
//!
//! ## Threads
//!
//! [`Mpi`] and [`Communicator`] are neither `Send` nor `Sync`. Use
//! [`Mpi::init_thread`] when other threads need to make MPI calls.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod args;
mod comm;
mod datatype;
mod error;
mod ffi;

pub use args::args;
pub use comm::Communicator;
pub use datatype::{DatatypeTag, MpiDatatype};
pub use error::{Error, Result};

use log::{debug, warn};
use std::ffi::OsString;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};

const STATE_UNINITIALIZED: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_FINALIZED: u8 = 2;
/// Native initialization returned an error; the runtime may be half set up.
const STATE_FAILED: u8 = 3;

/// Process-wide lifecycle of the native runtime
static MPI_STATE: AtomicU8 = AtomicU8::new(STATE_UNINITIALIZED);

pub(crate) fn is_active() -> bool {
    MPI_STATE.load(Ordering::SeqCst) == STATE_ACTIVE
}

/// Guard for every native call made through a [`Communicator`].
pub(crate) fn ensure_active() -> Result<()> {
    check_active(&MPI_STATE)
}

fn check_active(state: &AtomicU8) -> Result<()> {
    match state.load(Ordering::SeqCst) {
        STATE_ACTIVE => Ok(()),
        STATE_FINALIZED => Err(Error::Finalized),
        STATE_FAILED => Err(Error::InitFailed),
        _ => Err(Error::NotInitialized),
    }
}

/// Claim the runtime for initialization.
fn acquire(state: &AtomicU8) -> Result<()> {
    match state.compare_exchange(
        STATE_UNINITIALIZED,
        STATE_ACTIVE,
        Ordering::SeqCst,
        Ordering::SeqCst,
    ) {
        Ok(_) => Ok(()),
        Err(STATE_FINALIZED) => Err(Error::Finalized),
        Err(STATE_FAILED) => Err(Error::InitFailed),
        Err(_) => Err(Error::AlreadyInitialized),
    }
}

/// Give the claim back when initialization stopped before any native call.
fn abandon(state: &AtomicU8) {
    state.store(STATE_UNINITIALIZED, Ordering::SeqCst);
}

/// Record the status of `MPI_Init`/`MPI_Init_thread`.
///
/// A native failure is final: MPI may not be initialized twice, so the state
/// never returns to uninitialized.
fn settle_init(state: &AtomicU8, ret: i32) -> bool {
    if ret != 0 {
        state.store(STATE_FAILED, Ordering::SeqCst);
        return false;
    }
    true
}

/// MPI thread support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ThreadLevel {
    /// Only single-threaded execution
    Single = 0,
    /// Multi-threaded, but MPI calls only from main thread
    Funneled = 1,
    /// Multi-threaded, but MPI calls serialized by user
    Serialized = 2,
    /// Full multi-threaded support
    Multiple = 3,
}

impl ThreadLevel {
    fn from_provided(provided: i32) -> Self {
        match provided {
            0 => ThreadLevel::Single,
            1 => ThreadLevel::Funneled,
            2 => ThreadLevel::Serialized,
            _ => ThreadLevel::Multiple,
        }
    }
}

/// Reduction operations.
///
/// Discriminants match the `MINIMPI_OP_*` defines in `csrc/minimpi.h`; code
/// `0` is the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReduceOp {
    /// Sum of values
    Sum = 0,
    /// Maximum value
    Max = 1,
    /// Minimum value
    Min = 2,
    /// Product of values
    Prod = 3,
}

impl ReduceOp {
    /// Every supported operator, in code order.
    pub const ALL: [ReduceOp; 4] = [ReduceOp::Sum, ReduceOp::Max, ReduceOp::Min, ReduceOp::Prod];

    /// The integer code passed across the FFI boundary.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolve a raw code, aborting `MPI_COMM_WORLD` with exit code 1 when it
    /// is unknown.
    ///
    /// Use [`ReduceOp::try_from`] to get [`Error::UnsupportedOp`] instead.
    pub fn from_code_or_abort(code: i32) -> Self {
        match Self::try_from(code) {
            Ok(op) => op,
            Err(_) => {
                log::error!("unknown reduction operator code {code}, aborting");
                if is_active() {
                    unsafe { ffi::minimpi_require_op(code) };
                }
                std::process::abort()
            }
        }
    }
}

impl TryFrom<i32> for ReduceOp {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        ReduceOp::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or(Error::UnsupportedOp(code))
    }
}

/// MPI environment handle.
///
/// There is at most one live instance per process. Dropping it finalizes MPI
/// if [`finalize`](Self::finalize) was not called.
///
/// # Example
///
/// ```no_run
/// use minimpi::Mpi;
///
/// let mpi = Mpi::init().expect("Failed to initialize MPI");
/// let world = mpi.world();
/// println!("Running on {} processes", world.size().unwrap());
/// mpi.finalize().expect("Failed to finalize MPI");
/// ```
pub struct Mpi {
    thread_level: ThreadLevel,
    /// Marker to make Mpi !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl Mpi {
    /// Initialize MPI with the process arguments.
    ///
    /// The arguments are passed to `MPI_Init`; whatever the runtime leaves in
    /// `argv` becomes the list returned by [`args`].
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized, was finalized, or if
    /// the native call fails.
    pub fn init() -> Result<Self> {
        Self::initialize(None)
    }

    /// Initialize MPI requesting the given thread support level.
    ///
    /// The level actually provided is available from
    /// [`thread_level()`](Self::thread_level).
    pub fn init_thread(required: ThreadLevel) -> Result<Self> {
        Self::initialize(Some(required))
    }

    fn initialize(required: Option<ThreadLevel>) -> Result<Self> {
        acquire(&MPI_STATE)?;

        let mut native = match args::NativeArgv::new(std::env::args_os()) {
            Ok(native) => native,
            Err(e) => {
                abandon(&MPI_STATE);
                return Err(e);
            }
        };
        let mut argc = native.argc();
        let mut argv = native.as_mut_ptr();
        let mut provided: i32 = ThreadLevel::Single as i32;

        let ret = unsafe {
            match required {
                Some(level) => {
                    ffi::minimpi_init_thread(&mut argc, &mut argv, level as i32, &mut provided)
                }
                None => ffi::minimpi_init(&mut argc, &mut argv),
            }
        };
        if !settle_init(&MPI_STATE, ret) {
            return Err(Error::Init {
                code: ret,
                message: error::error_string(ret),
            });
        }

        if required.is_none() {
            // Plain MPI_Init may still provide more than Single.
            provided = query_provided().unwrap_or(provided);
        }

        let remaining = unsafe { args::collect(argc, argv) };
        drop(native);
        debug!(
            "MPI initialized ({} arguments remaining, thread level {provided})",
            remaining.len()
        );
        args::adopt(remaining);

        Ok(Mpi {
            thread_level: ThreadLevel::from_provided(provided),
            _marker: PhantomData,
        })
    }

    /// Finalize MPI.
    ///
    /// Every communicator operation fails with [`Error::Finalized`]
    /// afterwards. A failing `MPI_Finalize` is reported but not rolled back.
    pub fn finalize(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if MPI_STATE
            .compare_exchange(
                STATE_ACTIVE,
                STATE_FINALIZED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Ok(());
        }
        let ret = unsafe { ffi::minimpi_finalize() };
        if ret != 0 {
            return Err(Error::Finalize {
                code: ret,
                message: error::error_string(ret),
            });
        }
        debug!("MPI finalized");
        Ok(())
    }

    /// Get the thread support level provided at initialization.
    ///
    /// After [`init`](Self::init) this is the runtime's default level as
    /// reported by `MPI_Query_thread`.
    pub fn thread_level(&self) -> ThreadLevel {
        self.thread_level
    }

    /// Ask the runtime for the current thread support level.
    pub fn query_thread(&self) -> Result<ThreadLevel> {
        ensure_active()?;
        query_provided().map(ThreadLevel::from_provided)
    }

    /// Get a handle to `MPI_COMM_WORLD`.
    pub fn world(&self) -> Communicator {
        Communicator::world()
    }

    /// Get a handle to `MPI_COMM_SELF`.
    pub fn self_comm(&self) -> Communicator {
        Communicator::self_comm()
    }

    /// The process arguments as adopted from MPI initialization.
    pub fn args(&self) -> &'static [OsString] {
        args::args().unwrap_or_default()
    }

    /// High-resolution wall-clock time in seconds.
    pub fn wtime(&self) -> f64 {
        unsafe { ffi::minimpi_wtime() }
    }

    /// Get the MPI library version string.
    pub fn version() -> Result<String> {
        let mut buf = vec![0u8; 8192];
        let mut len: i32 = 0;
        let ret = unsafe { ffi::minimpi_get_version(buf.as_mut_ptr().cast(), &mut len) };
        Error::check("MPI_Get_library_version", ret)?;
        let len = (len.max(0) as usize).min(buf.len());
        Ok(String::from_utf8_lossy(&buf[..len])
            .trim_end_matches(['\0', '\n', ' '])
            .to_string())
    }

    /// Ask the native library whether MPI has been initialized.
    pub fn is_initialized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::minimpi_initialized(&mut flag) };
        flag != 0
    }

    /// Ask the native library whether MPI has been finalized.
    pub fn is_finalized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::minimpi_finalized(&mut flag) };
        flag != 0
    }
}

fn query_provided() -> Result<i32> {
    let mut provided: i32 = 0;
    let ret = unsafe { ffi::minimpi_query_thread(&mut provided) };
    Error::check("MPI_Query_thread", ret)?;
    Ok(provided)
}

impl Drop for Mpi {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("MPI finalization on drop failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_op_codes() {
        assert_eq!(ReduceOp::Sum.code(), 0);
        assert_eq!(ReduceOp::Max.code(), 1);
        assert_eq!(ReduceOp::Min.code(), 2);
        assert_eq!(ReduceOp::Prod.code(), 3);
    }

    #[test]
    fn reduce_op_from_code() {
        for op in ReduceOp::ALL {
            assert_eq!(ReduceOp::try_from(op.code()).unwrap(), op);
        }
        assert!(matches!(
            ReduceOp::try_from(4),
            Err(Error::UnsupportedOp(4))
        ));
        assert!(matches!(
            ReduceOp::try_from(-1),
            Err(Error::UnsupportedOp(-1))
        ));
    }

    #[test]
    fn known_op_code_does_not_abort() {
        assert_eq!(ReduceOp::from_code_or_abort(0), ReduceOp::Sum);
    }

    #[test]
    fn thread_level_ordering() {
        assert!(ThreadLevel::Single < ThreadLevel::Funneled);
        assert!(ThreadLevel::Serialized < ThreadLevel::Multiple);
        assert_eq!(ThreadLevel::from_provided(2), ThreadLevel::Serialized);
        assert_eq!(ThreadLevel::from_provided(7), ThreadLevel::Multiple);
    }

    #[test]
    fn guard_rejects_before_init() {
        // Unit tests never initialize MPI.
        assert!(matches!(ensure_active(), Err(Error::NotInitialized)));
        assert!(args::args().is_none());
    }

    #[test]
    fn failed_native_init_is_not_rolled_back() {
        let state = AtomicU8::new(STATE_UNINITIALIZED);
        acquire(&state).unwrap();
        assert!(!settle_init(&state, 1));

        assert!(matches!(acquire(&state), Err(Error::InitFailed)));
        assert!(matches!(acquire(&state), Err(Error::InitFailed)));
        assert!(matches!(check_active(&state), Err(Error::InitFailed)));
    }

    #[test]
    fn successful_native_init_activates() {
        let state = AtomicU8::new(STATE_UNINITIALIZED);
        acquire(&state).unwrap();
        assert!(settle_init(&state, 0));
        assert!(check_active(&state).is_ok());
        assert!(matches!(acquire(&state), Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn abandoned_init_can_be_retried() {
        // Argument marshalling failed before the native call.
        let state = AtomicU8::new(STATE_UNINITIALIZED);
        acquire(&state).unwrap();
        abandon(&state);
        assert!(matches!(check_active(&state), Err(Error::NotInitialized)));
        assert!(acquire(&state).is_ok());
    }

    #[test]
    fn finalized_state_refuses_init() {
        let state = AtomicU8::new(STATE_FINALIZED);
        assert!(matches!(acquire(&state), Err(Error::Finalized)));
        assert!(matches!(check_active(&state), Err(Error::Finalized)));
    }
}
