//! Safe wrappers for MPI communicator operations.

use crate::datatype::MpiDatatype;
use crate::error::{Error, Result};
use crate::{ensure_active, ffi, ReduceOp};
use log::{debug, trace};
use std::marker::PhantomData;

/// An MPI communicator.
///
/// Wraps an opaque handle into the C shim's communicator table. The handle is
/// only ever passed back to the shim, never interpreted.
///
/// # Example
///
/// ```no_run
/// use minimpi::Mpi;
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// println!("I am rank {} of {}", world.rank().unwrap(), world.size().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Communicator {
    handle: i32,
    /// Marker to prevent Send/Sync (MPI communicators are not thread-safe)
    _marker: PhantomData<*mut ()>,
}

impl Communicator {
    pub(crate) fn world() -> Self {
        Communicator {
            handle: unsafe { ffi::minimpi_comm_world() },
            _marker: PhantomData,
        }
    }

    pub(crate) fn self_comm() -> Self {
        Communicator {
            handle: unsafe { ffi::minimpi_comm_self() },
            _marker: PhantomData,
        }
    }

    /// Get the raw communicator handle (for advanced use).
    pub fn raw_handle(&self) -> i32 {
        self.handle
    }

    /// Get the rank of the calling process in this communicator.
    pub fn rank(&self) -> Result<i32> {
        ensure_active()?;
        let mut rank: i32 = -1;
        let ret = unsafe { ffi::minimpi_comm_rank(self.handle, &mut rank) };
        Error::check("MPI_Comm_rank", ret)?;
        Ok(rank)
    }

    /// Get the number of processes in this communicator.
    pub fn size(&self) -> Result<i32> {
        ensure_active()?;
        let mut size: i32 = -1;
        let ret = unsafe { ffi::minimpi_comm_size(self.handle, &mut size) };
        Error::check("MPI_Comm_size", ret)?;
        Ok(size)
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All processes in the communicator must call this function. No process
    /// will return until all processes have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        ensure_active()?;
        trace!("barrier on comm {}", self.handle);
        let ret = unsafe { ffi::minimpi_barrier(self.handle) };
        Error::check("MPI_Barrier", ret)
    }

    // ========================================================================
    // All-reduce
    // ========================================================================

    /// All-reduce: combine `send` element-wise across all processes with `op`
    /// and deliver the result to `recv` on every process.
    ///
    /// `send` and `recv` must have the same length, and every process must
    /// pass the same length. The first condition is checked here; the second
    /// is the caller's responsibility.
    pub fn allreduce<T: MpiDatatype>(&self, send: &[T], recv: &mut [T], op: ReduceOp) -> Result<()> {
        ensure_active()?;
        if send.len() != recv.len() {
            return Err(Error::BufferLengthMismatch {
                send: send.len(),
                recv: recv.len(),
            });
        }
        let count = native_count(send.len())?;
        trace!(
            "allreduce {count} x {:?} ({op:?}) on comm {}",
            T::TAG,
            self.handle
        );
        let ret = unsafe {
            ffi::minimpi_allreduce(
                send.as_ptr().cast(),
                recv.as_mut_ptr().cast(),
                count,
                T::TAG.code(),
                op.code(),
                self.handle,
            )
        };
        Error::check("MPI_Allreduce", ret)
    }

    /// All-reduce of 64-bit signed integers.
    pub fn allreduce_i64(&self, send: &[i64], recv: &mut [i64], op: ReduceOp) -> Result<()> {
        self.allreduce(send, recv, op)
    }

    /// All-reduce in place (`MPI_IN_PLACE`): `data` is both the contribution
    /// and the result.
    pub fn allreduce_inplace<T: MpiDatatype>(&self, data: &mut [T], op: ReduceOp) -> Result<()> {
        ensure_active()?;
        let count = native_count(data.len())?;
        trace!(
            "allreduce in place {count} x {:?} ({op:?}) on comm {}",
            T::TAG,
            self.handle
        );
        let ret = unsafe {
            ffi::minimpi_allreduce_inplace(
                data.as_mut_ptr().cast(),
                count,
                T::TAG.code(),
                op.code(),
                self.handle,
            )
        };
        Error::check("MPI_Allreduce", ret)
    }

    /// All-reduce a single value.
    pub fn allreduce_scalar<T: MpiDatatype>(&self, value: T, op: ReduceOp) -> Result<T> {
        let send = [value];
        let mut recv = [value];
        self.allreduce(&send, &mut recv, op)?;
        Ok(recv[0])
    }

    // ========================================================================
    // Abort
    // ========================================================================

    /// Terminate every process in this communicator with `errorcode`.
    ///
    /// Does not return when the abort goes through. The returned error
    /// describes why the native call could not be issued.
    ///
    /// ```no_run
    /// # fn run() -> minimpi::Result<()> {
    /// let mpi = minimpi::Mpi::init()?;
    /// let world = mpi.world();
    /// if world.size()? < 2 {
    ///     return Err(world.abort(3));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn abort(&self, errorcode: i32) -> Error {
        if let Err(e) = ensure_active() {
            return e;
        }
        debug!("aborting comm {} with code {errorcode}", self.handle);
        let ret = unsafe { ffi::minimpi_abort(self.handle, errorcode) };
        if ret != 0 {
            return Error::from_code("MPI_Abort", ret);
        }
        // MPI_Abort reported success yet returned: honor the request anyway.
        std::process::exit(errorcode)
    }
}

/// Element count as the shim's 64-bit count, bounded by the native `int`.
fn native_count(len: usize) -> Result<i64> {
    if len > i32::MAX as usize {
        return Err(Error::InvalidCount(len));
    }
    Ok(len as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_count_bounds() {
        assert_eq!(native_count(0).unwrap(), 0);
        assert_eq!(native_count(i32::MAX as usize).unwrap(), i64::from(i32::MAX));
        assert!(matches!(
            native_count(i32::MAX as usize + 1),
            Err(Error::InvalidCount(_))
        ));
    }

    #[test]
    fn operations_before_init_are_rejected() {
        let world = Communicator::world();
        assert!(matches!(world.rank(), Err(Error::NotInitialized)));
        assert!(matches!(world.size(), Err(Error::NotInitialized)));
        assert!(matches!(world.barrier(), Err(Error::NotInitialized)));
        let mut recv = [0i64; 2];
        assert!(matches!(
            world.allreduce_i64(&[1, 2], &mut recv, ReduceOp::Sum),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(world.abort(1), Error::NotInitialized));
    }

    #[test]
    fn shim_handles_are_distinct() {
        assert_eq!(Communicator::world().raw_handle(), 0);
        assert_eq!(Communicator::self_comm().raw_handle(), 1);
    }
}
