//! MPI datatype trait and type tag mapping.
//!
//! [`MpiDatatype`] is a sealed trait mapping Rust primitives to the datatype
//! codes understood by the C shim. [`DatatypeTag`] is the closed set of those
//! codes.
//!
//! | Rust Type | MPI Equivalent  | Code |
//! |-----------|-----------------|------|
//! | `i64`     | `MPI_INT64_T`   | 0    |
//! | `i32`     | `MPI_INT32_T`   | 1    |
//! | `f64`     | `MPI_DOUBLE`    | 2    |
//! | `f32`     | `MPI_FLOAT`     | 3    |
//! | `u64`     | `MPI_UINT64_T`  | 4    |
//! | `u8`      | `MPI_UINT8_T`   | 5    |

use crate::error::{Error, Result};
use crate::ffi;

mod sealed {
    pub trait Sealed {}
}

/// Datatype codes matching the `MINIMPI_*` defines in `csrc/minimpi.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DatatypeTag {
    /// 64-bit signed integer (`MPI_INT64_T`)
    I64 = 0,
    /// 32-bit signed integer (`MPI_INT32_T`)
    I32 = 1,
    /// 64-bit floating point (`MPI_DOUBLE`)
    F64 = 2,
    /// 32-bit floating point (`MPI_FLOAT`)
    F32 = 3,
    /// 64-bit unsigned integer (`MPI_UINT64_T`)
    U64 = 4,
    /// 8-bit unsigned integer (`MPI_UINT8_T`)
    U8 = 5,
}

impl DatatypeTag {
    /// Every supported tag, in code order.
    pub const ALL: [DatatypeTag; 6] = [
        DatatypeTag::I64,
        DatatypeTag::I32,
        DatatypeTag::F64,
        DatatypeTag::F32,
        DatatypeTag::U64,
        DatatypeTag::U8,
    ];

    /// The integer code passed across the FFI boundary.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolve a raw code, aborting `MPI_COMM_WORLD` with exit code 1 when it
    /// is unknown.
    ///
    /// This is the fail-fast counterpart of `DatatypeTag::try_from`, matching
    /// how the MPI runtime treats invalid datatype handles. Without an active
    /// MPI environment the process is aborted directly.
    pub fn from_code_or_abort(code: i32) -> Self {
        match Self::try_from(code) {
            Ok(tag) => tag,
            Err(_) => {
                log::error!("unknown datatype code {code}, aborting");
                if crate::is_active() {
                    unsafe { ffi::minimpi_require_datatype(code) };
                }
                std::process::abort()
            }
        }
    }
}

impl TryFrom<i32> for DatatypeTag {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        DatatypeTag::ALL
            .into_iter()
            .find(|tag| tag.code() == code)
            .ok_or(Error::UnsupportedDatatype(code))
    }
}

/// Trait for types that can be used in MPI communication operations.
///
/// This is a **sealed trait**: it cannot be implemented outside this crate.
/// Supported types: [`i64`], [`i32`], [`f64`], [`f32`], [`u64`], [`u8`].
///
/// # Example
///
/// ```no_run
/// use minimpi::{Mpi, ReduceOp};
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// let mut counts = [world.rank().unwrap() as i64];
/// world.allreduce_inplace(&mut counts, ReduceOp::Sum).unwrap();
///
/// let max = world.allreduce_scalar(1.5f64, ReduceOp::Max).unwrap();
/// ```
pub trait MpiDatatype: sealed::Sealed + Copy + Send + 'static {
    /// The datatype tag used for FFI dispatch to the C shim.
    const TAG: DatatypeTag;
}

macro_rules! impl_mpi_datatype {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl MpiDatatype for $ty {
            const TAG: DatatypeTag = $tag;
        }
    };
}

impl_mpi_datatype!(i64, DatatypeTag::I64);
impl_mpi_datatype!(i32, DatatypeTag::I32);
impl_mpi_datatype!(f64, DatatypeTag::F64);
impl_mpi_datatype!(f32, DatatypeTag::F32);
impl_mpi_datatype!(u64, DatatypeTag::U64);
impl_mpi_datatype!(u8, DatatypeTag::U8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_zero_is_int64() {
        assert_eq!(DatatypeTag::try_from(0).unwrap(), DatatypeTag::I64);
        assert_eq!(i64::TAG, DatatypeTag::I64);
    }

    #[test]
    fn tags_match_c_defines() {
        assert_eq!(i64::TAG.code(), 0); // MINIMPI_I64
        assert_eq!(i32::TAG.code(), 1); // MINIMPI_I32
        assert_eq!(f64::TAG.code(), 2); // MINIMPI_F64
        assert_eq!(f32::TAG.code(), 3); // MINIMPI_F32
        assert_eq!(u64::TAG.code(), 4); // MINIMPI_U64
        assert_eq!(u8::TAG.code(), 5); // MINIMPI_U8
    }

    #[test]
    fn all_is_in_code_order() {
        for (i, tag) in DatatypeTag::ALL.iter().enumerate() {
            assert_eq!(tag.code(), i as i32, "{tag:?} out of order");
            assert_eq!(DatatypeTag::try_from(i as i32).unwrap(), *tag);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        for code in [-1, 6, 99, i32::MAX] {
            assert!(matches!(
                DatatypeTag::try_from(code),
                Err(Error::UnsupportedDatatype(c)) if c == code
            ));
        }
    }

    #[test]
    fn known_code_does_not_abort() {
        assert_eq!(DatatypeTag::from_code_or_abort(2), DatatypeTag::F64);
    }
}
