//! Error types for minimpi

use crate::ffi;
use thiserror::Error;

/// Result type for MPI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for MPI operations
#[derive(Error, Debug)]
pub enum Error {
    /// MPI has already been initialized in this process
    #[error("MPI has already been initialized")]
    AlreadyInitialized,

    /// MPI has not been initialized yet
    #[error("MPI has not been initialized")]
    NotInitialized,

    /// MPI has been finalized and cannot be used or re-initialized
    #[error("MPI has already been finalized")]
    Finalized,

    /// An earlier native initialization failed; MPI cannot be initialized again
    #[error("MPI initialization failed earlier in this process")]
    InitFailed,

    /// `MPI_Init` / `MPI_Init_thread` returned a nonzero status
    #[error("error initializing MPI (code {code}): {message}")]
    Init {
        /// Native error code
        code: i32,
        /// Message from `MPI_Error_string`
        message: String,
    },

    /// `MPI_Finalize` returned a nonzero status
    #[error("error finalizing MPI (code {code}): {message}")]
    Finalize {
        /// Native error code
        code: i32,
        /// Message from `MPI_Error_string`
        message: String,
    },

    /// Any other native call returned a nonzero status
    #[error("{call} failed (code {code}): {message}")]
    Mpi {
        /// Name of the native MPI routine
        call: &'static str,
        /// Native error code
        code: i32,
        /// Message from `MPI_Error_string`
        message: String,
    },

    /// Send and receive buffers differ in length
    #[error("buffer length mismatch: send has {send} elements, recv has {recv}")]
    BufferLengthMismatch {
        /// Send buffer length
        send: usize,
        /// Receive buffer length
        recv: usize,
    },

    /// Element count does not fit the native `int` count
    #[error("invalid count: {0}")]
    InvalidCount(usize),

    /// Unknown reduction operator code
    #[error("unsupported reduction operator code: {0}")]
    UnsupportedOp(i32),

    /// Unknown datatype code
    #[error("unsupported datatype code: {0}")]
    UnsupportedDatatype(i32),

    /// A process argument could not be handed to the native library
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build an [`Error::Mpi`] for a failed native call, fetching the
    /// runtime's description of `code`.
    pub fn from_code(call: &'static str, code: i32) -> Self {
        Error::Mpi {
            call,
            code,
            message: error_string(code),
        }
    }

    /// Check a native return code, returning `Ok(())` for `MPI_SUCCESS`.
    pub fn check(call: &'static str, code: i32) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Error::from_code(call, code))
        }
    }

    /// The native error code, if this error came from the MPI runtime.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Init { code, .. } | Error::Finalize { code, .. } | Error::Mpi { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

/// Ask the runtime to describe an error code.
///
/// Falls back to a generic text when the lookup itself fails, which is the
/// case for codes the implementation does not know.
pub(crate) fn error_string(code: i32) -> String {
    let mut buf = [0u8; 1024];
    let mut len: i32 = 0;
    let ret = unsafe { ffi::minimpi_error_string(code, buf.as_mut_ptr().cast(), &mut len) };
    if ret != 0 {
        return format!("unknown MPI error {code}");
    }
    let len = (len.max(0) as usize).min(buf.len());
    String::from_utf8_lossy(&buf[..len]).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_accepts_success() {
        assert!(Error::check("MPI_Barrier", 0).is_ok());
    }

    #[test]
    fn display_includes_lengths() {
        let err = Error::BufferLengthMismatch { send: 3, recv: 4 };
        assert_eq!(
            err.to_string(),
            "buffer length mismatch: send has 3 elements, recv has 4"
        );
    }

    #[test]
    fn display_names_the_call() {
        let err = Error::Mpi {
            call: "MPI_Comm_rank",
            code: 5,
            message: "invalid communicator".into(),
        };
        assert_eq!(
            err.to_string(),
            "MPI_Comm_rank failed (code 5): invalid communicator"
        );
        assert_eq!(err.code(), Some(5));
    }

    #[test]
    fn lifecycle_errors_carry_no_code() {
        assert_eq!(Error::AlreadyInitialized.code(), None);
        assert_eq!(Error::Finalized.code(), None);
        assert_eq!(Error::InitFailed.code(), None);
        assert_eq!(Error::UnsupportedOp(9).code(), None);
    }

    #[test]
    fn unsupported_codes_display() {
        assert_eq!(
            Error::UnsupportedOp(7).to_string(),
            "unsupported reduction operator code: 7"
        );
        assert_eq!(
            Error::UnsupportedDatatype(42).to_string(),
            "unsupported datatype code: 42"
        );
    }
}
