//! Process argument vector handed to and adopted from native initialization.
//!
//! `MPI_Init` receives `&argc`/`&argv` and may strip or reorder runtime flags
//! (launcher options, implementation-private switches). Rust cannot rewrite
//! `std::env::args`, so the list the runtime reports back is stored once and
//! served through [`args`].

use crate::error::{Error, Result};
use std::ffi::{CStr, CString, OsString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::OnceLock;

static ADOPTED_ARGS: OnceLock<Vec<OsString>> = OnceLock::new();

/// The process arguments as left by MPI initialization.
///
/// Returns `None` before a successful [`Mpi::init`](crate::Mpi::init).
///
/// # Example
///
/// ```no_run
/// let _mpi = minimpi::Mpi::init().unwrap();
/// for arg in minimpi::args().unwrap_or_default() {
///     println!("{}", arg.to_string_lossy());
/// }
/// ```
pub fn args() -> Option<&'static [OsString]> {
    ADOPTED_ARGS.get().map(Vec::as_slice)
}

pub(crate) fn adopt(args: Vec<OsString>) {
    // Initialization happens once per process, so the cell is always empty here.
    let _ = ADOPTED_ARGS.set(args);
}

/// C-compatible `argv` owning its strings.
///
/// The pointer array is NULL-terminated as `main`'s `argv` is. Strings are
/// released when the value is dropped.
pub(crate) struct NativeArgv {
    strings: Vec<CString>,
    ptrs: Vec<*mut c_char>,
}

impl NativeArgv {
    pub(crate) fn new<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let strings = args
            .into_iter()
            .map(|arg| {
                CString::new(os_to_bytes(arg)).map_err(|e| {
                    Error::InvalidArgument(format!(
                        "argument contains a NUL byte at position {}",
                        e.nul_position()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut ptrs: Vec<*mut c_char> = strings.iter().map(|s| s.as_ptr().cast_mut()).collect();
        ptrs.push(ptr::null_mut());
        Ok(NativeArgv { strings, ptrs })
    }

    pub(crate) fn argc(&self) -> c_int {
        self.strings.len() as c_int
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }
}

/// Copy `argc` strings out of a native `argv`.
///
/// # Safety
///
/// `argv` must be null or point to at least `argc` valid NUL-terminated strings.
pub(crate) unsafe fn collect(argc: c_int, argv: *const *mut c_char) -> Vec<OsString> {
    if argv.is_null() {
        return Vec::new();
    }
    (0..argc.max(0) as usize)
        .map(|i| *argv.add(i))
        .take_while(|p| !p.is_null())
        .map(|p| bytes_to_os(CStr::from_ptr(p).to_bytes()))
        .collect()
}

#[cfg(unix)]
fn os_to_bytes(s: OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn os_to_bytes(s: OsString) -> Vec<u8> {
    s.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn bytes_to_os(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn argv_is_null_terminated() {
        let mut argv = NativeArgv::new(os(&["prog", "-n", "4"])).unwrap();
        assert_eq!(argv.argc(), 3);
        let p = argv.as_mut_ptr();
        unsafe {
            assert!(!(*p).is_null());
            assert!((*p.add(3)).is_null());
        }
    }

    #[test]
    fn collect_reads_back_what_was_passed() {
        let input = os(&["prog", "--alpha", "value with spaces"]);
        let mut argv = NativeArgv::new(input.clone()).unwrap();
        let back = unsafe { collect(argv.argc(), argv.as_mut_ptr()) };
        assert_eq!(back, input);
    }

    #[test]
    fn collect_honors_reduced_argc() {
        // The runtime may shrink argc after consuming its own flags.
        let mut argv = NativeArgv::new(os(&["prog", "keep", "--mca-flag"])).unwrap();
        let back = unsafe { collect(2, argv.as_mut_ptr()) };
        assert_eq!(back, os(&["prog", "keep"]));
    }

    #[test]
    fn collect_handles_null_argv() {
        let back = unsafe { collect(3, ptr::null()) };
        assert!(back.is_empty());
    }

    #[test]
    fn empty_argument_list() {
        let mut argv = NativeArgv::new(Vec::new()).unwrap();
        assert_eq!(argv.argc(), 0);
        let back = unsafe { collect(argv.argc(), argv.as_mut_ptr()) };
        assert!(back.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn interior_nul_is_rejected() {
        use std::os::unix::ffi::OsStringExt;
        let bad = OsString::from_vec(b"ab\0cd".to_vec());
        let err = NativeArgv::new(vec![OsString::from("prog"), bad])
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_survive() {
        use std::os::unix::ffi::OsStringExt;
        let raw = OsString::from_vec(vec![0x66, 0xff, 0x6f]);
        let mut argv = NativeArgv::new(vec![raw.clone()]).unwrap();
        let back = unsafe { collect(argv.argc(), argv.as_mut_ptr()) };
        assert_eq!(back, vec![raw]);
    }
}
