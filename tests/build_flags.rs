//! Parsing of the MPI compiler wrapper output used by the build script.

#[path = "../build/flags.rs"]
#[allow(dead_code)]
mod flags;

use flags::MpiInstall;
use std::path::{Path, PathBuf};

#[test]
fn mpich_wrapper_line() {
    let line = "gcc -I/opt/mpich/include -L/opt/mpich/lib -Wl,-rpath -Wl,/opt/mpich/lib \
                -Wl,--enable-new-dtags -lmpi";
    let install = MpiInstall::from_wrapper_line(line);
    assert_eq!(install.include_paths, vec![PathBuf::from("/opt/mpich/include")]);
    assert_eq!(install.link_paths, vec![PathBuf::from("/opt/mpich/lib")]);
    assert_eq!(install.libs, vec!["mpi".to_string()]);
    assert_eq!(install.version, None);
}

#[test]
fn openmpi_wrapper_line_keeps_every_library() {
    let line = "gcc -I/usr/lib/x86_64-linux-gnu/openmpi/include -pthread \
                -L/usr/lib/x86_64-linux-gnu/openmpi/lib -lmpi -lopen-rte -lopen-pal\n";
    let install = MpiInstall::from_wrapper_line(line);
    assert_eq!(install.libs, vec!["mpi", "open-rte", "open-pal"]);
    assert_eq!(install.include_paths.len(), 1);
    assert_eq!(install.link_paths.len(), 1);
}

#[test]
fn missing_libraries_fall_back_to_libmpi() {
    let install = MpiInstall::from_wrapper_line("cc -I/x/include");
    assert_eq!(install.libs, vec!["mpi".to_string()]);
}

#[test]
fn bare_flags_are_ignored() {
    let install = MpiInstall::from_wrapper_line("cc -I -L -l -O2");
    assert!(install.include_paths.is_empty());
    assert!(install.link_paths.is_empty());
    assert_eq!(install.libs, vec!["mpi".to_string()]);
}

#[test]
fn prefix_layout() {
    let install = MpiInstall::under_prefix(Path::new("/opt/cray/mpich"));
    assert_eq!(install.include_paths, vec![PathBuf::from("/opt/cray/mpich/include")]);
    assert_eq!(install.link_paths, vec![PathBuf::from("/opt/cray/mpich/lib")]);
    assert!(!MpiInstall::under_prefix(Path::new("/nonexistent/minimpi")).has_header());
}
