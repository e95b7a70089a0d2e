//! MPI installation layout as seen by the build script.
//!
//! Shared between `build.rs` and `tests/build_flags.rs`; std only.

use std::path::{Path, PathBuf};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MpiInstall {
    pub include_paths: Vec<PathBuf>,
    pub link_paths: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub version: Option<String>,
}

impl MpiInstall {
    /// Layout of a conventional `<prefix>/{include,lib}` installation.
    pub fn under_prefix(prefix: &Path) -> Self {
        MpiInstall {
            include_paths: vec![prefix.join("include")],
            link_paths: vec![prefix.join("lib")],
            libs: vec!["mpi".to_string()],
            version: None,
        }
    }

    /// Read `-I`, `-L` and `-l` out of a compiler wrapper command line such
    /// as the output of `mpicc -show`. Other tokens are ignored.
    ///
    /// An empty library list falls back to `mpi`.
    pub fn from_wrapper_line(line: &str) -> Self {
        let mut install = MpiInstall::default();
        for token in line.split_whitespace() {
            let value = |flag: &str| token.strip_prefix(flag).filter(|v| !v.is_empty());
            if let Some(path) = value("-I") {
                install.include_paths.push(path.into());
            } else if let Some(path) = value("-L") {
                install.link_paths.push(path.into());
            } else if let Some(lib) = value("-l") {
                install.libs.push(lib.to_string());
            }
        }
        if install.libs.is_empty() {
            install.libs.push("mpi".to_string());
        }
        install
    }

    /// Whether the headers are where this layout says they are.
    pub fn has_header(&self) -> bool {
        self.include_paths.iter().any(|p| p.join("mpi.h").is_file())
    }
}
