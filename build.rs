//! Build script for minimpi
//!
//! Compiles the C shim in `csrc/` against the native MPI headers and links the
//! crate with the MPI library. The first source below that yields an
//! installation wins.

#[path = "build/flags.rs"]
mod flags;

use flags::MpiInstall;
use std::env;
use std::path::Path;
use std::process::Command;

const SHIM_SOURCE: &str = "csrc/minimpi.c";
const SHIM_HEADER: &str = "csrc/minimpi.h";

type Source = fn() -> Option<MpiInstall>;

const SOURCES: [(&str, Source); 5] = [
    ("$MPI_PKG_CONFIG", from_pkg_config_env),
    ("pkg-config", from_pkg_config_names),
    ("compiler wrapper", from_compiler_wrapper),
    ("$CRAY_MPICH_DIR", from_cray_env),
    ("well-known prefix", from_known_prefixes),
];

fn main() {
    for path in [SHIM_SOURCE, SHIM_HEADER] {
        println!("cargo:rerun-if-changed={path}");
    }
    for var in ["MPI_PKG_CONFIG", "MPICC", "CRAY_MPICH_DIR"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let Some((source, install)) = SOURCES
        .iter()
        .find_map(|(name, source)| source().map(|install| (*name, install)))
    else {
        panic!(
            "no MPI installation found (tried {}). Install MPICH or Open MPI, or point \
             MPI_PKG_CONFIG, MPICC or CRAY_MPICH_DIR at one.",
            SOURCES.map(|(name, _)| name).join(", ")
        );
    };
    eprintln!("minimpi: using MPI from {source}: {install:?}");

    compile_shim(&install);
    emit_link_flags(&install);
}

fn compile_shim(install: &MpiInstall) {
    let mut build = cc::Build::new();
    build
        .file(SHIM_SOURCE)
        .include("csrc")
        .includes(&install.include_paths)
        .warnings(true)
        .extra_warnings(true);
    if env::var("PROFILE").as_deref() == Ok("release") {
        build.opt_level(3);
    }
    build.compile("minimpi");
}

fn emit_link_flags(install: &MpiInstall) {
    for dir in &install.link_paths {
        println!("cargo:rustc-link-search=native={}", dir.display());
        // Runtime lookup must resolve to the libmpi used at link time.
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", dir.display());
    }
    for lib in &install.libs {
        println!("cargo:rustc-link-lib={lib}");
    }
    if let Some(version) = &install.version {
        println!("cargo:rustc-env=MPI_VERSION={version}");
    }
}

fn find_package(name: &str) -> Option<MpiInstall> {
    let lib = pkg_config::Config::new()
        .cargo_metadata(false)
        .probe(name)
        .map_err(|e| eprintln!("minimpi: pkg-config {name}: {e}"))
        .ok()?;
    Some(MpiInstall {
        include_paths: lib.include_paths,
        link_paths: lib.link_paths,
        libs: lib.libs,
        version: Some(lib.version),
    })
}

fn from_pkg_config_env() -> Option<MpiInstall> {
    let name = env::var("MPI_PKG_CONFIG").ok()?;
    let found = find_package(&name);
    if found.is_none() {
        println!("cargo:warning=MPI_PKG_CONFIG={name} could not be resolved");
    }
    found
}

fn from_pkg_config_names() -> Option<MpiInstall> {
    ["mpich", "ompi", "mpi"].into_iter().find_map(find_package)
}

fn from_compiler_wrapper() -> Option<MpiInstall> {
    let wrapper = env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string());
    let output = Command::new(&wrapper).arg("-show").output().ok()?;
    if !output.status.success() {
        eprintln!("minimpi: '{wrapper} -show' exited with {}", output.status);
        return None;
    }
    Some(MpiInstall::from_wrapper_line(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

fn from_cray_env() -> Option<MpiInstall> {
    env::var_os("CRAY_MPICH_DIR").map(|dir| MpiInstall::under_prefix(Path::new(&dir)))
}

fn from_known_prefixes() -> Option<MpiInstall> {
    ["/usr", "/usr/local", "/opt/mpich", "/opt/openmpi"]
        .into_iter()
        .map(|prefix| MpiInstall::under_prefix(Path::new(prefix)))
        .find(MpiInstall::has_header)
}
