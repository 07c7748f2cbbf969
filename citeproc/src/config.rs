// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Locating the engine shared library.

use std::path::PathBuf;

/// Environment variable that overrides the engine library location.
pub const LIBRARY_ENV: &str = "CITEPROC_RS_LIBRARY";

/// Returns the path of the engine shared library.
///
/// Uses [`LIBRARY_ENV`] when it is set and non-empty. Otherwise returns the
/// platform's file name for the `citeproc_ffi` library (`libciteproc_ffi.so`,
/// `libciteproc_ffi.dylib` or `citeproc_ffi.dll`), leaving the search to the
/// dynamic loader.
///
/// # Examples
///
/// ```no_run
/// use citeproc::{config::library_path, load_api};
///
/// # fn main() -> Result<(), citeproc::Error> {
/// let api = load_api(library_path())?;
/// # Ok(())
/// # }
/// ```
pub fn library_path() -> PathBuf {
    match std::env::var_os(LIBRARY_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(libloading::library_filename("citeproc_ffi")),
    }
}
