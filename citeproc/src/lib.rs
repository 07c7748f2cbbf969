// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # citeproc - bindings to the citeproc-rs citation engine
//!
//! Safe Rust bindings over the engine's C ABI ([`citeproc_sys`]), turning raw
//! handles, result codes and callbacks into owned types, `Result`s and traits.
//!
//! ## Overview
//!
//! The engine formats citations and bibliographies from a CSL style and a set
//! of CSL-JSON references. Every string it produces is written into a buffer
//! owned by this crate through two callbacks, so no engine-allocated memory is
//! ever exposed.
//!
//! ### Key Concepts
//!
//! - **Driver**: one loaded style with its reference store and document ([`Driver`])
//! - **Cluster**: a group of cites forming one in-text citation or footnote ([`Cluster`])
//! - **Cite**: one reference inside a cluster, edited through a [`CiteRef`]
//! - **Document order**: the sequence of [`ClusterPosition`]s clusters appear in
//! - **Locale fetcher**: supplies locale XML while a driver is created ([`LocaleFetcher`])
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐
//! │ CiteprocApi│  (function table, shared by Arc)
//! └─────┬──────┘
//!       │
//!       ├─► Driver ──► references, cluster order, formatted output
//!       │     └─► LocaleFetcher (called during Driver::new)
//!       │
//!       ├─► Cluster ──► CiteRef   (invalidated by Cluster::reset)
//!       │
//!       └─► Logger ──► Log backend (process-wide)
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use citeproc::{Cite, ClusterPosition, Driver, LocaleDirectory, LocatorType, OutputFormat, load_api};
//! use citeproc::csl_json::{Name, Reference};
//!
//! # fn main() -> Result<(), citeproc::Error> {
//! let api = load_api(citeproc::config::library_path())?;
//! let style = std::fs::read_to_string("apa.csl").unwrap();
//! let mut driver = Driver::new(api, &style, LocaleDirectory::new("locales"), OutputFormat::Html)?;
//!
//! driver.insert_reference(
//!     &Reference::new("smith", "book")
//!         .with("title", "A Flight of Sparrows")
//!         .with("author", vec![Name::person("Smith", "John")]),
//! )?;
//!
//! let cluster = driver.cluster_named("footnote-1")?;
//! cluster.append(&Cite::new("smith").with_locator("56", LocatorType::Page))?;
//! let id = driver.insert_cluster(&cluster)?;
//! driver.set_cluster_order(&[ClusterPosition::note(id, 1)])?;
//!
//! println!("{}", driver.format_cluster(id)?);
//! print!("{}", driver.format_bibliography()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every fallible call returns [`Error`]. Engine failures carry an
//! [`ErrorKind`] and the engine's message. A driver whose engine call panicked
//! is poisoned and must be recreated; see [`ErrorKind::is_fatal_for_driver`].
//!
//! ## Thread Safety
//!
//! - [`CiteprocApi`] is shared through an `Arc` and may be used from any thread
//! - [`Driver`] and [`Cluster`] are `Send` but not `Sync`
//! - Error messages are kept per thread, so they are read on the thread that failed

mod api;
mod buffer;
mod cluster;
mod driver;
mod error;
mod locale;
mod logger;
mod user_data;

pub mod config;
pub mod csl_json;

pub use api::{CiteprocApi, CiteprocApiHandle, api_from_functions, load_api};
pub use citeproc_sys::ClusterId;
pub use cluster::{Cite, CiteRef, Cluster, ClusterPosition, LocatorType};
pub use driver::{Driver, OutputFormat};
pub use error::{Error, ErrorKind, Result};
pub use locale::{BuiltInLocales, LocaleDirectory, LocaleFetcher};
pub use logger::{LevelFilter, Log, LogLevel, Logger, TracingLog};
pub use user_data::UserData;
