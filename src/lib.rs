#![forbid(unsafe_code)]

//! Helpers for building Web Processing Service (WPS) process handlers in
//! climate-data pipelines.
//!
//! A WPS process receives a bag of named inputs: literal scalars, inline CSV
//! documents, local file paths, and remote URLs that may or may not be
//! OPeNDAP endpoints. This crate normalizes that bag into something a process
//! body can use directly: OPeNDAP URLs pass through untouched (the dataset
//! library opens them in place), plain HTTP references are downloaded into
//! the process working directory, local paths are checked and used as-is, and
//! literals and streams are handed over unchanged. On the way out, produced
//! files are grouped into a MetaLink/XML descriptor, and step-wise status
//! reporting keeps the remote caller informed.
//!
//! **Quick start**
//! ```no_run
//! use std::path::Path;
//! use wps_kit::{RequestInput, collect_args};
//!
//! let inputs = vec![
//!     RequestInput::multi("netcdf")
//!         .local("/data/tasmax_day_BCCAQv2.nc")
//!         .remote("https://example.org/thredds/fileServer/datasets/tasmin.nc"),
//!     RequestInput::literal("argc", 3),
//! ];
//!
//! let args = collect_args(inputs, Path::new("/tmp/workdir"))?;
//! for (identifier, value) in &args {
//!     println!("{identifier}: {value:?}");
//! }
//! # Ok::<(), wps_kit::Error>(())
//! ```
//!
//! **Assembling the output descriptor**
//! ```
//! use std::path::Path;
//! use wps_kit::{build_meta_link, metalink_urls};
//!
//! let outfiles = vec!["tasmax_annual.nc".to_string()];
//! let xml = build_meta_link("tasmax", "annual climatology", &outfiles, Path::new("/tmp/workdir"));
//! assert_eq!(metalink_urls(&xml).len(), 1);
//! ```
//!
//! Notes:
//! - Everything is synchronous and blocking; the hosting framework runs one
//!   request per worker.
//! - Logging goes through the `log` facade. The hosting process installs the
//!   sink once at startup; this crate only emits.

mod classify;
mod collect;
mod dataset;
mod error;
mod inputs;
mod metalink;
mod outputs;
mod resolve;
mod status;
pub mod testing;

pub use crate::classify::{Classifier, UrlKind, is_dap_url};
pub use crate::collect::{
    CollectedArguments, Collector, ResolvedInput, ResolvedValue, collect_args,
};
pub use crate::dataset::{DatasetAccess, DiskFormat};
pub use crate::error::{Error, Result, sanitize_message};
pub use crate::inputs::{
    InputKind, InputStream, LiteralValue, MAX_OCCURS, Occurrence, RequestInput,
};
pub use crate::metalink::{
    MetaFile, MetaLink, build_meta_link, build_meta_link_with_format, collect_output_files,
    metalink_urls,
};
pub use crate::outputs::{
    Output, auto_construct_outputs, fetch_json, fetch_metalink, fetch_text,
};
pub use crate::resolve::{Resolved, Resolver};
pub use crate::status::{StatusLogger, StatusSink, common_status_percentages};
