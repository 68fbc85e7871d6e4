//! Error types for the optipress workspace.
//!
//! Each domain crate gets its own error type built from a kind enum plus a
//! caller-location wrapper, so failures carry the file and line where they
//! were raised without the cost of a full backtrace.  The [`OptipressError`]
//! type aggregates the domain errors for callers that cross crate
//! boundaries, such as the HTTP layer.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod config;
mod error;
mod optimize;
mod store;

pub use archive::{ArchiveError, ArchiveErrorKind};
pub use config::ConfigError;
pub use error::{OptipressError, OptipressErrorKind, OptipressResult};
pub use optimize::{OptimizeError, OptimizeErrorKind};
pub use store::{StoreError, StoreErrorKind};
