//! HTTP surface for the optipress pipeline.
//!
//! A thin axum adapter over the core crates: multipart extraction feeds the
//! streaming ingestor chunk by chunk, downloads and archives leave as byte
//! streams, and every error-to-status decision is made in one module.
//! Nothing here touches image bytes.
//!
//! Routes:
//!
//! - `POST /upload`: multipart ingest, sniff, compress
//! - `GET /download/:token/:filename/:realfilename`: stream one optimized file
//! - `POST /delete`: remove both copies of an artifact
//! - `POST /download-zip`: stream selected optimized files as a zip
//! - `GET /health`: liveness probe

mod config;
mod request;
mod response;
mod routes;
mod state;

pub use config::{FormatsConfig, ServerConfig, StorageConfig};
pub use request::{DeleteRequest, DownloadZipRequest, UploadQuery, ZipEntryRequest};
pub use response::{ApiError, ErrorBody, ErrorDetail, UploadResponse};
pub use routes::create_router;
pub use state::AppState;
