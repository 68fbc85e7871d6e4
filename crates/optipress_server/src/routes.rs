//! HTTP routes and handlers.
//!
//! Handlers stay thin: extract the wire shapes, call into the pipeline,
//! shape the response. Failures convert through [`ApiError`] at the return
//! boundary.

use crate::request::{DeleteRequest, DownloadZipRequest, UploadQuery};
use crate::response::{ApiError, UploadResponse};
use crate::state::AppState;
use axum::{Json, Router};
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::Local;
use optipress_archive::{ExportEntry, archive_file_name, export_zip};
use optipress_store::{ArtifactName, ImageFormat, StagedUpload, delete_artifact, open_optimized};
use serde_json::json;
use tokio_util::io::ReaderStream;

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Build the service router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload))
        .route("/download/:token/:filename/:realfilename", get(download))
        .route("/delete", post(remove))
        .route("/download-zip", post(download_zip))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Ingest, sniff, and compress one uploaded file.
///
/// The namespace token must arrive before the file: as a `token` text field
/// ahead of it, or as a `?token=` query parameter. A file field seen without
/// a known namespace fails closed before any byte is staged.
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut token = query.token;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "token" => {
                token = Some(field.text().await.map_err(bad_multipart)?);
            }
            "file" => {
                let dirs = state.resolve(token.as_deref())?;
                let filename = field.file_name().unwrap_or("upload").to_string();

                let mut staged = StagedUpload::begin(&dirs, &filename).await?;
                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => staged.write_chunk(&chunk).await?,
                        Ok(None) => break,
                        Err(e) => {
                            staged.abort().await;
                            return Err(bad_multipart(e));
                        }
                    }
                }

                let artifact = staged.finish().await?;
                let (stored, size) = state.finish_upload(&dirs, artifact).await?;
                return Ok(Json(UploadResponse {
                    filename: stored.to_string(),
                    file_size_in_bytes: size,
                }));
            }
            _ => {} // Unrecognized fields are skipped
        }
    }

    Err(ApiError::bad_request("No file was uploaded"))
}

/// Stream one optimized artifact as an attachment.
async fn download(
    State(state): State<AppState>,
    Path((token, filename, realfilename)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let dirs = state.resolve(Some(&token))?;
    let name = ArtifactName::parse(&filename)?;
    let (file, size) = open_optimized(&dirs, &name).await?;

    let mime = name
        .extension()
        .parse::<ImageFormat>()
        .map(|format| format.mime().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string());

    let headers = [
        (header::CONTENT_TYPE, mime),
        (header::CONTENT_LENGTH, size.to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment_disposition(&realfilename),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Remove an artifact's copies from both trees, echoing the request body.
async fn remove(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<DeleteRequest>, ApiError> {
    let dirs = state.resolve(request.token.as_deref())?;
    let Some(filename) = request.filename.as_deref() else {
        return Err(ApiError::bad_request("No filename supplied"));
    };
    let name = ArtifactName::parse(filename)?;

    delete_artifact(&dirs, &name).await?;
    Ok(Json(request))
}

/// Pack the requested optimized artifacts into a streamed zip.
async fn download_zip(
    State(state): State<AppState>,
    Json(request): Json<DownloadZipRequest>,
) -> Result<Response, ApiError> {
    let dirs = state.resolve(request.token.as_deref())?;
    let entries: Vec<ExportEntry> = request
        .files
        .into_iter()
        .map(|entry| ExportEntry {
            stored: entry.file_server_name,
            display: entry.file_real_name,
        })
        .collect();

    let stream = export_zip(&dirs, entries).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment_disposition(&archive_file_name(Local::now())),
        ),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

/// Map a multipart protocol failure to a 400.
fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed multipart body: {}", err))
}

/// A `Content-Disposition` attachment value hardened against header
/// injection: quotes and control characters are stripped from the display
/// name before it is quoted.
fn attachment_disposition(display: &str) -> String {
    let clean: String = display
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let name = if clean.is_empty() { "download" } else { &clean };
    format!("attachment; filename=\"{}\"", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition_passes_ordinary_names() {
        assert_eq!(
            attachment_disposition("photo.png"),
            "attachment; filename=\"photo.png\""
        );
    }

    #[test]
    fn test_attachment_disposition_strips_injection() {
        assert_eq!(
            attachment_disposition("a\"b\r\nX-Evil: 1.png"),
            "attachment; filename=\"abX-Evil: 1.png\""
        );
        assert_eq!(
            attachment_disposition("\"\""),
            "attachment; filename=\"download\""
        );
    }
}
