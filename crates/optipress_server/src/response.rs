//! Wire response bodies and the error-to-status boundary.
//!
//! Status codes exist only here. Core crates raise typed kinds; this module
//! decides what each kind means over HTTP and shapes the
//! `{"error": {"code", "text"}}` body every failure carries.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use optipress_error::{ArchiveErrorKind, OptipressError, OptipressErrorKind, StoreErrorKind};
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadResponse {
    /// Stored `{digest}.{ext}` name, the handle for every later operation.
    pub filename: String,

    /// Byte size of the optimized copy.
    #[serde(rename = "fileSizeInBytes")]
    pub file_size_in_bytes: u64,
}

/// Error payload carried by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    /// The error.
    pub error: ErrorDetail,
}

/// The code/text pair inside an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorDetail {
    /// Numeric HTTP status, repeated in the body.
    pub code: u16,

    /// Human-readable description.
    pub text: String,
}

/// A request failure ready to leave the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    text: String,
}

impl ApiError {
    /// An error with an explicit status.
    pub fn new(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// A 400 for protocol-level violations the core never sees.
    pub fn bad_request(text: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, text)
    }

    /// The status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<OptipressError> for ApiError {
    fn from(err: OptipressError) -> Self {
        let (status, text) = match err.kind() {
            OptipressErrorKind::Store(e) => (store_status(&e.kind), e.kind.to_string()),
            OptipressErrorKind::Optimize(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.kind.to_string())
            }
            OptipressErrorKind::Archive(e) => (archive_status(&e.kind), e.kind.to_string()),
            OptipressErrorKind::Config(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.message.clone())
            }
        };
        Self { status, text }
    }
}

fn store_status(kind: &StoreErrorKind) -> StatusCode {
    match kind {
        StoreErrorKind::MissingIdentifier | StoreErrorKind::InvalidIdentifier(_) => {
            StatusCode::BAD_REQUEST
        }
        StoreErrorKind::UnsupportedFileType(_) => StatusCode::NOT_ACCEPTABLE,
        // A name this store could never have produced cannot exist.
        StoreErrorKind::NotFound(_) | StoreErrorKind::InvalidArtifactName(_) => {
            StatusCode::NOT_FOUND
        }
        StoreErrorKind::DirectoryCreation(_)
        | StoreErrorKind::IngestFailed(_)
        | StoreErrorKind::FileRead(_)
        | StoreErrorKind::DeletionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn archive_status(kind: &ArchiveErrorKind) -> StatusCode {
    match kind {
        ArchiveErrorKind::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
        ArchiveErrorKind::Zip(_)
        | ArchiveErrorKind::EntryRead(_)
        | ArchiveErrorKind::StreamClosed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, text = %self.text, "Request failed");
        } else {
            tracing::debug!(status = %self.status, text = %self.text, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.status.as_u16(),
                text: self.text,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optipress_error::StoreError;

    #[test]
    fn test_store_kinds_map_to_contract_statuses() {
        assert_eq!(
            store_status(&StoreErrorKind::MissingIdentifier),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_status(&StoreErrorKind::InvalidIdentifier("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_status(&StoreErrorKind::UnsupportedFileType("x".into())),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            store_status(&StoreErrorKind::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_status(&StoreErrorKind::InvalidArtifactName("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_status(&StoreErrorKind::IngestFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            store_status(&StoreErrorKind::DeletionFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_archive_kinds_map_to_contract_statuses() {
        assert_eq!(
            archive_status(&ArchiveErrorKind::NamespaceNotFound("abc".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            archive_status(&ArchiveErrorKind::Zip("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_text_is_the_domain_message() {
        let err: OptipressError =
            StoreError::new(StoreErrorKind::NotFound("a.png".into())).into();
        let api = ApiError::from(err);

        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert_eq!(api.text, "Artifact not found: a.png"); // No location noise on the wire
    }

    #[test]
    fn test_upload_response_uses_wire_field_names() {
        let response = UploadResponse {
            filename: "a.png".into(),
            file_size_in_bytes: 7,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["filename"], "a.png");
        assert_eq!(json["fileSizeInBytes"], 7);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: 406,
                text: "Unsupported file type".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], 406);
        assert_eq!(json["error"]["text"], "Unsupported file type");
    }
}
