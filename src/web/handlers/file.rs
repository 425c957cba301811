//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::TryStreamExt;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::file::{BatchUpload, DeliveryMode, Download, IncomingFile};
use crate::web::dto::{
    BatchUploadResponse, FileInfo, FileListResponse, MessageResponse, UploadResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FileboxError;

/// Multipart field carrying a single upload.
const SINGLE_FIELD: &str = "file";

/// Multipart field names accepted for batch uploads.
const BATCH_FIELDS: [&str; 2] = ["files", "files[]"];

/// Map a multipart read failure. A body over the transport limit surfaces
/// as 413 from the extractor and becomes `PayloadTooLarge`.
fn form_error(err: MultipartError, request_limit: u64) -> FileboxError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FileboxError::PayloadTooLarge {
            limit: request_limit,
        }
    } else {
        FileboxError::ReadFailed(err.body_text())
    }
}

fn rejection_error(rejection: MultipartRejection) -> ApiError {
    tracing::debug!("Rejected multipart request: {}", rejection);
    ApiError::bad_request(rejection.body_text())
}

/// Client filename of a field.
fn original_name(field: &Field<'_>) -> String {
    field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or("file")
        .to_string()
}

/// Part `Content-Length`, when the client sent one.
fn declared_size(field: &Field<'_>) -> Option<u64> {
    field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Read a multipart field as `AsyncRead`, carrying form errors through
/// the `io::Error` so storage can report them unchanged.
fn field_reader<'a>(field: Field<'a>, request_limit: u64) -> impl AsyncRead + Unpin + 'a {
    StreamReader::new(field.map_err(move |e| io::Error::other(form_error(e, request_limit))))
}

/// Feed every batch field of the form into `batch`.
async fn read_batch(
    batch: &mut BatchUpload<'_>,
    multipart: &mut Multipart,
    request_limit: u64,
) -> Result<(), FileboxError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, request_limit))?
    {
        if !field.name().is_some_and(|name| BATCH_FIELDS.contains(&name)) {
            continue;
        }

        let file = IncomingFile {
            original_name: original_name(&field),
            declared_size: declared_size(&field),
            content: field_reader(field, request_limit),
        };
        batch.add(file).await?;
    }

    Ok(())
}

/// Build a streaming response for an opened file.
fn download_response(download: Download) -> Result<Response<Body>, ApiError> {
    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CONTENT_LENGTH, download.size);

    if let Some(disposition) = download.disposition {
        builder = builder
            .header("Content-Description", "File Transfer")
            .header("Content-Transfer-Encoding", "binary")
            .header(header::CONTENT_DISPOSITION, disposition);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(download.file)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /upload - Upload a single file.
///
/// Request body: multipart/form-data with a "file" field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(rejection_error)?;
    let request_limit = state.limits.single_request_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, request_limit))?
    {
        if field.name() != Some(SINGLE_FIELD) {
            continue;
        }

        let original_name = original_name(&field);
        let declared_size = declared_size(&field);
        let stored = state
            .storage
            .save_upload(
                &original_name,
                declared_size,
                field_reader(field, request_limit),
                state.limits.max_file_bytes,
            )
            .await?;

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            file: stored.into(),
        }));
    }

    Err(FileboxError::MissingInput.into())
}

/// POST /upload/multiple - Upload several files.
///
/// Request body: multipart/form-data with "files" (or "files[]") fields.
/// Files over the per-file limit are skipped. If the form cannot be read to
/// the end, files saved so far are removed and the request fails.
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(rejection_error)?;
    let request_limit = state.limits.batch_request_bytes();
    let mut batch = state.storage.begin_batch(state.limits.max_file_bytes);

    if let Err(e) = read_batch(&mut batch, &mut multipart, request_limit).await {
        batch.rollback().await;
        return Err(e.into());
    }

    if batch.received() == 0 {
        return Err(ApiError::bad_request("No files provided"));
    }

    let outcome = batch.commit();

    Ok(Json(BatchUploadResponse {
        message: format!("Uploaded {} files", outcome.saved.len()),
        skipped: outcome.skipped.len(),
        files: outcome.saved.into_iter().map(Into::into).collect(),
    }))
}

/// GET /download/:filename - Download a file as an attachment.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let download = state
        .storage
        .open_for_download(&filename, DeliveryMode::Attachment)
        .await?;

    download_response(download)
}

/// GET /files/:filename - Stream a file with an inferred content type.
pub async fn stream_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let download = state
        .storage
        .open_for_download(&filename, DeliveryMode::Inline)
        .await?;

    download_response(download)
}

/// GET /files - List the upload directory.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<FileListResponse> {
    let listing = state.storage.list_files().await;

    let files: Vec<FileInfo> = listing
        .entries
        .iter()
        .map(|entry| FileInfo::from_entry(entry, &state.timezone))
        .collect();

    Json(FileListResponse {
        count: files.len(),
        files,
        skipped: listing.skipped,
    })
}

/// DELETE /files/:filename - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.storage.delete_file(&filename).await?;

    Ok(Json(MessageResponse::new("File deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use crate::StorageManager;
    use tempfile::TempDir;

    #[test]
    fn test_read_failure_is_bad_request() {
        let err = FileboxError::ReadFailed("boom".to_string());
        assert_eq!(ApiError::from(err).message(), "failed to read upload: boom");
    }

    #[tokio::test]
    async fn test_download_response_attachment_headers() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path()).unwrap();
        let stored = storage
            .save_upload("a.png", None, &b"png-bytes"[..], 1024)
            .await
            .unwrap();

        let download = storage
            .open_for_download(&stored.stored_name, DeliveryMode::Attachment)
            .await
            .unwrap();
        let response = download_response(download).unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(headers[header::CONTENT_LENGTH], "9");
        assert_eq!(headers["Content-Transfer-Encoding"], "binary");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename="));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"png-bytes");
    }

    #[tokio::test]
    async fn test_download_response_inline_headers() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path()).unwrap();
        let stored = storage
            .save_upload("a.png", None, &b"png-bytes"[..], 1024)
            .await
            .unwrap();

        let download = storage
            .open_for_download(&stored.stored_name, DeliveryMode::Inline)
            .await
            .unwrap();
        let response = download_response(download).unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }
}
