use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::spreadsheet::parse_workbook;

/// Multipart field the client puts the spreadsheet in
const FILE_FIELD: &str = "file";

/// POST /api/files/upload - parse the first worksheet of an uploaded file
///
/// Nothing is stored; the parsed table goes straight back to the caller.
pub async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload without a multipart body: {}", e);
        ApiError::bad_request("No file uploaded")
    })?;

    let bytes = read_file_field(&mut multipart)
        .await
        .map_err(multipart_error)?
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let size = bytes.len();
    let parsed = tokio::task::spawn_blocking(move || parse_workbook(&bytes))
        .await
        .map_err(|e| {
            tracing::error!("Spreadsheet parser task failed: {}", e);
            ApiError::internal_server_error("Error parsing file")
        })?;

    let table = parsed.map_err(|e| {
        tracing::error!("Spreadsheet parse error: {}", e);
        ApiError::internal_server_error("Error parsing file")
    })?;

    tracing::info!("Parsed upload of {} bytes into {} rows", size, table.rows.len());

    Ok(Json(json!({
        "message": "File parsed",
        "columns": table.columns,
        "rows": table.rows,
    })))
}

/// Bytes of the first `file` field, skipping any other fields
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(Some(field.bytes().await?.to_vec()));
        }
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("File too large");
    }
    tracing::debug!("Malformed multipart body: {}", err.body_text());
    ApiError::bad_request("No file uploaded")
}
