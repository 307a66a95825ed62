// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upload and alignment listing endpoints.

use super::load_stored;
use crate::error::ApiError;
use crate::services::analysis;
use crate::types::{AlignmentListResponse, UploadResponse};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};

/// Uploaded file taken from a multipart request.
struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// Extract the `file` field from a multipart request.
async fn extract_file(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        if field_name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            tracing::debug!(
                size = bytes.len(),
                filename = %filename,
                "Extracted file from multipart"
            );
            return Ok(UploadedFile {
                filename,
                data: bytes.to_vec(),
            });
        }
    }

    tracing::warn!("No 'file' field found in multipart request");
    Err(ApiError::MissingFile)
}

fn has_ifc_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ifc"))
}

/// POST /api/v1/upload - Store an IFC file and list its alignments.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let UploadedFile { filename, data } = extract_file(&mut multipart).await?;

    if !has_ifc_extension(&filename) {
        return Err(ApiError::InvalidFileType { filename });
    }
    if data.len() > state.config.max_file_size_bytes() {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_file_size_mb,
        });
    }

    let size = data.len();
    let file_key = state.cache.store_file(&filename, &data).await?;
    tracing::info!(file_key = %file_key, filename = %filename, size, "Stored upload");

    let config = state.config.analysis;
    let (schema, alignments) = tokio::task::spawn_blocking(move || {
        analysis::load(data).map(|file| (file.schema, analysis::list_alignments(&file, config)))
    })
    .await??;

    Ok(Json(UploadResponse {
        file_key,
        filename,
        size,
        schema: schema.to_string(),
        alignments,
    }))
}

/// GET /api/v1/files/:file_key/alignments - List alignments of a stored file.
pub async fn list_alignments(
    State(state): State<AppState>,
    Path(file_key): Path<String>,
) -> Result<Json<AlignmentListResponse>, ApiError> {
    let file = load_stored(&state, &file_key).await?;
    let config = state.config.analysis;
    let alignments =
        tokio::task::spawn_blocking(move || analysis::list_alignments(&file, config)).await?;

    Ok(Json(AlignmentListResponse {
        file_key,
        alignments,
    }))
}
