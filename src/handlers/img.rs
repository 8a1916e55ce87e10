use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::file;
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::AppState;

/// Accepted MIME types and extensions for one kind of upload. Both the
/// declared type and the file extension must match.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub kind: &'static str,
    pub mime_types: &'static [&'static str],
    pub extensions: &'static [&'static str],
}

pub const IMAGE_POLICY: UploadPolicy = UploadPolicy {
    kind: "image",
    mime_types: &["image/jpeg", "image/png", "image/webp", "image/gif"],
    extensions: &["jpg", "jpeg", "png", "webp", "gif"],
};

/// Proof-of-payment documents
pub const DOCUMENT_POLICY: UploadPolicy = UploadPolicy {
    kind: "document",
    mime_types: &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ],
    extensions: &["pdf", "doc", "docx"],
};

impl UploadPolicy {
    /// Validate an upload and return its normalized extension
    pub fn check(
        &self,
        original_name: &str,
        content_type: &str,
        size: usize,
        max_bytes: usize,
    ) -> AppResult<String> {
        if size == 0 {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if size > max_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds the {} MB limit",
                max_bytes / (1024 * 1024)
            )));
        }

        let content_type = content_type.trim().to_ascii_lowercase();
        if !self.mime_types.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported {} type '{}'",
                self.kind, content_type
            )));
        }

        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| self.extensions.contains(&ext.as_str()))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unsupported {} extension, allowed: {}",
                    self.kind,
                    self.extensions.join(", ")
                ))
            })?;

        Ok(extension)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
}

impl From<&file::Model> for FileInfo {
    fn from(f: &file::Model) -> Self {
        Self {
            id: f.id,
            filename: f.filename.clone(),
            original_name: f.original_name.clone(),
            content_type: f.content_type.clone(),
            size: f.size,
            url: format!("/api/img?id={}", f.id),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FileIdQuery {
    pub id: Option<String>,
}

impl FileIdQuery {
    fn require(&self) -> AppResult<Uuid> {
        let raw = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing file id".to_string()))?;

        Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid file id".to_string()))
    }
}

struct Upload {
    original_name: String,
    content_type: String,
    data: Bytes,
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?;
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        return Ok(Upload {
            original_name,
            content_type,
            data,
        });
    }

    Err(AppError::Validation("Missing file field".to_string()))
}

async fn store_upload(
    state: &AppState,
    multipart: Multipart,
    policy: UploadPolicy,
) -> AppResult<(StatusCode, Json<ApiResponse<FileInfo>>)> {
    let upload = read_upload(multipart).await?;
    let extension = policy.check(
        &upload.original_name,
        &upload.content_type,
        upload.data.len(),
        state.config.upload_max_bytes,
    )?;

    let id = Uuid::new_v4();
    let stored = file::ActiveModel {
        id: Set(id),
        filename: Set(format!("{}.{}", id, extension)),
        original_name: Set(upload.original_name),
        content_type: Set(upload.content_type.trim().to_ascii_lowercase()),
        size: Set(upload.data.len() as i64),
        data: Set(upload.data.to_vec()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        file_id = %stored.id,
        kind = policy.kind,
        size = stored.size,
        "File stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("File uploaded", FileInfo::from(&stored))),
    ))
}

/// Serve stored bytes by id
pub async fn get_file(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<FileIdQuery>, AppError>,
) -> AppResult<Response> {
    let id = query.require()?;

    let stored = file::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, stored.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", stored.filename),
            ),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        stored.data,
    )
        .into_response())
}

/// Upload a CMS image (admin)
pub async fn upload_image(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<FileInfo>>)> {
    store_upload(&state, multipart, IMAGE_POLICY).await
}

/// Upload a proof-of-payment document; the returned `url` is what
/// confirm-payment expects as `proofOfPayment`
pub async fn upload_document(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<FileInfo>>)> {
    store_upload(&state, multipart, DOCUMENT_POLICY).await
}

/// Delete a stored file (admin)
pub async fn delete_file(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<FileIdQuery>, AppError>,
) -> AppResult<Json<ApiResponse<FileInfo>>> {
    let id = query.require()?;

    let stored = file::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    file::Entity::delete_by_id(id).exec(&state.db).await?;

    tracing::info!(file_id = %id, "File deleted");

    Ok(Json(ApiResponse::success(
        "File deleted",
        FileInfo::from(&stored),
    )))
}
